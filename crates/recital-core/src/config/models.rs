use serde::Deserialize;
use std::time::Duration;

/// Reader configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, serde::Serialize, PartialEq)]
pub struct ReaderConfig {
    #[serde(default = "crate::config::defaults::default_group_order")]
    pub group_order: Vec<String>,
    #[serde(default)]
    pub start_group: Option<String>,
    #[serde(default)]
    pub start_section: Option<String>,
    #[serde(default = "crate::config::defaults::default_title_separator")]
    pub title_separator: String,
    #[serde(default = "crate::config::defaults::default_rate")]
    pub default_rate: f32,
    #[serde(default = "crate::config::defaults::default_min_rate")]
    pub min_rate: f32,
    #[serde(default = "crate::config::defaults::default_max_rate")]
    pub max_rate: f32,
    #[serde(default = "crate::config::defaults::default_pitch")]
    pub pitch: f32,
    #[serde(default = "crate::config::defaults::default_lang")]
    pub lang: String,
    #[serde(default = "crate::config::defaults::default_continuous_play")]
    pub continuous_play: bool,
    #[serde(default = "crate::config::defaults::default_auto_advance_delay_ms")]
    pub auto_advance_delay_ms: u64,
    #[serde(default = "crate::config::defaults::default_prefer_voice_clips")]
    pub prefer_voice_clips: bool,
    #[serde(default = "crate::config::defaults::default_storage_key")]
    pub storage_key: String,
    #[serde(default = "crate::config::defaults::default_completion_key")]
    pub completion_key: String,
    #[serde(default = "crate::config::defaults::default_unload_warning")]
    pub unload_warning: String,
    #[serde(default = "crate::config::defaults::default_load_failure_message")]
    pub load_failure_message: String,
    #[serde(default = "crate::config::defaults::default_chat_reply_delay_ms")]
    pub chat_reply_delay_ms: u64,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            group_order: crate::config::defaults::default_group_order(),
            start_group: None,
            start_section: None,
            title_separator: crate::config::defaults::default_title_separator(),
            default_rate: crate::config::defaults::default_rate(),
            min_rate: crate::config::defaults::default_min_rate(),
            max_rate: crate::config::defaults::default_max_rate(),
            pitch: crate::config::defaults::default_pitch(),
            lang: crate::config::defaults::default_lang(),
            continuous_play: crate::config::defaults::default_continuous_play(),
            auto_advance_delay_ms: crate::config::defaults::default_auto_advance_delay_ms(),
            prefer_voice_clips: crate::config::defaults::default_prefer_voice_clips(),
            storage_key: crate::config::defaults::default_storage_key(),
            completion_key: crate::config::defaults::default_completion_key(),
            unload_warning: crate::config::defaults::default_unload_warning(),
            load_failure_message: crate::config::defaults::default_load_failure_message(),
            chat_reply_delay_ms: crate::config::defaults::default_chat_reply_delay_ms(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

impl ReaderConfig {
    /// Keep rate bounds ordered and the default rate inside them regardless
    /// of what the file said.
    pub fn sanitized(mut self) -> Self {
        if !self.min_rate.is_finite() || self.min_rate <= 0.0 {
            self.min_rate = crate::config::defaults::default_min_rate();
        }
        if !self.max_rate.is_finite() || self.max_rate < self.min_rate {
            self.max_rate = self
                .min_rate
                .max(crate::config::defaults::default_max_rate());
        }
        if !self.default_rate.is_finite() {
            self.default_rate = crate::config::defaults::default_rate();
        }
        self.default_rate = self.clamp_rate(self.default_rate);
        if !self.pitch.is_finite() || self.pitch <= 0.0 {
            self.pitch = crate::config::defaults::default_pitch();
        }
        self
    }

    pub fn rate_range(&self) -> RateRange {
        RateRange {
            default: self.default_rate,
            min: self.min_rate,
            max: self.max_rate,
        }
    }

    pub fn clamp_rate(&self, rate: f32) -> f32 {
        self.rate_range().clamp(rate)
    }

    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }

    pub fn chat_reply_delay(&self) -> Duration {
        Duration::from_millis(self.chat_reply_delay_ms)
    }
}

/// Speech rate bounds shared by config sanitizing and live rate changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateRange {
    pub default: f32,
    pub min: f32,
    pub max: f32,
}

impl RateRange {
    /// Non-finite input falls back to the default rate.
    pub fn clamp(&self, rate: f32) -> f32 {
        let rate = if rate.is_finite() { rate } else { self.default };
        rate.clamp(self.min, self.max)
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
