use super::defaults;
use super::models::{LogLevel, ReaderConfig};
use serde::Deserialize;

/// Sectioned on-disk layout of `conf/config.toml`.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    documents: DocumentsConfig,
    #[serde(default)]
    narration: NarrationConfig,
    #[serde(default)]
    progress: ProgressConfig,
    #[serde(default)]
    chat: ChatConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for ReaderConfig {
    fn from(tables: ConfigTables) -> Self {
        ReaderConfig {
            group_order: tables.documents.group_order,
            start_group: tables.documents.start_group,
            start_section: tables.documents.start_section,
            title_separator: tables.documents.title_separator,
            default_rate: tables.narration.default_rate,
            min_rate: tables.narration.min_rate,
            max_rate: tables.narration.max_rate,
            pitch: tables.narration.pitch,
            lang: tables.narration.lang,
            continuous_play: tables.narration.continuous_play,
            auto_advance_delay_ms: tables.narration.auto_advance_delay_ms,
            prefer_voice_clips: tables.narration.prefer_voice_clips,
            storage_key: tables.progress.storage_key,
            completion_key: tables.progress.completion_key,
            unload_warning: tables.progress.unload_warning,
            load_failure_message: tables.progress.load_failure_message,
            chat_reply_delay_ms: tables.chat.reply_delay_ms,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&ReaderConfig> for ConfigTables {
    fn from(config: &ReaderConfig) -> Self {
        ConfigTables {
            documents: DocumentsConfig {
                group_order: config.group_order.clone(),
                start_group: config.start_group.clone(),
                start_section: config.start_section.clone(),
                title_separator: config.title_separator.clone(),
            },
            narration: NarrationConfig {
                default_rate: config.default_rate,
                min_rate: config.min_rate,
                max_rate: config.max_rate,
                pitch: config.pitch,
                lang: config.lang.clone(),
                continuous_play: config.continuous_play,
                auto_advance_delay_ms: config.auto_advance_delay_ms,
                prefer_voice_clips: config.prefer_voice_clips,
            },
            progress: ProgressConfig {
                storage_key: config.storage_key.clone(),
                completion_key: config.completion_key.clone(),
                unload_warning: config.unload_warning.clone(),
                load_failure_message: config.load_failure_message.clone(),
            },
            chat: ChatConfig {
                reply_delay_ms: config.chat_reply_delay_ms,
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct DocumentsConfig {
    #[serde(default = "defaults::default_group_order")]
    group_order: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_section: Option<String>,
    #[serde(default = "defaults::default_title_separator")]
    title_separator: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            group_order: defaults::default_group_order(),
            start_group: None,
            start_section: None,
            title_separator: defaults::default_title_separator(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct NarrationConfig {
    #[serde(default = "defaults::default_rate")]
    default_rate: f32,
    #[serde(default = "defaults::default_min_rate")]
    min_rate: f32,
    #[serde(default = "defaults::default_max_rate")]
    max_rate: f32,
    #[serde(default = "defaults::default_pitch")]
    pitch: f32,
    #[serde(default = "defaults::default_lang")]
    lang: String,
    #[serde(default = "defaults::default_continuous_play")]
    continuous_play: bool,
    #[serde(default = "defaults::default_auto_advance_delay_ms")]
    auto_advance_delay_ms: u64,
    #[serde(default = "defaults::default_prefer_voice_clips")]
    prefer_voice_clips: bool,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            default_rate: defaults::default_rate(),
            min_rate: defaults::default_min_rate(),
            max_rate: defaults::default_max_rate(),
            pitch: defaults::default_pitch(),
            lang: defaults::default_lang(),
            continuous_play: defaults::default_continuous_play(),
            auto_advance_delay_ms: defaults::default_auto_advance_delay_ms(),
            prefer_voice_clips: defaults::default_prefer_voice_clips(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ProgressConfig {
    #[serde(default = "defaults::default_storage_key")]
    storage_key: String,
    #[serde(default = "defaults::default_completion_key")]
    completion_key: String,
    #[serde(default = "defaults::default_unload_warning")]
    unload_warning: String,
    #[serde(default = "defaults::default_load_failure_message")]
    load_failure_message: String,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            storage_key: defaults::default_storage_key(),
            completion_key: defaults::default_completion_key(),
            unload_warning: defaults::default_unload_warning(),
            load_failure_message: defaults::default_load_failure_message(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ChatConfig {
    #[serde(default = "defaults::default_chat_reply_delay_ms")]
    reply_delay_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: defaults::default_chat_reply_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::default_log_level(),
        }
    }
}
