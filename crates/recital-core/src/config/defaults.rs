pub(crate) fn default_group_order() -> Vec<String> {
    [
        "important_notice",
        "terms_of_service",
        "privacy_policy",
        "cancellation_policy",
        "consent",
    ]
    .iter()
    .map(|key| key.to_string())
    .collect()
}

pub(crate) fn default_title_separator() -> String {
    "。".to_string()
}

pub(crate) fn default_rate() -> f32 {
    1.0
}

pub(crate) fn default_min_rate() -> f32 {
    0.5
}

pub(crate) fn default_max_rate() -> f32 {
    2.0
}

pub(crate) fn default_pitch() -> f32 {
    1.0
}

pub(crate) fn default_lang() -> String {
    "ja-JP".to_string()
}

pub(crate) fn default_continuous_play() -> bool {
    false
}

pub(crate) fn default_auto_advance_delay_ms() -> u64 {
    600
}

pub(crate) fn default_prefer_voice_clips() -> bool {
    true
}

pub(crate) fn default_storage_key() -> String {
    "contractProgress".to_string()
}

pub(crate) fn default_completion_key() -> String {
    "contractCompletionTime".to_string()
}

pub(crate) fn default_unload_warning() -> String {
    "Leaving this page will discard your reading progress.".to_string()
}

pub(crate) fn default_load_failure_message() -> String {
    "The contract could not be loaded.".to_string()
}

pub(crate) fn default_chat_reply_delay_ms() -> u64 {
    800
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}
