use serde::{Deserialize, Serialize};

fn default_schema_version() -> u32 {
    1
}

/// What `skip_next` (and natural track completion) does at the end of the
/// queue. The product default is to stop on the last track.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EndOfQueue {
    #[default]
    Stop,
    Wrap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    pub load_ms: u64,
    pub track_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            load_ms: 150,
            track_ms: 3_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub end_of_queue: EndOfQueue,
    pub media_base_url: String,
    pub log_level: String,
    pub demo: DemoConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            end_of_queue: EndOfQueue::default(),
            media_base_url: "https://media.example.com".to_string(),
            log_level: "info".to_string(),
            demo: DemoConfig::default(),
        }
    }
}
