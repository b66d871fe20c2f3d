pub mod config;
pub mod model;
pub mod urls;

pub use config::{AppConfig, DemoConfig, EndOfQueue};
pub use model::{ContextId, Track, TrackId};
