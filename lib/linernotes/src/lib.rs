pub mod aggregator;
pub mod config;
pub mod error;
pub mod links;
pub mod metadata;
pub mod openai;
pub mod player;
pub mod prompts;
pub mod services;
pub mod session;
pub mod traits;

#[cfg(test)]
mod testing;

pub use aggregator::{AggregationState, Aggregator};
pub use config::AppConfig;
pub use services::{Services, ServicesBuilder};
pub use session::Session;
pub use traits::{CompletionBackend, TrackSource};
