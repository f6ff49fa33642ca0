mod client;
mod models;

pub use client::{OpenAiClient, OpenAiClientBuilder};
