//! Gemini API provider.
//!
//! Talks to the Gemini REST API for image generation and editing, Veo video
//! jobs, and search-grounded text generation.

mod client;
mod types;

pub use client::{GEMINI_API_BASE_URL, GeminiClient, GeminiClientBuilder, GeminiConnector};
pub use types::*;
