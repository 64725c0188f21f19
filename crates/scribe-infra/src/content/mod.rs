//! AI content generation.

mod openai;

pub use openai::{OpenAiConfig, OpenAiContentGenerator};
