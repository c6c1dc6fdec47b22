//! Inference provider implementations
//!
//! Concrete implementations of the `InferenceClient` trait.

pub mod gemini;

pub use gemini::GeminiClient;
