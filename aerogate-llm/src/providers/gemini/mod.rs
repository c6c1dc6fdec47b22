//! Gemini provider implementation
//!
//! This module provides the `generateContent` REST client used for every task.

pub mod client;
pub mod types;

pub use client::GeminiClient;
