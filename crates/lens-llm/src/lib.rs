//! Text-model provider abstraction layer for tickerlens
//!
//! This crate provides provider-agnostic abstractions for driving text
//! generation models. It includes:
//!
//! - Message types for model conversations
//! - Completion request/response types
//! - `TextModel` trait for provider implementations
//! - Concrete provider implementations (behind feature flags)
//!
//! The dashboard pipeline depends only on the [`TextModel`] trait, so tests
//! and alternative backends can be injected freely.

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{
    CompletionRequest, CompletionRequestBuilder, CompletionResponse, FinishReason, TokenUsage,
};
pub use error::{ModelError, Result};
pub use messages::{Message, Role};
pub use provider::TextModel;

// Provider implementations (feature-gated)
#[cfg(feature = "gemini")]
pub mod providers;
