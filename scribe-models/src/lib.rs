//! Vision model providers for scribe.
//!
//! This crate provides:
//! - A provider trait for running OCR through vision-capable LLM APIs
//! - Claude, ChatGPT and Gemini implementations of that trait
//! - A registry that initializes configured providers and resolves them by key
//! - Credential sources (environment, in-memory, system keyring)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  ProviderRegistry                    │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  │
//! │  │   Claude    │  │   ChatGPT   │  │   Gemini    │  │
//! │  │  Provider   │  │  Provider   │  │  Provider   │  │
//! │  └─────────────┘  └─────────────┘  └─────────────┘  │
//! └─────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                    ConfigSource                      │
//! │       (Environment / Keyring / In-memory map)        │
//! └─────────────────────────────────────────────────────┘
//! ```

mod error;
mod types;

pub mod auth;
pub mod catalog;
pub mod config;
pub mod providers;
pub mod registry;
pub mod settings;

pub use error::{Error, Result};
pub use registry::ProviderRegistry;
pub use settings::{ModelOverrides, ModelSelection, OcrSettings};
pub use types::{
    AvailableModel, CallOptions, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, ProviderConfig,
    ProviderInfo, ProviderKind, ProviderResponse, Usage,
};
