//! `readiness-guide`: explains assessment questions to the person answering
//! them.
//!
//! The server hands a [`GuidanceRequest`] (the question, its rubric, an
//! optional free-text message and the business profile) to whichever
//! [`GuidanceProvider`] the project config selects.
//!
//! # Architecture
//!
//! ```text
//! GuidanceRequest
//!     │
//!     ▼
//! FallbackProvider ── primary ──▶ ChatCompletionsProvider  (POST {base_url}/chat/completions)
//!     │                                   │ error
//!     │ ◀─────────────────────────────────┘
//!     ▼
//! RubricProvider   ← offline; renders the rubric as an explanation
//!     │
//!     ▼
//! Guidance { explanation, scoring_guidance, tips, provider, llm_powered }
//! ```
//!
//! Nothing here touches session state.

pub mod chat;
pub mod error;
pub mod fallback;
pub mod provider;
pub mod rubric;
pub mod types;

pub use chat::ChatCompletionsProvider;
pub use error::GuideError;
pub use fallback::FallbackProvider;
pub use provider::GuidanceProvider;
pub use rubric::RubricProvider;
pub use types::{BusinessContext, Guidance, GuidanceRequest};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, GuideError>;
