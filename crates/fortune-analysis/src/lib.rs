//! Engagement analysis for Threads Fortune.
//!
//! Wraps the language-model collaborator behind [`TextGenerator`], caches
//! per-post critiques ([`AnalysisCache`], [`PostAnalyzer`]), builds creator
//! portraits ([`PortraitGenerator`]) and aggregates dashboard statistics
//! ([`summarize`]). Generator failures never escape this crate: they degrade
//! into an "Analysis unavailable" message or the default portrait.

pub mod analyzer;
pub mod cache;
pub mod error;
pub mod generator;
pub mod openai;
pub mod portrait;
pub mod summary;

mod retry;
mod text;

pub use analyzer::{AnalysisOutcome, AnalyzerSettings, BatchAnalysis, PostAnalysis, PostAnalyzer};
pub use cache::{is_valid, record_analysis, AnalysisCache};
pub use error::GenerationError;
pub use generator::{DisabledGenerator, TextGenerator};
pub use openai::OpenAiClient;
pub use portrait::{
    Archetype, FallbackReason, Portrait, PortraitGenerator, PortraitOutcome,
};
pub use summary::{summarize, PostHighlight, SummaryStats};
