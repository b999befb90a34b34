//! pharmyx-llm: Language-model collaborators.
//!
//! Everything here runs after the deterministic analysis is final and only
//! adds narrative or advisory output next to it. Failures are absorbed into
//! fixed fallbacks and never reach the caller as errors.

pub mod backend;
pub mod explanation;
pub mod advisory;
pub mod audit;

pub use advisory::{AdvisoryGeneResult, AdvisoryMapper, AdvisoryReport};
pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message};
pub use explanation::{Explanation, ExplanationGenerator, ExplanationRequest};
