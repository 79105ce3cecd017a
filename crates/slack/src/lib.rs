//! Slack transport pieces for the proposal workflow.
//!
//! - **Signature verification** (`signature`) - Slack v0 request signing
//! - **Slash command parsing** (`commands`) - form payload + deal URL extraction
//! - **Result delivery** (`notify`) - Block Kit messages posted to `response_url`
//!
//! The workflow engine itself never sees Slack; these modules sit between
//! the HTTP server and the orchestrator.

pub mod commands;
pub mod notify;
pub mod signature;

pub use commands::{extract_deal_reference_text, parse_slash_payload, SlashCommandPayload};
pub use notify::ResultNotifier;
pub use signature::verify_signature;
