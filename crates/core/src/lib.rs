//! Proposal workflow engine.
//!
//! Turns a HubSpot deal reference into a populated quote: fetches the deal's
//! CRM context, scores discovery-call transcripts against the service catalog,
//! generates proposal narrative via an LLM, and writes the quote plus line
//! items back into HubSpot. Transport concerns (Slack, HTTP) live in the
//! sibling crates; this crate only talks to the outside world through the
//! [`ports`] traits.

pub mod assemble;
pub mod catalog;
pub mod config;
pub mod context;
pub mod errors;
pub mod narrative;
pub mod ports;
pub mod recommend;
pub mod reference;
pub mod workflow;

pub use catalog::{ServiceCatalogEntry, BUNDLE_SKU};
pub use errors::{UpstreamService, WorkflowError};
pub use ports::{Company, Contact, CrmClient, Deal, LlmClient, NewLineItem, NewQuote};
pub use recommend::Recommendation;
pub use reference::DealReference;
pub use workflow::{Orchestrator, ProposalSummary};
