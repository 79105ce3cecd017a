//! Proposal narrative generation.
//!
//! Two independent completion calls produce the executive summary and the
//! first-90-day preview as HTML fragments. The raw model output is taken as
//! the final narrative; no HTML validation happens here. Transcript text is
//! truncated to a fixed character budget to bound request size.

use crate::errors::{UpstreamService, WorkflowError};
use crate::ports::LlmClient;
use crate::recommend::Recommendation;

/// Character budget for transcript text in the 90-day preview request.
const PREVIEW_TRANSCRIPT_BUDGET: usize = 15_000;
/// Character budget for transcript text in the executive summary request.
const SUMMARY_TRANSCRIPT_BUDGET: usize = 12_000;

const SUMMARY_SYSTEM_PROMPT: &str = "\
You are a RevOps consultant. Generate an Executive Summary as HTML for a CGO proposal.
Structure: <h3>Understanding Your Challenges</h3><p>...</p>
<h3>Our Recommendation</h3><p>Based on our discovery, we recommend:</p><ul><li><strong>Service Name</strong> - justification</li>...</ul>
<blockquote>With this engagement, you'll have a dedicated RevOps partner focused on one thing: helping you win more business, more often.</blockquote>
Be specific to the transcript. Professional, warm. Output ONLY valid HTML.";

const PREVIEW_SYSTEM_PROMPT: &str = "\
You are a RevOps consultant. Generate a First 90 Day Preview as HTML for a CGO proposal.
Structure: 5-7 workstream sections. Each section has an h3 header and a ul with 4-7 detailed li items.
Reference specific tools, people, numbers from the transcript when possible. Be action-oriented.
Output ONLY valid HTML, no markdown code fences. Use <h3> and <ul><li>...</li></ul>.";

/// The two HTML documents generated once per run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NarrativeBundle {
    pub executive_summary_html: String,
    pub ninety_day_preview_html: String,
}

pub async fn generate_narrative(
    llm: &dyn LlmClient,
    company_name: &str,
    transcripts: &[String],
    recommendation: &Recommendation,
) -> Result<NarrativeBundle, WorkflowError> {
    let summary_user =
        summary_user_message(company_name, transcripts, recommendation);
    let executive_summary_html = llm
        .complete(SUMMARY_SYSTEM_PROMPT, &summary_user)
        .await
        .map_err(|error| WorkflowError::upstream(UpstreamService::Anthropic, error.to_string()))?;

    let preview_user = preview_user_message(company_name, transcripts);
    let ninety_day_preview_html = llm
        .complete(PREVIEW_SYSTEM_PROMPT, &preview_user)
        .await
        .map_err(|error| WorkflowError::upstream(UpstreamService::Anthropic, error.to_string()))?;

    Ok(NarrativeBundle { executive_summary_html, ninety_day_preview_html })
}

fn summary_user_message(
    company_name: &str,
    transcripts: &[String],
    recommendation: &Recommendation,
) -> String {
    let transcript_text = truncate_chars(&joined_transcripts(transcripts), SUMMARY_TRANSCRIPT_BUDGET);
    let services_text: String = recommendation
        .selected
        .iter()
        .map(|entry| {
            format!("- {} (${}/mo): {}\n", entry.name, entry.monthly_price, entry.description)
        })
        .collect();
    format!(
        "Company: {company_name}\nMonthly total: ${}\n\nTranscripts:\n{transcript_text}\n\nServices:\n{services_text}",
        recommendation.total_monthly,
    )
}

fn preview_user_message(company_name: &str, transcripts: &[String]) -> String {
    let transcript_text = truncate_chars(&joined_transcripts(transcripts), PREVIEW_TRANSCRIPT_BUDGET);
    format!("Company: {company_name}\n\nTranscripts:\n{transcript_text}")
}

fn joined_transcripts(transcripts: &[String]) -> String {
    transcripts.join("\n\n---\n\n")
}

/// Truncates to at most `budget` characters, never splitting a code point.
fn truncate_chars(text: &str, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        Some((byte_index, _)) => text[..byte_index].to_owned(),
        None => text.to_owned(),
    }
}
