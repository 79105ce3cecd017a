//! Slash command payload handling.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use url::form_urlencoded;

/// Fields of the `/proposal` slash command this service consumes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub text: String,
    pub response_url: String,
    pub user_id: String,
    pub channel_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("missing response_url; this endpoint must be called from Slack")]
    MissingResponseUrl,
}

/// Decodes a form-urlencoded slash command body into the fields we use.
/// Unknown fields are ignored.
pub fn parse_slash_payload(body: &[u8]) -> Result<SlashCommandPayload, PayloadError> {
    let fields: BTreeMap<String, String> = form_urlencoded::parse(body)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let field = |name: &str| fields.get(name).cloned().unwrap_or_default();
    let payload = SlashCommandPayload {
        text: field("text"),
        response_url: field("response_url"),
        user_id: field("user_id"),
        channel_id: field("channel_id"),
    };
    if payload.response_url.is_empty() {
        return Err(PayloadError::MissingResponseUrl);
    }
    Ok(payload)
}

fn deal_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"https://app\.hubspot\.com/contacts/\d+/record/0-3/\d+")
            .expect("deal url pattern is valid")
    })
}

/// Pulls the deal URL out of the command text. Slack wraps pasted links in
/// angle brackets and may append extra words; when no URL shape is present
/// the trimmed text itself is handed to the workflow, whose own validation
/// produces the user-facing message.
pub fn extract_deal_reference_text(text: &str) -> Option<String> {
    if let Some(found) = deal_url_pattern().find(text) {
        return Some(found.as_str().to_owned());
    }
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Immediate ephemeral acknowledgment for an accepted command.
pub fn ack_text() -> &'static str {
    "Generating proposal... I'll post the quote link here when it's ready (usually 30-90 seconds)."
}

/// Usage help shown when the command text carries nothing usable.
pub fn usage_text() -> &'static str {
    "Usage: /proposal <HubSpot deal URL>\nExample: /proposal https://app.hubspot.com/contacts/21656838/record/0-3/12345"
}
