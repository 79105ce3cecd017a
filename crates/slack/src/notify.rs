//! Result delivery back to the slash command's `response_url`.
//!
//! Successful runs post an in-channel Block Kit message with the quote link;
//! failures post an ephemeral single-line cause. Delivery is best-effort:
//! a failed post is logged and dropped, the quote itself already exists.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use propflow_core::errors::WorkflowError;
use propflow_core::workflow::ProposalSummary;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

const POST_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { text: TextObject },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlashResponse {
    pub response_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Block>>,
}

impl SlashResponse {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self { response_type: "ephemeral", text: Some(text.into()), blocks: None }
    }

    pub fn in_channel(blocks: Vec<Block>) -> Self {
        Self { response_type: "in_channel", text: None, blocks: Some(blocks) }
    }
}

pub fn success_message(summary: &ProposalSummary) -> SlashResponse {
    let services_text: String =
        summary.service_names.iter().map(|name| format!("\u{2022} {name}\n")).collect();
    SlashResponse::in_channel(vec![
        Block::Section {
            text: TextObject::mrkdwn(format!("*Proposal created for {}*", summary.company_name)),
        },
        Block::Section {
            text: TextObject::mrkdwn(format!(
                "*Monthly investment:* ${}\n*Services:*\n{}",
                summary.total_monthly,
                services_text.trim_end()
            )),
        },
        Block::Section {
            text: TextObject::mrkdwn(format!("<{}|View quote in HubSpot>", summary.quote_url)),
        },
    ])
}

pub fn failure_message(error: &WorkflowError) -> SlashResponse {
    SlashResponse::ephemeral(format!(":x: Proposal failed: {error}"))
}

/// Posts terminal workflow results to the caller's `response_url`.
pub struct ResultNotifier {
    http: Client,
}

impl ResultNotifier {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(POST_TIMEOUT_SECS))
            .build()
            .context("failed to build Slack HTTP client")?;
        Ok(Self { http })
    }

    pub async fn deliver(
        &self,
        response_url: &str,
        result: &Result<ProposalSummary, WorkflowError>,
    ) {
        let message = match result {
            Ok(summary) => success_message(summary),
            Err(error) => failure_message(error),
        };
        match self.post(response_url, &message).await {
            Ok(()) => info!(outcome = if result.is_ok() { "success" } else { "failure" }, "result delivered"),
            Err(error) => warn!(error = %error, "result delivery failed, dropping message"),
        }
    }

    async fn post(&self, response_url: &str, message: &SlashResponse) -> Result<()> {
        let response = self
            .http
            .post(response_url)
            .json(message)
            .send()
            .await
            .context("post to response_url failed")?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("response_url returned {status}"));
        }
        Ok(())
    }
}
