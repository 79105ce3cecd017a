//! Workflow orchestration.
//!
//! One run is a linear pipeline: parse the reference, fetch CRM context,
//! score transcripts, generate narrative, assemble the quote. The first
//! fatal condition short-circuits to a terminal failure; no phase is
//! retried or re-entered, and nothing survives past the returned result.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::assemble::assemble_quote;
use crate::catalog;
use crate::context::fetch_context;
use crate::errors::WorkflowError;
use crate::narrative::generate_narrative;
use crate::ports::{CrmClient, LlmClient};
use crate::recommend::{recommend_services, Recommendation};
use crate::reference::DealReference;

/// The externally observable outcome of a successful run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalSummary {
    pub quote_url: String,
    pub company_name: String,
    pub total_monthly: i64,
    pub service_names: Vec<String>,
}

pub struct Orchestrator {
    portal_id: String,
    crm: Arc<dyn CrmClient>,
    llm: Arc<dyn LlmClient>,
}

impl Orchestrator {
    pub fn new(portal_id: impl Into<String>, crm: Arc<dyn CrmClient>, llm: Arc<dyn LlmClient>) -> Self {
        Self { portal_id: portal_id.into(), crm, llm }
    }

    /// Runs the full pipeline for one deal reference. Validation happens
    /// before any network I/O; a reference pointing at a foreign portal is
    /// never attempted against CRM data.
    pub async fn run(&self, reference_text: &str) -> Result<ProposalSummary, WorkflowError> {
        let run_id = Uuid::new_v4();

        let reference = DealReference::parse(reference_text).ok_or_else(|| {
            WorkflowError::Validation(
                "Invalid HubSpot deal URL. Use: https://app.hubspot.com/contacts/PORTAL_ID/record/0-3/DEAL_ID"
                    .to_owned(),
            )
        })?;
        if reference.portal_id != self.portal_id {
            return Err(WorkflowError::Validation(format!(
                "Deal URL portal {} does not match configured portal {}",
                reference.portal_id, self.portal_id
            )));
        }
        info!(run_id = %run_id, deal_id = %reference.deal_id, "proposal run started");

        let context = fetch_context(self.crm.as_ref(), &reference.deal_id).await?;
        if context.transcripts.is_empty() {
            return Err(WorkflowError::PreconditionFailed(
                "No AI meeting summaries found for this deal. Ensure discovery calls are recorded \
                 and linked to the deal, or add discovery notes manually."
                    .to_owned(),
            ));
        }
        info!(
            run_id = %run_id,
            companies = context.companies.len(),
            contacts = context.contacts.len(),
            transcripts = context.transcripts.len(),
            "deal context fetched"
        );

        let recommendation = with_default_fallback(recommend_services(&context.transcripts));
        info!(
            run_id = %run_id,
            services = ?recommendation.service_names(),
            total_monthly = recommendation.total_monthly,
            "services recommended"
        );

        let company_name = context.company_name().to_owned();
        let narrative = generate_narrative(
            self.llm.as_ref(),
            &company_name,
            &context.transcripts,
            &recommendation,
        )
        .await?;

        let quote_url = assemble_quote(
            self.crm.as_ref(),
            &self.portal_id,
            &reference.deal_id,
            &company_name,
            &recommendation,
            &narrative,
        )
        .await?;
        info!(run_id = %run_id, quote_url = %quote_url, "proposal run finished");

        Ok(ProposalSummary {
            quote_url,
            company_name,
            total_monthly: recommendation.total_monthly,
            service_names: recommendation.service_names(),
        })
    }
}

/// A transcript set with no qualifying pain area still gets quoted: the
/// default catalog entry stands in for an empty selection.
fn with_default_fallback(recommendation: Recommendation) -> Recommendation {
    if !recommendation.is_empty() {
        return recommendation;
    }
    let default = catalog::default_service();
    Recommendation { selected: vec![default], total_monthly: default.monthly_price }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use super::Orchestrator;
    use crate::errors::{UpstreamService, WorkflowError};
    use crate::ports::{Company, Contact, CrmClient, Deal, LlmClient, NewLineItem, NewQuote};

    const PORTAL: &str = "21656838";
    const DEAL_URL: &str = "https://app.hubspot.com/contacts/21656838/record/0-3/777";

    struct ScriptedCrm {
        calls: AtomicUsize,
        deal_fails: bool,
        meeting_notes: Vec<&'static str>,
        line_items: Mutex<Vec<NewLineItem>>,
    }

    impl ScriptedCrm {
        fn new(meeting_notes: Vec<&'static str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                deal_fails: false,
                meeting_notes,
                line_items: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CrmClient for ScriptedCrm {
        async fn fetch_deal(&self, deal_id: &str) -> Result<Deal> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.deal_fails {
                return Err(anyhow!("deals endpoint returned 502"));
            }
            Ok(Deal {
                id: deal_id.to_owned(),
                name: "Acme Expansion".to_owned(),
                company_ids: vec!["c1".to_owned()],
                contact_ids: Vec::new(),
            })
        }

        async fn fetch_company(&self, company_id: &str) -> Result<Company> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut properties = BTreeMap::new();
            properties.insert("name".to_owned(), "Acme Corp".to_owned());
            Ok(Company { id: company_id.to_owned(), properties })
        }

        async fn fetch_contact(&self, contact_id: &str) -> Result<Contact> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Contact { id: contact_id.to_owned(), properties: BTreeMap::new() })
        }

        async fn list_meeting_ids(&self, _deal_id: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..self.meeting_notes.len()).map(|index| format!("m{index}")).collect())
        }

        async fn fetch_meeting_notes(&self, meeting_id: &str) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let index: usize = meeting_id.trim_start_matches('m').parse().unwrap();
            Ok(Some(self.meeting_notes[index].to_owned()))
        }

        async fn fetch_product_ids(&self) -> Result<BTreeMap<String, String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut mapping = BTreeMap::new();
            for (sku, product_id) in
                [("CGO-CRM", "p-2"), ("CGO-SALESOPS", "p-1"), ("CGO-MKTOPS", "p-0")]
            {
                mapping.insert(sku.to_owned(), product_id.to_owned());
            }
            Ok(mapping)
        }

        async fn create_quote(&self, _quote: &NewQuote) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("888001".to_owned())
        }

        async fn create_line_item(&self, _quote_id: &str, line_item: &NewLineItem) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.line_items.lock().unwrap().push(line_item.clone());
            Ok(())
        }
    }

    struct CannedLlm;

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Ok("<h3>narrative</h3>".to_owned())
        }
    }

    fn orchestrator(crm: Arc<ScriptedCrm>) -> Orchestrator {
        Orchestrator::new(PORTAL, crm, Arc::new(CannedLlm))
    }

    #[tokio::test]
    async fn unparsable_reference_fails_validation_before_any_crm_call() {
        let crm = Arc::new(ScriptedCrm::new(Vec::new()));
        let error = orchestrator(crm.clone())
            .run("generate a proposal please")
            .await
            .expect_err("run should fail");
        assert!(matches!(error, WorkflowError::Validation(_)));
        assert_eq!(crm.call_count(), 0);
    }

    #[tokio::test]
    async fn foreign_portal_fails_validation_before_any_crm_call() {
        let crm = Arc::new(ScriptedCrm::new(Vec::new()));
        let error = orchestrator(crm.clone())
            .run("https://app.hubspot.com/contacts/99999/record/0-3/777")
            .await
            .expect_err("run should fail");
        assert!(matches!(error, WorkflowError::Validation(_)));
        assert!(error.to_string().contains("99999"));
        assert_eq!(crm.call_count(), 0);
    }

    #[tokio::test]
    async fn deal_fetch_failure_is_an_upstream_error() {
        let mut crm = ScriptedCrm::new(Vec::new());
        crm.deal_fails = true;
        let error =
            orchestrator(Arc::new(crm)).run(DEAL_URL).await.expect_err("run should fail");
        assert!(
            matches!(error, WorkflowError::Upstream { service: UpstreamService::Hubspot, .. })
        );
    }

    #[tokio::test]
    async fn zero_transcripts_is_a_precondition_failure() {
        let crm = Arc::new(ScriptedCrm::new(vec!["a note without provenance markers"]));
        let error = orchestrator(crm).run(DEAL_URL).await.expect_err("run should fail");
        assert!(matches!(error, WorkflowError::PreconditionFailed(_)));
        assert!(error.to_string().contains("discovery"));
    }

    #[tokio::test]
    async fn successful_run_reports_services_total_and_quote_url() {
        let crm = Arc::new(ScriptedCrm::new(vec![
            "AI Meeting Summary: crm duplicates slow us down and crm reporting is manual; \
             pipeline reviews stall",
            "AI Meeting Summary: forecasting is guesswork, pipeline stages inconsistent",
        ]));
        let summary = orchestrator(crm.clone()).run(DEAL_URL).await.expect("run should succeed");

        assert_eq!(summary.company_name, "Acme Corp");
        assert_eq!(summary.total_monthly, 5000);
        assert_eq!(
            summary.service_names,
            vec!["Sales Operations Consulting".to_owned(), "CRM Management".to_owned()]
        );
        assert_eq!(
            summary.quote_url,
            "https://app.hubspot.com/contacts/21656838/record/0-115/888001"
        );
        assert_eq!(crm.line_items.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn no_qualifying_pain_area_falls_back_to_the_default_service() {
        let crm = Arc::new(ScriptedCrm::new(vec![
            "AI Meeting Summary: pleasant chat about the weather",
        ]));
        let summary = orchestrator(crm).run(DEAL_URL).await.expect("run should succeed");
        assert_eq!(summary.service_names, vec!["Marketing Operations Consulting".to_owned()]);
        assert_eq!(summary.total_monthly, 3000);
    }
}
