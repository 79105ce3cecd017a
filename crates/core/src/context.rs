//! CRM context fetch phase.
//!
//! Fetch policy: the deal itself is load-bearing and aborts the run when it
//! cannot be read. Everything hanging off the deal (companies, contacts,
//! individual meetings) is fetched one record at a time and a failing record
//! is logged and omitted rather than failing the phase. Only the complete
//! absence of discovery transcripts is escalated, by the orchestrator.

use tracing::warn;

use crate::errors::{UpstreamService, WorkflowError};
use crate::ports::{Company, Contact, CrmClient, Deal};

/// Markers identifying a meeting note as an AI-generated call summary.
const TRANSCRIPT_MARKERS: &[&str] = &["AI Meeting Summary", "Generated by Fathom"];

/// Everything the downstream phases need from the CRM, fetched once per run.
#[derive(Clone, Debug)]
pub struct DealContext {
    pub deal: Deal,
    pub companies: Vec<Company>,
    pub contacts: Vec<Contact>,
    pub transcripts: Vec<String>,
}

impl DealContext {
    /// Display name for the proposal: the first company's name, falling back
    /// to the deal name when no company record was fetched.
    pub fn company_name(&self) -> &str {
        self.companies
            .first()
            .and_then(Company::name)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.deal.name)
    }
}

pub async fn fetch_context(
    crm: &dyn CrmClient,
    deal_id: &str,
) -> Result<DealContext, WorkflowError> {
    let deal = crm
        .fetch_deal(deal_id)
        .await
        .map_err(|error| WorkflowError::upstream(UpstreamService::Hubspot, error.to_string()))?;

    let mut companies = Vec::new();
    for company_id in &deal.company_ids {
        match crm.fetch_company(company_id).await {
            Ok(company) => companies.push(company),
            Err(error) => {
                warn!(company_id = %company_id, error = %error, "company fetch failed, omitting record");
            }
        }
    }

    let mut contacts = Vec::new();
    for contact_id in &deal.contact_ids {
        match crm.fetch_contact(contact_id).await {
            Ok(contact) => contacts.push(contact),
            Err(error) => {
                warn!(contact_id = %contact_id, error = %error, "contact fetch failed, omitting record");
            }
        }
    }

    let transcripts = fetch_transcripts(crm, deal_id).await;

    Ok(DealContext { deal, companies, contacts, transcripts })
}

/// Collects AI-generated meeting summaries linked to the deal. A failure
/// listing the associations yields an empty set; per-meeting failures drop
/// only that meeting.
async fn fetch_transcripts(crm: &dyn CrmClient, deal_id: &str) -> Vec<String> {
    let meeting_ids = match crm.list_meeting_ids(deal_id).await {
        Ok(ids) => ids,
        Err(error) => {
            warn!(deal_id = %deal_id, error = %error, "meeting association listing failed, no transcripts");
            return Vec::new();
        }
    };

    let mut transcripts = Vec::new();
    for meeting_id in meeting_ids {
        match crm.fetch_meeting_notes(&meeting_id).await {
            Ok(Some(notes)) if TRANSCRIPT_MARKERS.iter().any(|marker| notes.contains(marker)) => {
                transcripts.push(notes);
            }
            Ok(_) => {}
            Err(error) => {
                warn!(meeting_id = %meeting_id, error = %error, "meeting fetch failed, omitting transcript");
            }
        }
    }
    transcripts
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use super::{fetch_context, DealContext};
    use crate::ports::{Company, Contact, CrmClient, Deal, NewLineItem, NewQuote};

    struct FlakyCrm {
        failing_contact: &'static str,
    }

    #[async_trait]
    impl CrmClient for FlakyCrm {
        async fn fetch_deal(&self, deal_id: &str) -> Result<Deal> {
            Ok(Deal {
                id: deal_id.to_owned(),
                name: "Acme Renewal".to_owned(),
                company_ids: vec!["c1".to_owned()],
                contact_ids: vec!["p1".to_owned(), "p2".to_owned(), "p3".to_owned()],
            })
        }

        async fn fetch_company(&self, company_id: &str) -> Result<Company> {
            let mut properties = BTreeMap::new();
            properties.insert("name".to_owned(), "Acme Corp".to_owned());
            Ok(Company { id: company_id.to_owned(), properties })
        }

        async fn fetch_contact(&self, contact_id: &str) -> Result<Contact> {
            if contact_id == self.failing_contact {
                return Err(anyhow!("404 contact not found"));
            }
            Ok(Contact { id: contact_id.to_owned(), properties: BTreeMap::new() })
        }

        async fn list_meeting_ids(&self, _deal_id: &str) -> Result<Vec<String>> {
            Ok(vec!["m1".to_owned(), "m2".to_owned(), "m3".to_owned()])
        }

        async fn fetch_meeting_notes(&self, meeting_id: &str) -> Result<Option<String>> {
            match meeting_id {
                "m1" => Ok(Some("AI Meeting Summary\ncrm pains, crm again".to_owned())),
                "m2" => Ok(Some("manually typed note, no provenance marker".to_owned())),
                _ => Err(anyhow!("500 meeting store unavailable")),
            }
        }

        async fn fetch_product_ids(&self) -> Result<BTreeMap<String, String>> {
            Ok(BTreeMap::new())
        }

        async fn create_quote(&self, _quote: &NewQuote) -> Result<String> {
            Err(anyhow!("not used in this test"))
        }

        async fn create_line_item(&self, _quote_id: &str, _line_item: &NewLineItem) -> Result<()> {
            Err(anyhow!("not used in this test"))
        }
    }

    #[tokio::test]
    async fn one_failing_contact_leaves_the_other_two() {
        let crm = FlakyCrm { failing_contact: "p2" };
        let context = fetch_context(&crm, "d1").await.expect("phase should succeed");
        let ids: Vec<&str> = context.contacts.iter().map(|contact| contact.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);
    }

    #[tokio::test]
    async fn only_marked_notes_become_transcripts_and_failures_are_skipped() {
        let crm = FlakyCrm { failing_contact: "none" };
        let context = fetch_context(&crm, "d1").await.expect("phase should succeed");
        assert_eq!(context.transcripts.len(), 1);
        assert!(context.transcripts[0].contains("crm pains"));
    }

    #[tokio::test]
    async fn company_name_prefers_the_first_company() {
        let crm = FlakyCrm { failing_contact: "none" };
        let context = fetch_context(&crm, "d1").await.expect("phase should succeed");
        assert_eq!(context.company_name(), "Acme Corp");
    }

    #[test]
    fn company_name_falls_back_to_the_deal_name() {
        let context = DealContext {
            deal: Deal {
                id: "d1".to_owned(),
                name: "Acme Renewal".to_owned(),
                company_ids: Vec::new(),
                contact_ids: Vec::new(),
            },
            companies: Vec::new(),
            contacts: Vec::new(),
            transcripts: Vec::new(),
        };
        assert_eq!(context.company_name(), "Acme Renewal");
    }
}
