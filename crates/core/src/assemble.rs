//! Quote assembly: the CRM write sequence.
//!
//! Quote creation is the only fatal write. Product-catalog resolution and
//! individual line items are best-effort so that catalog drift in the CRM
//! never blocks the whole proposal; skipped items are logged.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::errors::{UpstreamService, WorkflowError};
use crate::narrative::NarrativeBundle;
use crate::ports::{CrmClient, NewLineItem, NewQuote};
use crate::recommend::Recommendation;

/// HubSpot object-type path segment for quotes in portal record URLs.
const QUOTE_OBJECT_TYPE: &str = "0-115";
const QUOTE_VALIDITY_DAYS: i64 = 30;

const TERMS_HTML: &str = "\
<ul><li><strong>Initial Term:</strong> 12 months from effective date</li>
<li><strong>Termination:</strong> 30 days written notice after initial term</li>
<li><strong>Payment:</strong> Net 15, monthly in advance</li>
<li><strong>Expenses:</strong> Pre-approved expenses billed at cost</li></ul>";

pub async fn assemble_quote(
    crm: &dyn CrmClient,
    portal_id: &str,
    deal_id: &str,
    company_name: &str,
    recommendation: &Recommendation,
    narrative: &NarrativeBundle,
) -> Result<String, WorkflowError> {
    let product_ids = match crm.fetch_product_ids().await {
        Ok(mapping) => mapping,
        Err(error) => {
            warn!(error = %error, "product catalog fetch failed, all line items will be skipped");
            BTreeMap::new()
        }
    };

    let quote = NewQuote {
        title: format!("CGO in a Box Proposal - {company_name}"),
        expiration_date: (Utc::now() + Duration::days(QUOTE_VALIDITY_DAYS))
            .format("%Y-%m-%d")
            .to_string(),
        comments_html: narrative.executive_summary_html.clone(),
        preview_html: narrative.ninety_day_preview_html.clone(),
        terms_html: TERMS_HTML.to_owned(),
        deal_id: deal_id.to_owned(),
    };
    let quote_id = crm
        .create_quote(&quote)
        .await
        .map_err(|error| WorkflowError::upstream(UpstreamService::Hubspot, error.to_string()))?;
    info!(quote_id = %quote_id, deal_id = %deal_id, "quote created");

    for service in &recommendation.selected {
        let Some(product_id) = product_ids.get(service.sku) else {
            warn!(sku = %service.sku, "no product id resolved for sku, skipping line item");
            continue;
        };
        let line_item = NewLineItem {
            product_id: product_id.clone(),
            quantity: 1,
            price: service.monthly_price,
            name: service.name.to_owned(),
            description: service.description.to_owned(),
        };
        if let Err(error) = crm.create_line_item(&quote_id, &line_item).await {
            warn!(sku = %service.sku, quote_id = %quote_id, error = %error, "line item creation failed, skipping");
        }
    }

    Ok(quote_url(portal_id, &quote_id))
}

pub fn quote_url(portal_id: &str, quote_id: &str) -> String {
    format!("https://app.hubspot.com/contacts/{portal_id}/record/{QUOTE_OBJECT_TYPE}/{quote_id}")
}
