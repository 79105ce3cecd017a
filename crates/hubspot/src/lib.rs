//! HubSpot CRM client.
//!
//! Implements the workflow engine's `CrmClient` port against the HubSpot
//! REST API: CRM object reads (deals, companies, contacts, meetings,
//! products) and the quote/line-item write sequence. Every call is a single
//! attempt with a bounded timeout; retry and tolerate-vs-abort policy belong
//! to the engine.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use propflow_core::config::HubspotConfig;
use propflow_core::ports::{Company, Contact, CrmClient, Deal, NewLineItem, NewQuote};
use reqwest::{Client, Method, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const API_BASE: &str = "https://api.hubapi.com";

/// HubSpot-defined association type: quote → deal.
const QUOTE_TO_DEAL_ASSOCIATION: u32 = 64;
/// HubSpot-defined association type: quote → line item.
const QUOTE_TO_LINE_ITEM_ASSOCIATION: u32 = 67;

const COMPANY_PROPERTIES: &str =
    "name,domain,industry,numberofemployees,address,city,state,zip,hs_logo_url";
const CONTACT_PROPERTIES: &str = "firstname,lastname,email,jobtitle";
const MEETING_PROPERTIES: &str =
    "hs_meeting_title,hs_internal_meeting_notes,hs_meeting_body,hs_timestamp";

pub struct HubspotClient {
    http: Client,
    access_token: SecretString,
    base_url: String,
}

impl HubspotClient {
    pub fn new(config: &HubspotConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HubSpot HTTP client")?;
        Ok(Self {
            http,
            access_token: config.access_token.clone(),
            base_url: API_BASE.to_owned(),
        })
    }

    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Response> {
        let url = format!("{}{path}", self.base_url);
        debug!(method = %method, path = %path, "hubspot request");

        let mut builder = self
            .http
            .request(method, &url)
            .bearer_auth(self.access_token.expose_secret());
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response =
            builder.send().await.with_context(|| format!("request to {path} failed"))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("HubSpot returned {status} for {path}: {detail}"));
        }
        Ok(response)
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let response = self.request(Method::GET, path, None).await?;
        response.json().await.with_context(|| format!("failed to decode response from {path}"))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self.request(Method::POST, path, Some(body)).await?;
        response.json().await.with_context(|| format!("failed to decode response from {path}"))
    }

    async fn put(&self, path: &str) -> Result<()> {
        self.request(Method::PUT, path, None).await.map(|_| ())
    }
}

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    id: String,
    #[serde(default)]
    properties: BTreeMap<String, Option<String>>,
    #[serde(default)]
    associations: BTreeMap<String, AssociationList>,
}

#[derive(Debug, Default, Deserialize)]
struct AssociationList {
    #[serde(default)]
    results: Vec<AssociationRef>,
}

#[derive(Debug, Deserialize)]
struct AssociationRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct V4AssociationPage {
    #[serde(default)]
    results: Vec<V4AssociationRef>,
}

#[derive(Debug, Deserialize)]
struct V4AssociationRef {
    #[serde(rename = "toObjectId")]
    to_object_id: i64,
}

#[derive(Debug, Deserialize)]
struct ProductPage {
    #[serde(default)]
    results: Vec<ObjectResponse>,
}

impl ObjectResponse {
    fn into_properties(self) -> BTreeMap<String, String> {
        self.properties
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value)))
            .collect()
    }

    fn association_ids(&self, object_type: &str) -> Vec<String> {
        self.associations
            .get(object_type)
            .map(|list| list.results.iter().map(|reference| reference.id.clone()).collect())
            .unwrap_or_default()
    }
}

fn quote_body(quote: &NewQuote) -> Value {
    json!({
        "properties": {
            "hs_title": quote.title,
            "hs_expiration_date": quote.expiration_date,
            "hs_status": "DRAFT",
            "hs_language": "en",
            "hs_locale": "en-us",
            "hs_currency": "USD",
            "hs_comments": quote.comments_html,
            "cgo_90_day_preview": quote.preview_html,
            "hs_terms": quote.terms_html,
        },
        "associations": [{
            "to": { "id": quote.deal_id },
            "types": [{
                "associationCategory": "HUBSPOT_DEFINED",
                "associationTypeId": QUOTE_TO_DEAL_ASSOCIATION,
            }],
        }],
    })
}

fn line_item_body(line_item: &NewLineItem) -> Value {
    json!({
        "properties": {
            "hs_product_id": line_item.product_id,
            "quantity": line_item.quantity,
            "price": line_item.price.to_string(),
            "name": line_item.name,
            "description": line_item.description,
        },
    })
}

#[async_trait]
impl CrmClient for HubspotClient {
    async fn fetch_deal(&self, deal_id: &str) -> Result<Deal> {
        let raw = self
            .get(&format!(
                "/crm/v3/objects/deals/{deal_id}?associations=contacts,companies"
            ))
            .await?;
        let object: ObjectResponse =
            serde_json::from_value(raw).context("unexpected deal response shape")?;

        let company_ids = object.association_ids("companies");
        let contact_ids = object.association_ids("contacts");
        let mut properties = object.into_properties();
        let name = properties.remove("dealname").unwrap_or_else(|| "Unknown Deal".to_owned());

        Ok(Deal { id: deal_id.to_owned(), name, company_ids, contact_ids })
    }

    async fn fetch_company(&self, company_id: &str) -> Result<Company> {
        let raw = self
            .get(&format!(
                "/crm/v3/objects/companies/{company_id}?properties={COMPANY_PROPERTIES}"
            ))
            .await?;
        let object: ObjectResponse =
            serde_json::from_value(raw).context("unexpected company response shape")?;
        Ok(Company { id: object.id.clone(), properties: object.into_properties() })
    }

    async fn fetch_contact(&self, contact_id: &str) -> Result<Contact> {
        let raw = self
            .get(&format!(
                "/crm/v3/objects/contacts/{contact_id}?properties={CONTACT_PROPERTIES}"
            ))
            .await?;
        let object: ObjectResponse =
            serde_json::from_value(raw).context("unexpected contact response shape")?;
        Ok(Contact { id: object.id.clone(), properties: object.into_properties() })
    }

    async fn list_meeting_ids(&self, deal_id: &str) -> Result<Vec<String>> {
        let raw = self.get(&format!("/crm/v4/objects/deals/{deal_id}/associations/meetings")).await?;
        let page: V4AssociationPage =
            serde_json::from_value(raw).context("unexpected association response shape")?;
        Ok(page.results.iter().map(|reference| reference.to_object_id.to_string()).collect())
    }

    async fn fetch_meeting_notes(&self, meeting_id: &str) -> Result<Option<String>> {
        let raw = self
            .get(&format!(
                "/crm/v3/objects/meetings/{meeting_id}?properties={MEETING_PROPERTIES}"
            ))
            .await?;
        let object: ObjectResponse =
            serde_json::from_value(raw).context("unexpected meeting response shape")?;
        Ok(object.into_properties().remove("hs_internal_meeting_notes"))
    }

    async fn fetch_product_ids(&self) -> Result<BTreeMap<String, String>> {
        let raw = self.get("/crm/v3/objects/products?limit=100&properties=name,hs_sku").await?;
        let page: ProductPage =
            serde_json::from_value(raw).context("unexpected product response shape")?;

        let mut mapping = BTreeMap::new();
        for product in page.results {
            let id = product.id.clone();
            if let Some(sku) = product.into_properties().remove("hs_sku") {
                mapping.insert(sku, id);
            }
        }
        Ok(mapping)
    }

    async fn create_quote(&self, quote: &NewQuote) -> Result<String> {
        let raw = self.post("/crm/v3/objects/quotes", &quote_body(quote)).await?;
        let created: ObjectResponse =
            serde_json::from_value(raw).context("unexpected quote creation response shape")?;
        Ok(created.id)
    }

    async fn create_line_item(&self, quote_id: &str, line_item: &NewLineItem) -> Result<()> {
        let raw = self.post("/crm/v3/objects/line_items", &line_item_body(line_item)).await?;
        let created: ObjectResponse =
            serde_json::from_value(raw).context("unexpected line item creation response shape")?;
        self.put(&format!(
            "/crm/v3/objects/quotes/{quote_id}/associations/line_items/{}/{QUOTE_TO_LINE_ITEM_ASSOCIATION}",
            created.id
        ))
        .await
    }
}
