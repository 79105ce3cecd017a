//! Integration seams between the workflow engine and the outside world.
//!
//! The engine decides per call site whether a failure aborts the run or is
//! tolerated; the clients behind these traits just report success or failure
//! for each individual operation.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

/// A CRM sales-opportunity record, fetched once per run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deal {
    pub id: String,
    pub name: String,
    pub company_ids: Vec<String>,
    pub contact_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Company {
    pub id: String,
    pub properties: BTreeMap<String, String>,
}

impl Company {
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contact {
    pub id: String,
    pub properties: BTreeMap<String, String>,
}

/// Quote creation payload; the CRM client maps these onto provider fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewQuote {
    pub title: String,
    pub expiration_date: String,
    pub comments_html: String,
    pub preview_html: String,
    pub terms_html: String,
    pub deal_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewLineItem {
    pub product_id: String,
    pub quantity: u32,
    pub price: i64,
    pub name: String,
    pub description: String,
}

#[async_trait]
pub trait CrmClient: Send + Sync {
    async fn fetch_deal(&self, deal_id: &str) -> Result<Deal>;
    async fn fetch_company(&self, company_id: &str) -> Result<Company>;
    async fn fetch_contact(&self, contact_id: &str) -> Result<Contact>;
    /// Meeting record ids associated with the deal.
    async fn list_meeting_ids(&self, deal_id: &str) -> Result<Vec<String>>;
    /// Internal notes of one meeting record; `None` when the field is unset.
    async fn fetch_meeting_notes(&self, meeting_id: &str) -> Result<Option<String>>;
    /// sku -> productId for the provider-side product catalog.
    async fn fetch_product_ids(&self) -> Result<BTreeMap<String, String>>;
    /// Creates the quote, associates it to the deal, returns the quote id.
    async fn create_quote(&self, quote: &NewQuote) -> Result<String>;
    /// Creates one line item and associates it to the quote.
    async fn create_line_item(&self, quote_id: &str, line_item: &NewLineItem) -> Result<()>;
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}
