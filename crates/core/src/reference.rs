use std::sync::OnceLock;

use regex::Regex;

/// Identifier pair parsed out of a HubSpot deal URL.
///
/// Both fields are non-empty numeric strings; the value is immutable once
/// parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DealReference {
    pub portal_id: String,
    pub deal_id: String,
}

fn deal_path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"contacts/(\d+)/record/0-3/(\d+)").expect("deal path pattern is valid")
    })
}

impl DealReference {
    /// Scans free-form text for a deal URL of the shape
    /// `.../contacts/{portal}/record/0-3/{deal}`. Returns `None` when the
    /// path shape is absent; parsing never fails any other way.
    pub fn parse(text: &str) -> Option<Self> {
        let captures = deal_path_pattern().captures(text)?;
        Some(Self { portal_id: captures[1].to_owned(), deal_id: captures[2].to_owned() })
    }
}
