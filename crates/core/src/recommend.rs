//! Transcript scoring and service selection.
//!
//! Pure functions over the static catalog tables: no I/O, deterministic, and
//! safe to call from any number of concurrent runs.

use std::collections::BTreeSet;

use crate::catalog::{self, ServiceCatalogEntry, PAIN_INDICATORS, SERVICES};

/// A sku qualifies for a transcript once its indicator phrases produce at
/// least this many hits in total. One hit is treated as noise.
const QUALIFYING_HITS: usize = 2;

/// Four or more distinct pain areas indicate the customer needs comprehensive
/// coverage and is quoted the bundle instead of a sum of parts.
const BUNDLE_THRESHOLD: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recommendation {
    pub selected: Vec<&'static ServiceCatalogEntry>,
    pub total_monthly: i64,
}

impl Recommendation {
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn service_names(&self) -> Vec<String> {
        self.selected.iter().map(|entry| entry.name.to_owned()).collect()
    }
}

fn count_hits(transcript_lower: &str, indicators: &[&str]) -> usize {
    indicators.iter().map(|phrase| transcript_lower.matches(phrase).count()).sum()
}

/// Skus whose indicators hit the qualifying threshold within one transcript.
fn qualifying_skus(transcript: &str) -> BTreeSet<&'static str> {
    let lowered = transcript.to_lowercase();
    PAIN_INDICATORS
        .iter()
        .filter(|(_, indicators)| count_hits(&lowered, indicators) >= QUALIFYING_HITS)
        .map(|(sku, _)| *sku)
        .collect()
}

/// Scores every transcript against the catalog and applies the selection
/// rule. An empty selection is returned as-is; the orchestrator decides the
/// default-service fallback.
pub fn recommend_services(transcripts: &[String]) -> Recommendation {
    let mut skus: BTreeSet<&'static str> = BTreeSet::new();
    for transcript in transcripts {
        skus.extend(qualifying_skus(transcript));
    }

    if skus.len() >= BUNDLE_THRESHOLD {
        let bundle = catalog::bundle();
        return Recommendation { selected: vec![bundle], total_monthly: bundle.monthly_price };
    }

    let selected: Vec<&'static ServiceCatalogEntry> =
        SERVICES.iter().filter(|entry| skus.contains(entry.sku)).collect();
    let total_monthly = selected.iter().map(|entry| entry.monthly_price).sum();
    Recommendation { selected, total_monthly }
}
