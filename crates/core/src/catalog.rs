//! Static service catalog and pain-indicator tables.
//!
//! Both tables are fixed at compile time and shared read-only across
//! concurrent workflow runs. Prices are whole USD per month.

pub const BUNDLE_SKU: &str = "CGO-BUNDLE";
pub const BUNDLE_MONTHLY_PRICE: i64 = 12_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceCatalogEntry {
    pub sku: &'static str,
    pub name: &'static str,
    pub monthly_price: i64,
    pub description: &'static str,
}

pub const SERVICES: &[ServiceCatalogEntry] = &[
    ServiceCatalogEntry {
        sku: "CGO-MKTOPS",
        name: "Marketing Operations Consulting",
        monthly_price: 3000,
        description: "Lead scoring, segmentation, campaign orchestration, ABM strategy",
    },
    ServiceCatalogEntry {
        sku: "CGO-SALESOPS",
        name: "Sales Operations Consulting",
        monthly_price: 3000,
        description: "Sales enablement, pipeline optimization, lead scoring",
    },
    ServiceCatalogEntry {
        sku: "CGO-CRM",
        name: "CRM Management",
        monthly_price: 2000,
        description: "Weekly hotfixes, data quality monitoring, ad-hoc reporting",
    },
    ServiceCatalogEntry {
        sku: "CGO-DATA",
        name: "Ongoing Data Enrichment",
        monthly_price: 1500,
        description: "1 custom signal + ICP monthly enrichment",
    },
    ServiceCatalogEntry {
        sku: "CGO-EMAIL",
        name: "Email Outreach Automation",
        monthly_price: 1500,
        description: "Cold email infrastructure and campaign execution",
    },
    ServiceCatalogEntry {
        sku: "CGO-LINKEDIN",
        name: "LinkedIn Outreach Automation",
        monthly_price: 1500,
        description: "LinkedIn prospecting automation",
    },
    ServiceCatalogEntry {
        sku: BUNDLE_SKU,
        name: "CGO Bundle (Full)",
        monthly_price: BUNDLE_MONTHLY_PRICE,
        description: "All services included",
    },
];

/// Lowercase keyword phrases signalling a pain area, keyed by sku. Matching
/// is case-insensitive substring search over transcript text.
pub const PAIN_INDICATORS: &[(&str, &[&str])] = &[
    (
        "CGO-CRM",
        &[
            "hubspot underutilized",
            "crm",
            "data silo",
            "logging",
            "data quality",
            "duplicates",
            "messy data",
            "hubspot help",
            "custom properties",
            "reporting",
            "dashboards",
        ],
    ),
    (
        "CGO-MKTOPS",
        &[
            "marketing automation",
            "lead scoring",
            "campaigns",
            "abm",
            "marketing attribution",
            "visitor identification",
            "website traffic",
            "de-anonymize",
            "lead qualification",
            "mql",
            "nurture",
        ],
    ),
    (
        "CGO-SALESOPS",
        &[
            "sales enablement",
            "pipeline",
            "sequences",
            "sales process",
            "forecasting",
            "sales team",
            "quota",
            "opportunity",
            "deal velocity",
            "win rate",
            "sales handoff",
        ],
    ),
    (
        "CGO-DATA",
        &[
            "data enrichment",
            "target market data",
            "contacts",
            "validation",
            "lead lists",
            "icp data",
            "firmographic",
            "technographic",
            "buying signals",
            "intent data",
            "clay",
        ],
    ),
    (
        "CGO-EMAIL",
        &[
            "email campaign",
            "cold email",
            "deliverability",
            "outreach",
            "email sequences",
            "prospecting email",
            "spam",
            "email warmup",
            "open rates",
            "reply rates",
        ],
    ),
    (
        "CGO-LINKEDIN",
        &[
            "linkedin campaign",
            "linkedin outreach",
            "social selling",
            "linkedin prospecting",
            "connection requests",
            "inmail",
            "linkedin automation",
            "social",
        ],
    ),
];

pub fn service_by_sku(sku: &str) -> Option<&'static ServiceCatalogEntry> {
    SERVICES.iter().find(|entry| entry.sku == sku)
}

pub fn bundle() -> &'static ServiceCatalogEntry {
    service_by_sku(BUNDLE_SKU).expect("bundle entry is present in the catalog")
}

/// Fallback entry quoted when no pain area qualifies.
pub fn default_service() -> &'static ServiceCatalogEntry {
    &SERVICES[0]
}

#[cfg(test)]
mod tests {
    use super::{bundle, default_service, service_by_sku, PAIN_INDICATORS, SERVICES};

    #[test]
    fn skus_are_unique() {
        for (index, entry) in SERVICES.iter().enumerate() {
            assert!(
                SERVICES.iter().skip(index + 1).all(|other| other.sku != entry.sku),
                "duplicate sku {}",
                entry.sku
            );
        }
    }

    #[test]
    fn every_indicator_sku_exists_and_is_not_the_bundle() {
        for (sku, indicators) in PAIN_INDICATORS {
            let entry = service_by_sku(sku).expect("indicator sku should be in the catalog");
            assert_ne!(entry.sku, bundle().sku);
            assert!(!indicators.is_empty());
            assert!(indicators.iter().all(|phrase| *phrase == phrase.to_lowercase()));
        }
    }

    #[test]
    fn bundle_price_is_fixed_and_below_full_sum() {
        let parts: i64 = SERVICES
            .iter()
            .filter(|entry| entry.sku != bundle().sku)
            .map(|entry| entry.monthly_price)
            .sum();
        assert_eq!(bundle().monthly_price, 12_000);
        assert!(bundle().monthly_price < parts);
    }

    #[test]
    fn default_service_is_a_non_bundle_entry() {
        assert_ne!(default_service().sku, bundle().sku);
    }
}
