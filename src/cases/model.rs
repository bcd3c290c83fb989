//! Case model and claim-type normalization.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The fixed claim-type enumeration persisted on cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimType {
    PhishingScam,
    MisSoldProduct,
    DeniedInsurance,
}

impl ClaimType {
    /// Fallback bucket for subtypes matching no known keyword.
    pub const DEFAULT: ClaimType = ClaimType::PhishingScam;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhishingScam => "Phishing Scam",
            Self::MisSoldProduct => "Mis-sold Financial Product",
            Self::DeniedInsurance => "Denied Insurance Claim",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Mis-sold Financial Product" => Self::MisSoldProduct,
            "Denied Insurance Claim" => Self::DeniedInsurance,
            _ => Self::PhishingScam,
        }
    }
}

/// Case lifecycle status. Only the draft state is produced by intake; the
/// case dashboard owns the rest of the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStatus {
    Draft,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
        }
    }
}

/// A durable, user-owned complaint record.
#[derive(Debug, Clone)]
pub struct Case {
    pub id: Uuid,
    pub user_id: Uuid,
    pub case_status: CaseStatus,
    pub claim_type: ClaimType,
    pub dispute_narrative: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Case {
    /// Build a new draft case from a converted session's fields.
    pub fn draft(user_id: Uuid, claim_type: ClaimType, narrative: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            case_status: CaseStatus::Draft,
            claim_type,
            dispute_narrative: narrative,
            created_at: Utc::now(),
        }
    }
}

/// Keyword groups checked in order; the first group with a hit wins.
///
/// Fraud/scam keywords come first on purpose: an ambiguous subtype that
/// mentions both fraud and insurance is bucketed as a scam.
const KEYWORD_GROUPS: &[(&[&str], ClaimType)] = &[
    (&["fraud", "scam", "phish"], ClaimType::PhishingScam),
    (
        &["mis-sold", "missold", "mis sold", "investment"],
        ClaimType::MisSoldProduct,
    ),
    (&["insurance", "policy"], ClaimType::DeniedInsurance),
];

/// Normalize a free-form classification subtype into the fixed enumeration.
///
/// Lossy by design: anything matching no known keyword is silently bucketed
/// into the default category rather than rejected.
pub fn derive_claim_type(subtype: &str) -> ClaimType {
    let lower = subtype.to_lowercase();
    for (keywords, claim_type) in KEYWORD_GROUPS {
        if keywords.iter().any(|k| lower.contains(k)) {
            return *claim_type;
        }
    }
    ClaimType::DEFAULT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraud_keyword_maps_to_phishing_scam() {
        assert_eq!(derive_claim_type("Investment Fraud"), ClaimType::PhishingScam);
        assert_eq!(derive_claim_type("FRAUD"), ClaimType::PhishingScam);
        assert_eq!(derive_claim_type("suspected fraud on card"), ClaimType::PhishingScam);
    }

    #[test]
    fn scam_and_phishing_keywords() {
        assert_eq!(derive_claim_type("Scam"), ClaimType::PhishingScam);
        assert_eq!(derive_claim_type("phishing link"), ClaimType::PhishingScam);
    }

    #[test]
    fn mis_sold_keywords() {
        assert_eq!(
            derive_claim_type("Mis-sold structured deposit"),
            ClaimType::MisSoldProduct
        );
        assert_eq!(
            derive_claim_type("unsuitable investment product"),
            ClaimType::MisSoldProduct
        );
    }

    #[test]
    fn insurance_keywords() {
        assert_eq!(
            derive_claim_type("denied insurance payout"),
            ClaimType::DeniedInsurance
        );
        assert_eq!(derive_claim_type("policy rejection"), ClaimType::DeniedInsurance);
    }

    #[test]
    fn unknown_subtype_defaults() {
        assert_eq!(derive_claim_type("something else entirely"), ClaimType::DEFAULT);
        assert_eq!(derive_claim_type(""), ClaimType::DEFAULT);
    }

    #[test]
    fn fraud_beats_insurance_on_ambiguous_input() {
        // First matching group wins: scam-first posture.
        assert_eq!(
            derive_claim_type("insurance fraud by my agent"),
            ClaimType::PhishingScam
        );
    }

    #[test]
    fn claim_type_round_trip() {
        for claim_type in [
            ClaimType::PhishingScam,
            ClaimType::MisSoldProduct,
            ClaimType::DeniedInsurance,
        ] {
            assert_eq!(ClaimType::parse(claim_type.as_str()), claim_type);
        }
    }

    #[test]
    fn unknown_db_string_parses_to_default() {
        assert_eq!(ClaimType::parse("Legacy Category"), ClaimType::DEFAULT);
    }
}
