//! Marketing charge-code taxonomy
//!
//! A marketing code reads `{REGION}-{SEGMENT}[-LEAD|-OTHER]` or
//! `GEN[...][-LEAD|-OTHER]`. Classification walks three ordered decision
//! tables; the first matching entry wins, so overlapping patterns resolve by
//! table position. New regions or segments are new table rows.

use crate::core::codes::{LEAD_SUFFIX, OTHER_SUFFIX};
use serde::Serialize;

/// Prefix → region label
pub const REGIONS: [(&str, &str); 3] = [("CHI", "Chicago"), ("ATL", "Atlanta"), ("LAX", "Los Angeles")];

/// Suffix of the base code → segment label
pub const SEGMENTS: [(&str, &str); 4] = [
    ("-BNK", "Banking"),
    ("-EXST", "Existing"),
    ("-STRAT", "Strategic"),
    ("-PEG", "Private Equity"),
];

/// Trailing effort marker → effort
pub const EFFORTS: [(&str, Effort); 2] = [(LEAD_SUFFIX, Effort::Lead), (OTHER_SUFFIX, Effort::Other)];

pub const GENERAL_PREFIX: &str = "GEN";
pub const GENERAL_LABEL: &str = "General";

pub const UNCLASSIFIED_COLUMN: &str = "MKT — Unclassified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Effort {
    Lead,
    /// Also the effort of a code without an explicit suffix
    Other,
}

/// Reporting destination of a marketing code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MarketingTarget {
    pub region: &'static str,
    pub segment: &'static str,
}

impl MarketingTarget {
    pub const GENERAL: MarketingTarget = MarketingTarget {
        region: GENERAL_LABEL,
        segment: GENERAL_LABEL,
    };

    /// Payroll column for this target and effort, e.g. `MKT Banking — Chicago-Lead`.
    /// "Other" effort columns carry no suffix.
    pub fn column(&self, effort: Effort) -> String {
        match effort {
            Effort::Lead => format!("MKT {} — {}-Lead", self.segment, self.region),
            Effort::Other => format!("MKT {} — {}", self.segment, self.region),
        }
    }

    /// Row label for time summaries, which have no effort split
    pub fn label(&self) -> String {
        format!("Marketing {} — {}", self.segment, self.region)
    }

    /// Canonical base code (`CHI-BNK`, `GEN`)
    pub fn base_code(&self) -> String {
        if *self == Self::GENERAL {
            return GENERAL_PREFIX.to_string();
        }
        let prefix = REGIONS
            .iter()
            .find(|(_, r)| *r == self.region)
            .map(|(p, _)| *p)
            .unwrap_or_default();
        let suffix = SEGMENTS
            .iter()
            .find(|(_, s)| *s == self.segment)
            .map(|(p, _)| *p)
            .unwrap_or_default();
        format!("{prefix}{suffix}")
    }
}

/// Every target in report order: each region across each segment, then General
pub fn all_targets() -> Vec<MarketingTarget> {
    let mut targets: Vec<MarketingTarget> = REGIONS
        .iter()
        .flat_map(|&(_, region)| {
            SEGMENTS
                .iter()
                .map(move |&(_, segment)| MarketingTarget { region, segment })
        })
        .collect();
    targets.push(MarketingTarget::GENERAL);
    targets
}

/// Every marketing payroll column, Lead before Other per target
pub fn all_columns() -> Vec<String> {
    all_targets()
        .iter()
        .flat_map(|t| [t.column(Effort::Lead), t.column(Effort::Other)])
        .collect()
}

/// Split a full code into its base and effort
pub fn split_effort(code: &str) -> (&str, Effort) {
    for (suffix, effort) in EFFORTS {
        if let Some(base) = code.strip_suffix(suffix) {
            return (base, effort);
        }
    }
    (code, Effort::Other)
}

/// Target of a base code (no effort suffix), `None` when unclassifiable
pub fn classify_base(base: &str) -> Option<MarketingTarget> {
    let base = base.trim().to_ascii_uppercase();
    if base.is_empty() {
        return None;
    }
    if base.starts_with(GENERAL_PREFIX) {
        return Some(MarketingTarget::GENERAL);
    }
    let region = REGIONS
        .iter()
        .find(|(prefix, _)| base.starts_with(prefix))
        .map(|(_, label)| *label)?;
    let segment = SEGMENTS
        .iter()
        .find(|(suffix, _)| base.ends_with(suffix))
        .map(|(_, label)| *label)?;
    Some(MarketingTarget { region, segment })
}

/// Target and effort of a full expense code
pub fn classify_code(code: &str) -> Option<(MarketingTarget, Effort)> {
    let upper = code.trim().to_ascii_uppercase();
    let (base, effort) = split_effort(&upper);
    classify_base(base).map(|target| (target, effort))
}
