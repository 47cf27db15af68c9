//! Charge-code vocabulary shared by the validator and the reports

use crate::types::ParsedWorkbook;
use std::collections::BTreeSet;

/// Firm-internal codes and their report labels, in display order
pub const INTERNAL_CODES: [(&str, &str); 7] = [
    ("ADM", "Administrative"),
    ("MTG", "Meetings"),
    ("REC", "Recruiting"),
    ("TRN", "Training"),
    ("HOL", "Holiday"),
    ("PTO", "Paid Time Off"),
    ("OFF", "Office"),
];

pub const LEAD_SUFFIX: &str = "-LEAD";
pub const OTHER_SUFFIX: &str = "-OTHER";

pub fn is_internal_code(code: &str) -> bool {
    INTERNAL_CODES.iter().any(|(c, _)| *c == code)
}

pub fn internal_codes() -> BTreeSet<String> {
    INTERNAL_CODES.iter().map(|(c, _)| c.to_string()).collect()
}

/// `-LEAD` / `-OTHER` forms of a marketing base code
pub fn marketing_variants(base: &str) -> [String; 2] {
    [format!("{base}{LEAD_SUFFIX}"), format!("{base}{OTHER_SUFFIX}")]
}

/// Ends in one of the marketing effort suffixes
pub fn is_marketing_coded(code: &str) -> bool {
    code.ends_with(LEAD_SUFFIX) || code.ends_with(OTHER_SUFFIX)
}

/// Client codes referenced by either half's time grid
pub fn client_codes(parsed: &ParsedWorkbook) -> BTreeSet<String> {
    parsed
        .time
        .iter()
        .flat_map(|(_, half)| half.totals_by_client_code.keys())
        .filter(|c| !c.is_empty())
        .cloned()
        .collect()
}

/// Codes of the internal band as entered on the sheet
pub fn internal_band_codes(parsed: &ParsedWorkbook) -> BTreeSet<String> {
    parsed
        .time
        .iter()
        .flat_map(|(_, half)| half.totals_by_other_hours.keys())
        .filter(|c| !c.is_empty())
        .cloned()
        .collect()
}

/// Suffixed expense codes derived from every marketing base code in the time grid
pub fn marketing_codes(parsed: &ParsedWorkbook) -> BTreeSet<String> {
    parsed
        .time
        .iter()
        .flat_map(|(_, half)| half.totals_by_marketing_bucket.keys())
        .filter(|c| !c.is_empty())
        .flat_map(|base| marketing_variants(base))
        .collect()
}
