//! Neighborhood label normalization
//!
//! Source data spells the same neighborhood in many ways ("Vl. São Paulo",
//! "VILA SAO PAULO", "vila são paulo"). Every raw label is canonicalized once,
//! at ingestion, into an upper-case ASCII-folded key.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical key for rows without a neighborhood label
pub const UNINFORMED: &str = "UNINFORMED";

/// Prefix abbreviations, applied in this order.
///
/// Order matters: "sta." and "sto." must be expanded before the bare "s." rule
/// gets a chance to eat their leading "s.".
const ABBREVIATIONS: [(&str, &str); 5] = [
    ("vl.", "Vila"),
    ("jd.", "Jardim"),
    ("sta.", "Santa"),
    ("sto.", "Santo"),
    ("s.", "São"),
];

static RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    ABBREVIATIONS
        .iter()
        .map(|(abbrev, expansion)| {
            let pattern = format!(r"\b{}", regex::escape(abbrev));
            // Patterns are built from the constant table above
            let re = Regex::new(&pattern).expect("abbreviation pattern is valid");
            (re, *expansion)
        })
        .collect()
});

/// Canonicalize a raw neighborhood label.
///
/// - `None` or `""` → [`UNINFORMED`]
/// - otherwise: strip combining marks after canonical decomposition, fold case
///   (upper then lower, so letters like `ſ` settle on their ASCII form), trim,
///   expand abbreviations (word-boundary anchored, all occurrences, table
///   order), strip marks again, upper-case.
///
/// The output is a fixed point: normalizing it again changes nothing.
///
/// A label made only of whitespace normalizes to `""`; ingestion drops such rows.
///
/// # Examples
///
/// ```
/// use fisio_common::normalize::normalize_neighborhood;
///
/// assert_eq!(normalize_neighborhood(Some("Vl. São Paulo")), "VILA SAO PAULO");
/// assert_eq!(normalize_neighborhood(None), "UNINFORMED");
/// ```
pub fn normalize_neighborhood(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(s) if !s.is_empty() => s,
        _ => return UNINFORMED.to_string(),
    };

    let mut value = strip_marks(raw).to_uppercase().to_lowercase().trim().to_string();
    for (re, expansion) in RULES.iter() {
        value = re.replace_all(&value, NoExpand(expansion)).into_owned();
    }

    strip_marks(&value).to_uppercase()
}

fn strip_marks(value: &str) -> String {
    value.nfd().filter(|c| !is_combining_mark(*c)).collect()
}
