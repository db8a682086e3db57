//! Static gazetteer of state and crop names.
//!
//! Recognition is an exact, case-insensitive alias lookup at word
//! boundaries — no fuzzy scoring. Short abbreviations (three letters or
//! fewer, e.g. `UP`, `TN`) only match as uppercase tokens so that
//! ordinary words never trigger them.

/// Canonical state names with accepted surface forms.
const STATES: &[(&str, &[&str])] = &[
    ("Andhra Pradesh", &["AP"]),
    ("Assam", &[]),
    ("Bihar", &[]),
    ("Chhattisgarh", &[]),
    ("Gujarat", &[]),
    ("Haryana", &[]),
    ("Himachal Pradesh", &["HP"]),
    ("Jharkhand", &[]),
    ("Karnataka", &[]),
    ("Kerala", &[]),
    ("Madhya Pradesh", &["MP"]),
    ("Maharashtra", &[]),
    ("Odisha", &["Orissa"]),
    ("Punjab", &[]),
    ("Rajasthan", &[]),
    ("Tamil Nadu", &["TN"]),
    ("Telangana", &[]),
    ("Uttar Pradesh", &["UP"]),
    ("Uttarakhand", &[]),
    ("West Bengal", &["WB", "Bengal"]),
];

/// Canonical crop names with common synonyms and local-language names.
const CROPS: &[(&str, &[&str])] = &[
    ("Barley", &["jau"]),
    ("Cotton", &["kapas"]),
    ("Groundnut", &["peanut"]),
    ("Maize", &["corn", "makka"]),
    ("Millet", &["pearl millet", "bajra", "bajri"]),
    ("Mustard", &["sarson"]),
    ("Pulses", &["dal"]),
    ("Rice", &["paddy", "dhan"]),
    ("Sorghum", &["jowar"]),
    ("Soybean", &[]),
    ("Sugarcane", &["sugar cane", "ganna"]),
    ("Wheat", &["gehun", "gehu"]),
];

/// A recognized entity mention: canonical name plus the byte offset of
/// its first appearance in the question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub canonical: &'static str,
    pub position: usize,
}

/// States mentioned in the text, ordered by first appearance.
pub fn find_states(text: &str) -> Vec<Mention> {
    find_mentions(text, STATES)
}

/// Crops mentioned in the text, ordered by first appearance.
pub fn find_crops(text: &str) -> Vec<Mention> {
    find_mentions(text, CROPS)
}

/// Canonicalize a state name given directly (not scanned from prose).
/// Accepts aliases and underscore/whitespace variations.
pub fn canonical_state(name: &str) -> Option<&'static str> {
    canonical_in(name, STATES)
}

/// Canonicalize a crop name given directly.
pub fn canonical_crop(name: &str) -> Option<&'static str> {
    canonical_in(name, CROPS)
}

fn canonical_in(name: &str, table: &[(&'static str, &[&str])]) -> Option<&'static str> {
    let normalized = name
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    for &(canonical, aliases) in table {
        if canonical.to_lowercase() == normalized {
            return Some(canonical);
        }
        if aliases.iter().any(|a| a.to_lowercase() == normalized) {
            return Some(canonical);
        }
    }
    None
}

fn find_mentions(text: &str, table: &[(&'static str, &[&str])]) -> Vec<Mention> {
    let lowered = text.to_lowercase();
    let mut mentions: Vec<Mention> = Vec::new();

    for &(canonical, aliases) in table {
        let mut earliest: Option<usize> = None;
        for surface in std::iter::once(canonical).chain(aliases.iter().copied()) {
            let found = if surface.len() <= 3 {
                // Abbreviations must appear uppercase in the original text.
                find_word(text, surface)
            } else {
                find_word(&lowered, &surface.to_lowercase())
            };
            if let Some(pos) = found {
                earliest = Some(earliest.map_or(pos, |e: usize| e.min(pos)));
            }
        }
        if let Some(position) = earliest {
            mentions.push(Mention {
                canonical,
                position,
            });
        }
    }

    mentions.sort_by_key(|m| m.position);
    mentions
}

/// First occurrence of `needle` in `haystack` bounded by non-alphabetic
/// characters on both sides.
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    let mut search_from = 0;
    while let Some(rel) = haystack[search_from..].find(needle) {
        let start = search_from + rel;
        let end = start + needle.len();
        let before_ok = start == 0
            || !haystack[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphabetic());
        let after_ok = end == haystack.len()
            || !haystack[end..].chars().next().is_some_and(|c| c.is_alphabetic());
        if before_ok && after_ok {
            return Some(start);
        }
        search_from = start + needle.len().max(1);
    }
    None
}
