//! Question intent classification.
//!
//! Classifies free-text questions about agricultural and climate
//! statistics into structured intents with extracted slots.
//!
//! Templates are evaluated in a fixed priority order, most specific
//! first; the first template whose required signals are all present
//! wins. Overlapping vocabulary ("compare" appears in comparison and
//! policy phrasings alike) is disambiguated by that ordering, not by
//! scoring.

use std::sync::LazyLock;

use regex::Regex;

use super::gazetteer;
use super::types::*;

/// Parse a question into an intent and its slots.
///
/// Deterministic and side-effect-free; never fails. Unmatched input
/// yields `Unknown` carrying the raw question.
pub fn parse_question(question: &str) -> ParsedQuestion {
    let text = question.trim();
    let lowered = text.to_lowercase();

    let states = gazetteer::find_states(text);
    let crops = gazetteer::find_crops(text);
    let span = extract_span(&lowered);
    let state = |i: usize| states.get(i).map(|m| m.canonical.to_string());
    let crop = |i: usize| crops.get(i).map(|m| m.canonical.to_string());

    // 1. District extremes: "district" plus both a max and a min word.
    if lowered.contains("district")
        && HIGH_WORD_PATTERN.is_match(&lowered)
        && LOW_WORD_PATTERN.is_match(&lowered)
    {
        return ParsedQuestion::new(QuestionIntent::DistrictExtremes {
            state_a: state(0),
            state_b: state(1),
            crop: crop(0),
            year: extract_single_year(&lowered, span.as_ref()),
        });
    }

    // 2. Rainfall/crop comparison: two states plus a comparison signal.
    if states.len() >= 2 && COMPARE_SIGNAL_PATTERN.is_match(&lowered) {
        return ParsedQuestion::new(QuestionIntent::CompareRainfallAndCrops {
            state_a: state(0),
            state_b: state(1),
            crop_filter: crop(0),
            span,
            top_m: extract_top_m(&lowered),
        });
    }

    // 3. Production trend: a trend signal plus region and crop.
    if TREND_SIGNAL_PATTERN.is_match(&lowered) && !states.is_empty() && !crops.is_empty() {
        return ParsedQuestion::new(QuestionIntent::ProductionTrendWithClimate {
            region: state(0),
            crop: crop(0),
            span,
        });
    }

    // 4. Policy arguments: a policy signal; crops assigned left to right.
    if POLICY_SIGNAL_PATTERN.is_match(&lowered) {
        return ParsedQuestion::new(QuestionIntent::PolicyArguments {
            region: state(0),
            crop_a: crop(0),
            crop_b: crop(1),
            span,
        });
    }

    ParsedQuestion::new(QuestionIntent::Unknown {
        raw: question.to_string(),
    })
}

// ============================================================================
// Slot Extraction
// ============================================================================

/// Extract a year window: an explicit range beats a lookback phrase.
fn extract_span(lowered: &str) -> Option<YearSelector> {
    if let Some(caps) = YEAR_RANGE_PATTERN.captures(lowered) {
        let start: i32 = caps[1].parse().ok()?;
        let end: i32 = caps[2].parse().ok()?;
        if start <= end {
            return Some(YearSelector::Range { start, end });
        }
    }

    for pattern in [&*LOOKBACK_PATTERN, &*LOOKBACK_LOOSE_PATTERN] {
        if let Some(caps) = pattern.captures(lowered) {
            if let Some(n) = parse_count(&caps[1]) {
                if n > 0 {
                    return Some(YearSelector::LastN { n });
                }
            }
        }
    }
    None
}

/// A bare four-digit year, ignored when a range already matched.
fn extract_single_year(lowered: &str, span: Option<&YearSelector>) -> Option<i32> {
    if matches!(span, Some(YearSelector::Range { .. })) {
        return None;
    }
    SINGLE_YEAR_PATTERN
        .captures(lowered)
        .and_then(|caps| caps[1].parse().ok())
}

/// "top 3" / "top five" / "5 best"; defaults to 3 when absent.
fn extract_top_m(lowered: &str) -> usize {
    for pattern in [&*TOP_M_PATTERN, &*TOP_M_TRAILING_PATTERN] {
        if let Some(caps) = pattern.captures(lowered) {
            if let Some(n) = parse_count(&caps[1]) {
                if n > 0 {
                    return n;
                }
            }
        }
    }
    3
}

/// Parse a digit string or a number word (one..ten).
fn parse_count(token: &str) -> Option<usize> {
    if let Ok(n) = token.parse() {
        return Some(n);
    }
    match token {
        "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        "eight" => Some(8),
        "nine" => Some(9),
        "ten" => Some(10),
        _ => None,
    }
}

// ============================================================================
// Patterns (using LazyLock for static initialization)
// ============================================================================

const COUNT: &str = r"(\d+|one|two|three|four|five|six|seven|eight|nine|ten)";

static HIGH_WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(highest|max|maximum|peak|best|top)\b").expect("Invalid regex")
});
static LOW_WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(lowest|min|minimum|worst|bottom)\b").expect("Invalid regex")
});
static COMPARE_SIGNAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(rainfall|compare[ds]?|comparison|better|versus|vs\.?|crops?)\b")
        .expect("Invalid regex")
});
static TREND_SIGNAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(trend|show|history|evolv\w*|over\s+the\s+years)\b").expect("Invalid regex")
});
static POLICY_SIGNAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(policy|policies|scheme|promote)\b").expect("Invalid regex"));

static YEAR_RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b((?:19|20)\d{2})\s*(?:[-\u{2013}\u{2014}]|to|through)\s*((?:19|20)\d{2})\b")
        .expect("Invalid regex")
});
static LOOKBACK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:last|past|previous|recent)\s+{COUNT}\s+years?"
    ))
    .expect("Invalid regex")
});
static LOOKBACK_LOOSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:over|during|for|in)\s+(?:the\s+)?(?:last|past|previous)?\s*{COUNT}\s+years?"
    ))
    .expect("Invalid regex")
});
static SINGLE_YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").expect("Invalid regex"));
static TOP_M_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:top|first|best|leading|main)\s+{COUNT}\b")).expect("Invalid regex")
});
static TOP_M_TRAILING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b{COUNT}\s+(?:most|top|best|leading|main)\b")).expect("Invalid regex")
});

// ============================================================================
// Tests
// ============================================================================
