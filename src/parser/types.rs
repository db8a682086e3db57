//! Types for the question parsing system.

use serde::{Deserialize, Serialize};

/// The analytical question category, with the slots extracted for it.
///
/// Slots that could not be resolved from the text are `None`; presence is
/// validated at the request boundary, never here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum QuestionIntent {
    /// Compare rainfall and top crops between two states.
    CompareRainfallAndCrops {
        state_a: Option<String>,
        state_b: Option<String>,
        crop_filter: Option<String>,
        span: Option<YearSelector>,
        top_m: usize,
    },
    /// Highest/lowest producing district per state for one crop.
    DistrictExtremes {
        state_a: Option<String>,
        state_b: Option<String>,
        crop: Option<String>,
        year: Option<i32>,
    },
    /// Production trend for a crop in a region, against rainfall.
    ProductionTrendWithClimate {
        region: Option<String>,
        crop: Option<String>,
        span: Option<YearSelector>,
    },
    /// Policy comparison of two crops within a region.
    PolicyArguments {
        region: Option<String>,
        crop_a: Option<String>,
        crop_b: Option<String>,
        span: Option<YearSelector>,
    },
    /// No template matched.
    Unknown { raw: String },
}

impl QuestionIntent {
    /// The intent tag as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CompareRainfallAndCrops { .. } => "compare_rainfall_and_crops",
            Self::DistrictExtremes { .. } => "district_extremes",
            Self::ProductionTrendWithClimate { .. } => "production_trend_with_climate",
            Self::PolicyArguments { .. } => "policy_arguments",
            Self::Unknown { .. } => "unknown",
        }
    }
}

/// A parsed question: the classified intent plus its slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuestion {
    #[serde(flatten)]
    pub intent: QuestionIntent,
}

impl ParsedQuestion {
    pub fn new(intent: QuestionIntent) -> Self {
        Self { intent }
    }
}

/// A year window extracted from the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearSelector {
    /// "last 5 years" — the N most recent years with data.
    LastN { n: usize },
    /// "2015–2020" — an explicit inclusive range.
    Range { start: i32, end: i32 },
}
