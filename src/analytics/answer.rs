//! Answer payload types: prose, tables, and provenance citations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::DatasetMeta;

/// A named table with a fixed, ordered column set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }
}

/// Provenance of a data point used in an answer: the dataset identity
/// plus the natural key of the record(s) behind the claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub dataset: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl Citation {
    pub fn new(meta: &DatasetMeta) -> Self {
        Self {
            dataset: meta.name.clone(),
            source: meta.source_url.clone(),
            resource_id: meta.resource_id.clone(),
            state: None,
            district: None,
            crop: None,
            year: None,
        }
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self
    }

    pub fn crop(mut self, crop: impl Into<String>) -> Self {
        self.crop = Some(crop.into());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
}

/// A computed answer: prose plus supporting tables and citations.
///
/// Request-scoped — produced fresh per question and never cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub tables: Vec<Table>,
    pub citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<serde_json::Map<String, Value>>,
}

impl Answer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..Default::default()
        }
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Append a citation, skipping exact duplicates.
    pub fn cite(&mut self, citation: Citation) {
        if !self.citations.contains(&citation) {
            self.citations.push(citation);
        }
    }
}

/// Round a value to two decimals for table cells.
pub fn cell(value: f64) -> Value {
    Value::from((value * 100.0).round() / 100.0)
}

/// Round a value to one decimal for table cells.
pub fn cell1(value: f64) -> Value {
    Value::from((value * 10.0).round() / 10.0)
}
