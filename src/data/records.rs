//! Dataset records and the immutable snapshot they live in.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A district-level crop production record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub state: String,
    pub district: String,
    pub crop: String,
    #[serde(deserialize_with = "de_i32")]
    pub year: i32,
    #[serde(deserialize_with = "de_f64")]
    pub production_tonnes: f64,
}

/// A state-level annual rainfall record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainfallRecord {
    pub state: String,
    #[serde(deserialize_with = "de_i32")]
    pub year: i32,
    #[serde(deserialize_with = "de_f64")]
    pub annual_rainfall_mm: f64,
}

/// Provenance metadata for a dataset, carried into citations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub name: String,
    pub source_url: String,
    pub resource_id: String,
}

impl DatasetMeta {
    pub fn new(
        name: impl Into<String>,
        source_url: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_url: source_url.into(),
            resource_id: resource_id.into(),
        }
    }
}

/// An immutable point-in-time view of both datasets.
///
/// Built once per load/refresh, then shared read-only behind an `Arc`.
/// Names are normalized to title case and records are deduplicated by
/// natural key before the snapshot is published, so every key appears at
/// most once.
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    production: Vec<ProductionRecord>,
    rainfall: Vec<RainfallRecord>,
    agriculture_meta: DatasetMeta,
    rainfall_meta: DatasetMeta,
    states: Vec<String>,
    crops: Vec<String>,
    loaded_at: DateTime<Utc>,
}

impl DatasetSnapshot {
    /// Build a snapshot from raw records: normalize names, deduplicate by
    /// natural key (last occurrence wins), and precompute entity lists.
    pub fn build(
        production: Vec<ProductionRecord>,
        rainfall: Vec<RainfallRecord>,
        agriculture_meta: DatasetMeta,
        rainfall_meta: DatasetMeta,
    ) -> Self {
        let raw_production = production.len();
        let raw_rainfall = rainfall.len();

        let mut by_key: BTreeMap<(String, String, String, i32), ProductionRecord> =
            BTreeMap::new();
        for mut record in production {
            record.state = title_case(&record.state);
            record.district = title_case(&record.district);
            record.crop = title_case(&record.crop);
            let key = (
                record.state.clone(),
                record.district.clone(),
                record.crop.clone(),
                record.year,
            );
            by_key.insert(key, record);
        }
        let production: Vec<ProductionRecord> = by_key.into_values().collect();

        let mut by_key: BTreeMap<(String, i32), RainfallRecord> = BTreeMap::new();
        for mut record in rainfall {
            record.state = title_case(&record.state);
            by_key.insert((record.state.clone(), record.year), record);
        }
        let rainfall: Vec<RainfallRecord> = by_key.into_values().collect();

        let dropped = (raw_production - production.len()) + (raw_rainfall - rainfall.len());
        if dropped > 0 {
            tracing::warn!("Dropped {dropped} duplicate-key records during snapshot build");
        }

        let mut states: BTreeSet<String> = BTreeSet::new();
        let mut crops: BTreeSet<String> = BTreeSet::new();
        for record in &production {
            states.insert(record.state.clone());
            crops.insert(record.crop.clone());
        }
        for record in &rainfall {
            states.insert(record.state.clone());
        }

        Self {
            production,
            rainfall,
            agriculture_meta,
            rainfall_meta,
            states: states.into_iter().collect(),
            crops: crops.into_iter().collect(),
            loaded_at: Utc::now(),
        }
    }

    /// An empty snapshot, used before the first load completes.
    pub fn empty() -> Self {
        Self::build(
            Vec::new(),
            Vec::new(),
            DatasetMeta::new("agriculture", "", ""),
            DatasetMeta::new("rainfall", "", ""),
        )
    }

    /// Unique states across both datasets, sorted.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Unique crops in the production dataset, sorted.
    pub fn crops(&self) -> &[String] {
        &self.crops
    }

    pub fn agriculture_meta(&self) -> &DatasetMeta {
        &self.agriculture_meta
    }

    pub fn rainfall_meta(&self) -> &DatasetMeta {
        &self.rainfall_meta
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn production_len(&self) -> usize {
        self.production.len()
    }

    pub fn rainfall_len(&self) -> usize {
        self.rainfall.len()
    }

    /// Case-insensitive exact lookup of a state name.
    pub fn resolve_state(&self, name: &str) -> Option<&str> {
        self.states
            .iter()
            .find(|s| s.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Case-insensitive exact lookup of a crop name.
    pub fn resolve_crop(&self, name: &str) -> Option<&str> {
        self.crops
            .iter()
            .find(|c| c.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Production records matching the given filters, in key order.
    pub fn production_for(
        &self,
        state: Option<&str>,
        crop: Option<&str>,
        year: Option<i32>,
    ) -> Vec<&ProductionRecord> {
        self.production
            .iter()
            .filter(|r| state.map_or(true, |s| r.state == s))
            .filter(|r| crop.map_or(true, |c| r.crop == c))
            .filter(|r| year.map_or(true, |y| r.year == y))
            .collect()
    }

    /// Rainfall records matching the given filters, in key order.
    pub fn rainfall_for(&self, state: Option<&str>, years: Option<&[i32]>) -> Vec<&RainfallRecord> {
        self.rainfall
            .iter()
            .filter(|r| state.map_or(true, |s| r.state == s))
            .filter(|r| years.map_or(true, |ys| ys.contains(&r.year)))
            .collect()
    }

    /// All production records, in key order.
    pub fn production(&self) -> &[ProductionRecord] {
        &self.production
    }

    /// All rainfall records, in key order.
    pub fn rainfall(&self) -> &[RainfallRecord] {
        &self.rainfall
    }
}

/// Title-case a name: each whitespace-separated word capitalized.
pub fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// CSV samples and the datastore API both deliver numbers either as
// numbers or as quoted strings.
fn de_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(f64),
        Str(String),
    }
    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn de_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(i64),
        Str(String),
    }
    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n as i32),
        NumOrStr::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
