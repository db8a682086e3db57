//! The Analytics Engine.
//!
//! One method per supported intent, each turning validated parameters
//! into an `Answer` computed against the current dataset snapshot. Every
//! method takes the snapshot `Arc` once at entry, so a concurrent
//! `refresh()` can never mix two dataset generations inside one answer.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::Value;

use crate::config::AnalyticsConfig;
use crate::data::{DataManager, DatasetSnapshot, ProductionRecord};
use crate::error::{AnalyticsError, Result};
use crate::metrics::get_metrics;
use crate::parser::{gazetteer, YearSelector};

use super::answer::{cell, cell1, Answer, Citation, Table};
use super::stats;

pub struct AnalyticsEngine {
    data: Arc<DataManager>,
    cfg: AnalyticsConfig,
}

impl AnalyticsEngine {
    pub fn new(data: Arc<DataManager>, cfg: AnalyticsConfig) -> Self {
        Self { data, cfg }
    }

    /// Reload the dataset. Safe to call while reads are in flight; the
    /// new snapshot is published atomically by the Data Manager.
    pub async fn refresh(&self) -> Result<()> {
        self.data.reload().await?;
        get_metrics().refresh_total.inc();
        Ok(())
    }

    /// Rainfall and top-crop comparison between two states.
    pub fn compare_rainfall_and_crops(
        &self,
        state_a: &str,
        state_b: &str,
        crop_filter: Option<&str>,
        span: Option<&YearSelector>,
        top_m: usize,
    ) -> Result<Answer> {
        let snapshot = self.data.snapshot();
        let state_a = resolve_state(&snapshot, state_a)?;
        let state_b = resolve_state(&snapshot, state_b)?;
        let crop_filter = crop_filter
            .map(|c| resolve_crop(&snapshot, c))
            .transpose()?;

        let rainfall: Vec<_> = snapshot
            .rainfall()
            .iter()
            .filter(|r| r.state == state_a || r.state == state_b)
            .collect();
        let available = years_descending(rainfall.iter().map(|r| r.year));
        if available.is_empty() {
            return Err(AnalyticsError::NoRainfallData.into());
        }
        let years = select_years(available, span, self.cfg.compare_lookback_years);
        if years.is_empty() {
            return Err(AnalyticsError::NoRainfallData.into());
        }

        let rainfall_window: Vec<_> = rainfall
            .iter()
            .filter(|r| years.contains(&r.year))
            .collect();
        let production: Vec<_> = snapshot
            .production()
            .iter()
            .filter(|r| (r.state == state_a || r.state == state_b) && years.contains(&r.year))
            .filter(|r| crop_filter.as_deref().map_or(true, |c| r.crop == c))
            .collect();

        let mut answer_text = format!(
            "Compared rainfall for {state_a} and {state_b} over {} year(s).",
            years.len()
        );
        let mut result = Answer::default();

        for state in [&state_a, &state_b] {
            let avg_rain = mean(
                rainfall_window
                    .iter()
                    .filter(|r| &r.state == state)
                    .map(|r| r.annual_rainfall_mm),
            );
            match avg_rain {
                Some(avg) => {
                    answer_text.push_str(&format!(" {state} averaged {avg:.1} mm of rainfall."))
                }
                None => answer_text
                    .push_str(&format!(" {state} has no rainfall records in the window.")),
            }

            let mut totals: BTreeMap<String, f64> = BTreeMap::new();
            for record in production.iter().filter(|r| &r.state == state) {
                *totals.entry(record.crop.clone()).or_default() += record.production_tonnes;
            }
            let ranked = stats::rank_top(totals.into_iter().collect(), top_m);

            let mut table = Table::new(
                state.clone(),
                &["Crop", "Production (tonnes)", "Avg rainfall (mm)"],
            );
            let avg_cell = avg_rain.map(cell1).unwrap_or(Value::Null);
            if ranked.is_empty() {
                table.push_row(vec![Value::from("No data"), Value::Null, avg_cell.clone()]);
            }
            for (crop, total) in &ranked {
                table.push_row(vec![
                    Value::from(crop.as_str()),
                    cell(*total),
                    avg_cell.clone(),
                ]);
                for record in production
                    .iter()
                    .filter(|r| &r.state == state && &r.crop == crop)
                {
                    result.cite(
                        Citation::new(snapshot.agriculture_meta())
                            .state(state.clone())
                            .crop(crop.clone())
                            .year(record.year),
                    );
                }
            }
            result.tables.push(table);
        }

        for record in &rainfall_window {
            result.cite(
                Citation::new(snapshot.rainfall_meta())
                    .state(record.state.clone())
                    .year(record.year),
            );
        }

        if let Some(crop) = &crop_filter {
            answer_text.push_str(&format!(" Filtered crop category: {crop}."));
        }
        result.answer = answer_text;
        Ok(result)
    }

    /// Highest and lowest producing district per state for one crop.
    pub fn district_extremes(
        &self,
        state_a: &str,
        state_b: &str,
        crop: &str,
        year: Option<i32>,
    ) -> Result<Answer> {
        let snapshot = self.data.snapshot();
        let state_a = resolve_state(&snapshot, state_a)?;
        let state_b = resolve_state(&snapshot, state_b)?;
        let crop = resolve_crop(&snapshot, crop)?;

        let crop_records = snapshot.production_for(None, Some(&crop), None);
        if crop_records.is_empty() {
            return Err(AnalyticsError::NoProductionData.into());
        }
        let year = match year {
            Some(y) => {
                if !crop_records.iter().any(|r| r.year == y) {
                    return Err(AnalyticsError::NoProductionData.into());
                }
                y
            }
            // Default: the most recent year with any record for the crop.
            None => crop_records.iter().map(|r| r.year).max().unwrap_or_default(),
        };

        let mut table = Table::new(
            format!("District extremes for {crop} in {year}"),
            &["State", "District", "Production (tonnes)", "Rank"],
        );
        let mut parts = Vec::new();
        let mut result = Answer::default();

        for state in [&state_a, &state_b] {
            let records = snapshot.production_for(Some(state), Some(&crop), Some(year));
            if records.is_empty() {
                return Err(AnalyticsError::NoRecordsForState {
                    state: state.clone(),
                    crop: crop.clone(),
                    year,
                }
                .into());
            }
            let max = extreme(&records, true);
            let min = extreme(&records, false);

            table.push_row(vec![
                Value::from(state.as_str()),
                Value::from(max.district.as_str()),
                cell(max.production_tonnes),
                Value::from("max"),
            ]);
            table.push_row(vec![
                Value::from(state.as_str()),
                Value::from(min.district.as_str()),
                cell(min.production_tonnes),
                Value::from("min"),
            ]);
            parts.push(format!(
                "{state}'s peak {crop} output came from {} with {:.1} tonnes, while {} recorded \
                 the lowest at {:.1} tonnes.",
                max.district, max.production_tonnes, min.district, min.production_tonnes
            ));

            for record in [max, min] {
                result.cite(
                    Citation::new(snapshot.agriculture_meta())
                        .state(state.clone())
                        .district(record.district.clone())
                        .crop(crop.clone())
                        .year(year),
                );
            }
        }

        result.answer = parts.join(" ");
        result.tables.push(table);
        Ok(result)
    }

    /// Production trend for a crop in a region, against rainfall.
    pub fn production_trend_with_climate(
        &self,
        region: &str,
        crop: &str,
        span: Option<&YearSelector>,
    ) -> Result<Answer> {
        let snapshot = self.data.snapshot();
        let region = resolve_region(&snapshot, region)?;
        let crop = resolve_crop(&snapshot, crop)?;

        let production = snapshot.production_for(Some(&region), Some(&crop), None);
        if production.is_empty() {
            return Err(AnalyticsError::EmptySeries.into());
        }
        let rainfall = snapshot.rainfall_for(Some(&region), None);
        if rainfall.is_empty() {
            return Err(AnalyticsError::NoRegionRainfall.into());
        }

        let available = years_descending(production.iter().map(|r| r.year));
        let years = select_years(available, span, self.cfg.trend_lookback_years);
        if years.is_empty() {
            return Err(AnalyticsError::EmptySeries.into());
        }

        let mut production_by_year: BTreeMap<i32, f64> = BTreeMap::new();
        for record in production.iter().filter(|r| years.contains(&r.year)) {
            *production_by_year.entry(record.year).or_default() += record.production_tonnes;
        }
        let rainfall_by_year: BTreeMap<i32, f64> = rainfall
            .iter()
            .filter(|r| years.contains(&r.year))
            .map(|r| (r.year, r.annual_rainfall_mm))
            .collect();

        // Inner join: only years carried by both series are reported.
        let merged: Vec<(i32, f64, f64)> = production_by_year
            .iter()
            .filter_map(|(year, production)| {
                rainfall_by_year
                    .get(year)
                    .map(|rain| (*year, *production, *rain))
            })
            .collect();
        if merged.is_empty() {
            return Err(AnalyticsError::NoRegionRainfall.into());
        }

        let mut table = Table::new(
            format!("{region} {crop} vs rainfall"),
            &["Year", "Production (tonnes)", "Rainfall (mm)"],
        );
        let mut result = Answer::default();
        for (year, production, rain) in &merged {
            table.push_row(vec![Value::from(*year), cell(*production), cell1(*rain)]);
            result.cite(
                Citation::new(snapshot.agriculture_meta())
                    .state(region.clone())
                    .crop(crop.clone())
                    .year(*year),
            );
            result.cite(
                Citation::new(snapshot.rainfall_meta())
                    .state(region.clone())
                    .year(*year),
            );
        }

        let production_series: Vec<f64> = merged.iter().map(|(_, p, _)| *p).collect();
        let rainfall_series: Vec<f64> = merged.iter().map(|(_, _, r)| *r).collect();
        let direction = stats::trend_direction(&production_series, self.cfg.trend_flat_epsilon);
        let growth = stats::growth_pct(&production_series);
        let correlation = stats::pearson(&production_series, &rainfall_series);

        let mut answer_text = format!(
            "{region} {crop} production is {} over {} year(s) ({growth:+.1}% total change). \
             Rainfall correlation indicates {}",
            direction.as_str(),
            merged.len(),
            stats::interpret_correlation(correlation),
        );
        match correlation {
            Some(r) => answer_text.push_str(&format!(" (r={r:.2}).")),
            None => answer_text.push('.'),
        }

        result.answer = answer_text;
        result.tables.push(table);
        Ok(result)
    }

    /// Policy comparison of two crops within a region.
    pub fn policy_arguments(
        &self,
        region: &str,
        crop_a: &str,
        crop_b: &str,
        span: Option<&YearSelector>,
    ) -> Result<Answer> {
        let snapshot = self.data.snapshot();
        let region = resolve_region(&snapshot, region)?;
        let crop_a = resolve_crop(&snapshot, crop_a)?;
        let crop_b = resolve_crop(&snapshot, crop_b)?;

        let region_records = snapshot.production_for(Some(&region), None, None);
        let available = years_descending(region_records.iter().map(|r| r.year));
        if available.is_empty() {
            return Err(AnalyticsError::EmptySeries.into());
        }
        let years = select_years(available, span, self.cfg.policy_lookback_years);
        if years.is_empty() {
            return Err(AnalyticsError::EmptySeries.into());
        }

        let rainfall_by_year: BTreeMap<i32, f64> = snapshot
            .rainfall_for(Some(&region), Some(&years))
            .iter()
            .map(|r| (r.year, r.annual_rainfall_mm))
            .collect();
        let avg_rain = mean(rainfall_by_year.values().copied());

        let mut result = Answer::default();
        let mut metrics = Vec::new();
        for crop in [&crop_a, &crop_b] {
            let mut series: BTreeMap<i32, f64> = BTreeMap::new();
            for record in region_records
                .iter()
                .filter(|r| &r.crop == crop && years.contains(&r.year))
            {
                *series.entry(record.year).or_default() += record.production_tonnes;
            }
            for year in series.keys() {
                result.cite(
                    Citation::new(snapshot.agriculture_meta())
                        .state(region.clone())
                        .crop(crop.clone())
                        .year(*year),
                );
            }
            metrics.push(CropMetrics::from_series(&series, avg_rain));
        }
        if metrics.iter().all(|m| m.is_none()) {
            return Err(AnalyticsError::EmptySeries.into());
        }

        let mut table = Table::new(
            format!("Policy comparison: {crop_a} vs {crop_b} in {region}"),
            &["Metric", &crop_a, &crop_b],
        );
        table.push_row(metric_row("Average production (tonnes)", &metrics, |m| {
            cell(m.avg_production)
        }));
        table.push_row(metric_row("Total change (%)", &metrics, |m| cell(m.growth)));
        table.push_row(metric_row(
            "Production per mm rainfall (tonnes)",
            &metrics,
            |m| m.rain_efficiency.map(cell).unwrap_or(Value::Null),
        ));

        let mut rain_table = Table::new("Rainfall context", &["Year", "Rainfall (mm)"]);
        for (year, rain) in &rainfall_by_year {
            rain_table.push_row(vec![Value::from(*year), cell1(*rain)]);
            result.cite(
                Citation::new(snapshot.rainfall_meta())
                    .state(region.clone())
                    .year(*year),
            );
        }

        let mut parts = vec![format!(
            "Policy comparison for {region} over {} year(s).",
            years.len()
        )];
        for (crop, other_crop, index) in [(&crop_a, &crop_b, 0usize), (&crop_b, &crop_a, 1usize)] {
            match &metrics[index] {
                Some(m) => {
                    let other = metrics[1 - index].as_ref();
                    let (for_points, against_points) = argue(m, other, other_crop);
                    parts.push(format!("For {crop}: {}.", for_points.join("; ")));
                    parts.push(format!("Against {crop}: {}.", against_points.join("; ")));
                }
                None => parts.push(format!("No production records for {crop} in {region}.")),
            }
        }
        if let Some(avg) = avg_rain {
            let rain_values: Vec<f64> = rainfall_by_year.values().copied().collect();
            parts.push(format!(
                "Rainfall averaged {avg:.1} mm with {:+.1}% change over the span.",
                stats::growth_pct(&rain_values)
            ));
        }

        result.answer = parts.join(" ");
        result.tables.push(table);
        result.tables.push(rain_table);
        Ok(result)
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Per-crop metrics over the selected span.
#[derive(Debug, Clone)]
struct CropMetrics {
    avg_production: f64,
    growth: f64,
    rain_efficiency: Option<f64>,
}

impl CropMetrics {
    fn from_series(series: &BTreeMap<i32, f64>, avg_rain: Option<f64>) -> Option<Self> {
        if series.is_empty() {
            return None;
        }
        let values: Vec<f64> = series.values().copied().collect();
        let avg_production = values.iter().sum::<f64>() / values.len() as f64;
        Some(Self {
            avg_production,
            growth: stats::growth_pct(&values),
            rain_efficiency: avg_rain
                .filter(|r| *r > 0.0)
                .map(|r| avg_production / r),
        })
    }
}

fn metric_row(
    name: &str,
    metrics: &[Option<CropMetrics>],
    extract: impl Fn(&CropMetrics) -> Value,
) -> Vec<Value> {
    let mut row = vec![Value::from(name)];
    for m in metrics {
        row.push(m.as_ref().map(&extract).unwrap_or(Value::Null));
    }
    row
}

/// Balanced argument bullets for one crop against the other.
fn argue(
    m: &CropMetrics,
    other: Option<&CropMetrics>,
    other_name: &str,
) -> (Vec<String>, Vec<String>) {
    let mut for_points = Vec::new();
    let mut against_points = Vec::new();

    match other {
        Some(o) => {
            if m.avg_production >= o.avg_production {
                for_points.push(format!(
                    "leads on average production ({:.1} vs {:.1} tonnes)",
                    m.avg_production, o.avg_production
                ));
            } else {
                against_points.push(format!(
                    "trails {other_name} on average production ({:.1} vs {:.1} tonnes)",
                    m.avg_production, o.avg_production
                ));
            }
            if let (Some(eff), Some(other_eff)) = (m.rain_efficiency, o.rain_efficiency) {
                if eff >= other_eff {
                    for_points.push(format!(
                        "yields more per mm of rainfall ({eff:.2} vs {other_eff:.2} tonnes)"
                    ));
                } else {
                    against_points.push(format!(
                        "needs more rainfall per tonne ({eff:.2} vs {other_eff:.2} tonnes per mm)"
                    ));
                }
            }
        }
        None => for_points.push(format!(
            "averages {:.1} tonnes with no competing records from {other_name}",
            m.avg_production
        )),
    }

    if m.growth > 0.0 {
        for_points.push(format!("production grew {:+.1}% across the span", m.growth));
    } else if m.growth < 0.0 {
        against_points.push(format!("production fell {:.1}% across the span", m.growth.abs()));
    }

    if for_points.is_empty() {
        for_points.push(format!("holds steady at {:.1} tonnes on average", m.avg_production));
    }
    if against_points.is_empty() {
        against_points.push("no clear weakness in the selected span".to_string());
    }
    (for_points, against_points)
}

fn resolve_state(snapshot: &DatasetSnapshot, query: &str) -> Result<String> {
    match lookup_state(snapshot, query) {
        Some(state) => Ok(state),
        None => Err(AnalyticsError::UnknownState {
            query: query.to_string(),
            available: snapshot.states().join(", "),
        }
        .into()),
    }
}

fn resolve_region(snapshot: &DatasetSnapshot, query: &str) -> Result<String> {
    match lookup_state(snapshot, query) {
        Some(state) => Ok(state),
        None => Err(AnalyticsError::UnknownRegion {
            query: query.to_string(),
            available: snapshot.states().join(", "),
        }
        .into()),
    }
}

fn lookup_state(snapshot: &DatasetSnapshot, query: &str) -> Option<String> {
    // Gazetteer canonicalization first (aliases, underscores), then an
    // exact case-insensitive match against the loaded data.
    let candidate = gazetteer::canonical_state(query)
        .map(str::to_string)
        .unwrap_or_else(|| crate::data::title_case(&query.replace('_', " ")));
    snapshot.resolve_state(&candidate).map(str::to_string)
}

fn resolve_crop(snapshot: &DatasetSnapshot, query: &str) -> Result<String> {
    let candidate = gazetteer::canonical_crop(query)
        .map(str::to_string)
        .unwrap_or_else(|| crate::data::title_case(&query.replace('_', " ")));
    match snapshot.resolve_crop(&candidate) {
        Some(crop) => Ok(crop.to_string()),
        None => Err(AnalyticsError::UnknownCrop {
            query: query.to_string(),
            available: snapshot.crops().join(", "),
        }
        .into()),
    }
}

/// Unique years, newest first.
fn years_descending(years: impl Iterator<Item = i32>) -> Vec<i32> {
    let set: BTreeSet<i32> = years.collect();
    set.into_iter().rev().collect()
}

/// Apply a year selector to the available years (newest first),
/// returning the chosen window oldest first.
fn select_years(available_desc: Vec<i32>, span: Option<&YearSelector>, default_n: usize) -> Vec<i32> {
    let mut years: Vec<i32> = match span {
        Some(YearSelector::LastN { n }) => available_desc.into_iter().take(*n).collect(),
        Some(YearSelector::Range { start, end }) => available_desc
            .into_iter()
            .filter(|y| *start <= *y && *y <= *end)
            .collect(),
        None => available_desc.into_iter().take(default_n).collect(),
    };
    years.sort_unstable();
    years
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}

/// The extreme record by production; equal values resolved by district
/// name ascending so results are stable across runs.
fn extreme<'a>(records: &[&'a ProductionRecord], want_max: bool) -> &'a ProductionRecord {
    let mut best = records[0];
    for record in &records[1..] {
        let better = if want_max {
            record.production_tonnes > best.production_tonnes
        } else {
            record.production_tonnes < best.production_tonnes
        };
        let tie = record.production_tonnes == best.production_tonnes
            && record.district < best.district;
        if better || tie {
            best = record;
        }
    }
    best
}
