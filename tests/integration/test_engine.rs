//! End-to-end Analytics Engine tests over a programmatic snapshot.

use std::sync::Arc;

use samarth::data::DatasetMeta;
use samarth::{
    AnalyticsEngine, Config, DataManager, DatasetSnapshot, ProductionRecord, RainfallRecord,
    SamarthError, YearSelector,
};

fn production(state: &str, district: &str, crop: &str, year: i32, t: f64) -> ProductionRecord {
    ProductionRecord {
        state: state.to_string(),
        district: district.to_string(),
        crop: crop.to_string(),
        year,
        production_tonnes: t,
    }
}

fn rainfall(state: &str, year: i32, mm: f64) -> RainfallRecord {
    RainfallRecord {
        state: state.to_string(),
        year,
        annual_rainfall_mm: mm,
    }
}

/// Five years (2019-2023) of data for Punjab, Haryana, and Kerala.
///
/// Shapes worth knowing: Punjab wheat grows 200 t/year; Haryana maize
/// and rice have identical five-year totals (tie-break coverage);
/// Kerala grows rice only.
fn sample_snapshot() -> DatasetSnapshot {
    let mut records = Vec::new();
    for (i, year) in (2019..=2023).enumerate() {
        let i = i as f64;
        // Punjab: wheat trending up, rice flat, a little maize
        records.push(production("Punjab", "Ludhiana", "Wheat", year, 1000.0 + 100.0 * i));
        records.push(production("Punjab", "Amritsar", "Wheat", year, 800.0 + 100.0 * i));
        records.push(production("Punjab", "Ludhiana", "Rice", year, 900.0));
        records.push(production("Punjab", "Amritsar", "Rice", year, 700.0));
        records.push(production("Punjab", "Ludhiana", "Maize", year, 50.0));
        // Haryana: wheat flat; rice and maize with equal totals
        records.push(production("Haryana", "Karnal", "Wheat", year, 600.0));
        records.push(production("Haryana", "Hisar", "Wheat", year, 400.0));
        records.push(production("Haryana", "Karnal", "Rice", year, 300.0));
        records.push(production("Haryana", "Hisar", "Rice", year, 200.0));
        records.push(production("Haryana", "Karnal", "Maize", year, 500.0));
        // Kerala: rice only
        records.push(production("Kerala", "Palakkad", "Rice", year, 100.0));
    }

    let mut rain = Vec::new();
    for (i, year) in (2019..=2023).enumerate() {
        let i = i as f64;
        rain.push(rainfall("Punjab", year, 600.0 + 10.0 * i));
        rain.push(rainfall("Haryana", year, 500.0 + 5.0 * i));
        rain.push(rainfall("Kerala", year, 2900.0 + 10.0 * i));
    }

    DatasetSnapshot::build(
        records,
        rain,
        DatasetMeta::new("agriculture", "https://data.gov.in", "agri-1"),
        DatasetMeta::new("rainfall", "https://data.gov.in", "rain-1"),
    )
}

fn engine() -> AnalyticsEngine {
    let config = Config::default();
    let data = Arc::new(DataManager::from_snapshot(&config, sample_snapshot()));
    AnalyticsEngine::new(data, config.analytics)
}

#[test]
fn test_compare_produces_one_table_per_state() {
    let answer = engine()
        .compare_rainfall_and_crops("Punjab", "Haryana", None, None, 3)
        .unwrap();

    assert_eq!(answer.tables.len(), 2);
    assert_eq!(answer.tables[0].title, "Punjab");
    assert_eq!(answer.tables[1].title, "Haryana");
    assert!(answer.tables.iter().all(|t| t.rows.len() <= 3));
    assert!(answer.answer.contains("Punjab averaged 620.0 mm"));
    assert!(answer.answer.contains("Haryana averaged 510.0 mm"));
}

#[test]
fn test_compare_equal_volumes_rank_alphabetically() {
    let answer = engine()
        .compare_rainfall_and_crops("Punjab", "Haryana", None, None, 3)
        .unwrap();

    // Haryana: Wheat 5000 first, then Maize and Rice tied at 2500 —
    // alphabetical order breaks the tie.
    let crops: Vec<String> = answer.tables[1]
        .rows
        .iter()
        .map(|row| row[0].as_str().unwrap().to_string())
        .collect();
    assert_eq!(crops, ["Wheat", "Maize", "Rice"]);
}

#[test]
fn test_compare_scenario_rice_last_five_years() {
    let answer = engine()
        .compare_rainfall_and_crops(
            "Punjab",
            "Haryana",
            Some("rice"),
            Some(&YearSelector::LastN { n: 5 }),
            3,
        )
        .unwrap();

    assert_eq!(answer.tables.len(), 2);
    assert_eq!(answer.tables[0].title, "Punjab");
    assert_eq!(answer.tables[1].title, "Haryana");
    for table in &answer.tables {
        assert!(table.rows.len() <= 3);
        for row in &table.rows {
            assert_eq!(row[0].as_str(), Some("Rice"));
        }
    }
    assert!(!answer.citations.is_empty());
    for citation in &answer.citations {
        let year = citation.year.unwrap();
        assert!((2019..=2023).contains(&year), "citation outside window: {year}");
    }
}

#[test]
fn test_compare_unknown_state_is_domain_error() {
    let err = engine()
        .compare_rainfall_and_crops("Atlantis", "Punjab", None, None, 3)
        .unwrap_err();
    match err {
        SamarthError::Analytics(domain) => {
            let message = domain.to_string();
            assert!(message.contains("Atlantis"));
            assert!(message.contains("Available states"));
        }
        other => panic!("expected domain error, got {other:?}"),
    }
}

#[test]
fn test_compare_crop_synonym_resolves() {
    // "paddy" is an alias of the canonical crop "Rice"
    let answer = engine()
        .compare_rainfall_and_crops("Punjab", "Haryana", Some("paddy"), None, 3)
        .unwrap();
    assert!(answer.answer.contains("Filtered crop category: Rice."));
}

#[test]
fn test_district_extremes_defaults_to_latest_year() {
    let answer = engine()
        .district_extremes("Punjab", "Haryana", "Wheat", None)
        .unwrap();

    let table = &answer.tables[0];
    assert_eq!(table.title, "District extremes for Wheat in 2023");
    assert_eq!(table.rows.len(), 4);
    // Punjab max/min then Haryana max/min
    assert_eq!(table.rows[0][1].as_str(), Some("Ludhiana"));
    assert_eq!(table.rows[0][3].as_str(), Some("max"));
    assert_eq!(table.rows[1][1].as_str(), Some("Amritsar"));
    assert_eq!(table.rows[1][3].as_str(), Some("min"));
    assert_eq!(table.rows[2][1].as_str(), Some("Karnal"));
    assert_eq!(table.rows[3][1].as_str(), Some("Hisar"));

    assert!(answer.answer.contains("Ludhiana"));
    assert_eq!(answer.citations.len(), 4);
    assert!(answer.citations.iter().all(|c| c.year == Some(2023)));
}

#[test]
fn test_district_extremes_missing_state_records_fails() {
    // Kerala reports no wheat at all
    let err = engine()
        .district_extremes("Kerala", "Punjab", "Wheat", None)
        .unwrap_err();
    match err {
        SamarthError::Analytics(domain) => {
            assert!(domain.to_string().contains("Kerala"));
        }
        other => panic!("expected domain error, got {other:?}"),
    }
}

#[test]
fn test_district_extremes_rejects_year_without_data() {
    let err = engine()
        .district_extremes("Punjab", "Haryana", "Wheat", Some(1998))
        .unwrap_err();
    assert!(matches!(err, SamarthError::Analytics(_)));
}

#[test]
fn test_trend_is_increasing_with_strong_correlation() {
    let answer = engine()
        .production_trend_with_climate("Punjab", "Wheat", None)
        .unwrap();

    assert!(answer.answer.contains("increasing"));
    assert!(answer.answer.contains("strong positive association"));

    let table = &answer.tables[0];
    assert_eq!(
        table.headers,
        ["Year", "Production (tonnes)", "Rainfall (mm)"]
    );
    assert_eq!(table.rows.len(), 5);
    assert_eq!(table.rows[0][0], serde_json::json!(2019));
    // Punjab wheat 2019: 1000 + 800
    assert_eq!(table.rows[0][1], serde_json::json!(1800.0));
}

#[test]
fn test_trend_flat_series_reports_flat() {
    let answer = engine()
        .production_trend_with_climate("Punjab", "Rice", None)
        .unwrap();
    assert!(answer.answer.contains("flat"), "answer: {}", answer.answer);
}

#[test]
fn test_trend_respects_year_range() {
    let answer = engine()
        .production_trend_with_climate(
            "Punjab",
            "Wheat",
            Some(&YearSelector::Range {
                start: 2020,
                end: 2022,
            }),
        )
        .unwrap();
    let years: Vec<i64> = answer.tables[0]
        .rows
        .iter()
        .map(|row| row[0].as_i64().unwrap())
        .collect();
    assert_eq!(years, [2020, 2021, 2022]);
}

#[test]
fn test_policy_arguments_compares_both_crops() {
    let answer = engine()
        .policy_arguments("Punjab", "Rice", "Wheat", None)
        .unwrap();

    assert!(answer.answer.contains("For Rice:"));
    assert!(answer.answer.contains("Against Rice:"));
    assert!(answer.answer.contains("For Wheat:"));
    assert!(answer.answer.contains("Against Wheat:"));

    let table = &answer.tables[0];
    assert_eq!(table.headers, ["Metric", "Rice", "Wheat"]);
    assert_eq!(table.rows.len(), 3);
    assert_eq!(
        table.rows[0][0].as_str(),
        Some("Average production (tonnes)")
    );

    // every metric cell is backed by a citation for that crop
    for crop in ["Rice", "Wheat"] {
        assert!(answer
            .citations
            .iter()
            .any(|c| c.crop.as_deref() == Some(crop)));
    }
    assert!(answer
        .citations
        .iter()
        .any(|c| c.dataset == "rainfall"));
}

#[test]
fn test_policy_unknown_crop_is_domain_error() {
    let err = engine()
        .policy_arguments("Punjab", "Rice", "Quinoa", None)
        .unwrap_err();
    match err {
        SamarthError::Analytics(domain) => {
            assert!(domain.to_string().contains("Quinoa"));
        }
        other => panic!("expected domain error, got {other:?}"),
    }
}

#[test]
fn test_answers_are_deterministic() {
    let engine = engine();
    let a = engine
        .compare_rainfall_and_crops("Punjab", "Haryana", None, None, 3)
        .unwrap();
    let b = engine
        .compare_rainfall_and_crops("Punjab", "Haryana", None, None, 3)
        .unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

/// Two distinguishable dataset generations for the atomicity test.
fn generation(rain_mm: f64, tonnes: f64) -> DatasetSnapshot {
    let mut records = Vec::new();
    let mut rain = Vec::new();
    for year in 2019..=2023 {
        records.push(production("Punjab", "Ludhiana", "Rice", year, tonnes));
        records.push(production("Haryana", "Karnal", "Rice", year, tonnes));
        rain.push(rainfall("Punjab", year, rain_mm));
        rain.push(rainfall("Haryana", year, rain_mm));
    }
    DatasetSnapshot::build(
        records,
        rain,
        DatasetMeta::new("agriculture", "https://data.gov.in", "agri-1"),
        DatasetMeta::new("rainfall", "https://data.gov.in", "rain-1"),
    )
}

#[test]
fn test_refresh_never_mixes_generations() {
    let config = Config::default();
    let data = Arc::new(DataManager::from_snapshot(&config, generation(100.0, 10.0)));
    let engine = AnalyticsEngine::new(data.clone(), config.analytics);

    let writer = {
        let data = data.clone();
        std::thread::spawn(move || {
            for i in 0..200 {
                let snapshot = if i % 2 == 0 {
                    generation(999.0, 500.0)
                } else {
                    generation(100.0, 10.0)
                };
                data.install(snapshot);
            }
        })
    };

    for _ in 0..200 {
        let answer = engine
            .compare_rainfall_and_crops("Punjab", "Haryana", None, None, 3)
            .unwrap();
        // Each generation pairs one rainfall level with one production
        // level; a mixed answer would combine values across them.
        let rain_cell = answer.tables[0].rows[0][2].as_f64().unwrap();
        let production_cell = answer.tables[0].rows[0][1].as_f64().unwrap();
        match rain_cell {
            r if r == 100.0 => assert_eq!(production_cell, 50.0),
            r if r == 999.0 => assert_eq!(production_cell, 2500.0),
            other => panic!("unexpected rainfall value: {other}"),
        }
    }

    writer.join().unwrap();
}
