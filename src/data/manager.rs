//! The Data Manager: loads datasets and publishes immutable snapshots.
//!
//! Each dataset comes from its configured local CSV sample, or from the
//! data.gov.in datastore API when `DATAGOV_API_KEY` is set (paged fetch
//! with a raw JSON snapshot written under the cache directory, falling
//! back to the local sample on any remote failure).
//!
//! Readers share one snapshot behind an `Arc`; `reload()` builds a fresh
//! snapshot off to the side and swaps the reference, so an in-flight read
//! sees either the old snapshot in full or the new one in full.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;

use crate::config::{Config, DatasetSource, DatasetsConfig};
use crate::error::{DatasetError, Result};
use crate::metrics::get_metrics;

use super::records::{DatasetMeta, DatasetSnapshot, ProductionRecord, RainfallRecord};

const DATAGOV_ENDPOINT: &str = "https://data.gov.in/api/3/action/datastore_search";
const FETCH_PAGE_SIZE: usize = 2000;

pub struct DataManager {
    datasets: DatasetsConfig,
    cache_dir: PathBuf,
    snapshot: RwLock<Arc<DatasetSnapshot>>,
    client: reqwest::Client,
}

impl DataManager {
    /// Build a manager and perform the initial load.
    pub async fn load(config: &Config) -> Result<Self> {
        let manager = Self {
            datasets: config.datasets.clone(),
            cache_dir: config.cache_dir(),
            snapshot: RwLock::new(Arc::new(DatasetSnapshot::empty())),
            client: reqwest::Client::new(),
        };
        manager.reload().await?;
        Ok(manager)
    }

    /// Build a manager around an existing snapshot (no I/O).
    pub fn from_snapshot(config: &Config, snapshot: DatasetSnapshot) -> Self {
        let manager = Self {
            datasets: config.datasets.clone(),
            cache_dir: config.cache_dir(),
            snapshot: RwLock::new(Arc::new(DatasetSnapshot::empty())),
            client: reqwest::Client::new(),
        };
        manager.install(snapshot);
        manager
    }

    /// The current snapshot. Callers hold the `Arc` for the duration of
    /// one computation so a concurrent reload cannot mix generations.
    pub fn snapshot(&self) -> Arc<DatasetSnapshot> {
        self.snapshot.read().clone()
    }

    /// Atomically publish a new snapshot.
    pub fn install(&self, snapshot: DatasetSnapshot) {
        let metrics = get_metrics();
        metrics.production_records.set(snapshot.production_len() as i64);
        metrics.rainfall_records.set(snapshot.rainfall_len() as i64);
        *self.snapshot.write() = Arc::new(snapshot);
    }

    /// Rebuild the snapshot from the configured sources and publish it.
    pub async fn reload(&self) -> Result<()> {
        let snapshot = self.build_snapshot().await?;
        tracing::info!(
            production = snapshot.production_len(),
            rainfall = snapshot.rainfall_len(),
            "Dataset snapshot loaded"
        );
        self.install(snapshot);
        Ok(())
    }

    async fn build_snapshot(&self) -> Result<DatasetSnapshot> {
        let production: Vec<ProductionRecord> =
            self.load_rows("agriculture", &self.datasets.agriculture).await?;
        let rainfall: Vec<RainfallRecord> =
            self.load_rows("rainfall", &self.datasets.rainfall).await?;

        if production.is_empty() {
            return Err(DatasetError::Empty("agriculture".to_string()).into());
        }
        if rainfall.is_empty() {
            return Err(DatasetError::Empty("rainfall".to_string()).into());
        }

        Ok(DatasetSnapshot::build(
            production,
            rainfall,
            dataset_meta("agriculture", &self.datasets.agriculture),
            dataset_meta("rainfall", &self.datasets.rainfall),
        ))
    }

    async fn load_rows<T: DeserializeOwned>(
        &self,
        name: &str,
        source: &DatasetSource,
    ) -> Result<Vec<T>> {
        if !source.resource_id.is_empty() {
            if let Ok(api_key) = std::env::var("DATAGOV_API_KEY") {
                match self.fetch_remote(name, source, &api_key).await {
                    Ok(rows) => return Ok(rows),
                    Err(err) => {
                        tracing::warn!(
                            "Remote fetch failed for '{name}': {err}. Falling back to local sample."
                        );
                    }
                }
            }
        }
        self.load_local(name, source)
    }

    fn load_local<T: DeserializeOwned>(&self, name: &str, source: &DatasetSource) -> Result<Vec<T>> {
        let path = PathBuf::from(shellexpand::tilde(&source.local_sample).as_ref());
        if !path.exists() {
            return Err(DatasetError::SampleNotFound(path.display().to_string()).into());
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| DatasetError::Parse {
                dataset: name.to_string(),
                message: e.to_string(),
            })?;

        // Column headers vary in case across published extracts.
        let headers = reader
            .headers()
            .map_err(|e| DatasetError::Parse {
                dataset: name.to_string(),
                message: e.to_string(),
            })?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect::<csv::StringRecord>();
        reader.set_headers(headers);

        let mut rows = Vec::new();
        for row in reader.deserialize() {
            let row: T = row.map_err(|e| DatasetError::Parse {
                dataset: name.to_string(),
                message: e.to_string(),
            })?;
            rows.push(row);
        }
        Ok(rows)
    }

    async fn fetch_remote<T: DeserializeOwned>(
        &self,
        name: &str,
        source: &DatasetSource,
        api_key: &str,
    ) -> Result<Vec<T>> {
        let fetch_err = |message: String| DatasetError::RemoteFetch {
            dataset: name.to_string(),
            message,
        };

        let mut records: Vec<serde_json::Value> = Vec::new();
        let mut offset = 0usize;
        loop {
            let limit = FETCH_PAGE_SIZE.to_string();
            let offset_param = offset.to_string();
            let response = self
                .client
                .get(DATAGOV_ENDPOINT)
                .query(&[
                    ("resource_id", source.resource_id.as_str()),
                    ("api-key", api_key),
                    ("limit", limit.as_str()),
                    ("offset", offset_param.as_str()),
                ])
                .send()
                .await
                .map_err(|e| fetch_err(e.to_string()))?
                .error_for_status()
                .map_err(|e| fetch_err(e.to_string()))?;

            let payload: serde_json::Value =
                response.json().await.map_err(|e| fetch_err(e.to_string()))?;
            let batch = payload
                .pointer("/result/records")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();

            let batch_len = batch.len();
            records.extend(batch);
            offset += FETCH_PAGE_SIZE;
            if batch_len < FETCH_PAGE_SIZE {
                break;
            }
        }

        if records.is_empty() {
            return Err(fetch_err("no records returned from API".to_string()).into());
        }

        self.write_raw_snapshot(source, &records)?;

        records
            .into_iter()
            .map(|record| {
                serde_json::from_value(lowercase_keys(record)).map_err(|e| {
                    DatasetError::Parse {
                        dataset: name.to_string(),
                        message: e.to_string(),
                    }
                    .into()
                })
            })
            .collect()
    }

    /// Keep a timestamped copy of the raw API payload for provenance.
    fn write_raw_snapshot(
        &self,
        source: &DatasetSource,
        records: &[serde_json::Value],
    ) -> Result<()> {
        let dir = self.cache_dir.join("raw").join(&source.resource_id);
        std::fs::create_dir_all(&dir)?;
        let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
        let path = dir.join(format!("{timestamp}.json"));
        std::fs::write(&path, serde_json::to_vec_pretty(records)?)?;
        tracing::debug!("Raw snapshot written to {}", path.display());
        Ok(())
    }
}

fn dataset_meta(name: &str, source: &DatasetSource) -> DatasetMeta {
    DatasetMeta::new(name, &source.source_url, &source.resource_id)
}

/// Lowercase the keys of a JSON object so field names match the record
/// structs regardless of how the publisher cased them.
fn lowercase_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v))
                .collect(),
        ),
        other => other,
    }
}
