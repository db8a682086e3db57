//! Samarth: analytical Q&A over Indian agricultural and climate statistics.
//!
//! Free-text questions are parsed into structured intents and answered
//! by computing over a loaded dataset, with supporting tables and source
//! citations for every numeric claim.

pub mod analytics;
pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod parser;

pub use analytics::{Answer, AnalyticsEngine, Citation, Table};
pub use api::{create_rest_router, dispatch, ApiState, DispatchError};
pub use config::Config;
pub use data::{DataManager, DatasetMeta, DatasetSnapshot, ProductionRecord, RainfallRecord};
pub use error::{AnalyticsError, ConfigError, DatasetError, Result, SamarthError};
pub use metrics::{get_metrics, Metrics};
pub use parser::{parse_question, ParsedQuestion, QuestionIntent, YearSelector};
