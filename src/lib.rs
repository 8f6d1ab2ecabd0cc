//! Fairness monitoring core: bias metrics, drift forecasting, and a
//! tamper-evident audit trail.
//!
//! Every fairness check runs a fixed metric set (DIR, SPD, EOD, AOD, Theil)
//! over two-group outcome tallies, seals the result into a hash-chained
//! [`record::CheckRecord`], and registers the record's content hash with an
//! [`anchor::AnchorService`]. A read-only [`drift::DriftMonitor`] turns the
//! recorded DIR series into trends, forecasts, and early warnings.
//!
//! [`service::FairnessMonitor`] is the high-level entry point:
//!
//! ```
//! use fairlens::config::MonitorConfig;
//! use fairlens::metrics::EvaluationInput;
//! use fairlens::service::FairnessMonitor;
//!
//! let monitor = FairnessMonitor::in_memory(MonitorConfig::default()).unwrap();
//! let input = EvaluationInput::from_counts("loan_v1", (45, 100), (70, 100));
//! let record = monitor.evaluate(&input).unwrap();
//! assert!(record.alert);
//! assert!(monitor.verify_all().is_ok());
//! ```

pub mod anchor;
pub mod chain;
pub mod config;
pub mod drift;
pub mod error;
pub mod metrics;
pub mod record;
pub mod service;
pub mod store;

pub use config::MonitorConfig;
pub use error::{FairlensError, Result};
pub use metrics::{EvaluationInput, FairnessReport, MetricsEngine};
pub use record::CheckRecord;
pub use service::FairnessMonitor;
