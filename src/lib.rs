//! Filtering and aggregation engine for the governance meetings dashboard.
//!
//! Records are fetched once into immutable snapshots (`dataset`), narrowed by
//! pure filter specs (`filter`), and reduced to chart-ready aggregates
//! (`aggregate`). `views::DashboardEngine` bundles both and memoizes the
//! result per snapshot, filter and month.

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod dates;
pub mod error;
pub mod filter;
pub mod logging;
pub mod source;
pub mod types;
pub mod views;

pub use error::{ConfigError, LoadError, SourceError};
pub use filter::{ActionFilter, AgendaFilter, MeetingFilter, RecordFilter};
pub use views::DashboardEngine;
