//! Immutable record snapshots.
//!
//! Every fetch produces new snapshots with fresh generation ids. Snapshots
//! are replaced wholesale on refetch, never patched, so a generation id is a
//! complete identity for memoization.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::aggregate::GroupedRecord;
use crate::error::SourceError;
use crate::source::RecordSource;
use crate::types::{ActionItem, AgendaItem, Meeting, Territory};

/// A fetched collection with its identity.
#[derive(Debug)]
pub struct Snapshot<T> {
    generation: Uuid,
    fetched_at: DateTime<Utc>,
    records: Arc<[T]>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            fetched_at: self.fetched_at,
            records: Arc::clone(&self.records),
        }
    }
}

impl<T> Snapshot<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            generation: Uuid::new_v4(),
            fetched_at: Utc::now(),
            records: records.into(),
        }
    }

    pub fn generation(&self) -> Uuid {
        self.generation
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// All collections of one fetch.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub territories: Snapshot<Territory>,
    pub meetings: Snapshot<Meeting>,
    pub agenda_items: Snapshot<AgendaItem>,
    pub action_items: Snapshot<ActionItem>,
}

impl Dataset {
    /// Fetch every collection. Any failing fetch fails the load.
    pub fn load<S: RecordSource + ?Sized>(source: &S) -> Result<Self, SourceError> {
        match Self::fetch_all(source) {
            Ok(dataset) => {
                log::info!(
                    "loaded {} territories, {} meetings, {} agenda items, {} actions",
                    dataset.territories.len(),
                    dataset.meetings.len(),
                    dataset.agenda_items.len(),
                    dataset.action_items.len()
                );
                Ok(dataset)
            }
            Err(e) => {
                log::error!("Error fetching dashboard data: {}", e);
                Err(e)
            }
        }
    }

    fn fetch_all<S: RecordSource + ?Sized>(source: &S) -> Result<Self, SourceError> {
        Ok(Self {
            territories: Snapshot::new(source.fetch_territories()?),
            meetings: Snapshot::new(source.fetch_meetings()?),
            agenda_items: Snapshot::new(source.fetch_agenda_items()?),
            action_items: Snapshot::new(source.fetch_action_items()?),
        })
    }

    /// Territory names for filter pickers: the territory collection when
    /// present, otherwise the names used by meetings and actions.
    pub fn territory_names(&self) -> Vec<String> {
        if !self.territories.is_empty() {
            let names: BTreeSet<String> = self
                .territories
                .records()
                .iter()
                .map(|t| t.name.clone())
                .collect();
            return names.into_iter().collect();
        }
        let mut names: BTreeSet<String> = territory_options(self.meetings.records())
            .into_iter()
            .collect();
        names.extend(territory_options(self.action_items.records()));
        names.into_iter().collect()
    }
}

/// Distinct territory names present in `records`, sorted.
pub fn territory_options<R: GroupedRecord>(records: &[R]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.territory())
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
