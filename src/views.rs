//! View assembly and memoization.
//!
//! A view bundles the filtered records with their aggregates, in the shape
//! the tables and charts consume. `DashboardEngine` caches the last view of
//! each kind, keyed by (snapshot generation, filter, current month). A key
//! change recomputes; nothing is patched incrementally.

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::{
    aggregate_by_territory, aggregate_monthly_trend_with_locale, aggregate_status_distribution,
    summarize_actions,
};
use crate::dataset::Dataset;
use crate::dates::month_start;
use crate::error::SourceError;
use crate::filter::{filter_records, ActionFilter, AgendaFilter, MeetingFilter};
use crate::source::RecordSource;
use crate::types::{
    ActionItem, ActionSummary, AgendaItem, AgendaTally, Config, Meeting, MeetingTally,
    MonthLocale, MonthlyBucket, StatusCount, StatusTally, TerritoryRollup,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDashboard {
    pub items: Vec<ActionItem>,
    pub active_filters: usize,
    pub summary: ActionSummary,
    pub status_distribution: [StatusCount; 3],
    pub by_territory: Vec<TerritoryRollup<StatusTally>>,
    pub trend: Vec<MonthlyBucket>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDashboard {
    pub meetings: Vec<Meeting>,
    pub active_filters: usize,
    pub by_territory: Vec<TerritoryRollup<MeetingTally>>,
    pub trend: Vec<MonthlyBucket>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaDashboard {
    pub items: Vec<AgendaItem>,
    pub active_filters: usize,
    pub by_territory: Vec<TerritoryRollup<AgendaTally>>,
}

pub fn assemble_action_dashboard(
    items: &[ActionItem],
    filter: &ActionFilter,
    today: NaiveDate,
    locale: MonthLocale,
) -> ActionDashboard {
    let items = filter_records(items, filter);
    ActionDashboard {
        active_filters: filter.active_count(),
        summary: summarize_actions(&items),
        status_distribution: aggregate_status_distribution(&items),
        by_territory: aggregate_by_territory(&items),
        trend: aggregate_monthly_trend_with_locale(&items, today, locale),
        items,
    }
}

pub fn assemble_meeting_dashboard(
    meetings: &[Meeting],
    filter: &MeetingFilter,
    today: NaiveDate,
    locale: MonthLocale,
) -> MeetingDashboard {
    let meetings = filter_records(meetings, filter);
    MeetingDashboard {
        active_filters: filter.active_count(),
        by_territory: aggregate_by_territory(&meetings),
        trend: aggregate_monthly_trend_with_locale(&meetings, today, locale),
        meetings,
    }
}

pub fn assemble_agenda_dashboard(items: &[AgendaItem], filter: &AgendaFilter) -> AgendaDashboard {
    let items = filter_records(items, filter);
    AgendaDashboard {
        active_filters: filter.active_count(),
        by_territory: aggregate_by_territory(&items),
        items,
    }
}

/// Single-slot cache: holds the last key and its value.
struct Memo<K, V> {
    slot: Mutex<Option<(K, Arc<V>)>>,
}

impl<K: PartialEq, V> Memo<K, V> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    fn get_or_compute(&self, key: K, compute: impl FnOnce() -> V) -> Arc<V> {
        if let Some((cached, value)) = self.slot.lock().as_ref() {
            if *cached == key {
                return Arc::clone(value);
            }
        }
        let value = Arc::new(compute());
        *self.slot.lock() = Some((key, Arc::clone(&value)));
        value
    }

    fn clear(&self) {
        *self.slot.lock() = None;
    }
}

type ActionKey = (Uuid, ActionFilter, NaiveDate);
type MeetingKey = (Uuid, MeetingFilter, NaiveDate);
type AgendaKey = (Uuid, AgendaFilter);

/// Holds the current dataset and serves memoized views over it.
pub struct DashboardEngine {
    dataset: Dataset,
    month_locale: MonthLocale,
    actions: Memo<ActionKey, ActionDashboard>,
    meetings: Memo<MeetingKey, MeetingDashboard>,
    agenda: Memo<AgendaKey, AgendaDashboard>,
}

impl DashboardEngine {
    pub fn new(dataset: Dataset, config: &Config) -> Self {
        Self {
            dataset,
            month_locale: config.month_locale,
            actions: Memo::new(),
            meetings: Memo::new(),
            agenda: Memo::new(),
        }
    }

    /// Fetch a dataset from `source` and build an engine over it.
    pub fn load<S: RecordSource + ?Sized>(source: &S, config: &Config) -> Result<Self, SourceError> {
        Ok(Self::new(Dataset::load(source)?, config))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Swap in a new dataset wholesale and drop every cached view.
    pub fn replace_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.actions.clear();
        self.meetings.clear();
        self.agenda.clear();
    }

    /// Refetch from `source`. On failure the current dataset is kept.
    pub fn refresh<S: RecordSource + ?Sized>(&mut self, source: &S) -> Result<(), SourceError> {
        let dataset = Dataset::load(source)?;
        self.replace_dataset(dataset);
        Ok(())
    }

    /// Action view for `filter`. The trend window follows the month of
    /// `today`, so a new month invalidates the cached view.
    pub fn action_view(&self, filter: &ActionFilter, today: NaiveDate) -> Arc<ActionDashboard> {
        let snapshot = &self.dataset.action_items;
        let key = (snapshot.generation(), filter.clone(), month_start(today));
        self.actions.get_or_compute(key, || {
            log::debug!("recomputing action view ({} records)", snapshot.len());
            assemble_action_dashboard(snapshot.records(), filter, today, self.month_locale)
        })
    }

    pub fn meeting_view(&self, filter: &MeetingFilter, today: NaiveDate) -> Arc<MeetingDashboard> {
        let snapshot = &self.dataset.meetings;
        let key = (snapshot.generation(), filter.clone(), month_start(today));
        self.meetings.get_or_compute(key, || {
            log::debug!("recomputing meeting view ({} records)", snapshot.len());
            assemble_meeting_dashboard(snapshot.records(), filter, today, self.month_locale)
        })
    }

    pub fn agenda_view(&self, filter: &AgendaFilter) -> Arc<AgendaDashboard> {
        let snapshot = &self.dataset.agenda_items;
        let key = (snapshot.generation(), filter.clone());
        self.agenda.get_or_compute(key, || {
            log::debug!("recomputing agenda view ({} records)", snapshot.len());
            assemble_agenda_dashboard(snapshot.records(), filter)
        })
    }

    pub fn territory_names(&self) -> Vec<String> {
        self.dataset.territory_names()
    }
}

/// Today's date on the local calendar, for callers without an injected clock.
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
