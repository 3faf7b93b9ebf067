//! Filter predicate engine.
//!
//! Each filter is a literal conjunction of independent criteria. An unset or
//! empty criterion is vacuously true. Criteria are checked cheapest-first:
//! set membership, then date bounds, then substring scans.
//!
//! Territory matching is plain string equality on the display name.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::parse_calendar_date;
use crate::types::{ActionItem, ActionStatus, AgendaItem, ChildStatus, Meeting};

/// Inclusion test of a single record against a filter specification.
pub trait RecordFilter<R> {
    fn matches(&self, record: &R) -> bool;
}

/// Keep the records matching `filter`, in their original order.
///
/// Total: never fails, returns an empty vec when nothing matches.
pub fn filter_records<R, F>(records: &[R], filter: &F) -> Vec<R>
where
    R: Clone,
    F: RecordFilter<R>,
{
    records
        .iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect()
}

/// Case-insensitive substring query.
///
/// The needle is trimmed and lowercased once on construction. A blank query
/// is unset and matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TextQuery {
    needle: Option<String>,
}

impl TextQuery {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        Self {
            needle: (!trimmed.is_empty()).then(|| trimmed.to_lowercase()),
        }
    }

    pub fn is_set(&self) -> bool {
        self.needle.is_some()
    }

    /// True when unset or when any of `fields` contains the needle.
    pub fn found_in_any(&self, fields: &[&str]) -> bool {
        match &self.needle {
            None => true,
            Some(needle) => fields
                .iter()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
        }
    }
}

impl From<&str> for TextQuery {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for TextQuery {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<TextQuery> for String {
    fn from(query: TextQuery) -> Self {
        query.needle.unwrap_or_default()
    }
}

fn territory_allowed(territories: &BTreeSet<String>, territory: &str) -> bool {
    territories.is_empty() || territories.contains(territory)
}

/// Inclusive calendar-date bounds. A record date that cannot be parsed
/// fails whenever a bound is set.
fn within_bounds(date: &str, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    match parse_calendar_date(date) {
        Some(day) => from.map_or(true, |f| day >= f) && to.map_or(true, |t| day <= t),
        None => false,
    }
}

fn collect_names<I, S>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

// =============================================================================
// Meetings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingFilter {
    #[serde(default)]
    pub territories: BTreeSet<String>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub secretary: TextQuery,
}

impl MeetingFilter {
    pub fn with_territories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.territories = collect_names(names);
        self
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn with_secretary(mut self, query: &str) -> Self {
        self.secretary = TextQuery::new(query);
        self
    }

    /// Number of active criterion groups; the date range counts once.
    pub fn active_count(&self) -> usize {
        [
            !self.territories.is_empty(),
            self.date_from.is_some() || self.date_to.is_some(),
            self.secretary.is_set(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    pub fn is_active(&self) -> bool {
        self.active_count() > 0
    }
}

impl RecordFilter<Meeting> for MeetingFilter {
    fn matches(&self, meeting: &Meeting) -> bool {
        territory_allowed(&self.territories, &meeting.territory)
            && within_bounds(&meeting.date, self.date_from, self.date_to)
            && self.secretary.found_in_any(&[meeting.secretary.as_str()])
    }
}

// =============================================================================
// Agenda items
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaFilter {
    #[serde(default)]
    pub territories: BTreeSet<String>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub description: TextQuery,
    /// Passes iff the item has at least one action in this status.
    #[serde(default)]
    pub child_status: Option<ChildStatus>,
}

impl AgendaFilter {
    pub fn with_territories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.territories = collect_names(names);
        self
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn with_description(mut self, query: &str) -> Self {
        self.description = TextQuery::new(query);
        self
    }

    pub fn with_child_status(mut self, status: ChildStatus) -> Self {
        self.child_status = Some(status);
        self
    }

    pub fn active_count(&self) -> usize {
        [
            !self.territories.is_empty(),
            self.date_from.is_some() || self.date_to.is_some(),
            self.description.is_set(),
            self.child_status.is_some(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    pub fn is_active(&self) -> bool {
        self.active_count() > 0
    }
}

impl RecordFilter<AgendaItem> for AgendaFilter {
    fn matches(&self, item: &AgendaItem) -> bool {
        territory_allowed(&self.territories, &item.territory)
            && self
                .child_status
                .map_or(true, |status| item.actions_in(status) > 0)
            && within_bounds(&item.meeting_date, self.date_from, self.date_to)
            && self.description.found_in_any(&[item.description.as_str()])
    }
}

// =============================================================================
// Action items
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionFilter {
    #[serde(default)]
    pub territories: BTreeSet<String>,
    #[serde(default)]
    pub status: BTreeSet<ActionStatus>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub responsible: TextQuery,
    /// Matches the agenda description or the problem text.
    #[serde(default)]
    pub text: TextQuery,
}

impl ActionFilter {
    pub fn with_territories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.territories = collect_names(names);
        self
    }

    pub fn with_status<I>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = ActionStatus>,
    {
        self.status = statuses.into_iter().collect();
        self
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn with_responsible(mut self, query: &str) -> Self {
        self.responsible = TextQuery::new(query);
        self
    }

    pub fn with_text(mut self, query: &str) -> Self {
        self.text = TextQuery::new(query);
        self
    }

    pub fn active_count(&self) -> usize {
        [
            !self.territories.is_empty(),
            !self.status.is_empty(),
            self.date_from.is_some() || self.date_to.is_some(),
            self.responsible.is_set(),
            self.text.is_set(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    pub fn is_active(&self) -> bool {
        self.active_count() > 0
    }
}

impl RecordFilter<ActionItem> for ActionFilter {
    fn matches(&self, item: &ActionItem) -> bool {
        territory_allowed(&self.territories, &item.territory)
            && (self.status.is_empty() || self.status.contains(&item.status))
            && within_bounds(&item.meeting_date, self.date_from, self.date_to)
            && self.responsible.found_in_any(&[item.responsible.as_str()])
            && self
                .text
                .found_in_any(&[item.agenda_description.as_str(), item.problem.as_str()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn action(id: &str, territory: &str, status: ActionStatus, date: &str) -> ActionItem {
        ActionItem {
            id: id.to_string(),
            territory: territory.to_string(),
            meeting_date: date.to_string(),
            agenda_description: "Iluminação pública".to_string(),
            problem: "Postes apagados na Rua A".to_string(),
            responsible: "Maria Souza".to_string(),
            status,
        }
    }

    fn sample() -> Vec<ActionItem> {
        vec![
            action("1", "North", ActionStatus::Pending, "2024-01-10"),
            action("2", "North", ActionStatus::Completed, "2024-01-15"),
            action("3", "South", ActionStatus::Completed, "2024-02-01"),
        ]
    }

    fn ids(items: &[ActionItem]) -> Vec<&str> {
        items.iter().map(|a| a.id.as_str()).collect()
    }

    fn agenda(id: &str, pending: u32, in_progress: u32, completed: u32) -> AgendaItem {
        AgendaItem {
            id: id.to_string(),
            territory: "Centro".to_string(),
            meeting_date: "2024-03-05".to_string(),
            description: "Saneamento básico".to_string(),
            pending_actions: pending,
            in_progress_actions: in_progress,
            completed_actions: completed,
        }
    }

    fn meeting(id: &str, territory: &str, date: &str, secretary: &str) -> Meeting {
        Meeting {
            id: id.to_string(),
            territory: territory.to_string(),
            date: date.to_string(),
            time: String::new(),
            secretary: secretary.to_string(),
            agenda_item_count: 0,
            action_item_count: 0,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let items = sample();
        assert_eq!(filter_records(&items, &ActionFilter::default()), items);
    }

    #[test]
    fn territory_filter_keeps_only_south() {
        let filter = ActionFilter::default().with_territories(["South"]);
        assert_eq!(ids(&filter_records(&sample(), &filter)), vec!["3"]);
    }

    #[test]
    fn single_day_range_is_inclusive_on_both_sides() {
        let filter = ActionFilter::default().between(Some(d(2024, 2, 1)), Some(d(2024, 2, 1)));
        assert_eq!(ids(&filter_records(&sample(), &filter)), vec!["3"]);
    }

    #[test]
    fn record_with_time_component_compares_by_calendar_day() {
        let items = vec![action("1", "North", ActionStatus::Pending, "2024-01-31T23:59:00-03:00")];
        let filter = ActionFilter::default().between(None, Some(d(2024, 1, 31)));
        assert_eq!(filter_records(&items, &filter).len(), 1);
    }

    #[test]
    fn contradictory_bounds_match_nothing() {
        let filter = ActionFilter::default().between(Some(d(2024, 3, 1)), Some(d(2024, 1, 1)));
        assert!(filter_records(&sample(), &filter).is_empty());
    }

    #[test]
    fn unparsable_date_only_fails_date_bounded_filters() {
        let items = vec![action("x", "North", ActionStatus::Pending, "not-a-date")];
        assert_eq!(filter_records(&items, &ActionFilter::default()).len(), 1);
        let bounded = ActionFilter::default().between(Some(d(2000, 1, 1)), None);
        assert!(filter_records(&items, &bounded).is_empty());
    }

    #[test]
    fn status_filter_is_set_membership() {
        let filter = ActionFilter::default()
            .with_status([ActionStatus::Pending, ActionStatus::InProgress]);
        assert_eq!(ids(&filter_records(&sample(), &filter)), vec!["1"]);
    }

    #[test]
    fn free_text_is_case_insensitive_or_across_fields() {
        let mut items = sample();
        items[1].agenda_description = "Transporte".to_string();
        items[1].problem = "Ônibus atrasado".to_string();

        let by_problem = ActionFilter::default().with_text("ÔNIBUS");
        assert_eq!(ids(&filter_records(&items, &by_problem)), vec!["2"]);

        let by_description = ActionFilter::default().with_text("iluminação");
        assert_eq!(ids(&filter_records(&items, &by_description)), vec!["1", "3"]);

        let by_responsible = ActionFilter::default().with_responsible("  souza ");
        assert_eq!(filter_records(&items, &by_responsible).len(), 3);
    }

    #[test]
    fn blank_text_query_is_unset() {
        let filter = ActionFilter::default().with_responsible("   ").with_text("");
        assert!(!filter.is_active());
        assert_eq!(filter_records(&sample(), &filter).len(), 3);
    }

    #[test]
    fn filtering_is_idempotent() {
        let filter = ActionFilter::default()
            .with_territories(["North"])
            .with_text("postes");
        let once = filter_records(&sample(), &filter);
        let twice = filter_records(&once, &filter);
        assert_eq!(once, twice);
    }

    #[test]
    fn adding_a_criterion_never_grows_the_result() {
        let items = sample();
        let base = ActionFilter::default().with_territories(["North", "South"]);
        let narrower = base.clone().with_status([ActionStatus::Completed]);
        let narrowest = narrower.clone().between(Some(d(2024, 1, 20)), None);

        let a = filter_records(&items, &base);
        let b = filter_records(&items, &narrower);
        let c = filter_records(&items, &narrowest);
        assert!(b.iter().all(|x| a.contains(x)));
        assert!(c.iter().all(|x| b.contains(x)));
        assert_eq!((a.len(), b.len(), c.len()), (3, 2, 1));
    }

    #[test]
    fn active_count_counts_date_range_once() {
        let filter = ActionFilter::default()
            .with_territories(["North"])
            .between(Some(d(2024, 1, 1)), Some(d(2024, 1, 31)))
            .with_text("postes");
        assert_eq!(filter.active_count(), 3);
        assert_eq!(ActionFilter::default().active_count(), 0);
    }

    #[test]
    fn agenda_child_status_requires_at_least_one() {
        let items = vec![agenda("a", 2, 0, 0), agenda("b", 0, 1, 3), agenda("c", 0, 0, 0)];
        let pending = AgendaFilter::default().with_child_status(ChildStatus::Pending);
        let completed = AgendaFilter::default().with_child_status(ChildStatus::Completed);
        let ids = |v: Vec<AgendaItem>| v.into_iter().map(|a| a.id).collect::<Vec<_>>();
        assert_eq!(ids(filter_records(&items, &pending)), vec!["a"]);
        assert_eq!(ids(filter_records(&items, &completed)), vec!["b"]);
    }

    #[test]
    fn agenda_description_search() {
        let items = vec![agenda("a", 1, 0, 0)];
        let hit = AgendaFilter::default().with_description("SANEAMENTO");
        let miss = AgendaFilter::default().with_description("escola");
        assert_eq!(filter_records(&items, &hit).len(), 1);
        assert!(filter_records(&items, &miss).is_empty());
    }

    #[test]
    fn meeting_filter_combines_criteria() {
        let meetings = vec![
            meeting("1", "Leste", "2024-05-02", "Ana Lima"),
            meeting("2", "Leste", "2024-06-10", "Carlos Reis"),
            meeting("3", "Oeste", "2024-05-20", "Ana Paula"),
        ];
        let filter = MeetingFilter::default()
            .with_territories(["Leste"])
            .with_secretary("ana");
        let found = filter_records(&meetings, &filter);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");

        let may = MeetingFilter::default().between(Some(d(2024, 5, 1)), Some(d(2024, 5, 31)));
        assert_eq!(filter_records(&meetings, &may).len(), 2);
        assert_eq!(may.active_count(), 1);
    }

    #[test]
    fn filter_deserializes_from_presentation_json() {
        let filter: ActionFilter = serde_json::from_str(
            r#"{"territories":["South"],"status":["Concluído"],"dateFrom":"2024-02-01","responsible":"  "}"#,
        )
        .unwrap();
        assert_eq!(filter.active_count(), 3);
        assert!(!filter.responsible.is_set());
        assert_eq!(ids(&filter_records(&sample(), &filter)), vec!["3"]);
    }
}
