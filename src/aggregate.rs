//! Aggregation engine: status distribution, territory rollups and the
//! monthly trend.
//!
//! All functions are pure. The trend is the only view that depends on the
//! calendar, and it takes `today` explicitly instead of reading the clock.
//! Empty input always produces correctly shaped zero results.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::dates::{full_month_label, month_label, month_ordinal, parse_calendar_date, trailing_months};
use crate::types::{
    ActionItem, ActionStatus, ActionSummary, AgendaItem, AgendaTally, Meeting, MeetingTally,
    MonthLocale, MonthlyBucket, StatusCount, StatusTally, TerritoryRollup, TOP_TERRITORY_LIMIT,
    TREND_WINDOW_MONTHS,
};

// =============================================================================
// Status distribution
// =============================================================================

/// Whole-percent share of `count` in `total`, rounded half up.
fn percent_of(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count * 200 + total) / (2 * total)) as u32
}

/// One bucket per status, always in `Pending, InProgress, Completed` order,
/// zero-count buckets included. The counts sum to `items.len()`.
pub fn aggregate_status_distribution(items: &[ActionItem]) -> [StatusCount; 3] {
    let tally = tally_statuses(items);
    let total = items.len();
    ActionStatus::ALL.map(|status| {
        let count = match status {
            ActionStatus::Pending => tally.pending,
            ActionStatus::InProgress => tally.in_progress,
            ActionStatus::Completed => tally.completed,
        };
        StatusCount {
            status,
            count,
            percent: percent_of(count, total),
        }
    })
}

fn tally_statuses(items: &[ActionItem]) -> StatusTally {
    let mut tally = StatusTally::default();
    for item in items {
        item.tally_into(&mut tally);
    }
    tally
}

/// Totals for the metric cards above the action table.
pub fn summarize_actions(items: &[ActionItem]) -> ActionSummary {
    let tally = tally_statuses(items);
    let total = items.len();
    let completion_rate = if total == 0 {
        0.0
    } else {
        tally.completed as f64 * 100.0 / total as f64
    };
    ActionSummary {
        total,
        pending: tally.pending,
        in_progress: tally.in_progress,
        completed: tally.completed,
        completion_rate,
    }
}

// =============================================================================
// Territory rollup
// =============================================================================

/// A record that can be grouped by territory name.
///
/// The key is the display string: records with equal territory text are
/// grouped together whatever territory id they came from.
pub trait GroupedRecord {
    type Tally: Default;

    fn territory(&self) -> &str;

    /// Add this record's contribution to its group's tally.
    fn tally_into(&self, tally: &mut Self::Tally);
}

impl GroupedRecord for ActionItem {
    type Tally = StatusTally;

    fn territory(&self) -> &str {
        &self.territory
    }

    fn tally_into(&self, tally: &mut StatusTally) {
        match self.status {
            ActionStatus::Pending => tally.pending += 1,
            ActionStatus::InProgress => tally.in_progress += 1,
            ActionStatus::Completed => tally.completed += 1,
        }
    }
}

impl GroupedRecord for Meeting {
    type Tally = MeetingTally;

    fn territory(&self) -> &str {
        &self.territory
    }

    fn tally_into(&self, tally: &mut MeetingTally) {
        tally.agenda_items += u64::from(self.agenda_item_count);
        tally.action_items += u64::from(self.action_item_count);
    }
}

impl GroupedRecord for AgendaItem {
    type Tally = AgendaTally;

    fn territory(&self) -> &str {
        &self.territory
    }

    fn tally_into(&self, tally: &mut AgendaTally) {
        tally.pending_actions += u64::from(self.pending_actions);
        tally.in_progress_actions += u64::from(self.in_progress_actions);
        tally.completed_actions += u64::from(self.completed_actions);
    }
}

/// Group records by territory, largest groups first.
///
/// The sort is stable, so equal totals keep first-encounter order. Only the
/// top `TOP_TERRITORY_LIMIT` groups are returned; the rest are dropped, not
/// merged into an "other" group.
pub fn aggregate_by_territory<R: GroupedRecord>(records: &[R]) -> Vec<TerritoryRollup<R::Tally>> {
    let mut groups: Vec<TerritoryRollup<R::Tally>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let slot = *index.entry(record.territory()).or_insert_with(|| {
            groups.push(TerritoryRollup {
                territory: record.territory().to_string(),
                total: 0,
                tally: R::Tally::default(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.total += 1;
        record.tally_into(&mut group.tally);
    }

    let distinct = groups.len();
    groups.sort_by(|a, b| b.total.cmp(&a.total));
    groups.truncate(TOP_TERRITORY_LIMIT);
    if distinct > TOP_TERRITORY_LIMIT {
        log::debug!(
            "territory rollup: kept {} of {} groups",
            TOP_TERRITORY_LIMIT,
            distinct
        );
    }
    groups
}

// =============================================================================
// Monthly trend
// =============================================================================

/// A dated record that can be placed in the monthly trend.
pub trait TrendRecord {
    fn trend_date(&self) -> &str;

    /// Records without a lifecycle count as not completed.
    fn is_completed(&self) -> bool {
        false
    }
}

impl TrendRecord for ActionItem {
    fn trend_date(&self) -> &str {
        &self.meeting_date
    }

    fn is_completed(&self) -> bool {
        self.status.is_completed()
    }
}

impl TrendRecord for Meeting {
    fn trend_date(&self) -> &str {
        &self.date
    }
}

/// Six calendar-month buckets ending with the month of `today`, oldest
/// first, with Portuguese month labels.
pub fn aggregate_monthly_trend<R: TrendRecord>(records: &[R], today: NaiveDate) -> Vec<MonthlyBucket> {
    aggregate_monthly_trend_with_locale(records, today, MonthLocale::PtBr)
}

/// Monthly trend with labels in `locale`.
///
/// A record lands in exactly one bucket, or in none when its date is outside
/// the window or cannot be parsed. Excluded records only leave this view.
pub fn aggregate_monthly_trend_with_locale<R: TrendRecord>(
    records: &[R],
    today: NaiveDate,
    locale: MonthLocale,
) -> Vec<MonthlyBucket> {
    let months = trailing_months(today, TREND_WINDOW_MONTHS);
    let mut buckets: Vec<MonthlyBucket> = months
        .iter()
        .map(|&month| MonthlyBucket {
            month,
            label: month_label(month, locale),
            full_label: full_month_label(month, locale),
            total: 0,
            completed: 0,
            not_completed: 0,
        })
        .collect();

    let Some(first) = months.first().map(|m| month_ordinal(*m)) else {
        return buckets;
    };

    let mut unparsable = 0usize;
    for record in records {
        let Some(date) = parse_calendar_date(record.trend_date()) else {
            unparsable += 1;
            continue;
        };
        let offset = month_ordinal(date) - first;
        if offset < 0 || offset >= buckets.len() as i64 {
            continue;
        }
        let bucket = &mut buckets[offset as usize];
        bucket.total += 1;
        if record.is_completed() {
            bucket.completed += 1;
        } else {
            bucket.not_completed += 1;
        }
    }

    if unparsable > 0 {
        log::warn!("monthly trend: skipped {} record(s) with unparsable dates", unparsable);
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn action(territory: &str, status: ActionStatus, date: &str) -> ActionItem {
        ActionItem {
            id: format!("{}-{}", territory, date),
            territory: territory.to_string(),
            meeting_date: date.to_string(),
            agenda_description: String::new(),
            problem: String::new(),
            responsible: String::new(),
            status,
        }
    }

    fn scenario() -> Vec<ActionItem> {
        vec![
            action("North", ActionStatus::Pending, "2024-01-10"),
            action("North", ActionStatus::Completed, "2024-01-15"),
            action("South", ActionStatus::Completed, "2024-02-01"),
        ]
    }

    fn meeting(territory: &str, date: &str, agenda: u32, actions: u32) -> Meeting {
        Meeting {
            id: format!("{}-{}", territory, date),
            territory: territory.to_string(),
            date: date.to_string(),
            time: "19:00".to_string(),
            secretary: "Não informado".to_string(),
            agenda_item_count: agenda,
            action_item_count: actions,
        }
    }

    #[test]
    fn distribution_for_scenario() {
        let dist = aggregate_status_distribution(&scenario());
        let counts: Vec<(ActionStatus, usize)> = dist.iter().map(|b| (b.status, b.count)).collect();
        assert_eq!(
            counts,
            vec![
                (ActionStatus::Pending, 1),
                (ActionStatus::InProgress, 0),
                (ActionStatus::Completed, 2),
            ]
        );
        assert_eq!(dist[0].percent, 33);
        assert_eq!(dist[2].percent, 67);
    }

    #[test]
    fn distribution_of_empty_collection_has_three_zero_buckets() {
        let dist = aggregate_status_distribution(&[]);
        assert_eq!(dist.len(), 3);
        assert!(dist.iter().all(|b| b.count == 0 && b.percent == 0));
        assert_eq!(dist[1].status, ActionStatus::InProgress);
    }

    #[test]
    fn distribution_total_matches_input_length() {
        let mut items = scenario();
        items.push(action("East", ActionStatus::InProgress, "2024-03-01"));
        items.push(action("East", ActionStatus::InProgress, "garbage"));
        let sum: usize = aggregate_status_distribution(&items).iter().map(|b| b.count).sum();
        assert_eq!(sum, items.len());
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent_of(1, 8), 13);
        assert_eq!(percent_of(3, 8), 38);
        assert_eq!(percent_of(0, 5), 0);
        assert_eq!(percent_of(5, 5), 100);
    }

    #[test]
    fn summary_counts_and_rate() {
        let summary = summarize_actions(&scenario());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.completed, 2);
        assert!((summary.completion_rate - 66.666).abs() < 0.01);
        assert_eq!(summarize_actions(&[]).completion_rate, 0.0);
    }

    #[test]
    fn rollup_for_scenario() {
        let rollup = aggregate_by_territory(&scenario());
        assert_eq!(rollup.len(), 2);
        assert_eq!(rollup[0].territory, "North");
        assert_eq!(rollup[0].total, 2);
        assert_eq!(
            rollup[0].tally,
            StatusTally {
                pending: 1,
                in_progress: 0,
                completed: 1
            }
        );
        assert_eq!(rollup[1].territory, "South");
        assert_eq!(rollup[1].total, 1);
    }

    #[test]
    fn rollup_sorts_descending_with_first_seen_tie_break() {
        let items = vec![
            action("B", ActionStatus::Pending, "2024-01-01"),
            action("A", ActionStatus::Pending, "2024-01-01"),
            action("C", ActionStatus::Pending, "2024-01-01"),
            action("C", ActionStatus::Completed, "2024-01-02"),
            action("A", ActionStatus::Pending, "2024-01-03"),
            action("D", ActionStatus::Pending, "2024-01-01"),
        ];
        let order: Vec<(String, usize)> = aggregate_by_territory(&items)
            .into_iter()
            .map(|g| (g.territory, g.total))
            .collect();
        assert_eq!(
            order,
            vec![
                ("A".to_string(), 2),
                ("C".to_string(), 2),
                ("B".to_string(), 1),
                ("D".to_string(), 1),
            ]
        );
    }

    #[test]
    fn rollup_keeps_top_eight_without_other_bucket() {
        let mut items = Vec::new();
        for (i, name) in ["T0", "T1", "T2", "T3", "T4", "T5", "T6", "T7", "T8", "T9"]
            .iter()
            .enumerate()
        {
            for _ in 0..(10 - i) {
                items.push(action(name, ActionStatus::Pending, "2024-01-01"));
            }
        }
        let rollup = aggregate_by_territory(&items);
        assert_eq!(rollup.len(), TOP_TERRITORY_LIMIT);
        assert_eq!(rollup.last().unwrap().territory, "T7");
        assert!(rollup.windows(2).all(|w| w[0].total >= w[1].total));
        assert!(rollup.iter().all(|g| g.territory != "T8" && g.territory != "T9"));
    }

    #[test]
    fn rollup_groups_by_exact_display_name() {
        let items = vec![
            action("Zona Norte", ActionStatus::Pending, "2024-01-01"),
            action("Zona norte", ActionStatus::Pending, "2024-01-01"),
            action("Zona Norte", ActionStatus::Completed, "2024-01-01"),
        ];
        let rollup = aggregate_by_territory(&items);
        assert_eq!(rollup.len(), 2);
        assert_eq!(rollup[0].territory, "Zona Norte");
    }

    #[test]
    fn meeting_rollup_sums_precomputed_counts() {
        let meetings = vec![
            meeting("Leste", "2024-04-02", 3, 7),
            meeting("Oeste", "2024-04-09", 1, 1),
            meeting("Leste", "2024-05-02", 2, 0),
        ];
        let rollup = aggregate_by_territory(&meetings);
        assert_eq!(rollup[0].territory, "Leste");
        assert_eq!(rollup[0].total, 2);
        assert_eq!(
            rollup[0].tally,
            MeetingTally {
                agenda_items: 5,
                action_items: 7
            }
        );
    }

    #[test]
    fn agenda_rollup_sums_child_counts() {
        let item = |territory: &str, p: u32, i: u32, c: u32| AgendaItem {
            id: String::new(),
            territory: territory.to_string(),
            meeting_date: "2024-01-01".to_string(),
            description: String::new(),
            pending_actions: p,
            in_progress_actions: i,
            completed_actions: c,
        };
        let rollup = aggregate_by_territory(&[item("Sul", 1, 2, 3), item("Sul", 0, 0, 4)]);
        assert_eq!(rollup.len(), 1);
        assert_eq!(
            rollup[0].tally,
            AgendaTally {
                pending_actions: 1,
                in_progress_actions: 2,
                completed_actions: 7
            }
        );
    }

    #[test]
    fn empty_rollup_is_empty() {
        assert!(aggregate_by_territory::<ActionItem>(&[]).is_empty());
    }

    #[test]
    fn trend_of_empty_collection_has_six_zero_months() {
        let trend = aggregate_monthly_trend::<ActionItem>(&[], d(2024, 6, 15));
        assert_eq!(trend.len(), TREND_WINDOW_MONTHS);
        assert!(trend.iter().all(|b| b.total == 0));
        assert_eq!(trend[0].month, d(2024, 1, 1));
        assert_eq!(trend[5].month, d(2024, 6, 1));
        assert_eq!(trend[5].label, "jun");
        assert_eq!(trend[0].full_label, "janeiro 2024");
    }

    #[test]
    fn trend_buckets_scenario_by_calendar_month() {
        let trend = aggregate_monthly_trend(&scenario(), d(2024, 2, 20));
        let jan = &trend[4];
        let feb = &trend[5];
        assert_eq!((jan.total, jan.completed, jan.not_completed), (2, 1, 1));
        assert_eq!((feb.total, feb.completed, feb.not_completed), (1, 1, 0));
        assert_eq!(trend.iter().map(|b| b.total).sum::<usize>(), 3);
    }

    #[test]
    fn trend_month_edges_are_inclusive() {
        let items = vec![
            action("X", ActionStatus::Pending, "2024-01-01"),
            action("X", ActionStatus::InProgress, "2024-01-31"),
            action("X", ActionStatus::Pending, "2023-12-31"),
        ];
        let trend = aggregate_monthly_trend(&items, d(2024, 1, 1));
        assert_eq!(trend[5].total, 2);
        assert_eq!(trend[5].not_completed, 2);
        assert_eq!(trend[4].total, 1);
    }

    #[test]
    fn trend_excludes_out_of_window_and_unparsable_dates() {
        let items = vec![
            action("X", ActionStatus::Completed, "2023-08-31"),
            action("X", ActionStatus::Completed, "2023-09-01"),
            action("X", ActionStatus::Completed, "2024-03-01"),
            action("X", ActionStatus::Completed, "sem data"),
        ];
        let trend = aggregate_monthly_trend(&items, d(2024, 2, 29));
        assert_eq!(trend.len(), 6);
        assert_eq!(trend[0].month, d(2023, 9, 1));
        assert_eq!(trend[0].completed, 1);
        assert_eq!(trend.iter().map(|b| b.total).sum::<usize>(), 1);
    }

    #[test]
    fn trend_window_moves_with_today() {
        let items = scenario();
        let in_feb = aggregate_monthly_trend(&items, d(2024, 2, 1));
        let in_august = aggregate_monthly_trend(&items, d(2024, 8, 1));
        assert_eq!(in_feb.iter().map(|b| b.total).sum::<usize>(), 3);
        assert_eq!(in_august.iter().map(|b| b.total).sum::<usize>(), 0);
    }

    #[test]
    fn meeting_trend_counts_everything_as_not_completed() {
        let meetings = vec![meeting("Leste", "2024-05-02", 1, 1), meeting("Leste", "2024-05-20", 0, 0)];
        let trend = aggregate_monthly_trend_with_locale(&meetings, d(2024, 5, 31), MonthLocale::En);
        assert_eq!(trend[5].label, "May");
        assert_eq!((trend[5].total, trend[5].completed, trend[5].not_completed), (2, 0, 2));
    }
}
