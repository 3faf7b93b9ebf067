use serde::{Deserialize, Serialize};

/// Groups beyond this rank are dropped from territory rollups.
///
/// There is no "other" bucket: the cut-off keeps the territory charts legible
/// and is not a statement about the data.
pub const TOP_TERRITORY_LIMIT: usize = 8;

/// Number of calendar months in the trend window (current month included).
pub const TREND_WINDOW_MONTHS: usize = 6;

// =============================================================================
// Records
// =============================================================================

/// Lifecycle of an action item. Closed set; the source labels are Portuguese.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionStatus {
    #[serde(rename = "Pendente", alias = "pending")]
    Pending,
    #[serde(rename = "Em andamento", alias = "inProgress")]
    InProgress,
    #[serde(rename = "Concluído", alias = "completed")]
    Completed,
}

impl ActionStatus {
    /// Canonical order used by every status-keyed view.
    pub const ALL: [ActionStatus; 3] = [
        ActionStatus::Pending,
        ActionStatus::InProgress,
        ActionStatus::Completed,
    ];

    /// Display label as stored by the source.
    pub fn label(self) -> &'static str {
        match self {
            ActionStatus::Pending => "Pendente",
            ActionStatus::InProgress => "Em andamento",
            ActionStatus::Completed => "Concluído",
        }
    }

    /// Parse a status as written by the source or by API callers.
    ///
    /// Accepts the Portuguese labels (with or without accents, any case) and
    /// the English identifiers. Anything else is `None`.
    pub fn from_label(value: &str) -> Option<Self> {
        let key: String = value
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'í' => 'i',
                ' ' | '-' => '_',
                other => other,
            })
            .collect();
        match key.as_str() {
            "pendente" | "pending" => Some(ActionStatus::Pending),
            "em_andamento" | "andamento" | "in_progress" | "inprogress" => {
                Some(ActionStatus::InProgress)
            }
            "concluido" | "completed" => Some(ActionStatus::Completed),
            _ => None,
        }
    }

    pub fn is_completed(self) -> bool {
        self == ActionStatus::Completed
    }
}

/// Child-count criterion for agenda items: "has at least one action in
/// this status".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChildStatus {
    #[serde(alias = "pendente")]
    Pending,
    #[serde(alias = "andamento")]
    InProgress,
    #[serde(alias = "concluido")]
    Completed,
}

impl From<ActionStatus> for ChildStatus {
    fn from(status: ActionStatus) -> Self {
        match status {
            ActionStatus::Pending => ChildStatus::Pending,
            ActionStatus::InProgress => ChildStatus::InProgress,
            ActionStatus::Completed => ChildStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Territory {
    pub id: String,
    pub name: String,
}

/// A meeting, already joined to its territory name.
///
/// `agenda_item_count` and `action_item_count` arrive precomputed and are
/// never re-derived from the agenda/action collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub territory: String,
    /// ISO calendar date (`YYYY-MM-DD`).
    pub date: String,
    /// Free-form start time, empty when the source has none.
    #[serde(default)]
    pub time: String,
    pub secretary: String,
    pub agenda_item_count: u32,
    pub action_item_count: u32,
}

/// An agenda item ("pauta") with per-status counts of its actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaItem {
    pub id: String,
    pub territory: String,
    pub meeting_date: String,
    pub description: String,
    pub pending_actions: u32,
    pub in_progress_actions: u32,
    pub completed_actions: u32,
}

impl AgendaItem {
    pub fn actions_in(&self, status: ChildStatus) -> u32 {
        match status {
            ChildStatus::Pending => self.pending_actions,
            ChildStatus::InProgress => self.in_progress_actions,
            ChildStatus::Completed => self.completed_actions,
        }
    }
}

/// A tracked action item ("apontamento").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub id: String,
    pub territory: String,
    pub meeting_date: String,
    pub agenda_description: String,
    pub problem: String,
    pub responsible: String,
    pub status: ActionStatus,
}

// =============================================================================
// Aggregates
// =============================================================================

/// One bucket of the status distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: ActionStatus,
    pub count: usize,
    /// Share of the collection, rounded to a whole percent.
    pub percent: u32,
}

/// Per-status sub-totals of action items in a territory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTally {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

/// Agenda and action totals over the meetings of a territory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingTally {
    pub agenda_items: u64,
    pub action_items: u64,
}

/// Summed child counts over the agenda items of a territory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaTally {
    pub pending_actions: u64,
    pub in_progress_actions: u64,
    pub completed_actions: u64,
}

/// A territory group: record count plus a record-type specific tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryRollup<T> {
    pub territory: String,
    pub total: usize,
    #[serde(flatten)]
    pub tally: T,
}

/// One calendar month of the trend window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucket {
    /// First day of the month.
    pub month: chrono::NaiveDate,
    /// Short label, e.g. `jan`.
    pub label: String,
    /// Long label, e.g. `janeiro 2024`.
    pub full_label: String,
    pub total: usize,
    pub completed: usize,
    pub not_completed: usize,
}

/// Totals behind the action metric cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSummary {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    /// Completed share in percent, 0.0 for an empty collection.
    pub completion_rate: f64,
}

// =============================================================================
// Configuration
// =============================================================================

/// Language of month labels in trend buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MonthLocale {
    #[default]
    PtBr,
    En,
}

/// Configuration stored in ~/.govdash/config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding the exported JSON collections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub files: SourceFiles,
    #[serde(default)]
    pub month_locale: MonthLocale,
    /// Default `env_logger` filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            files: SourceFiles::default(),
            month_locale: MonthLocale::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// File names of the exported collections inside `data_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFiles {
    #[serde(default = "default_territories_file")]
    pub territories: String,
    #[serde(default = "default_meetings_file")]
    pub meetings: String,
    #[serde(default = "default_agenda_file")]
    pub agenda_items: String,
    #[serde(default = "default_actions_file")]
    pub action_items: String,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            territories: default_territories_file(),
            meetings: default_meetings_file(),
            agenda_items: default_agenda_file(),
            action_items: default_actions_file(),
        }
    }
}

fn default_territories_file() -> String {
    "territorios.json".to_string()
}

fn default_meetings_file() -> String {
    "reunioes.json".to_string()
}

fn default_agenda_file() -> String {
    "pautas.json".to_string()
}

fn default_actions_file() -> String {
    "acoes.json".to_string()
}
