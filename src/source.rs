//! Record sources and the normalizer.
//!
//! The backend returns nested relational rows (a meeting embeds its
//! territory and its agenda items, each with their actions). This module
//! flattens them into the record types the engine works on, joined to
//! territory display names and with child counts precomputed.
//!
//! `JsonDirSource` reads exported rows from a directory:
//! - `territorios.json`: `[{ "id_territorio", "nome" }]` (optional)
//! - `reunioes.json`: `[{ "id_reuniao", "data", "hora", "secretario_nome",
//!   "territorios": { "nome" }, "pautas": [{ "acoes": [..] }] }]`
//! - `pautas.json`: `[{ "id_pauta", "descricao", "reunioes": { "data",
//!   "territorios" }, "acoes": [{ "status" }] }]`
//! - `acoes.json`: `[{ "id_acao", "problema", "responsaveis", "status",
//!   "pautas": { "descricao", "reunioes": { .. } } }]`

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;

use crate::error::SourceError;
use crate::types::{ActionItem, ActionStatus, AgendaItem, Config, Meeting, SourceFiles, Territory};

/// Territory label for rows whose territory join came back empty.
pub const NO_TERRITORY: &str = "Sem território";

/// Secretary label for meetings without one.
pub const NO_SECRETARY: &str = "Não informado";

/// Fetches each record collection: an array of records or a failure.
pub trait RecordSource: Send + Sync {
    fn fetch_territories(&self) -> Result<Vec<Territory>, SourceError>;
    fn fetch_meetings(&self) -> Result<Vec<Meeting>, SourceError>;
    fn fetch_agenda_items(&self) -> Result<Vec<AgendaItem>, SourceError>;
    fn fetch_action_items(&self) -> Result<Vec<ActionItem>, SourceError>;
}

// =============================================================================
// Raw rows
// =============================================================================

/// Ids arrive as numbers from the database and as strings from exports.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Number(n) => write!(f, "{}", n),
            RawId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawTerritory {
    pub id_territorio: RawId,
    #[serde(default)]
    pub nome: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawTerritoryRef {
    #[serde(default)]
    pub nome: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawMeetingRow {
    pub id_reuniao: RawId,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub hora: Option<String>,
    #[serde(default)]
    pub secretario_nome: Option<String>,
    #[serde(default)]
    pub territorios: Option<RawTerritoryRef>,
    #[serde(default)]
    pub pautas: Option<Vec<RawMeetingAgenda>>,
}

#[derive(Debug, Deserialize)]
pub struct RawMeetingAgenda {
    #[serde(default)]
    pub acoes: Option<Vec<IgnoredAny>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawMeetingRef {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub territorios: Option<RawTerritoryRef>,
}

#[derive(Debug, Deserialize)]
pub struct RawStatusRef {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawAgendaRow {
    pub id_pauta: RawId,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub reunioes: Option<RawMeetingRef>,
    #[serde(default)]
    pub acoes: Option<Vec<RawStatusRef>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawAgendaRef {
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub reunioes: Option<RawMeetingRef>,
}

#[derive(Debug, Deserialize)]
pub struct RawActionRow {
    pub id_acao: RawId,
    #[serde(default)]
    pub problema: Option<String>,
    #[serde(default)]
    pub responsaveis: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub pautas: Option<RawAgendaRef>,
}

// =============================================================================
// Normalizer
// =============================================================================

/// Rows the normalizer could not represent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// `(action id, status text)` of actions with an unknown status.
    pub unknown_status: Vec<(String, String)>,
}

impl NormalizeReport {
    pub fn is_clean(&self) -> bool {
        self.unknown_status.is_empty()
    }
}

fn territory_name(territory: Option<&RawTerritoryRef>) -> String {
    territory
        .and_then(|t| t.nome.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(NO_TERRITORY)
        .to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn normalize_territories(rows: Vec<RawTerritory>) -> Vec<Territory> {
    rows.into_iter()
        .map(|row| Territory {
            id: row.id_territorio.to_string(),
            name: row.nome.as_deref().map(str::trim).unwrap_or_default().to_string(),
        })
        .collect()
}

/// Flatten meeting rows, newest first.
pub fn normalize_meetings(rows: Vec<RawMeetingRow>) -> Vec<Meeting> {
    let mut meetings: Vec<Meeting> = rows
        .into_iter()
        .map(|row| {
            let agenda = row.pautas.unwrap_or_default();
            let action_item_count: usize = agenda
                .iter()
                .map(|p| p.acoes.as_ref().map_or(0, Vec::len))
                .sum();
            Meeting {
                id: row.id_reuniao.to_string(),
                territory: territory_name(row.territorios.as_ref()),
                date: row.data.unwrap_or_default(),
                time: row.hora.unwrap_or_default(),
                secretary: non_empty(row.secretario_nome.as_deref())
                    .unwrap_or(NO_SECRETARY)
                    .to_string(),
                agenda_item_count: agenda.len() as u32,
                action_item_count: action_item_count as u32,
            }
        })
        .collect();
    meetings.sort_by(|a, b| b.date.cmp(&a.date));
    meetings
}

/// Flatten agenda rows, counting nested actions per status.
///
/// Nested actions with an unknown status are not counted anywhere.
pub fn normalize_agenda_items(rows: Vec<RawAgendaRow>) -> Vec<AgendaItem> {
    rows.into_iter()
        .map(|row| {
            let meeting = row.reunioes.unwrap_or_default();
            let mut item = AgendaItem {
                id: row.id_pauta.to_string(),
                territory: territory_name(meeting.territorios.as_ref()),
                meeting_date: meeting.data.unwrap_or_default(),
                description: row.descricao.unwrap_or_default(),
                pending_actions: 0,
                in_progress_actions: 0,
                completed_actions: 0,
            };
            for action in row.acoes.unwrap_or_default() {
                match action.status.as_deref().and_then(ActionStatus::from_label) {
                    Some(ActionStatus::Pending) => item.pending_actions += 1,
                    Some(ActionStatus::InProgress) => item.in_progress_actions += 1,
                    Some(ActionStatus::Completed) => item.completed_actions += 1,
                    None => log::debug!(
                        "agenda item {}: ignoring action with status {:?}",
                        item.id,
                        action.status
                    ),
                }
            }
            item
        })
        .collect()
}

/// Flatten action rows.
///
/// `ActionItem` only holds the three known statuses, so a row with any other
/// status is left out and listed in the report instead of failing the fetch.
pub fn normalize_action_items(rows: Vec<RawActionRow>) -> (Vec<ActionItem>, NormalizeReport) {
    let mut report = NormalizeReport::default();
    let mut items = Vec::with_capacity(rows.len());

    for row in rows {
        let id = row.id_acao.to_string();
        let status_text = row.status.unwrap_or_default();
        let Some(status) = ActionStatus::from_label(&status_text) else {
            log::warn!("action {}: unknown status {:?}, skipping", id, status_text);
            report.unknown_status.push((id, status_text));
            continue;
        };
        let agenda = row.pautas.unwrap_or_default();
        let meeting = agenda.reunioes.unwrap_or_default();
        items.push(ActionItem {
            id,
            territory: territory_name(meeting.territorios.as_ref()),
            meeting_date: meeting.data.unwrap_or_default(),
            agenda_description: agenda.descricao.unwrap_or_default(),
            problem: row.problema.unwrap_or_default(),
            responsible: row.responsaveis.unwrap_or_default(),
            status,
        });
    }

    (items, report)
}

// =============================================================================
// Sources
// =============================================================================

/// Reads exported backend rows from JSON files in a directory.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
    files: SourceFiles,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>, files: SourceFiles) -> Self {
        Self {
            dir: dir.into(),
            files,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let dir = config.data_dir.as_deref().ok_or(SourceError::DataDirMissing)?;
        Ok(Self::new(dir, config.files.clone()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_rows<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, SourceError> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Err(SourceError::NotFound(path));
        }
        let content = fs::read_to_string(&path)?;
        let rows: Vec<T> = serde_json::from_str(&content).map_err(|e| SourceError::Parse {
            file: file.to_string(),
            message: e.to_string(),
        })?;
        log::debug!("read {} row(s) from {}", rows.len(), path.display());
        Ok(rows)
    }

    /// Action items together with the rows that had to be left out.
    pub fn fetch_action_items_with_report(
        &self,
    ) -> Result<(Vec<ActionItem>, NormalizeReport), SourceError> {
        let rows = self.read_rows::<RawActionRow>(&self.files.action_items)?;
        Ok(normalize_action_items(rows))
    }
}

impl RecordSource for JsonDirSource {
    /// The territory export is optional; without it the list is empty and
    /// territory names come from the records themselves.
    fn fetch_territories(&self) -> Result<Vec<Territory>, SourceError> {
        match self.read_rows::<RawTerritory>(&self.files.territories) {
            Ok(rows) => Ok(normalize_territories(rows)),
            Err(SourceError::NotFound(path)) => {
                log::info!("no territory export at {}", path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    fn fetch_meetings(&self) -> Result<Vec<Meeting>, SourceError> {
        let rows = self.read_rows(&self.files.meetings)?;
        Ok(normalize_meetings(rows))
    }

    fn fetch_agenda_items(&self) -> Result<Vec<AgendaItem>, SourceError> {
        let rows = self.read_rows(&self.files.agenda_items)?;
        Ok(normalize_agenda_items(rows))
    }

    fn fetch_action_items(&self) -> Result<Vec<ActionItem>, SourceError> {
        let (items, report) = self.fetch_action_items_with_report()?;
        if !report.is_clean() {
            log::warn!(
                "{} action(s) left out for unknown status",
                report.unknown_status.len()
            );
        }
        Ok(items)
    }
}

/// Source over records that are already normalized.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    pub territories: Vec<Territory>,
    pub meetings: Vec<Meeting>,
    pub agenda_items: Vec<AgendaItem>,
    pub action_items: Vec<ActionItem>,
}

impl RecordSource for InMemorySource {
    fn fetch_territories(&self) -> Result<Vec<Territory>, SourceError> {
        Ok(self.territories.clone())
    }

    fn fetch_meetings(&self) -> Result<Vec<Meeting>, SourceError> {
        Ok(self.meetings.clone())
    }

    fn fetch_agenda_items(&self) -> Result<Vec<AgendaItem>, SourceError> {
        Ok(self.agenda_items.clone())
    }

    fn fetch_action_items(&self) -> Result<Vec<ActionItem>, SourceError> {
        Ok(self.action_items.clone())
    }
}
