//! govdash: print a dashboard view as JSON.
//!
//! Usage: `govdash <actions|meetings|agenda|territories> [--territory NAME]... [--from YYYY-MM-DD] [--to YYYY-MM-DD] [--text QUERY] [--responsible QUERY]`
//!
//! Reads the exported collections from the `dataDir` in ~/.govdash/config.json.
//! `--text` searches agenda description and problem for actions, secretary
//! for meetings and description for agenda items. `--responsible` only
//! applies to actions.

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;

use govdash_lib::config::load_config;
use govdash_lib::dates::parse_calendar_date;
use govdash_lib::error::{LoadError, SourceError};
use govdash_lib::filter::{ActionFilter, AgendaFilter, MeetingFilter};
use govdash_lib::logging;
use govdash_lib::source::JsonDirSource;
use govdash_lib::types::Config;
use govdash_lib::views::{local_today, DashboardEngine};

#[derive(Default)]
struct Args {
    view: String,
    territories: Vec<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    text: String,
    responsible: String,
}

fn parse_date_arg(value: Option<String>, flag: &str) -> anyhow::Result<NaiveDate> {
    let value = value.ok_or_else(|| anyhow!("{flag} needs a value"))?;
    parse_calendar_date(&value).ok_or_else(|| anyhow!("{flag}: not a date: {value}"))
}

fn parse_args() -> anyhow::Result<Args> {
    let mut raw = std::env::args().skip(1);
    let mut args = Args {
        view: raw.next().unwrap_or_else(|| "actions".to_string()),
        ..Default::default()
    };
    while let Some(flag) = raw.next() {
        match flag.as_str() {
            "--territory" => args
                .territories
                .push(raw.next().ok_or_else(|| anyhow!("--territory needs a value"))?),
            "--from" => args.from = Some(parse_date_arg(raw.next(), "--from")?),
            "--to" => args.to = Some(parse_date_arg(raw.next(), "--to")?),
            "--text" => args.text = raw.next().ok_or_else(|| anyhow!("--text needs a value"))?,
            "--responsible" => {
                args.responsible = raw
                    .next()
                    .ok_or_else(|| anyhow!("--responsible needs a value"))?
            }
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

/// Resolve the data directory and load every collection from it.
fn open_engine(config: &Config) -> Result<DashboardEngine, SourceError> {
    let source = JsonDirSource::from_config(config)?;
    DashboardEngine::load(&source, config)
}

fn main() -> anyhow::Result<()> {
    let config = load_config().context("Failed to load govdash config")?;
    logging::init(&config);
    let args = parse_args()?;

    let engine = match open_engine(&config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{}", serde_json::to_string_pretty(&LoadError::from(&e))?);
            return Err(e.into());
        }
    };

    let today = local_today();
    let json = match args.view.as_str() {
        "actions" => {
            let filter = ActionFilter::default()
                .with_territories(args.territories)
                .between(args.from, args.to)
                .with_text(&args.text)
                .with_responsible(&args.responsible);
            serde_json::to_string_pretty(&*engine.action_view(&filter, today))?
        }
        "meetings" => {
            let filter = MeetingFilter::default()
                .with_territories(args.territories)
                .between(args.from, args.to)
                .with_secretary(&args.text);
            serde_json::to_string_pretty(&*engine.meeting_view(&filter, today))?
        }
        "agenda" => {
            let filter = AgendaFilter::default()
                .with_territories(args.territories)
                .between(args.from, args.to)
                .with_description(&args.text);
            serde_json::to_string_pretty(&*engine.agenda_view(&filter))?
        }
        "territories" => serde_json::to_string_pretty(&engine.territory_names())?,
        other => bail!("unknown view: {other}"),
    };
    println!("{json}");
    Ok(())
}
