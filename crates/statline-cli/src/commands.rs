//! Subcommands and their execution against a [`SqliteStore`].

use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use statline_core::{StatusHistory, status::StatusRecord, tracker::StatusTracker};
use statline_store_sqlite::SqliteStore;
use uuid::Uuid;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Create or list observed entities.
  #[command(subcommand)]
  Entity(EntityCommand),

  /// Add or query status records.
  #[command(subcommand)]
  Status(StatusCommand),
}

#[derive(Subcommand, Debug)]
pub enum EntityCommand {
  /// Create an entity of the selected kind.
  Add,
  /// List entities of the selected kind.
  List,
}

#[derive(Subcommand, Debug)]
pub enum StatusCommand {
  /// Make a new status current for an entity.
  Add(AddStatus),
  /// Show the status of an entity as of a date.
  AsOf(EntityAt),
  /// Show the full status history of an entity.
  History {
    entity: Uuid,
  },
  /// Show every entity's status as of a date.
  List(At),
}

#[derive(Args, Debug)]
pub struct AddStatus {
  pub entity:  Uuid,
  /// First day the status applies (YYYY-MM-DD).
  #[arg(long)]
  pub from:    NaiveDate,
  /// Status payload as JSON.
  #[arg(long, default_value = "{}")]
  pub payload: String,
}

#[derive(Args, Debug)]
pub struct EntityAt {
  pub entity: Uuid,
  #[command(flatten)]
  pub at:     At,
}

#[derive(Args, Debug)]
pub struct At {
  /// Date to look up (YYYY-MM-DD); defaults to today (UTC).
  #[arg(long)]
  pub date: Option<NaiveDate>,
}

impl At {
  fn resolve(&self) -> NaiveDate { self.date.unwrap_or_else(|| Utc::now().date_naive()) }
}

/// Execute `command` against `store`, scoped to entities of `kind`.
pub async fn run(store: &SqliteStore, kind: &str, command: Command) -> anyhow::Result<()> {
  let history: StatusHistory<serde_json::Value> = StatusHistory::new(kind);

  match command {
    Command::Entity(EntityCommand::Add) => {
      print(&store.add_entity(kind.to_owned()).await?)
    }
    Command::Entity(EntityCommand::List) => {
      for entity in store.list_entities(Some(kind.to_owned())).await? {
        print(&entity)?;
      }
      Ok(())
    }
    Command::Status(StatusCommand::Add(args)) => {
      let payload: serde_json::Value =
        serde_json::from_str(&args.payload).context("--payload is not valid JSON")?;
      let record = store
        .add_status(&history, StatusRecord::new(args.entity, args.from, payload))
        .await
        .with_context(|| format!("failed to add status for {}", args.entity))?;
      print(&record)
    }
    Command::Status(StatusCommand::AsOf(args)) => {
      let date = args.at.resolve();
      print(&store.get_status_as_of(&history, args.entity, date).await?)
    }
    Command::Status(StatusCommand::History { entity }) => {
      for record in store.status_history(&history, entity).await? {
        print(&record)?;
      }
      Ok(())
    }
    Command::Status(StatusCommand::List(at)) => {
      let date = at.resolve();
      for (entity, status) in store.entities_with_status_as_of(&history, date).await? {
        print(&serde_json::json!({ "entity": entity, "status": status }))?;
      }
      Ok(())
    }
  }
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string(value)?);
  Ok(())
}
