mod about;
mod auth;
mod carousel;
mod config_cmd;
mod contact;
mod mail;
mod schedule;
mod status;

pub use about::AboutCommand;
pub use auth::AuthCommand;
pub use carousel::CarouselCommand;
pub use config_cmd::ConfigCommand;
pub use contact::ContactCommand;
pub use mail::MailCommand;
pub use schedule::ScheduleCommand;
pub use status::StatusCommand;

use clap::ValueEnum;
use eldirecto_core::{ContentStore, DurableMirror, HttpGateway, Record, SaveOutcome, Session};
use std::io::{self, Write};

use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub type AdminStore = ContentStore<HttpGateway>;

/// Opens the store with the saved session. Nothing is loaded yet.
pub fn open_store(config: &Config) -> AdminStore {
    let session = config
        .auth
        .token
        .clone()
        .map(Session::resume)
        .unwrap_or_default();

    ContentStore::new(
        HttpGateway::new(config.gateway_url.value.clone()),
        DurableMirror::new(config.data_dir.value.clone()),
        session,
    )
}

/// Opens the store and loads every collection.
///
/// Collections that could not be read are reported on stderr and shown from
/// the local copy.
pub async fn load_store(config: &Config) -> Result<AdminStore, Box<dyn std::error::Error>> {
    let mut store = open_store(config);
    if !store.is_authenticated() {
        return Err("Not logged in. Run 'eldirecto auth login' first.".into());
    }

    let report = store.load_all().await?;
    if report.requires_login() {
        return Err("Session expired. Run 'eldirecto auth login' again.".into());
    }
    for (kind, error) in &report.failures {
        eprintln!(
            "Warning: could not load {} ({}); showing the last known copy",
            kind, error
        );
    }

    Ok(store)
}

/// Finds a record by exact id or unique id prefix.
pub fn find<'a, T: Record>(records: &'a [T], identifier: &str) -> Result<&'a T, String> {
    if let Some(record) = records.iter().find(|r| r.id() == identifier) {
        return Ok(record);
    }

    let matches: Vec<&T> = records
        .iter()
        .filter(|r| r.id().starts_with(identifier))
        .collect();
    match matches.as_slice() {
        [record] => Ok(record),
        [] => Err(format!("No {} record matches '{}'", T::KIND, identifier)),
        _ => Err(format!(
            "'{}' matches {} {} records; use more of the id",
            identifier,
            matches.len(),
            T::KIND
        )),
    }
}

pub fn print_save(outcome: SaveOutcome) {
    match outcome {
        SaveOutcome::NoChanges => println!("No changes to save."),
        SaveOutcome::Saved { created, updated } => {
            println!("Saved: {} created, {} updated", created, updated)
        }
    }
}

/// Asks a yes/no question on stdin. Anything but "y" is no.
pub fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
