use clap::Args;
use eldirecto_core::{CollectionKind, ContentSnapshot, DurableMirror, LoadState};
use serde::Serialize;

use super::{open_store, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct StatusCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct CollectionStatus {
    collection: CollectionKind,
    state: LoadState,
    records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct Status {
    gateway: String,
    authenticated: bool,
    mirror: Option<String>,
    collections: Vec<CollectionStatus>,
}

fn record_count(snapshot: &ContentSnapshot, kind: CollectionKind) -> usize {
    match kind {
        CollectionKind::Carousel => snapshot.carousel.len(),
        CollectionKind::Contact => snapshot.contact.len(),
        CollectionKind::Schedule => snapshot.schedule.len(),
        CollectionKind::About => usize::from(!snapshot.about.content.is_empty()),
    }
}

impl StatusCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let mut store = open_store(config);

        let mut failures = Vec::new();
        if store.is_authenticated() {
            let report = store.load_all().await?;
            failures = report.failures;
        }

        let mirror = DurableMirror::new(config.data_dir.value.clone());
        let mirror = mirror.exists().then(|| mirror.path().display().to_string());
        let status = Status {
            gateway: config.gateway_url.value.clone(),
            authenticated: store.is_authenticated(),
            mirror,
            collections: CollectionKind::ALL
                .iter()
                .map(|&kind| CollectionStatus {
                    collection: kind,
                    state: store.state(kind),
                    records: record_count(store.snapshot(), kind),
                    error: failures
                        .iter()
                        .find(|(failed, _)| *failed == kind)
                        .map(|(_, e)| e.to_string()),
                })
                .collect(),
        };

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
            OutputFormat::Text => {
                println!("Gateway: {}", status.gateway);
                if status.authenticated {
                    println!("Session: logged in");
                } else {
                    println!("Session: not logged in (showing local copy)");
                }
                match &status.mirror {
                    Some(path) => println!("Mirror:  {}", path),
                    None => println!("Mirror:  (empty)"),
                }
                println!();

                for c in &status.collections {
                    print!(
                        "{:<10} {:<18} {:>3} record(s)",
                        c.collection.to_string(),
                        c.state.to_string(),
                        c.records
                    );
                    if let Some(error) = &c.error {
                        print!("  ! {}", error);
                    }
                    println!();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eldirecto_core::{AboutContent, ContactEntry};

    #[test]
    fn test_record_count() {
        let mut snapshot = ContentSnapshot::default();
        assert_eq!(record_count(&snapshot, CollectionKind::About), 0);

        snapshot.about = AboutContent::new("Desde 1960.");
        snapshot.contact.push(ContactEntry::new("Rosario", "1"));
        assert_eq!(record_count(&snapshot, CollectionKind::About), 1);
        assert_eq!(record_count(&snapshot, CollectionKind::Contact), 1);
        assert_eq!(record_count(&snapshot, CollectionKind::Carousel), 0);
    }
}
