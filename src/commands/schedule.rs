use clap::{Args, Subcommand};
use eldirecto_core::ordering::group_by_branch;
use eldirecto_core::{BranchRef, Direction, MoveOutcome, ScheduleEntry};

use super::{confirm, find, load_store, print_save, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct ScheduleCommand {
    #[command(subcommand)]
    pub command: ScheduleSubcommand,
}

#[derive(Subcommand)]
pub enum ScheduleSubcommand {
    /// Show opening hours grouped by branch
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a row at the end of a branch's schedule
    Add {
        /// Branch id
        #[arg(long)]
        branch_id: String,

        /// Branch display name
        #[arg(long)]
        branch_name: String,

        /// Day label, e.g. "Lunes a Viernes"
        day: String,

        /// Hours, e.g. "07:00 - 18:00"
        hours: String,
    },

    /// Edit a schedule row
    Edit {
        /// Row id (or unique prefix)
        id: String,

        #[arg(long)]
        day: Option<String>,

        #[arg(long)]
        hours: Option<String>,
    },

    /// Move a row one position within its branch
    Move {
        /// Row id (or unique prefix)
        id: String,

        /// up or down
        direction: Direction,
    },

    /// Delete a schedule row
    Delete {
        /// Row id (or unique prefix)
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

fn print_schedule(entries: &[ScheduleEntry]) {
    let branches = group_by_branch(entries);
    if branches.is_empty() {
        println!("No schedule rows");
        return;
    }
    for branch in branches {
        println!("{}", branch.branch.name);
        for entry in &branch.entries {
            let short_id = entry.id.get(..8).unwrap_or(&entry.id);
            println!("  {}  [{}]", entry, short_id);
        }
        println!();
    }
}

impl ScheduleCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let mut store = load_store(config).await?;

        match &self.command {
            ScheduleSubcommand::List { format } => {
                let entries = store.working::<ScheduleEntry>();
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(entries)?)
                    }
                    OutputFormat::Text => print_schedule(entries),
                }
                Ok(())
            }

            ScheduleSubcommand::Add {
                branch_id,
                branch_name,
                day,
                hours,
            } => {
                if day.trim().is_empty() {
                    return Err("Day label cannot be empty".into());
                }
                let branch = BranchRef::new(branch_id.trim(), branch_name.trim());
                store.append(ScheduleEntry::new(branch, day.trim(), hours.trim()))?;

                print_save(store.save::<ScheduleEntry>().await?);
                print_schedule(store.working::<ScheduleEntry>());
                Ok(())
            }

            ScheduleSubcommand::Edit { id, day, hours } => {
                let mut entry = find(store.working::<ScheduleEntry>(), id)?.clone();
                if let Some(day) = day {
                    entry.day_label = day.trim().to_string();
                }
                if let Some(hours) = hours {
                    entry.hours_text = hours.trim().to_string();
                }

                store.stage(entry)?;
                print_save(store.save::<ScheduleEntry>().await?);
                Ok(())
            }

            ScheduleSubcommand::Move { id, direction } => {
                let entry = find(store.working::<ScheduleEntry>(), id)?.clone();
                match store
                    .move_record::<ScheduleEntry>(&entry.id, *direction)
                    .await?
                {
                    MoveOutcome::Unchanged => println!(
                        "'{}' is already {} in {}.",
                        entry.day_label,
                        match direction {
                            Direction::Up => "first",
                            Direction::Down => "last",
                        },
                        entry.branch.name
                    ),
                    MoveOutcome::Moved(entries) => print_schedule(&entries),
                }
                Ok(())
            }

            ScheduleSubcommand::Delete { id, force } => {
                let entry = find(store.working::<ScheduleEntry>(), id)?.clone();
                let prompt = format!(
                    "Delete '{}' from {}?",
                    entry.day_label, entry.branch.name
                );
                if !force && !confirm(&prompt)? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                store.delete::<ScheduleEntry>(&entry.id).await?;
                println!("Deleted {} row: {}", entry.branch.name, entry.day_label);
                Ok(())
            }
        }
    }
}
