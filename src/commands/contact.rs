use clap::{Args, Subcommand};
use eldirecto_core::ContactEntry;

use super::{confirm, find, load_store, print_save, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct ContactCommand {
    #[command(subcommand)]
    pub command: ContactSubcommand,
}

#[derive(Subcommand)]
pub enum ContactSubcommand {
    /// List branch contact details
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a branch
    Add {
        /// Branch name
        branch_name: String,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        email: Option<String>,

        /// WhatsApp number
        #[arg(long)]
        whatsapp: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },

    /// Edit a branch's contact details
    Edit {
        /// Entry id (or unique prefix)
        id: String,

        #[arg(long)]
        branch_name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Email (empty string to clear)
        #[arg(long)]
        email: Option<String>,

        /// WhatsApp number (empty string to clear)
        #[arg(long)]
        whatsapp: Option<String>,

        /// Address (empty string to clear)
        #[arg(long)]
        address: Option<String>,
    },

    /// Delete a branch
    Delete {
        /// Entry id (or unique prefix)
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

/// `Some("")` clears an optional field.
fn apply_optional(field: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = value {
        *field = if value.trim().is_empty() {
            None
        } else {
            Some(value.clone())
        };
    }
}

impl ContactCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let mut store = load_store(config).await?;

        match &self.command {
            ContactSubcommand::List { format } => {
                let entries = store.working::<ContactEntry>();
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
                    OutputFormat::Text => {
                        if entries.is_empty() {
                            println!("No branches");
                        }
                        for entry in entries {
                            println!("{}", entry);
                            println!("  id: {}\n", entry.id);
                        }
                    }
                }
                Ok(())
            }

            ContactSubcommand::Add {
                branch_name,
                phone,
                email,
                whatsapp,
                address,
            } => {
                if branch_name.trim().is_empty() {
                    return Err("Branch name cannot be empty".into());
                }
                let mut entry = ContactEntry::new(branch_name.trim(), phone);
                apply_optional(&mut entry.email, email);
                apply_optional(&mut entry.whatsapp_number, whatsapp);
                apply_optional(&mut entry.address, address);

                store.stage(entry)?;
                print_save(store.save::<ContactEntry>().await?);
                Ok(())
            }

            ContactSubcommand::Edit {
                id,
                branch_name,
                phone,
                email,
                whatsapp,
                address,
            } => {
                let mut entry = find(store.working::<ContactEntry>(), id)?.clone();
                if let Some(name) = branch_name {
                    entry.branch_name = name.clone();
                }
                if let Some(phone) = phone {
                    entry.phone = phone.clone();
                }
                apply_optional(&mut entry.email, email);
                apply_optional(&mut entry.whatsapp_number, whatsapp);
                apply_optional(&mut entry.address, address);

                store.stage(entry)?;
                print_save(store.save::<ContactEntry>().await?);
                Ok(())
            }

            ContactSubcommand::Delete { id, force } => {
                let entry = find(store.working::<ContactEntry>(), id)?.clone();
                if !force && !confirm(&format!("Delete branch '{}'?", entry.branch_name))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                store.delete::<ContactEntry>(&entry.id).await?;
                println!("Deleted branch: {}", entry.branch_name);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_optional() {
        let mut field = Some("old".to_string());
        apply_optional(&mut field, &None);
        assert_eq!(field.as_deref(), Some("old"));

        apply_optional(&mut field, &Some("new".to_string()));
        assert_eq!(field.as_deref(), Some("new"));

        apply_optional(&mut field, &Some(" ".to_string()));
        assert!(field.is_none());
    }
}
