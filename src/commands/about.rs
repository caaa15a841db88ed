use clap::{Args, Subcommand};
use eldirecto_core::AboutContent;
use std::path::PathBuf;

use super::{load_store, print_save, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct AboutCommand {
    #[command(subcommand)]
    pub command: AboutSubcommand,
}

#[derive(Subcommand)]
pub enum AboutSubcommand {
    /// Show the "about us" text
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Replace the "about us" text
    Set {
        /// New text; paragraphs separated by blank lines
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        text: Option<String>,

        /// Read the text from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

impl AboutCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let mut store = load_store(config).await?;

        match &self.command {
            AboutSubcommand::Show { format } => {
                let about = &store.snapshot().about;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(about)?),
                    OutputFormat::Text => {
                        let paragraphs = about.paragraphs();
                        if paragraphs.is_empty() {
                            println!("No about text");
                        }
                        for paragraph in paragraphs {
                            println!("{}\n", paragraph);
                        }
                    }
                }
                Ok(())
            }

            AboutSubcommand::Set { text, file } => {
                let content = match (text, file) {
                    (Some(text), _) => text.clone(),
                    (None, Some(path)) => std::fs::read_to_string(path)
                        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?,
                    (None, None) => return Err("Provide the text or --file".into()),
                };

                let about = AboutContent {
                    id: store.snapshot().about.id.clone(),
                    content: content.trim().to_string(),
                };
                store.update_collection(vec![about]);
                print_save(store.save::<AboutContent>().await?);
                Ok(())
            }
        }
    }
}
