use clap::{Args, Subcommand};
use eldirecto_core::{CarouselItem, Direction, ImageRef, MoveOutcome};

use super::{confirm, find, load_store, print_save, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct CarouselCommand {
    #[command(subcommand)]
    pub command: CarouselSubcommand,
}

#[derive(Subcommand)]
pub enum CarouselSubcommand {
    /// List slides in display order
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a slide at the end
    Add {
        /// Slide title
        title: String,

        /// Text shown under the title
        #[arg(long, default_value = "")]
        description: String,

        /// Public image URI
        #[arg(long, conflicts_with = "blob")]
        image: Option<String>,

        /// Key of an uploaded image blob
        #[arg(long)]
        blob: Option<String>,
    },

    /// Edit a slide
    Edit {
        /// Slide id (or unique prefix)
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, conflicts_with = "blob")]
        image: Option<String>,

        #[arg(long)]
        blob: Option<String>,
    },

    /// Move a slide one position up or down
    Move {
        /// Slide id (or unique prefix)
        id: String,

        /// up or down
        direction: Direction,
    },

    /// Delete a slide
    Delete {
        /// Slide id (or unique prefix)
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

fn image_ref(image: &Option<String>, blob: &Option<String>) -> Option<ImageRef> {
    match (image, blob) {
        (Some(uri), _) => Some(ImageRef::uri(uri.clone())),
        (None, Some(key)) => Some(ImageRef::blob(key.clone())),
        (None, None) => None,
    }
}

fn print_slides(items: &[CarouselItem]) {
    if items.is_empty() {
        println!("No slides");
        return;
    }
    for item in items {
        println!("{}", item);
        println!("   id: {}", item.id);
    }
}

impl CarouselCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let mut store = load_store(config).await?;

        match &self.command {
            CarouselSubcommand::List { format } => {
                let items = store.working::<CarouselItem>();
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
                    OutputFormat::Text => print_slides(items),
                }
                Ok(())
            }

            CarouselSubcommand::Add {
                title,
                description,
                image,
                blob,
            } => {
                if title.trim().is_empty() {
                    return Err("Slide title cannot be empty".into());
                }
                let image = image_ref(image, blob).ok_or("Provide --image or --blob")?;

                store.append(CarouselItem::new(image, title.trim(), description))?;
                print_save(store.save::<CarouselItem>().await?);
                print_slides(store.working::<CarouselItem>());
                Ok(())
            }

            CarouselSubcommand::Edit {
                id,
                title,
                description,
                image,
                blob,
            } => {
                let mut item = find(store.working::<CarouselItem>(), id)?.clone();
                if let Some(title) = title {
                    item.title = title.clone();
                }
                if let Some(description) = description {
                    item.description = description.clone();
                }
                if let Some(image) = image_ref(image, blob) {
                    item.image = image;
                }

                store.stage(item)?;
                print_save(store.save::<CarouselItem>().await?);
                Ok(())
            }

            CarouselSubcommand::Move { id, direction } => {
                let item = find(store.working::<CarouselItem>(), id)?.clone();
                match store.move_record::<CarouselItem>(&item.id, *direction).await? {
                    MoveOutcome::Unchanged => {
                        let edge = match direction {
                            Direction::Up => "top",
                            Direction::Down => "bottom",
                        };
                        println!("'{}' is already at the {}.", item.title, edge);
                    }
                    MoveOutcome::Moved(items) => print_slides(&items),
                }
                Ok(())
            }

            CarouselSubcommand::Delete { id, force } => {
                let item = find(store.working::<CarouselItem>(), id)?.clone();
                if !force && !confirm(&format!("Delete slide '{}'?", item.title))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                store.delete::<CarouselItem>(&item.id).await?;
                println!("Deleted slide: {}", item.title);
                Ok(())
            }
        }
    }
}
