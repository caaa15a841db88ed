use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    AboutCommand, AuthCommand, CarouselCommand, ConfigCommand, ContactCommand, MailCommand,
    ScheduleCommand, StatusCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "eldirecto")]
#[command(version)]
#[command(about = "Content administration for the El Directo website", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to or out of the content gateway
    Auth(AuthCommand),

    /// Show session and per-collection load state
    Status(StatusCommand),

    /// Manage the home page carousel
    Carousel(CarouselCommand),

    /// Manage branch contact details
    Contact(ContactCommand),

    /// Manage branch opening hours
    Schedule(ScheduleCommand),

    /// Show or replace the "about us" text
    About(AboutCommand),

    /// Send a contact form message
    Mail(MailCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Auth(cmd)) => cmd.run(&config).await?,
        Some(Commands::Status(cmd)) => cmd.run(&config).await?,
        Some(Commands::Carousel(cmd)) => cmd.run(&config).await?,
        Some(Commands::Contact(cmd)) => cmd.run(&config).await?,
        Some(Commands::Schedule(cmd)) => cmd.run(&config).await?,
        Some(Commands::About(cmd)) => cmd.run(&config).await?,
        Some(Commands::Mail(cmd)) => cmd.run(&config).await?,
        Some(Commands::Config(cmd)) => cmd.run(&config)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
