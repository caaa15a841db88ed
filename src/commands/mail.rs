use chrono::Utc;
use clap::{Args, Subcommand};
use eldirecto_core::mail::submit;
use eldirecto_core::throttle::format_remaining;
use eldirecto_core::{ContactError, ContactMessage, HttpGateway, SubmissionThrottle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;

#[derive(Args)]
pub struct MailCommand {
    #[command(subcommand)]
    pub command: MailSubcommand,
}

#[derive(Subcommand)]
pub enum MailSubcommand {
    /// Send a message through the public contact form
    Send {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        company: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long)]
        message: String,

        /// Wait out the cooldown instead of failing
        #[arg(long)]
        wait: bool,
    },
}

fn throttle_path(data_dir: &Path) -> PathBuf {
    data_dir.join("throttle.json")
}

/// Reads the saved throttle. A missing or unreadable file starts fresh.
fn load_throttle(data_dir: &Path) -> SubmissionThrottle {
    std::fs::read_to_string(throttle_path(data_dir))
        .ok()
        .and_then(|contents| serde_json::from_str(&contents).ok())
        .unwrap_or_default()
}

fn save_throttle(data_dir: &Path, throttle: &SubmissionThrottle) -> io::Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let json = serde_json::to_string(throttle).map_err(io::Error::other)?;
    std::fs::write(throttle_path(data_dir), json)
}

/// Prints a countdown until `remaining` has passed.
async fn wait_out(remaining: Duration) -> io::Result<()> {
    let mut left = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    let mut ticks = tokio::time::interval(Duration::from_secs(1));
    while left > 0 {
        ticks.tick().await;
        print!(
            "\rYou can send again in {}  ",
            format_remaining(&Duration::from_secs(left))
        );
        io::stdout().flush()?;
        left -= 1;
    }
    ticks.tick().await;
    println!();
    Ok(())
}

impl MailCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            MailSubcommand::Send {
                name,
                company,
                email,
                phone,
                message,
                wait,
            } => {
                let data_dir = &config.data_dir.value;
                let gateway = HttpGateway::new(config.gateway_url.value.clone());
                let mut throttle = load_throttle(data_dir);
                let message = ContactMessage {
                    name: name.clone(),
                    company: company.clone(),
                    email: email.clone(),
                    phone: phone.clone(),
                    message: message.clone(),
                };

                let mut result = submit(&gateway, &mut throttle, &message, Utc::now()).await;
                if *wait {
                    if let Err(ContactError::Throttled { remaining }) = result {
                        wait_out(remaining).await?;
                        result = submit(&gateway, &mut throttle, &message, Utc::now()).await;
                    }
                }
                result?;

                save_throttle(data_dir, &throttle)?;
                println!("Message sent. Thank you, {}.", message.name.trim());
                Ok(())
            }
        }
    }
}
