use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::adapters::JsonFileSnapshotStore;
use crate::config::Config;
use crate::domain::{Campaign, CampaignId, CampaignStatus};
use crate::services::{DonationLedger, LifecycleManager};
use crate::store::{CampaignFilter, CampaignStore};

#[derive(Parser)]
#[command(name = "fundraiser-ledger")]
#[command(about = "Campaign verification workflow and donation ledger", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Campaign review commands
    #[command(subcommand)]
    Campaigns(CampaignCommands),

    /// Donation ledger commands
    #[command(subcommand)]
    Donations(DonationCommands),

    /// Print campaign counts and total raised
    Summary,

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum CampaignCommands {
    /// List campaigns, optionally by status
    List {
        #[arg(short, long)]
        status: Option<CampaignStatus>,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one campaign as JSON
    Show {
        #[arg(value_name = "ID")]
        id: CampaignId,
    },
    /// Approve a pending campaign
    Approve {
        #[arg(value_name = "ID")]
        id: CampaignId,
    },
    /// Reject a pending campaign
    Reject {
        #[arg(value_name = "ID")]
        id: CampaignId,
        #[arg(short, long, default_value = "")]
        reason: String,
    },
    /// Send a rejected campaign back to review
    Resubmit {
        #[arg(value_name = "ID")]
        id: CampaignId,
    },
    /// Delete an approved campaign
    Delete {
        #[arg(value_name = "ID")]
        id: CampaignId,
    },
}

#[derive(Subcommand)]
pub enum DonationCommands {
    /// Print the donation history of one campaign
    History {
        #[arg(value_name = "ID")]
        id: CampaignId,
    },
}

pub async fn open_store(config: &Config) -> anyhow::Result<Arc<CampaignStore>> {
    let backend = Arc::new(JsonFileSnapshotStore::new(config.data_file.clone()));
    let store = CampaignStore::open(backend).await?;
    Ok(Arc::new(store))
}

pub async fn handle_campaigns(config: &Config, command: CampaignCommands) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let lifecycle = LifecycleManager::with_window(store, config.campaign_window());

    match command {
        CampaignCommands::List { status, category } => {
            let filter = CampaignFilter {
                status,
                category,
            };
            let campaigns = lifecycle.list(&filter).await;
            if campaigns.is_empty() {
                println!("No campaigns found");
                return Ok(());
            }
            print_table(&campaigns);
        }
        CampaignCommands::Show { id } => {
            let campaign = lifecycle.get(id).await?;
            println!("{}", serde_json::to_string_pretty(&campaign)?);
        }
        CampaignCommands::Approve { id } => {
            let campaign = lifecycle.approve(id).await?;
            println!(
                "✓ Campaign {} approved, open until {}",
                id,
                campaign
                    .end_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            );
        }
        CampaignCommands::Reject { id, reason } => {
            let campaign = lifecycle.reject(id, &reason).await?;
            println!(
                "✓ Campaign {} rejected: {}",
                id,
                campaign.rejection_reason.unwrap_or_default()
            );
        }
        CampaignCommands::Resubmit { id } => {
            lifecycle.resubmit(id).await?;
            println!("✓ Campaign {} back in review", id);
        }
        CampaignCommands::Delete { id } => match lifecycle.delete(id).await? {
            Some(_) => println!("✓ Campaign {} deleted", id),
            None => println!("Campaign {} does not exist, nothing to delete", id),
        },
    }

    Ok(())
}

pub async fn handle_donations(config: &Config, command: DonationCommands) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let ledger = DonationLedger::new(store);

    match command {
        DonationCommands::History { id } => {
            let history = ledger.history(id).await;
            let mut count = 0;
            println!("{:<38} {:<14} {:<44} {:<20}", "Donation", "Amount", "Donor", "Timestamp");
            println!("{}", "-".repeat(118));
            for donation in &history {
                count += 1;
                println!(
                    "{:<38} {:<14} {:<44} {:<20}",
                    donation.id,
                    donation.amount.to_string(),
                    donation.donor_address,
                    donation.timestamp.format("%Y-%m-%d %H:%M:%S")
                );
            }
            println!("{} donation(s), {} total", count, history.total());
        }
    }

    Ok(())
}

pub async fn handle_summary(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let summary = DonationLedger::new(store).summary().await;

    println!("Pending:      {}", summary.pending);
    println!("Approved:     {}", summary.approved);
    println!("Rejected:     {}", summary.rejected);
    println!("Completed:    {}", summary.completed);
    println!("Donations:    {}", summary.donations);
    println!("Total raised: {}", summary.total_raised);

    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");
    config.validate()?;

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Data File: {}", config.data_file.display());
    println!("  Campaign Window: {} days", config.campaign_window_days);
    println!("  Log Format: {:?}", config.log_format);

    println!("✓ Configuration is valid");

    Ok(())
}

fn print_table(campaigns: &[Campaign]) {
    println!(
        "{:<6} {:<32} {:<24} {:<10} {:>10} {:>10}",
        "ID", "Title", "Organization", "Status", "Goal", "Raised"
    );
    println!("{}", "-".repeat(97));
    for campaign in campaigns {
        println!(
            "{:<6} {:<32} {:<24} {:<10} {:>10} {:>10}",
            campaign.id,
            truncate(&campaign.title, 32),
            truncate(&campaign.organization, 24),
            campaign.status,
            campaign.goal_amount.to_string(),
            campaign.raised_amount.to_string()
        );
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reject_command() {
        let cli = Cli::try_parse_from([
            "fundraiser-ledger",
            "campaigns",
            "reject",
            "2",
            "--reason",
            "missing license",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Campaigns(CampaignCommands::Reject { id, reason })) => {
                assert_eq!(id, CampaignId(2));
                assert_eq!(reason, "missing license");
            }
            _ => panic!("expected reject command"),
        }
    }

    #[test]
    fn parses_status_filter() {
        let cli = Cli::try_parse_from(["fundraiser-ledger", "campaigns", "list", "-s", "approved"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Campaigns(CampaignCommands::List {
                status: Some(CampaignStatus::Approved),
                ..
            }))
        ));
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["fundraiser-ledger"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn truncates_long_titles() {
        assert_eq!(truncate("Clean Water", 32), "Clean Water");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
