use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use ago_group_sync::config::{self, SyncMode};
use ago_group_sync::model::Credentials;
use ago_group_sync::portal::PortalClient;
use ago_group_sync::report::SyncOutcome;
use ago_group_sync::sync::{SyncSettings, Synchronizer};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Adds organization accounts matching the membership policy to a portal group"
)]
struct Args {
    /// Path to YAML config file; built-in defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Portal username (defaults to sync.default_username)
    #[arg(long)]
    username: Option<String>,

    /// Portal password (case sensitive)
    #[arg(long)]
    password: String,

    /// Item id of the group to update (defaults to sync.default_group)
    #[arg(long)]
    group: Option<String>,

    /// Directory the users_<timestamp>.yml report is written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Add the missing members instead of only reporting them
    #[arg(long, conflicts_with = "dry_run")]
    apply: bool,

    /// Only report the missing members (overrides sync.mode: apply)
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut cfg = config::load(args.config.as_deref())?;
    if let Some(dir) = &args.output_dir {
        cfg.sync.output_dir = dir.to_string_lossy().to_string();
    }
    if args.apply {
        cfg.sync.mode = SyncMode::Apply;
    } else if args.dry_run {
        cfg.sync.mode = SyncMode::DryRun;
    }
    config::validate(&cfg)?;
    cfg.ensure_dirs()
        .with_context(|| format!("failed to create output dir {}", cfg.sync.output_dir))?;

    let username = args
        .username
        .unwrap_or_else(|| cfg.sync.default_username.clone());
    let group_id = args.group.unwrap_or_else(|| cfg.sync.default_group.clone());
    let credentials = Credentials::new(username, args.password);

    let portal = PortalClient::new(&cfg.portal.base_url)?;
    info!(base_url = %portal.base_url(), mode = cfg.sync.mode.as_str(), "connecting to portal");
    let synchronizer = Synchronizer::new(portal, SyncSettings::from_config(&cfg));

    let report = match synchronizer.run(&credentials, &group_id).await {
        Ok(report) => report,
        Err(err) => {
            error!(?err, "sync run failed");
            return Err(err.into());
        }
    };

    info!(
        group_members = report.group_member_count,
        org_members = report.org_member_count,
        eligible = report.eligible_member_count,
        "membership summary"
    );

    match &report.outcome {
        SyncOutcome::NoChanges => {
            info!(group_id = %report.group_id, "there are no members to be added to the group");
        }
        SyncOutcome::Additions {
            usernames,
            report_path,
            batches_applied,
        } => {
            if usernames.len() == 1 {
                info!(group_id = %report.group_id, "there is 1 member to add to the group");
            } else {
                info!(
                    group_id = %report.group_id,
                    count = usernames.len(),
                    "there are members to add to the group"
                );
            }
            info!(path = %report_path.display(), "usernames written");
            println!("********************");
            println!("{}", usernames.join(","));
            println!("********************");
            match batches_applied {
                Some(batches) => info!(batches, "finished updating group members"),
                None => info!("dry run complete; rerun with --apply to add these members"),
            }
        }
    }

    Ok(())
}
