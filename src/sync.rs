//! End-to-end run: authenticate, list both collections, diff, report and
//! optionally apply.

use chrono::Utc;
use std::path::PathBuf;
use tracing::{error, info, instrument};

use crate::batch::apply_in_batches;
use crate::config::{Config, SyncMode};
use crate::diff::diff_members;
use crate::error::SyncError;
use crate::model::{Credentials, MembershipDelta, Token};
use crate::paginate::fetch_all;
use crate::policy::EligibilityPolicy;
use crate::portal::{Listing, PortalService};
use crate::report::{write_delta, SyncOutcome, SyncReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub page_size: u32,
    pub batch_size: usize,
    pub token_expiration_minutes: u32,
    pub output_dir: PathBuf,
    pub mode: SyncMode,
    pub policy: EligibilityPolicy,
}

impl SyncSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            page_size: cfg.portal.page_size,
            batch_size: cfg.portal.batch_size,
            token_expiration_minutes: cfg.portal.token_expiration_minutes,
            output_dir: PathBuf::from(&cfg.sync.output_dir),
            mode: cfg.sync.mode,
            policy: EligibilityPolicy::from_config(&cfg.policy),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Values fixed at authentication and read-only for the rest of a run.
#[derive(Debug)]
struct Session {
    token: Token,
    group_id: String,
}

pub struct Synchronizer<P> {
    portal: P,
    settings: SyncSettings,
}

impl<P: PortalService> Synchronizer<P> {
    pub fn new(portal: P, settings: SyncSettings) -> Self {
        Self { portal, settings }
    }

    /// Run every step once. The first failing step aborts the run.
    #[instrument(skip_all, fields(group_id = %group_id, mode = self.settings.mode.as_str()))]
    pub async fn run(
        &self,
        credentials: &Credentials,
        group_id: &str,
    ) -> Result<SyncReport, SyncError> {
        let session = self.authenticate(credentials, group_id).await?;

        info!(group_id = %session.group_id, "fetching group members");
        let group_members = fetch_all(
            &self.portal,
            &session.token,
            &Listing::group(&session.group_id),
            self.settings.page_size,
        )
        .await?;
        info!(count = group_members.len(), "group members fetched");

        info!("fetching organization members");
        let org_members = fetch_all(
            &self.portal,
            &session.token,
            &Listing::OrgMembers,
            self.settings.page_size,
        )
        .await?;
        info!(count = org_members.len(), "organization members fetched");

        let diff = diff_members(&self.settings.policy, &group_members, &org_members);
        let delta = diff.additions;

        let mut report = SyncReport {
            group_id: session.group_id.clone(),
            group_member_count: group_members.len(),
            org_member_count: org_members.len(),
            eligible_member_count: diff.eligible_count,
            outcome: SyncOutcome::NoChanges,
        };

        if delta.is_empty() {
            info!(group_id = %session.group_id, "no members to add");
            return Ok(report);
        }
        info!(count = delta.len(), "members to add");

        let report_path = write_delta(&self.settings.output_dir, &delta, Utc::now()).await?;
        info!(path = %report_path.display(), "wrote usernames to add");

        let batches_applied = match self.settings.mode {
            SyncMode::DryRun => {
                info!("dry run; group membership left unchanged");
                None
            }
            SyncMode::Apply => Some(self.apply(&session, &delta).await?),
        };

        report.outcome = SyncOutcome::Additions {
            usernames: delta,
            report_path,
            batches_applied,
        };
        Ok(report)
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
        group_id: &str,
    ) -> Result<Session, SyncError> {
        info!(username = %credentials.username, "requesting token");
        let token = self
            .portal
            .generate_token(credentials, self.settings.token_expiration_minutes)
            .await
            .map_err(|err| {
                error!(%err, "unable to retrieve token");
                err
            })?;
        if let Some(expires_at) = token.expires_at() {
            info!(%expires_at, "token issued");
        }
        Ok(Session {
            token,
            group_id: group_id.to_string(),
        })
    }

    #[instrument(skip_all, fields(count = delta.len()))]
    async fn apply(&self, session: &Session, delta: &MembershipDelta) -> Result<usize, SyncError> {
        let portal = &self.portal;
        let token = &session.token;
        let group_id = session.group_id.as_str();
        let applied = apply_in_batches(delta, self.settings.batch_size, move |batch| async move {
            portal.add_users(token, group_id, &batch).await
        })
        .await?;
        info!(batches = applied, "finished adding members to group");
        Ok(applied)
    }
}
