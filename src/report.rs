//! The usernames-to-add artifact and the run summary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::SyncError;

/// What a completed run found and did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub group_id: String,
    pub group_member_count: usize,
    pub org_member_count: usize,
    /// Organization members matching the policy, whether or not already in the group.
    pub eligible_member_count: usize,
    pub outcome: SyncOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Every eligible organization member is already in the group.
    NoChanges,
    Additions {
        usernames: Vec<String>,
        report_path: PathBuf,
        /// `None` on a dry run.
        batches_applied: Option<usize>,
    },
}

impl SyncReport {
    pub fn usernames(&self) -> &[String] {
        match &self.outcome {
            SyncOutcome::NoChanges => &[],
            SyncOutcome::Additions { usernames, .. } => usernames,
        }
    }
}

pub fn report_file_name(now: DateTime<Utc>) -> String {
    format!("users_{}.yml", now.timestamp_millis())
}

/// Write `usernames` as a YAML sequence to `users_<millis>.yml` in `dir`.
///
/// An existing file with the same name is never overwritten.
pub async fn write_delta(
    dir: &Path,
    usernames: &[String],
    now: DateTime<Utc>,
) -> Result<PathBuf, SyncError> {
    let path = dir.join(report_file_name(now));
    let yaml = serde_yaml::to_string(usernames)?;
    let report_err = |source| SyncError::Report {
        path: path.clone(),
        source,
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(report_err)?;
    file.write_all(yaml.as_bytes()).await.map_err(report_err)?;
    file.flush().await.map_err(report_err)?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn fixed_now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_123).unwrap()
    }

    #[test]
    fn file_name_is_timestamped() {
        assert_eq!(report_file_name(fixed_now()), "users_1700000000123.yml");
    }

    #[tokio::test]
    async fn writes_yaml_sequence() {
        let td = tempdir().unwrap();
        let names = vec!["a_governmentofbc".to_string(), "b_governmentofbc".to_string()];
        let path = write_delta(td.path(), &names, fixed_now()).await.unwrap();
        assert_eq!(path, td.path().join("users_1700000000123.yml"));

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<String> = serde_yaml::from_str(&content).unwrap();
        assert_eq!(parsed, names);
    }

    #[tokio::test]
    async fn never_overwrites() {
        let td = tempdir().unwrap();
        let names = vec!["a_governmentofbc".to_string()];
        write_delta(td.path(), &names, fixed_now()).await.unwrap();
        let err = write_delta(td.path(), &["other".to_string()], fixed_now())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Report { .. }));

        let existing = td.path().join(report_file_name(fixed_now()));
        let content = std::fs::read_to_string(existing).unwrap();
        assert!(content.contains("a_governmentofbc"));
    }
}
