use crate::config;
use crate::model::UserRecord;

/// Decides which organization accounts belong in the group.
///
/// Matching is case-sensitive and applied to the raw values: no trimming,
/// no case folding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityPolicy {
    account_marker: String,
    email_domain: String,
}

impl EligibilityPolicy {
    pub fn new(account_marker: impl Into<String>, email_domain: impl Into<String>) -> Self {
        Self {
            account_marker: account_marker.into(),
            email_domain: email_domain.into(),
        }
    }

    pub fn from_config(cfg: &config::Policy) -> Self {
        Self::new(cfg.account_marker.clone(), cfg.email_domain.clone())
    }

    pub fn is_eligible(&self, user: &UserRecord) -> bool {
        user.username.contains(&self.account_marker) && user.email.ends_with(&self.email_domain)
    }
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self::from_config(&config::Policy::default())
    }
}
