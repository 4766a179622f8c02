use std::collections::HashSet;

use tracing::info;

use crate::model::{MembershipDelta, UserRecord};
use crate::policy::EligibilityPolicy;

/// Outcome of comparing the organization listing against the group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDiff {
    /// Organization members that satisfy the policy, in or out of the group.
    pub eligible_count: usize,
    pub additions: MembershipDelta,
}

/// Eligible organization members that are not yet in the group.
///
/// Output follows the order of `org_members`. Duplicate usernames in the
/// organization listing are kept as duplicates.
pub fn compute_additions(
    policy: &EligibilityPolicy,
    group_members: &[UserRecord],
    org_members: &[UserRecord],
) -> MembershipDelta {
    diff_members(policy, group_members, org_members).additions
}

/// Same as [`compute_additions`], also reporting how many organization
/// members were eligible.
pub fn diff_members(
    policy: &EligibilityPolicy,
    group_members: &[UserRecord],
    org_members: &[UserRecord],
) -> MemberDiff {
    let in_group: HashSet<&str> = group_members.iter().map(|u| u.username.as_str()).collect();

    let eligible: Vec<&UserRecord> = org_members
        .iter()
        .filter(|u| policy.is_eligible(u))
        .collect();
    let eligible_count = eligible.len();
    info!(eligible = eligible_count, "eligible organization members");

    let additions = eligible
        .into_iter()
        .filter(|u| !in_group.contains(u.username.as_str()))
        .map(|u| u.username.clone())
        .collect();

    MemberDiff {
        eligible_count,
        additions,
    }
}
