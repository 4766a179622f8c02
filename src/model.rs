use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A portal account as returned by the listing endpoints.
///
/// Group listings may omit `email`; it then decodes as an empty string and
/// never satisfies the eligibility policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl UserRecord {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            attributes: Map::new(),
        }
    }
}

/// Usernames to add, in the order they were found in the organization listing.
pub type MembershipDelta = Vec<String>;

/// 1-based page index into a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// 1-based offset of the first record on this page.
    pub fn start(&self) -> u64 {
        let size = u64::from(self.page_size);
        (u64::from(self.page) * size + 1).saturating_sub(size)
    }
}

/// Where the listing continues after a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    More(i64),
    Done,
}

impl NextPage {
    /// `-1` is the portal's end-of-listing marker. Every other value,
    /// `0` included, means another page exists.
    pub fn from_next_start(next_start: i64) -> Self {
        if next_start == -1 {
            NextPage::Done
        } else {
            NextPage::More(next_start)
        }
    }

    pub fn has_more(&self) -> bool {
        matches!(self, NextPage::More(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub users: Vec<UserRecord>,
    pub next: NextPage,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Bearer token issued for one run. Never refreshed.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Token {
    pub fn new(value: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_start_offsets() {
        assert_eq!(PageRequest::new(1, 100).start(), 1);
        assert_eq!(PageRequest::new(2, 100).start(), 101);
        assert_eq!(PageRequest::new(3, 100).start(), 201);
        assert_eq!(PageRequest::new(4, 25).start(), 76);
    }

    #[test]
    fn only_minus_one_ends_listing() {
        assert_eq!(NextPage::from_next_start(-1), NextPage::Done);
        assert_eq!(NextPage::from_next_start(0), NextPage::More(0));
        assert!(NextPage::from_next_start(0).has_more());
        assert!(NextPage::from_next_start(101).has_more());
        assert!(NextPage::from_next_start(-2).has_more());
    }

    #[test]
    fn user_record_keeps_extra_attributes() {
        let user: UserRecord = serde_json::from_str(
            r#"{"username":"a_governmentofbc","email":"a@gov.bc.ca",
                "fullName":"A","role":"org_user"}"#,
        )
        .unwrap();
        assert_eq!(user.username, "a_governmentofbc");
        assert_eq!(user.attributes["fullName"], "A");
        assert_eq!(user.attributes["role"], "org_user");
    }

    #[test]
    fn group_member_without_email_decodes() {
        let user: UserRecord =
            serde_json::from_str(r#"{"username":"a","memberType":"member"}"#).unwrap();
        assert_eq!(user.email, "");
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = Token::new("secret-token", None);
        let dbg = format!("{:?}", token);
        assert!(!dbg.contains("secret-token"));
        assert!(dbg.contains("REDACTED"));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let credentials = Credentials::new("admin", "hunter2");
        let dbg = format!("{:?}", credentials);
        assert!(dbg.contains("admin"));
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("REDACTED"));
    }
}
