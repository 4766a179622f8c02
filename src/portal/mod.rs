use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Request, Url};
use std::fmt;
use tracing::{debug, warn};

use crate::config::ConfigError;
use crate::error::SyncError;
use crate::model::{Credentials, NextPage, PageRequest, PageResult, Token};
use crate::portal::model::{AddUsersResponse, TokenResponse, UserListResponse};

pub mod model;

/// A paged user listing exposed by the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    GroupMembers { group_id: String },
    OrgMembers,
}

impl Listing {
    pub fn group(group_id: impl Into<String>) -> Self {
        Listing::GroupMembers {
            group_id: group_id.into(),
        }
    }

    /// Path segments below the base URL. The group id is one segment.
    pub fn segments(&self) -> Vec<&str> {
        match self {
            Listing::GroupMembers { group_id } => {
                vec!["community", "groups", group_id.as_str(), "userList"]
            }
            Listing::OrgMembers => vec!["portals", "self", "users"],
        }
    }

    pub fn path(&self) -> String {
        self.segments().join("/")
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listing::GroupMembers { group_id } => write!(f, "group {}", group_id),
            Listing::OrgMembers => f.write_str("organization"),
        }
    }
}

/// The three portal calls a sync run needs.
#[async_trait]
pub trait PortalService: Send + Sync {
    async fn generate_token(
        &self,
        credentials: &Credentials,
        expiration_minutes: u32,
    ) -> Result<Token, SyncError>;

    async fn fetch_page(
        &self,
        token: &Token,
        listing: &Listing,
        request: PageRequest,
    ) -> Result<PageResult, SyncError>;

    async fn add_users(
        &self,
        token: &Token,
        group_id: &str,
        usernames: &[String],
    ) -> Result<(), SyncError>;
}

#[derive(Clone)]
pub struct PortalClient {
    http: Client,
    base_url: Url,
}

impl fmt::Debug for PortalClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl PortalClient {
    pub fn new(base_url: &str) -> Result<Self, SyncError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|_| ConfigError::Invalid("portal.base_url is not a valid URL"))?;
        let http = Client::builder()
            .user_agent(concat!("ago-group-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::transport("build HTTP client", e))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends `segments` to the base URL, percent-encoding each one, so a
    /// group id can never add path levels, a query or a fragment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SyncError> {
        if segments.iter().any(|s| matches!(*s, "" | "." | "..")) {
            return Err(ConfigError::Invalid("group id must not be empty, '.' or '..'").into());
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConfigError::Invalid("portal.base_url cannot be a base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn build_token_request(
        &self,
        credentials: &Credentials,
        expiration_minutes: u32,
    ) -> Result<Request, SyncError> {
        let referer = self.base_url.as_str().trim_end_matches('/').to_string();
        let form = [
            ("username", credentials.username.clone()),
            ("password", credentials.password.clone()),
            ("expiration", expiration_minutes.to_string()),
            ("referer", referer),
            ("f", "json".to_string()),
        ];
        self.http
            .post(self.endpoint(&["generateToken"])?)
            .form(&form)
            .build()
            .map_err(|e| SyncError::transport("build token request", e))
    }

    pub fn build_page_request(
        &self,
        token: &Token,
        listing: &Listing,
        request: PageRequest,
    ) -> Result<Request, SyncError> {
        let query = [
            ("num", request.page_size.to_string()),
            ("start", request.start().to_string()),
            ("f", "json".to_string()),
            ("token", token.as_str().to_string()),
        ];
        self.http
            .get(self.endpoint(&listing.segments())?)
            .query(&query)
            .build()
            .map_err(|e| SyncError::transport(format!("build {} page request", listing), e))
    }

    /// The token travels in the query string; the usernames in the form body.
    pub fn build_add_users_request(
        &self,
        token: &Token,
        group_id: &str,
        usernames: &[String],
    ) -> Result<Request, SyncError> {
        let mut url = self.endpoint(&["community", "groups", group_id, "addUsers"])?;
        url.query_pairs_mut().append_pair("token", token.as_str());
        let form = [("users", usernames.join(",")), ("f", "json".to_string())];
        self.http
            .post(url)
            .form(&form)
            .build()
            .map_err(|e| SyncError::transport("build addUsers request", e))
    }

    async fn execute(&self, operation: &str, request: Request) -> Result<String, SyncError> {
        // The query string may carry the token, so only the path is logged.
        debug!(method = %request.method(), path = %request.url().path(), "sending portal request");
        let res = self
            .http
            .execute(request)
            .await
            .map_err(|e| SyncError::transport(operation, e))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, operation, "portal returned an error status");
            return Err(SyncError::Http {
                operation: operation.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        res.text()
            .await
            .map_err(|e| SyncError::transport(operation, e))
    }
}

#[async_trait]
impl PortalService for PortalClient {
    async fn generate_token(
        &self,
        credentials: &Credentials,
        expiration_minutes: u32,
    ) -> Result<Token, SyncError> {
        let request = self.build_token_request(credentials, expiration_minutes)?;
        let body = self.execute("generate token", request).await?;
        parse_token_response(&body)
    }

    async fn fetch_page(
        &self,
        token: &Token,
        listing: &Listing,
        request: PageRequest,
    ) -> Result<PageResult, SyncError> {
        let operation = format!("fetch {} page {}", listing, request.page);
        let http_request = self.build_page_request(token, listing, request)?;
        let body = self.execute(&operation, http_request).await?;
        parse_user_list(&operation, &body)
    }

    async fn add_users(
        &self,
        token: &Token,
        group_id: &str,
        usernames: &[String],
    ) -> Result<(), SyncError> {
        let request = self.build_add_users_request(token, group_id, usernames)?;
        let body = self.execute("add users to group", request).await?;
        let not_added = parse_add_users(&body)?;
        if !not_added.is_empty() {
            warn!(group_id, not_added = %not_added.join(","), "portal declined to add some users");
        }
        Ok(())
    }
}

pub fn parse_token_response(body: &str) -> Result<Token, SyncError> {
    let payload: TokenResponse =
        serde_json::from_str(body).map_err(|e| SyncError::decode("generate token", e))?;
    if let Some(err) = payload.error {
        return Err(SyncError::Authentication {
            message: err.describe(),
        });
    }
    let token = payload
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SyncError::Authentication {
            message: "portal response did not include a token".into(),
        })?;
    let expires_at = payload.expires.and_then(DateTime::<Utc>::from_timestamp_millis);
    Ok(Token::new(token, expires_at))
}

pub fn parse_user_list(operation: &str, body: &str) -> Result<PageResult, SyncError> {
    let payload: UserListResponse =
        serde_json::from_str(body).map_err(|e| SyncError::decode(operation, e))?;
    if let Some(err) = payload.error {
        return Err(SyncError::Api {
            operation: operation.to_string(),
            message: err.describe(),
        });
    }
    let next_start = payload.next_start.ok_or_else(|| SyncError::Api {
        operation: operation.to_string(),
        message: "response did not include nextStart".into(),
    })?;
    Ok(PageResult {
        users: payload.users,
        next: NextPage::from_next_start(next_start),
    })
}

/// Returns the usernames the portal reported as `notAdded`.
pub fn parse_add_users(body: &str) -> Result<Vec<String>, SyncError> {
    let payload: AddUsersResponse =
        serde_json::from_str(body).map_err(|e| SyncError::decode("add users to group", e))?;
    if let Some(err) = payload.error {
        return Err(SyncError::Mutation {
            message: err.describe(),
        });
    }
    Ok(payload.not_added)
}
