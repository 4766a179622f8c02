use serde::Deserialize;

use crate::model::UserRecord;

/// Error payload the portal embeds in otherwise successful HTTP responses.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<String>,
}

impl ApiError {
    pub fn describe(&self) -> String {
        let mut out = self.message.clone();
        if let Some(code) = self.code {
            out.push_str(&format!(" (code {})", code));
        }
        if !self.details.is_empty() {
            out.push_str(": ");
            out.push_str(&self.details.join("; "));
        }
        out
    }
}

#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    pub token: Option<String>,
    /// Epoch milliseconds.
    pub expires: Option<i64>,
    pub error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    pub next_start: Option<i64>,
    pub error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddUsersResponse {
    #[serde(default)]
    pub not_added: Vec<String>,
    pub error: Option<ApiError>,
}
