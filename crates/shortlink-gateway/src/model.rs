use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use shortlink_core::LinkRecord;
use shortlink_service::CreatedLink;

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub original_url: String,
    /// Empty or missing means the link never expires.
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateLinkResponse {
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub expires_at: Option<Timestamp>,
}

impl From<CreatedLink> for CreateLinkResponse {
    fn from(link: CreatedLink) -> Self {
        Self {
            short_code: link.code.to_string(),
            short_url: link.short_url,
            original_url: link.original_url,
            expires_at: link.expires_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkInfoResponse {
    pub short_code: String,
    pub original_url: String,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub click_count: u64,
}

impl From<LinkRecord> for LinkInfoResponse {
    fn from(record: LinkRecord) -> Self {
        Self {
            short_code: record.code.to_string(),
            original_url: record.original_url,
            created_at: record.created_at,
            modified_at: record.modified_at,
            expires_at: record.expire_at,
            click_count: record.click_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
