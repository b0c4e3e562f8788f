use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use dp_lib::{mime, validation};

use crate::{ApiError, Detail, Validator};
use crate::error::GeneralKind;

/// a single entry of a folder listing. field names follow the remote
/// store so entries pass through unchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    pub id: String,
    pub name: String,
    pub mime_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,

    /// byte count as a decimal string. folders and structured objects
    /// have none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

fn default_page_size() -> u32 {
    validation::DEFAULT_PAGE_SIZE
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    pub folder_id: Option<String>,
    pub page_token: Option<String>,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Validator for ListQuery {
    fn validate(&self) -> Result<(), ApiError> {
        if !validation::page_size_valid(self.page_size) {
            return Err(ApiError::from((
                GeneralKind::ValidationFailed,
                Detail::with_key("page_size"),
                "page_size must be between 1 and 100"
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub files: Vec<FileItem>,

    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

fn default_mime_type() -> String {
    String::from(mime::TEXT_PLAIN)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteBody {
    pub name: String,
    pub content: Option<String>,

    #[serde(default = "default_mime_type")]
    pub mime_type: String,

    pub file_url: Option<String>,
    pub folder_id: Option<String>,
}

impl WriteBody {
    /// the requested mime type with surrounding whitespace removed. blank
    /// values fall back to plain text
    pub fn mime(&self) -> &str {
        let trimmed = self.mime_type.trim();

        if trimmed.is_empty() {
            mime::TEXT_PLAIN
        } else {
            trimmed
        }
    }

    /// the content with surrounding whitespace removed, if any remains
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn file_url(&self) -> Option<&str> {
        self.file_url.as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

impl Validator for WriteBody {
    fn validate(&self) -> Result<(), ApiError> {
        if !validation::name_valid(&self.name) {
            return Err(ApiError::from((
                GeneralKind::ValidationFailed,
                Detail::with_key("name"),
                "name must contain visible characters and no control characters"
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    pub id: String,
    pub action: Action,
}
