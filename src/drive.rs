//! the remote object store the playground proxies to

use async_trait::async_trait;
use bytes::Bytes;

use dp_api::fs::FileItem;

use crate::sec::credentials;

pub mod query;
pub mod google;

#[cfg(test)]
pub mod memory;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("object was not found")]
    NotFound,

    #[error("remote service responded with {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected response from remote service: {0}")]
    Unexpected(String),

    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Credentials(#[from] credentials::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// which children a name lookup considers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    Folder,
    Any,
}

#[derive(Debug, Clone)]
pub struct ListRequest {
    pub parent: String,
    pub page_size: u32,
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub files: Vec<FileItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewObject {
    pub name: String,
    pub mime_type: String,
    pub parent: String,
}

#[derive(Debug, Clone)]
pub struct Media {
    pub mime_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderKind {
    Title,
    Body,
    Subtitle,
    Other(String),
}

impl PlaceholderKind {
    pub fn from_api(given: &str) -> Self {
        match given {
            "TITLE" => PlaceholderKind::Title,
            "BODY" => PlaceholderKind::Body,
            "SUBTITLE" => PlaceholderKind::Subtitle,
            other => PlaceholderKind::Other(other.to_owned()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Placeholder {
    pub object_id: String,
    pub kind: PlaceholderKind,
}

#[derive(Debug, Clone, Default)]
pub struct Slide {
    pub object_id: String,
    pub placeholders: Vec<Placeholder>,
}

#[derive(Debug, Clone, Default)]
pub struct Presentation {
    pub slides: Vec<Slide>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideInsert {
    pub object_id: String,
    pub text: String,
}

#[async_trait]
pub trait Drive: Send + Sync {
    /// one page of the non-trashed children of a container
    async fn list_children(&self, req: &ListRequest) -> Result<Page>;

    /// the id of the first non-trashed child with exactly the given name
    async fn find_child(&self, parent: &str, name: &str, kind: ChildKind) -> Result<Option<String>>;

    async fn parents(&self, id: &str) -> Result<Vec<String>>;

    async fn metadata(&self, id: &str) -> Result<FileItem>;

    async fn download(&self, id: &str) -> Result<Bytes>;

    async fn create(&self, object: &NewObject, media: Option<Media>) -> Result<String>;

    async fn rename(&self, id: &str, name: &str) -> Result<()>;

    async fn replace_media(&self, id: &str, media: Media) -> Result<()>;

    /// the end offset of the last structural element of a document body
    async fn document_end_index(&self, id: &str) -> Result<i64>;

    async fn insert_document_text(&self, id: &str, index: i64, text: &str) -> Result<()>;

    async fn set_sheet_values(&self, id: &str, range: &str, rows: &[Vec<String>]) -> Result<()>;

    async fn presentation(&self, id: &str) -> Result<Presentation>;

    async fn create_title_body_slide(&self, id: &str) -> Result<()>;

    async fn insert_slide_text(&self, id: &str, inserts: &[SlideInsert]) -> Result<()>;
}
