use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut, BufMut};
use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use dp_api::fs::FileItem;

use crate::sec::credentials::TokenProvider;

use super::{
    ChildKind,
    Drive,
    Error,
    ListRequest,
    Media,
    NewObject,
    Page,
    Placeholder,
    PlaceholderKind,
    Presentation,
    Result,
    Slide,
    SlideInsert,
};
use super::query::Query;

const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, modifiedTime, size)";
const ITEM_FIELDS: &str = "id, name, mimeType, modifiedTime, size";

/// documents with no structural elements still hold the trailing newline
const EMPTY_DOCUMENT_END: i64 = 2;

pub const SLIDE_INSERTION_INDEX: i64 = 0;

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub drive: Url,
    pub upload: Url,
    pub docs: Url,
    pub sheets: Url,
    pub slides: Url,
}

impl Endpoints {
    pub fn google() -> std::result::Result<Self, url::ParseError> {
        Ok(Endpoints {
            drive: Url::parse("https://www.googleapis.com/drive/v3/")?,
            upload: Url::parse("https://www.googleapis.com/upload/drive/v3/")?,
            docs: Url::parse("https://docs.googleapis.com/v1/")?,
            sheets: Url::parse("https://sheets.googleapis.com/v4/")?,
            slides: Url::parse("https://slides.googleapis.com/v1/")?,
        })
    }
}

/// appends percent encoded path segments to a base url
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();

    url.path_segments_mut()
        .map_err(|_| Error::Unexpected(format!("base url cannot hold a path: {base}")))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<FileItem>,

    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FileIds {
    #[serde(default)]
    files: Vec<FileId>,
}

#[derive(Debug, Deserialize)]
struct FileParents {
    #[serde(default)]
    parents: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuralElement {
    end_index: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentBody {
    #[serde(default)]
    content: Vec<StructuralElement>,
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    body: DocumentBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPlaceholder {
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiShape {
    placeholder: Option<ApiPlaceholder>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageElement {
    object_id: Option<String>,
    shape: Option<ApiShape>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSlide {
    #[serde(default)]
    object_id: String,

    #[serde(default)]
    page_elements: Vec<PageElement>,
}

#[derive(Debug, Deserialize)]
struct ApiPresentation {
    #[serde(default)]
    slides: Vec<ApiSlide>,
}

impl From<ApiPresentation> for Presentation {
    fn from(api: ApiPresentation) -> Self {
        let slides = api.slides.into_iter()
            .map(|slide| Slide {
                object_id: slide.object_id,
                placeholders: slide.page_elements.into_iter()
                    .filter_map(|element| {
                        let object_id = element.object_id?;
                        let kind = element.shape?.placeholder?.kind?;

                        Some(Placeholder {
                            object_id,
                            kind: PlaceholderKind::from_api(&kind),
                        })
                    })
                    .collect(),
            })
            .collect();

        Presentation { slides }
    }
}

/// remote store backed by the google workspace rest apis
pub struct GoogleDrive {
    client: Client,
    tokens: Arc<dyn TokenProvider>,
    endpoints: Endpoints,
}

impl GoogleDrive {
    pub fn new(client: Client, tokens: Arc<dyn TokenProvider>, endpoints: Endpoints) -> Self {
        GoogleDrive {
            client,
            tokens,
            endpoints,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let token = self.tokens.access_token().await?;
        let response = builder.bearer_auth(token)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else if status == StatusCode::NOT_FOUND {
            Err(Error::NotFound)
        } else {
            let body = response.text().await?;

            Err(Error::Status { status, body })
        }
    }

    fn drive_files(&self, id: Option<&str>) -> Result<Url> {
        match id {
            Some(id) => endpoint(&self.endpoints.drive, &["files", id]),
            None => endpoint(&self.endpoints.drive, &["files"]),
        }
    }

    async fn batch_update(&self, base: &Url, collection: &str, id: &str, requests: serde_json::Value) -> Result<()> {
        let method = format!("{id}:batchUpdate");
        let url = endpoint(base, &[collection, &method])?;

        self.send(self.client.post(url).json(&json!({ "requests": requests }))).await?;

        Ok(())
    }
}

fn multipart_related(boundary: &str, metadata: &serde_json::Value, media: &Media) -> Result<Bytes> {
    let mut body = BytesMut::with_capacity(media.bytes.len() + 256);

    body.put_slice(format!("--{boundary}\r\n").as_bytes());
    body.put_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.put_slice(&serde_json::to_vec(metadata)?);
    body.put_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.put_slice(format!("Content-Type: {}\r\n\r\n", media.mime_type).as_bytes());
    body.put_slice(&media.bytes);
    body.put_slice(format!("\r\n--{boundary}--").as_bytes());

    Ok(body.freeze())
}

fn boundary() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    format!("playground_{token}")
}

#[async_trait]
impl Drive for GoogleDrive {
    async fn list_children(&self, req: &ListRequest) -> Result<Page> {
        let q = Query::new()
            .in_parents(&req.parent)
            .not_trashed()
            .build();
        let page_size = req.page_size.to_string();
        let mut params = vec![
            ("q", q.as_str()),
            ("spaces", "drive"),
            ("fields", LIST_FIELDS),
            ("pageSize", page_size.as_str()),
        ];

        if let Some(token) = req.page_token.as_deref() {
            params.push(("pageToken", token));
        }

        let url = self.drive_files(None)?;
        let list: FileList = self.send(self.client.get(url).query(&params))
            .await?
            .json()
            .await?;

        Ok(Page {
            files: list.files,
            next_page_token: list.next_page_token,
        })
    }

    async fn find_child(&self, parent: &str, name: &str, kind: ChildKind) -> Result<Option<String>> {
        let mut q = Query::new()
            .in_parents(parent)
            .name_is(name);

        if kind == ChildKind::Folder {
            q = q.folders();
        }

        let q = q.not_trashed().build();
        let url = self.drive_files(None)?;
        let found: FileIds = self.send(self.client.get(url).query(&[
            ("q", q.as_str()),
            ("spaces", "drive"),
            ("fields", "files(id)"),
            ("pageSize", "1"),
        ]))
            .await?
            .json()
            .await?;

        Ok(found.files.into_iter().next().map(|file| file.id))
    }

    async fn parents(&self, id: &str) -> Result<Vec<String>> {
        let url = self.drive_files(Some(id))?;
        let meta: FileParents = self.send(self.client.get(url).query(&[("fields", "parents")]))
            .await?
            .json()
            .await?;

        Ok(meta.parents)
    }

    async fn metadata(&self, id: &str) -> Result<FileItem> {
        let url = self.drive_files(Some(id))?;

        Ok(self.send(self.client.get(url).query(&[("fields", ITEM_FIELDS)]))
            .await?
            .json()
            .await?)
    }

    async fn download(&self, id: &str) -> Result<Bytes> {
        let url = self.drive_files(Some(id))?;

        Ok(self.send(self.client.get(url).query(&[("alt", "media")]))
            .await?
            .bytes()
            .await?)
    }

    async fn create(&self, object: &NewObject, media: Option<Media>) -> Result<String> {
        let metadata = json!({
            "name": object.name,
            "mimeType": object.mime_type,
            "parents": [object.parent],
        });

        let builder = if let Some(media) = media {
            let boundary = boundary();
            let body = multipart_related(&boundary, &metadata, &media)?;
            let url = endpoint(&self.endpoints.upload, &["files"])?;

            self.client.post(url)
                .query(&[("uploadType", "multipart"), ("fields", "id")])
                .header(
                    reqwest::header::CONTENT_TYPE,
                    format!("multipart/related; boundary={boundary}")
                )
                .body(body)
        } else {
            self.client.post(self.drive_files(None)?)
                .query(&[("fields", "id")])
                .json(&metadata)
        };

        let created: FileId = self.send(builder)
            .await?
            .json()
            .await?;

        Ok(created.id)
    }

    async fn rename(&self, id: &str, name: &str) -> Result<()> {
        let url = self.drive_files(Some(id))?;

        self.send(self.client.request(Method::PATCH, url)
            .query(&[("fields", "id")])
            .json(&json!({ "name": name }))).await?;

        Ok(())
    }

    async fn replace_media(&self, id: &str, media: Media) -> Result<()> {
        let url = endpoint(&self.endpoints.upload, &["files", id])?;

        self.send(self.client.request(Method::PATCH, url)
            .query(&[("uploadType", "media"), ("fields", "id")])
            .header(reqwest::header::CONTENT_TYPE, media.mime_type)
            .body(media.bytes)).await?;

        Ok(())
    }

    async fn document_end_index(&self, id: &str) -> Result<i64> {
        let url = endpoint(&self.endpoints.docs, &["documents", id])?;
        let doc: Document = self.send(self.client.get(url)
            .query(&[("fields", "body(content(endIndex))")]))
            .await?
            .json()
            .await?;

        Ok(doc.body.content.last()
            .and_then(|element| element.end_index)
            .unwrap_or(EMPTY_DOCUMENT_END))
    }

    async fn insert_document_text(&self, id: &str, index: i64, text: &str) -> Result<()> {
        self.batch_update(&self.endpoints.docs, "documents", id, json!([{
            "insertText": {
                "location": { "index": index },
                "text": text,
            }
        }])).await
    }

    async fn set_sheet_values(&self, id: &str, range: &str, rows: &[Vec<String>]) -> Result<()> {
        let url = endpoint(&self.endpoints.sheets, &["spreadsheets", id, "values", range])?;

        self.send(self.client.put(url)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": rows,
            }))).await?;

        Ok(())
    }

    async fn presentation(&self, id: &str) -> Result<Presentation> {
        let url = endpoint(&self.endpoints.slides, &["presentations", id])?;
        let api: ApiPresentation = self.send(self.client.get(url))
            .await?
            .json()
            .await?;

        Ok(api.into())
    }

    async fn create_title_body_slide(&self, id: &str) -> Result<()> {
        self.batch_update(&self.endpoints.slides, "presentations", id, json!([{
            "createSlide": {
                "slideLayoutReference": { "predefinedLayout": "TITLE_AND_BODY" },
                "placeholderIdMappings": [],
            }
        }])).await
    }

    async fn insert_slide_text(&self, id: &str, inserts: &[SlideInsert]) -> Result<()> {
        let requests: Vec<serde_json::Value> = inserts.iter()
            .map(|insert| json!({
                "insertText": {
                    "objectId": insert.object_id,
                    "text": insert.text,
                    "insertionIndex": SLIDE_INSERTION_INDEX,
                }
            }))
            .collect();

        self.batch_update(&self.endpoints.slides, "presentations", id, json!(requests)).await
    }
}
