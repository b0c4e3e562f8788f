//! in process store used to exercise the playground without the network

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;

use dp_api::fs::FileItem;
use dp_lib::mime;

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

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List { parent: String, page_token: Option<String> },
    Create { name: String, mime_type: String, parent: String, media: bool },
    Rename { id: String, name: String },
    ReplaceMedia { id: String, bytes: Bytes },
    InsertDocumentText { id: String, index: i64, text: String },
    SetSheetValues { id: String, range: String, rows: Vec<Vec<String>> },
    CreateSlide { id: String },
    InsertSlideText { id: String, inserts: Vec<SlideInsert> },
}

#[derive(Debug, Clone)]
pub struct Object {
    pub name: String,
    pub mime_type: String,
    pub parents: Vec<String>,
    pub trashed: bool,
    pub bytes: Bytes,
    /// document body text. always ends with the implicit trailing newline
    pub body: String,
    pub grid: Vec<Vec<String>>,
    pub slides: Vec<Slide>,
    pub text: HashMap<String, String>,
}

impl Object {
    fn new(name: &str, mime_type: &str, parents: &[&str]) -> Self {
        Object {
            name: name.to_owned(),
            mime_type: mime_type.to_owned(),
            parents: parents.iter().map(|p| p.to_string()).collect(),
            trashed: false,
            bytes: Bytes::new(),
            body: String::from("\n"),
            grid: Vec::new(),
            slides: Vec::new(),
            text: HashMap::new(),
        }
    }

    fn item(&self, id: &str) -> FileItem {
        FileItem {
            id: id.to_owned(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            modified_time: Some(Utc::now()),
            size: if mime::Structured::from_mime(&self.mime_type).is_some() || self.mime_type == mime::FOLDER {
                None
            } else {
                Some(self.bytes.len().to_string())
            },
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    order: Vec<String>,
    objects: HashMap<String, Object>,
    broken: HashSet<String>,
    calls: Vec<Call>,
    parent_lookups: usize,
    next_id: usize,
}

impl Inner {
    fn insert(&mut self, id: String, object: Object) {
        if self.objects.insert(id.clone(), object).is_none() {
            self.order.push(id);
        }
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Object> {
        self.objects.get_mut(id).ok_or(Error::NotFound)
    }
}

#[derive(Debug, Default)]
pub struct MemoryDrive {
    inner: Mutex<Inner>,
}

impl MemoryDrive {
    pub fn new() -> Self {
        MemoryDrive::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn folder(&self, id: &str, name: &str, parents: &[&str]) -> &Self {
        self.lock().insert(id.to_owned(), Object::new(name, mime::FOLDER, parents));
        self
    }

    pub fn file(&self, id: &str, name: &str, mime_type: &str, parents: &[&str], bytes: &[u8]) -> &Self {
        let mut object = Object::new(name, mime_type, parents);
        object.bytes = Bytes::copy_from_slice(bytes);

        self.lock().insert(id.to_owned(), object);
        self
    }

    pub fn trash(&self, id: &str) -> &Self {
        if let Some(object) = self.lock().objects.get_mut(id) {
            object.trashed = true;
        }

        self
    }

    /// parent lookups for the id fail as if the remote call errored
    pub fn break_parents(&self, id: &str) -> &Self {
        self.lock().broken.insert(id.to_owned());
        self
    }

    pub fn object(&self, id: &str) -> Option<Object> {
        self.lock().objects.get(id).cloned()
    }

    /// ids of the non-trashed objects with the given name in creation order
    pub fn named(&self, name: &str) -> Vec<String> {
        let inner = self.lock();

        inner.order.iter()
            .filter(|id| inner.objects.get(*id)
                .map(|o| o.name == name && !o.trashed)
                .unwrap_or(false))
            .cloned()
            .collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn parent_lookups(&self) -> usize {
        self.lock().parent_lookups
    }
}

#[async_trait]
impl Drive for MemoryDrive {
    async fn list_children(&self, req: &ListRequest) -> Result<Page> {
        let mut inner = self.lock();
        inner.calls.push(Call::List {
            parent: req.parent.clone(),
            page_token: req.page_token.clone(),
        });

        let offset = match &req.page_token {
            Some(token) => token.parse::<usize>()
                .map_err(|_| Error::Unexpected(format!("invalid page token: {token}")))?,
            None => 0,
        };

        let children: Vec<FileItem> = inner.order.iter()
            .filter_map(|id| {
                let object = inner.objects.get(id)?;

                if !object.trashed && object.parents.contains(&req.parent) {
                    Some(object.item(id))
                } else {
                    None
                }
            })
            .collect();

        let end = (offset + req.page_size as usize).min(children.len());
        let files = children.get(offset..end)
            .map(|page| page.to_vec())
            .unwrap_or_default();

        Ok(Page {
            files,
            next_page_token: if end < children.len() {
                Some(end.to_string())
            } else {
                None
            },
        })
    }

    async fn find_child(&self, parent: &str, name: &str, kind: ChildKind) -> Result<Option<String>> {
        let inner = self.lock();

        Ok(inner.order.iter()
            .find(|id| {
                let Some(object) = inner.objects.get(*id) else {
                    return false;
                };

                !object.trashed
                    && object.name == name
                    && object.parents.iter().any(|p| p == parent)
                    && (kind == ChildKind::Any || object.mime_type == mime::FOLDER)
            })
            .cloned())
    }

    async fn parents(&self, id: &str) -> Result<Vec<String>> {
        let mut inner = self.lock();
        inner.parent_lookups += 1;

        if inner.broken.contains(id) {
            return Err(Error::Unexpected(format!("parents lookup failed for {id}")));
        }

        inner.objects.get(id)
            .map(|object| object.parents.clone())
            .ok_or(Error::NotFound)
    }

    async fn metadata(&self, id: &str) -> Result<FileItem> {
        let inner = self.lock();

        inner.objects.get(id)
            .map(|object| object.item(id))
            .ok_or(Error::NotFound)
    }

    async fn download(&self, id: &str) -> Result<Bytes> {
        let inner = self.lock();
        let object = inner.objects.get(id).ok_or(Error::NotFound)?;

        if mime::Structured::from_mime(&object.mime_type).is_some() {
            return Err(Error::Unexpected(String::from("structured objects need export")));
        }

        Ok(object.bytes.clone())
    }

    async fn create(&self, object: &NewObject, media: Option<Media>) -> Result<String> {
        let mut inner = self.lock();
        inner.next_id += 1;

        let id = format!("new{}", inner.next_id);
        let mut created = Object::new(&object.name, &object.mime_type, &[object.parent.as_str()]);

        inner.calls.push(Call::Create {
            name: object.name.clone(),
            mime_type: object.mime_type.clone(),
            parent: object.parent.clone(),
            media: media.is_some(),
        });

        if let Some(media) = media {
            created.bytes = media.bytes;
        }

        inner.insert(id.clone(), created);

        Ok(id)
    }

    async fn rename(&self, id: &str, name: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::Rename { id: id.to_owned(), name: name.to_owned() });
        inner.get_mut(id)?.name = name.to_owned();

        Ok(())
    }

    async fn replace_media(&self, id: &str, media: Media) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::ReplaceMedia { id: id.to_owned(), bytes: media.bytes.clone() });

        let object = inner.get_mut(id)?;
        object.bytes = media.bytes;
        object.mime_type = media.mime_type;

        Ok(())
    }

    async fn document_end_index(&self, id: &str) -> Result<i64> {
        let mut inner = self.lock();
        let object = inner.get_mut(id)?;

        Ok(object.body.chars().count() as i64 + 1)
    }

    async fn insert_document_text(&self, id: &str, index: i64, text: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::InsertDocumentText {
            id: id.to_owned(),
            index,
            text: text.to_owned(),
        });

        let object = inner.get_mut(id)?;
        let at = usize::try_from(index - 1)
            .map_err(|_| Error::Unexpected(format!("index out of range: {index}")))?;
        let byte_at = object.body.char_indices()
            .nth(at)
            .map(|(pos, _)| pos)
            .ok_or_else(|| Error::Unexpected(format!("index out of range: {index}")))?;

        object.body.insert_str(byte_at, text);

        Ok(())
    }

    async fn set_sheet_values(&self, id: &str, range: &str, rows: &[Vec<String>]) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::SetSheetValues {
            id: id.to_owned(),
            range: range.to_owned(),
            rows: rows.to_vec(),
        });

        inner.get_mut(id)?.grid = rows.to_vec();

        Ok(())
    }

    async fn presentation(&self, id: &str) -> Result<Presentation> {
        let mut inner = self.lock();

        Ok(Presentation {
            slides: inner.get_mut(id)?.slides.clone(),
        })
    }

    async fn create_title_body_slide(&self, id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::CreateSlide { id: id.to_owned() });

        let object = inner.get_mut(id)?;
        let count = object.slides.len();

        object.slides.push(Slide {
            object_id: format!("{id}_slide{count}"),
            placeholders: vec![
                Placeholder {
                    object_id: format!("{id}_slide{count}_title"),
                    kind: PlaceholderKind::Title,
                },
                Placeholder {
                    object_id: format!("{id}_slide{count}_body"),
                    kind: PlaceholderKind::Body,
                },
            ],
        });

        Ok(())
    }

    async fn insert_slide_text(&self, id: &str, inserts: &[SlideInsert]) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::InsertSlideText {
            id: id.to_owned(),
            inserts: inserts.to_vec(),
        });

        let object = inner.get_mut(id)?;

        for insert in inserts {
            object.text.entry(insert.object_id.clone())
                .or_default()
                .insert_str(0, &insert.text);
        }

        Ok(())
    }
}
