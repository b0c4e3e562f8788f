use bytes::Bytes;

use dp_api::fs::{Action, WriteBody, WriteResult};
use dp_lib::mime::Structured;
use dp_lib::{sheet, slides};

use crate::drive::{
    ChildKind,
    Drive,
    Media,
    NewObject,
    PlaceholderKind,
    SlideInsert,
};
use crate::net::error::{self, Detail, GeneralKind};

/// sheet values are written starting at this cell of the first sheet
pub const SHEET_RANGE: &str = "A1";

/// documents start with their first character at this index
const DOCUMENT_START: i64 = 1;

fn result(id: String, action: Action) -> WriteResult {
    WriteResult { id, action }
}

/// creates or updates `body.name` directly under `folder_id`.
///
/// the folder must already be authorized. the existence lookup and the
/// following create are separate remote calls, so concurrent writers for
/// the same name can both create.
pub async fn dispatch_write(
    drive: &dyn Drive,
    folder_id: &str,
    body: &WriteBody,
) -> error::Result<WriteResult> {
    let existing = drive.find_child(folder_id, &body.name, ChildKind::Any).await?;
    let mime_type = body.mime();
    let structured = Structured::from_mime(mime_type);

    tracing::debug!(
        "write \"{}\" {mime_type} existing: {existing:?} content: {}",
        body.name,
        body.content().is_some()
    );

    if let Some(kind) = structured {
        let Some(content) = body.content() else {
            return match existing {
                Some(id) => Ok(result(id, Action::Unchanged)),
                None => {
                    let id = create(drive, folder_id, body, kind.as_mime(), None).await?;

                    Ok(result(id, Action::Created))
                }
            };
        };

        return match kind {
            Structured::Document => write_document(drive, folder_id, body, existing, content).await,
            Structured::Spreadsheet => write_sheet(drive, folder_id, body, existing, content).await,
            Structured::Presentation => write_slides(drive, folder_id, body, existing, content).await,
        };
    }

    if body.file_url().is_some() {
        return Err(error::Error::api((
            GeneralKind::NotImplemented,
            Detail::with_key("file_url"),
            "file_url upload is not supported. use content for text or structured types"
        )));
    }

    let Some(content) = body.content() else {
        return Err(error::Error::api((
            GeneralKind::MissingData,
            Detail::with_key("content"),
            "content is required for non structured mime types"
        )));
    };

    let media = Media {
        mime_type: mime_type.to_owned(),
        bytes: Bytes::copy_from_slice(content.as_bytes()),
    };

    match existing {
        Some(id) => {
            drive.rename(&id, &body.name).await?;
            drive.replace_media(&id, media).await?;

            Ok(result(id, Action::Updated))
        }
        None => {
            let id = create(drive, folder_id, body, mime_type, Some(media)).await?;

            Ok(result(id, Action::Created))
        }
    }
}

async fn create(
    drive: &dyn Drive,
    folder_id: &str,
    body: &WriteBody,
    mime_type: &str,
    media: Option<Media>,
) -> error::Result<String> {
    let object = NewObject {
        name: body.name.clone(),
        mime_type: mime_type.to_owned(),
        parent: folder_id.to_owned(),
    };

    Ok(drive.create(&object, media).await?)
}

async fn write_document(
    drive: &dyn Drive,
    folder_id: &str,
    body: &WriteBody,
    existing: Option<String>,
    content: &str,
) -> error::Result<WriteResult> {
    match existing {
        Some(id) => {
            let end = drive.document_end_index(&id).await?;
            let text = format!("\n{content}");

            drive.insert_document_text(&id, end - 1, &text).await?;

            Ok(result(id, Action::Updated))
        }
        None => {
            let id = create(drive, folder_id, body, Structured::Document.as_mime(), None).await?;

            drive.insert_document_text(&id, DOCUMENT_START, content).await?;

            Ok(result(id, Action::Created))
        }
    }
}

async fn write_sheet(
    drive: &dyn Drive,
    folder_id: &str,
    body: &WriteBody,
    existing: Option<String>,
    content: &str,
) -> error::Result<WriteResult> {
    let rows = sheet::parse_grid(content);

    let (id, action) = match existing {
        Some(id) => (id, Action::Updated),
        None => (
            create(drive, folder_id, body, Structured::Spreadsheet.as_mime(), None).await?,
            Action::Created
        ),
    };

    if !rows.is_empty() {
        drive.set_sheet_values(&id, SHEET_RANGE, &rows).await?;
    }

    Ok(result(id, action))
}

async fn write_slides(
    drive: &dyn Drive,
    folder_id: &str,
    body: &WriteBody,
    existing: Option<String>,
    content: &str,
) -> error::Result<WriteResult> {
    let (id, action) = match existing {
        Some(id) => (id, Action::Updated),
        None => (
            create(drive, folder_id, body, Structured::Presentation.as_mime(), None).await?,
            Action::Created
        ),
    };

    let (title, text) = slides::split_title_body(content);
    let mut presentation = drive.presentation(&id).await?;

    if presentation.slides.is_empty() {
        drive.create_title_body_slide(&id).await?;

        presentation = drive.presentation(&id).await?;
    }

    let Some(first) = presentation.slides.first() else {
        return Ok(result(id, action));
    };

    let mut inserts = Vec::new();

    for placeholder in &first.placeholders {
        let given = match placeholder.kind {
            PlaceholderKind::Title => &title,
            PlaceholderKind::Body |
            PlaceholderKind::Subtitle => &text,
            PlaceholderKind::Other(_) => continue,
        };

        if !given.is_empty() {
            inserts.push(SlideInsert {
                object_id: placeholder.object_id.clone(),
                text: given.clone(),
            });
        }
    }

    if !inserts.is_empty() {
        drive.insert_slide_text(&id, &inserts).await?;
    }

    Ok(result(id, action))
}
