use axum::extract::{Query, State};
use axum::extract::rejection::QueryRejection;
use axum::response::IntoResponse;

use dp_api::{Json, Validator};
use dp_api::fs::{ListQuery, Listing};

use crate::drive::ListRequest;
use crate::net::error::{self, AuthKind};
use crate::sec::authn::api_key::ApiKey;
use crate::state::ArcShared;

use super::{given_id, within_root};

pub async fn get(
    State(state): State<ArcShared>,
    _key: ApiKey,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> error::Result<impl IntoResponse> {
    let Query(query) = query?;
    query.validate()?;

    let drive = state.drive();
    let root = state.root().resolve(drive).await?;
    let folder_id = given_id(&query.folder_id)
        .unwrap_or(root.as_str())
        .to_owned();

    if !within_root(drive, &folder_id, &root).await {
        return Err(error::Error::api((
            AuthKind::OutsideRoot,
            "folder_id must be the Playground root or a subfolder under it."
        )));
    }

    let page = drive.list_children(&ListRequest {
        parent: folder_id,
        page_size: query.page_size,
        page_token: query.page_token.filter(|token| !token.is_empty()),
    }).await?;

    Ok(Json(Listing {
        files: page.files,
        next_page_token: page.next_page_token,
    }))
}
