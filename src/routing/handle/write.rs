use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;

use dp_api::{Json, Validator};
use dp_api::fs::WriteBody;

use crate::fs;
use crate::net::error::{self, AuthKind};
use crate::sec::authn::api_key::ApiKey;
use crate::state::ArcShared;

use super::{given_id, within_root};

pub async fn post(
    State(state): State<ArcShared>,
    _key: ApiKey,
    body: Result<axum::Json<WriteBody>, JsonRejection>,
) -> error::Result<impl IntoResponse> {
    let axum::Json(body) = body?;
    body.validate()?;

    let drive = state.drive();
    let root = state.root().resolve(drive).await?;
    let folder_id = given_id(&body.folder_id)
        .unwrap_or(root.as_str())
        .to_owned();

    if !within_root(drive, &folder_id, &root).await {
        return Err(error::Error::api((
            AuthKind::OutsideRoot,
            "folder_id must be the Playground root or a subfolder under it."
        )));
    }

    let result = fs::dispatch_write(drive, &folder_id, &body).await?;

    tracing::debug!("write \"{}\" -> {} {:?}", body.name, result.id, result.action);

    Ok(Json(result))
}
