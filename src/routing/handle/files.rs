pub mod content {
    use axum::extract::{Path, State};
    use axum::extract::rejection::PathRejection;
    use axum::http::header::CONTENT_TYPE;
    use axum::response::IntoResponse;

    use dp_lib::validation;

    use crate::net::error::{self, AuthKind, FsKind};
    use crate::sec::authn::api_key::ApiKey;
    use crate::state::ArcShared;

    use super::super::within_root;

    const TEXT_UTF8: &str = "text/plain; charset=utf-8";

    /// the raw bytes of an object decoded as utf-8. invalid sequences are
    /// replaced instead of failing the request
    pub async fn get(
        State(state): State<ArcShared>,
        _key: ApiKey,
        file_id: Result<Path<String>, PathRejection>,
    ) -> error::Result<impl IntoResponse> {
        let Path(file_id) = file_id?;

        if !validation::id_valid(&file_id) {
            return Err(error::Error::api(FsKind::FileNotFound));
        }

        let drive = state.drive();
        let root = state.root().resolve(drive).await?;

        if let Err(err) = drive.metadata(&file_id).await {
            tracing::debug!("metadata for {file_id} failed: {err}");

            return Err(error::Error::api((FsKind::FileNotFound, err.to_string())));
        }

        if !within_root(drive, &file_id, &root).await {
            return Err(error::Error::api((
                AuthKind::OutsideRoot,
                "File is not in the Playground folder or its subfolders. Use /list to get file IDs."
            )));
        }

        let bytes = match drive.download(&file_id).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!("download of {file_id} failed: {err}");

                return Err(error::Error::api((FsKind::DownloadFailed, err.to_string())));
            }
        };

        Ok((
            [(CONTENT_TYPE, TEXT_UTF8)],
            String::from_utf8_lossy(&bytes).into_owned()
        ))
    }
}
