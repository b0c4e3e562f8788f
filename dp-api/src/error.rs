use http::StatusCode;
use axum_core::response::{Response, IntoResponse};
use serde::{Serialize, Deserialize};
use strum::{AsRefStr as StrumAsRefStr};

use crate::response::{serialize_json, error_json};

#[derive(
    Debug, Clone, PartialEq, Eq,
    StrumAsRefStr,
    Serialize, Deserialize
)]
pub enum AuthKind {
    ApiKeyMissing,
    InvalidApiKey,

    OutsideRoot,
}

impl std::fmt::Display for AuthKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.as_ref(), f)
    }
}

impl From<&AuthKind> for StatusCode {
    fn from(kind: &AuthKind) -> Self {
        match kind {
            AuthKind::ApiKeyMissing |
            AuthKind::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AuthKind::OutsideRoot => StatusCode::FORBIDDEN,
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq,
    StrumAsRefStr,
    Serialize, Deserialize
)]
pub enum FsKind {
    FileNotFound,
    RootNotFound,
    DownloadFailed,
}

impl std::fmt::Display for FsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.as_ref(), f)
    }
}

impl From<&FsKind> for StatusCode {
    fn from(kind: &FsKind) -> Self {
        match kind {
            FsKind::FileNotFound |
            FsKind::RootNotFound |
            FsKind::DownloadFailed => StatusCode::NOT_FOUND,
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq,
    StrumAsRefStr,
    Serialize, Deserialize
)]
pub enum GeneralKind {
    InternalFailure,
    Timeout,
    Upstream,

    NotFound,
    NotImplemented,

    ValidationFailed,
    InvalidData,
    MissingData,

    InvalidMethod,
}

impl std::fmt::Display for GeneralKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.as_ref(), f)
    }
}

impl From<&GeneralKind> for StatusCode {
    fn from(kind: &GeneralKind) -> StatusCode {
        match kind {
            GeneralKind::InternalFailure => StatusCode::INTERNAL_SERVER_ERROR,
            GeneralKind::Timeout => StatusCode::REQUEST_TIMEOUT,
            GeneralKind::Upstream => StatusCode::BAD_GATEWAY,
            GeneralKind::NotFound => StatusCode::NOT_FOUND,
            GeneralKind::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            GeneralKind::ValidationFailed |
            GeneralKind::InvalidData |
            GeneralKind::MissingData => StatusCode::BAD_REQUEST,
            GeneralKind::InvalidMethod => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

/// serialized as the bare variant name of the inner kind
#[derive(
    Debug, Clone, PartialEq, Eq,
    Serialize, Deserialize
)]
#[serde(untagged)]
pub enum ApiErrorKind {
    General(GeneralKind),
    Auth(AuthKind),
    Fs(FsKind),
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiErrorKind::General(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::Auth(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::Fs(v) => std::fmt::Display::fmt(v, f),
        }
    }
}

impl From<GeneralKind> for ApiErrorKind {
    fn from(v: GeneralKind) -> Self {
        ApiErrorKind::General(v)
    }
}

impl From<AuthKind> for ApiErrorKind {
    fn from(v: AuthKind) -> Self {
        ApiErrorKind::Auth(v)
    }
}

impl From<FsKind> for ApiErrorKind {
    fn from(v: FsKind) -> Self {
        ApiErrorKind::Fs(v)
    }
}

impl From<&ApiErrorKind> for StatusCode {
    fn from(kind: &ApiErrorKind) -> Self {
        match kind {
            ApiErrorKind::General(v) => v.into(),
            ApiErrorKind::Auth(v) => v.into(),
            ApiErrorKind::Fs(v) => v.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Detail {
    Keys(Vec<String>),
}

impl Detail {
    pub fn with_key(key: impl Into<String>) -> Self {
        Detail::Keys(vec![key.into()])
    }
}

impl std::fmt::Display for Detail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Detail::Keys(list) => {
                let mut iter = list.iter();

                if let Some(first) = iter.next() {
                    write!(f, "{}", first)?;

                    for key in iter {
                        write!(f, ",{}", key)?;
                    }
                }
            },
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    kind: ApiErrorKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<Detail>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    msg: Option<String>,
}

impl ApiError {
    pub fn new() -> Self {
        ApiError {
            kind: ApiErrorKind::General(GeneralKind::InternalFailure),
            detail: None,
            msg: None
        }
    }

    pub fn with_kind<K>(mut self, kind: K) -> Self
    where
        K: Into<ApiErrorKind>
    {
        self.kind = kind.into();
        self
    }

    pub fn with_detail(mut self, detail: Detail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn with_message<M>(mut self, msg: M) -> Self
    where
        M: Into<String>
    {
        self.msg = Some(msg.into());
        self
    }

    pub fn kind(&self) -> &ApiErrorKind {
        &self.kind
    }

    pub fn detail(&self) -> Option<&Detail> {
        self.detail.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.msg.as_deref()
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from(&self.kind)
    }
}

impl std::default::Default for ApiError {
    fn default() -> Self {
        ApiError::new()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }

        if let Some(msg) = &self.msg {
            write!(f, ": {}", msg)?;
        }

        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match serialize_json(self.status(), &self) {
            Ok(res) => res,
            Err(err) => {
                tracing::error!("ApiError serialization error {:?}", err);
                error_json()
            }
        }
    }
}

impl<K> From<K> for ApiError
where
    K: Into<ApiErrorKind>
{
    fn from(kind: K) -> Self {
        ApiError {
            kind: kind.into(),
            detail: None,
            msg: None
        }
    }
}

impl<K,M> From<(K, M)> for ApiError
where
    K: Into<ApiErrorKind>,
    M: Into<String>,
{
    fn from((kind, msg): (K, M)) -> Self {
        ApiError {
            kind: kind.into(),
            detail: None,
            msg: Some(msg.into())
        }
    }
}

impl<K> From<(K, Detail)> for ApiError
where
    K: Into<ApiErrorKind>
{
    fn from((kind, detail): (K, Detail)) -> Self {
        ApiError {
            kind: kind.into(),
            detail: Some(detail),
            msg: None
        }
    }
}

impl<K,M> From<(K, Detail, M)> for ApiError
where
    K: Into<ApiErrorKind>,
    M: Into<String>
{
    fn from((kind, detail, msg): (K, Detail, M)) -> Self {
        ApiError {
            kind: kind.into(),
            detail: Some(detail),
            msg: Some(msg.into())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_mapping() {
        let expected = [
            (ApiErrorKind::from(AuthKind::ApiKeyMissing), StatusCode::UNAUTHORIZED),
            (AuthKind::InvalidApiKey.into(), StatusCode::UNAUTHORIZED),
            (AuthKind::OutsideRoot.into(), StatusCode::FORBIDDEN),
            (FsKind::FileNotFound.into(), StatusCode::NOT_FOUND),
            (FsKind::RootNotFound.into(), StatusCode::NOT_FOUND),
            (FsKind::DownloadFailed.into(), StatusCode::NOT_FOUND),
            (GeneralKind::MissingData.into(), StatusCode::BAD_REQUEST),
            (GeneralKind::NotImplemented.into(), StatusCode::NOT_IMPLEMENTED),
            (GeneralKind::Upstream.into(), StatusCode::BAD_GATEWAY),
        ];

        for (kind, status) in expected {
            assert_eq!(StatusCode::from(&kind), status, "kind {}", kind);
        }
    }

    #[test]
    fn serializes_bare_kind() {
        let err = ApiError::from((
            AuthKind::OutsideRoot,
            Detail::with_key("folder_id"),
            "not under root"
        ));

        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json, serde_json::json!({
            "kind": "OutsideRoot",
            "detail": {"Keys": ["folder_id"]},
            "msg": "not under root",
        }));

        let plain = serde_json::to_value(ApiError::from(GeneralKind::NotFound)).unwrap();

        assert_eq!(plain, serde_json::json!({"kind": "NotFound"}));
    }

    #[test]
    fn kind_names_are_distinct() {
        let route = serde_json::to_value(ApiErrorKind::from(GeneralKind::NotFound)).unwrap();
        let file = serde_json::to_value(ApiErrorKind::from(FsKind::FileNotFound)).unwrap();

        assert_ne!(route, file);
        assert_eq!(file, serde_json::json!("FileNotFound"));

        let parsed: ApiErrorKind = serde_json::from_value(file).unwrap();
        assert_eq!(parsed, ApiErrorKind::Fs(FsKind::FileNotFound));

        let parsed: ApiErrorKind = serde_json::from_value(route).unwrap();
        assert_eq!(parsed, ApiErrorKind::General(GeneralKind::NotFound));
    }
}
