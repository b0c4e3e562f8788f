use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use tracing::Level;

pub use dp_api::error::{
    Detail,
    ApiError,
    GeneralKind,
    AuthKind,
    FsKind,
};

use crate::drive;

type BoxDynError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug)]
pub struct Error {
    inner: ApiError,
    context: Option<String>,
    src: Option<BoxDynError>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new() -> Self {
        Error {
            inner: Default::default(),
            context: None,
            src: None,
        }
    }

    pub fn api<T>(value: T) -> Self
    where
        T: Into<ApiError>
    {
        Error {
            inner: value.into(),
            context: None,
            src: None
        }
    }

    pub fn message<M>(mut self, msg: M) -> Self
    where
        M: Into<String>
    {
        self.inner = self.inner.with_message(msg);
        self
    }

    pub fn context<C>(mut self, ctx: C) -> Self
    where
        C: Into<String>
    {
        self.context = Some(ctx.into());
        self
    }

    pub fn source<S>(mut self, src: S) -> Self
    where
        S: Into<BoxDynError>
    {
        self.src = Some(src.into());
        self
    }

    pub fn api_error(&self) -> &ApiError {
        &self.inner
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.inner, &self.context, &self.src) {
            (inner, Some(cxt), Some(err)) => if f.alternate() {
                write!(f, "inner: {}\ncxt: {}\nerr: {:#?}", inner, cxt, err)
            } else {
                write!(f, "inner: {}\ncxt: {}\nerr: {:?}", inner, cxt, err)
            },
            (inner, Some(cxt), None) => write!(f, "inner: {}\ncxt: {}", inner, cxt),
            (inner, None, Some(err)) => if f.alternate() {
                write!(f, "inner: {}\nerr: {:#?}", inner, err)
            } else {
                write!(f, "inner: {}\nerr: {:?}", inner, err)
            },
            (inner, None, None) => write!(f, "inner: {}", inner)
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.src.as_ref().map(|v| & **v as _)
    }
}

impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        if let Some(err) = self.src.as_ref() {
            if let Some(cxt) = self.context.as_ref() {
                tracing::event!(
                    Level::ERROR,
                    "unhandled error when processing request: {cxt}\n{:#?}",
                    err
                );
            } else {
                tracing::event!(
                    Level::ERROR,
                    "unhandled error when processing request: {:#?}",
                    err
                );
            }
        }

        self.inner.into_response()
    }
}

impl From<ApiError> for Error {
    fn from(api_err: ApiError) -> Self {
        Error {
            inner: api_err,
            context: None,
            src: None,
        }
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(_infallible: std::convert::Infallible) -> Self {
        Error::new()
            .source("Infallible. how did this happen")
    }
}

impl From<drive::Error> for Error {
    fn from(err: drive::Error) -> Self {
        match err {
            drive::Error::NotFound => Error::api(GeneralKind::NotFound),
            err => Error::api(GeneralKind::Upstream)
                .source(err)
        }
    }
}

impl From<QueryRejection> for Error {
    fn from(err: QueryRejection) -> Self {
        Error::api(GeneralKind::InvalidData)
            .message(err.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(err: PathRejection) -> Self {
        Error::api(GeneralKind::InvalidData)
            .message(err.body_text())
    }
}

impl From<JsonRejection> for Error {
    fn from(err: JsonRejection) -> Self {
        match err {
            JsonRejection::MissingJsonContentType(_) => Error::api(GeneralKind::MissingData)
                .message(err.body_text()),
            _ => Error::api(GeneralKind::InvalidData)
                .message(err.body_text()),
        }
    }
}
