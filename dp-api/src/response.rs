use http::StatusCode;
use axum_core::body::Body;
use axum_core::response::{Response, IntoResponse};
use serde::Serialize;
use bytes::{BytesMut, BufMut};

pub fn serialize_json(
    status: StatusCode,
    data: &impl Serialize
) -> Result<Response, serde_json::Error> {
    let froze = {
        let mut buf = BytesMut::with_capacity(128).writer();
        serde_json::to_writer(&mut buf, data)?;

        buf.into_inner().freeze()
    };

    let mut response = Response::new(Body::from(froze));
    *response.status_mut() = status;

    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json")
    );

    Ok(response)
}

pub fn error_json() -> Response {
    let body = r#"{"kind":"InternalFailure"}"#;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;

    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json")
    );

    response
}

/// a successful json body sent with a 200 status
#[derive(Debug)]
pub struct Json<T>(pub T);

impl<T> IntoResponse for Json<T>
where
    T: Serialize
{
    fn into_response(self) -> Response {
        match serialize_json(StatusCode::OK, &self.0) {
            Ok(res) => res,
            Err(err) => {
                tracing::error!("Json<T> serialization error {:?}", err);
                error_json()
            }
        }
    }
}
