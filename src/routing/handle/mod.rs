use dp_lib::validation;

use crate::drive::Drive;
use crate::fs;
use crate::net::error::{self, GeneralKind};

pub mod health;
pub mod list;
pub mod files;
pub mod write;

pub async fn not_found() -> error::Error {
    error::Error::api(GeneralKind::NotFound)
}

pub async fn method_not_allowed() -> error::Error {
    error::Error::api(GeneralKind::InvalidMethod)
}

/// ids that cannot name a remote object are never looked up
pub async fn within_root(drive: &dyn Drive, id: &str, root: &str) -> bool {
    if id == root {
        return true;
    }

    validation::id_valid(id) && fs::is_under_root(drive, id, root).await
}

/// trimmed optional identifier from a request. blank values are absent
pub fn given_id(given: &Option<String>) -> Option<&str> {
    given.as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
