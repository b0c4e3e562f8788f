use crate::config;
use crate::drive::{ChildKind, Drive};
use crate::net::error::{self, FsKind};

/// the id the remote store uses for the top of a drive
pub const DRIVE_ROOT: &str = "root";

/// where the playground root comes from. fixed ids are used as given,
/// paths are walked from the drive root on every resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootSource {
    Fixed(String),
    Path(Vec<String>),
}

impl RootSource {
    pub fn from_config(root: &config::Root) -> Self {
        match &root.id {
            Some(id) => RootSource::Fixed(id.clone()),
            None => RootSource::Path(root.path.clone()),
        }
    }

    pub async fn resolve(&self, drive: &dyn Drive) -> error::Result<String> {
        let segments = match self {
            RootSource::Fixed(id) => return Ok(id.clone()),
            RootSource::Path(segments) => segments,
        };

        let mut parent = String::from(DRIVE_ROOT);

        for name in segments {
            match drive.find_child(&parent, name, ChildKind::Folder).await? {
                Some(id) => {
                    tracing::debug!("root segment \"{name}\" -> {id}");

                    parent = id;
                }
                None => {
                    return Err(error::Error::api((
                        FsKind::RootNotFound,
                        format!(
                            "Folder not found: {}. Missing after: {name}",
                            segments.join(" / ")
                        )
                    )));
                }
            }
        }

        Ok(parent)
    }
}
