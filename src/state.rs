use std::sync::Arc;
use std::time::Duration;

use crate::config;
use crate::drive::Drive;
use crate::drive::google::{Endpoints, GoogleDrive};
use crate::error::{self, Context};
use crate::fs::RootSource;
use crate::sec::authn::api_key;
use crate::sec::credentials::AuthorizedUser;

pub struct Shared {
    api_key: blake3::Hash,
    root: RootSource,
    drive: Arc<dyn Drive>,
    timeout: Duration,
}

pub type ArcShared = Arc<Shared>;

impl Shared {
    pub fn new(api_key: &str, root: RootSource, drive: Arc<dyn Drive>, timeout: Duration) -> Self {
        Shared {
            api_key: api_key::digest(api_key),
            root,
            drive,
            timeout,
        }
    }

    pub fn from_config(config: &config::Config) -> error::Result<Shared> {
        tracing::debug!("creating Shared state");

        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create http client")?;

        let tokens = AuthorizedUser::from_config(client.clone(), &config.settings.google)?;
        let endpoints = Endpoints::google()
            .context("invalid remote service endpoints")?;
        let drive = GoogleDrive::new(client, Arc::new(tokens), endpoints);

        Ok(Shared::new(
            config.settings.api_key.expose(),
            RootSource::from_config(&config.settings.root),
            Arc::new(drive),
            config.settings.timeout,
        ))
    }

    pub fn api_key(&self) -> &blake3::Hash {
        &self.api_key
    }

    pub fn root(&self) -> &RootSource {
        &self.root
    }

    pub fn drive(&self) -> &dyn Drive {
        self.drive.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("root", &self.root)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
