use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Root {
    pub id: Option<String>,
    pub path: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct Google {
    pub token_json: Option<String>,
    pub token_file: Option<PathBuf>,
    pub credentials_file: Option<PathBuf>,
    pub credentials_json: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Listener {
    pub addr: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub api_key: Option<String>,
    pub root: Option<Root>,
    pub google: Option<Google>,
    pub listener: Option<Listener>,

    /// request timeout in seconds
    pub timeout: Option<u64>,
}
