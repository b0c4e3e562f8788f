use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::net::{SocketAddr, IpAddr, Ipv4Addr};
use std::fmt::{Display, Formatter};
use std::time::Duration;

use clap::Parser;

use crate::error::{self, Context};

mod shape;

pub const DEFAULT_PORT: u16 = 8765;
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;
pub const DEFAULT_ROOT_PATH: [&str; 3] = ["Personal", "AI Research", "OpenClaw Playground"];

pub const ENV_API_KEY: &str = "DRIVE_PLAYGROUND_API_KEY";
pub const ENV_FOLDER_ID: &str = "DRIVE_PLAYGROUND_FOLDER_ID";
pub const ENV_ROOT_PATH: &str = "DRIVE_PLAYGROUND_PATH";
pub const ENV_TOKEN_JSON: &str = "GOOGLE_DRIVE_TOKEN_JSON";
pub const ENV_TOKEN_FILE: &str = "GOOGLE_DRIVE_TOKEN_FILE";
pub const ENV_CREDENTIALS_FILE: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ENV_CREDENTIALS_JSON: &str = "GOOGLE_DRIVE_CREDENTIALS_JSON";
pub const ENV_PORT: &str = "PORT";

#[derive(Debug, Parser)]
#[command(author, version ,about, long_about = None)]
pub struct CliArgs {
    /// a yaml or json config file to load settings from. environment
    /// variables override anything loaded
    #[arg(long)]
    config: Vec<PathBuf>
}

#[derive(Debug)]
pub struct Config {
    pub settings: Settings,
}

impl Config {
    pub fn from_args(args: CliArgs) -> error::Result<Self> {
        let cwd = std::env::current_dir()
            .context("failed to retrieve cwd for Settings")?;

        match dotenvy::from_path(cwd.join(".env")) {
            Ok(()) => tracing::debug!("loaded .env file"),
            Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(error::Error::config("failed to load .env file").source(err));
            }
        }

        let mut settings = Settings::with_cwd(&cwd);

        for config_path in args.config {
            let full = if config_path.is_absolute() {
                config_path
            } else {
                normalize(cwd.join(config_path))
            };

            tracing::debug!("loading config file \"{}\"", full.display());

            let loaded = Self::load_file(&full)?;
            let src = SrcFile::new(&full)?;
            let dot = DotPath::new(&"settings");

            settings.merge(&src, dot, loaded)?;
        }

        settings.merge_env(|key| std::env::var(key).ok())?;
        settings.check()?;

        tracing::debug!("{settings:#?}");

        Ok(Config {
            settings,
        })
    }

    fn load_file(path: &PathBuf) -> error::Result<shape::Settings> {
        let ext = path.extension().context(format!(
            "failed to retrieve the file extension for config file: \"{}\"", path.display()
        ))?;

        let ext = ext.to_ascii_lowercase();
        let file = std::fs::OpenOptions::new()
            .read(true)
            .open(path)
            .context(format!("failed to open config file: \"{}\"", path.display()))?;
        let reader = std::io::BufReader::new(file);

        if ext.eq("yaml") || ext.eq("yml") {
            serde_yaml::from_reader(reader).context(format!(
                "failed to parse yaml config file: \"{}\"", path.display()
            ))
        } else if ext.eq("json") {
            serde_json::from_reader(reader).context(format!(
                "failed to parse json config file: \"{}\"", path.display()
            ))
        } else {
            Err(error::Error::config(format!(
                "unknown type of config file: \"{}\"", path.display()
            )))
        }
    }
}

struct SrcFile<'a> {
    parent: &'a Path,
    src: &'a Path,
}

impl<'a> SrcFile<'a> {
    fn new(src: &'a Path) -> error::Result<Self> {
        let parent = src.parent().context(format!(
            "failed to retrieve parent path from source file \"{}\"", src.display()
        ))?;

        Ok(SrcFile {
            parent,
            src
        })
    }
}

impl<'a> Display for SrcFile<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.src.display())
    }
}

struct DotPath<'a>(Vec<&'a dyn Display>);

impl<'a> DotPath<'a> {
    fn new(name: &'a (dyn Display)) -> Self {
        DotPath(vec![name])
    }

    fn push(&self, name: &'a (dyn Display)) -> Self {
        let mut path = self.0.clone();
        path.push(name);

        DotPath(path)
    }
}

impl<'a> Display for DotPath<'a> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;

        for name in &self.0 {
            if first {
                write!(fmt, "{name}")?;
                first = false;
            } else {
                write!(fmt, ".{name}")?;
            }
        }

        Ok(())
    }
}

/// a value that is never written out by Debug
#[derive(Clone, Default)]
pub struct Secret(String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(<redacted>)")
        }
    }
}

#[derive(Debug)]
pub struct Settings {
    pub api_key: Secret,
    pub root: Root,
    pub google: Google,
    pub listener: Listener,
    pub timeout: Duration,
}

impl Settings {
    fn with_cwd(cwd: &Path) -> Self {
        Settings {
            api_key: Secret::default(),
            root: Root::default(),
            google: Google::with_cwd(cwd),
            listener: Listener::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, settings: shape::Settings) -> error::Result<()> {
        if let Some(api_key) = settings.api_key {
            self.api_key = Secret(api_key.trim().to_owned());
        }

        if let Some(root) = settings.root {
            self.root.merge(src, dot.push(&"root"), root)?;
        }

        if let Some(google) = settings.google {
            self.google.merge(src, dot.push(&"google"), google)?;
        }

        if let Some(listener) = settings.listener {
            self.listener.merge(src, dot.push(&"listener"), listener)?;
        }

        if let Some(timeout) = settings.timeout {
            if timeout == 0 {
                return Err(error::Error::config(format!(
                    "{}.timeout must be greater than 0 file: {src}", dot
                )));
            }

            self.timeout = Duration::from_secs(timeout);
        }

        Ok(())
    }

    /// applies environment overrides. blank values count as unset
    fn merge_env<F>(&mut self, lookup: F) -> error::Result<()>
    where
        F: Fn(&str) -> Option<String>
    {
        let get = |key: &str| lookup(key)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty());

        if let Some(api_key) = get(ENV_API_KEY) {
            self.api_key = Secret(api_key);
        }

        if let Some(id) = get(ENV_FOLDER_ID) {
            self.root.id = Some(id);
        }

        if let Some(path) = get(ENV_ROOT_PATH) {
            self.root.path = split_root_path(&path);
        }

        if let Some(token_json) = get(ENV_TOKEN_JSON) {
            self.google.token_json = Some(Secret(token_json));
        }

        if let Some(token_file) = get(ENV_TOKEN_FILE) {
            self.google.token_file = PathBuf::from(token_file);
        }

        if let Some(credentials_file) = get(ENV_CREDENTIALS_FILE) {
            self.google.credentials_file = PathBuf::from(credentials_file);
        }

        if let Some(credentials_json) = get(ENV_CREDENTIALS_JSON) {
            self.google.credentials_json = Some(Secret(credentials_json));
        }

        if let Some(port) = get(ENV_PORT) {
            let port = u16::from_str(&port).map_err(|err| error::Error::config(format!(
                "{ENV_PORT} is not a valid port: \"{port}\""
            )).source(err))?;

            self.listener.addr.set_port(port);
        }

        Ok(())
    }

    fn check(&self) -> error::Result<()> {
        if self.api_key.is_empty() {
            return Err(error::Error::config(format!(
                "Set {ENV_API_KEY} in the environment."
            )));
        }

        if self.root.id.is_none() && self.root.path.is_empty() {
            return Err(error::Error::config(format!(
                "no root folder given. set {ENV_FOLDER_ID} or {ENV_ROOT_PATH}"
            )));
        }

        Ok(())
    }
}

fn split_root_path(given: &str) -> Vec<String> {
    given.split('/')
        .map(str::trim)
        .filter(|seg| !seg.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[derive(Debug)]
pub struct Root {
    pub id: Option<String>,
    pub path: Vec<String>,
}

impl Root {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, root: shape::Root) -> error::Result<()> {
        if let Some(id) = root.id {
            let trimmed = id.trim();

            if trimmed.is_empty() {
                self.id = None;
            } else if dp_lib::validation::id_valid(trimmed) {
                self.id = Some(trimmed.to_owned());
            } else {
                return Err(error::Error::config(format!(
                    "{}.id invalid: \"{id}\" file: {src}", dot
                )));
            }
        }

        if let Some(path) = root.path {
            let segments: Vec<String> = path.iter()
                .map(|seg| seg.trim())
                .filter(|seg| !seg.is_empty())
                .map(ToOwned::to_owned)
                .collect();

            if segments.is_empty() {
                return Err(error::Error::config(format!(
                    "{}.path must contain at least one folder name file: {src}", dot
                )));
            }

            self.path = segments;
        }

        Ok(())
    }
}

impl Default for Root {
    fn default() -> Self {
        Root {
            id: None,
            path: DEFAULT_ROOT_PATH.iter()
                .map(|seg| seg.to_string())
                .collect(),
        }
    }
}

#[derive(Debug)]
pub struct Google {
    pub token_json: Option<Secret>,
    pub token_file: PathBuf,
    pub credentials_file: PathBuf,
    pub credentials_json: Option<Secret>,
}

impl Google {
    fn with_cwd(cwd: &Path) -> Self {
        Google {
            token_json: None,
            token_file: cwd.join("token.json"),
            credentials_file: cwd.join("credentials.json"),
            credentials_json: None,
        }
    }

    fn merge(&mut self, src: &SrcFile<'_>, _dot: DotPath<'_>, google: shape::Google) -> error::Result<()> {
        if let Some(token_json) = google.token_json {
            self.token_json = Some(Secret(token_json));
        }

        if let Some(token_file) = google.token_file {
            self.token_file = relative_to(token_file, src);
        }

        if let Some(credentials_file) = google.credentials_file {
            self.credentials_file = relative_to(credentials_file, src);
        }

        if let Some(credentials_json) = google.credentials_json {
            self.credentials_json = Some(Secret(credentials_json));
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct Listener {
    pub addr: SocketAddr,
}

impl Listener {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, listener: shape::Listener) -> error::Result<()> {
        self.addr = match SocketAddr::from_str(&listener.addr) {
            Ok(valid) => valid,
            Err(_) => match IpAddr::from_str(&listener.addr) {
                Ok(valid) => SocketAddr::from((valid, DEFAULT_PORT)),
                Err(_) => {
                    return Err(error::Error::config(format!(
                        "{dot}.addr invalid: \"{}\" file: {src}", listener.addr
                    )));
                }
            }
        };

        Ok(())
    }
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
        }
    }
}

fn relative_to(given: PathBuf, src: &SrcFile<'_>) -> PathBuf {
    if given.is_absolute() {
        given
    } else {
        normalize(src.parent.join(given))
    }
}

fn normalize<P>(path: P) -> PathBuf
where
    P: AsRef<Path>
{
    let mut rtn = PathBuf::new();

    for comp in path.as_ref().components() {
        match comp {
            Component::ParentDir => {
                rtn.pop();
            }
            Component::CurDir => {}
            _ => {
                rtn.push(comp.as_os_str());
            }
        }
    }

    rtn
}
