pub const FOLDER: &str = "application/vnd.google-apps.folder";
pub const DOCUMENT: &str = "application/vnd.google-apps.document";
pub const SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";
pub const PRESENTATION: &str = "application/vnd.google-apps.presentation";

pub const TEXT_PLAIN: &str = "text/plain";

/// the object types whose content is edited through structured requests
/// instead of raw media uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structured {
    Document,
    Spreadsheet,
    Presentation,
}

impl Structured {
    pub fn from_mime(given: &str) -> Option<Self> {
        match given {
            DOCUMENT => Some(Structured::Document),
            SPREADSHEET => Some(Structured::Spreadsheet),
            PRESENTATION => Some(Structured::Presentation),
            _ => None
        }
    }

    pub fn as_mime(&self) -> &'static str {
        match self {
            Structured::Document => DOCUMENT,
            Structured::Spreadsheet => SPREADSHEET,
            Structured::Presentation => PRESENTATION,
        }
    }
}

impl std::fmt::Display for Structured {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_mime())
    }
}
