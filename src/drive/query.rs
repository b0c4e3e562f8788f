//! builder for the drive search query language

use dp_lib::mime;

/// quotes a string literal for use in a query. backslashes and single
/// quotes are escaped so caller supplied names cannot alter the query
pub fn literal(given: &str) -> String {
    let mut rtn = String::with_capacity(given.len() + 2);
    rtn.push('\'');

    for ch in given.chars() {
        match ch {
            '\\' => rtn.push_str("\\\\"),
            '\'' => rtn.push_str("\\'"),
            c => rtn.push(c),
        }
    }

    rtn.push('\'');
    rtn
}

#[derive(Debug, Default)]
pub struct Query {
    clauses: Vec<String>,
}

impl Query {
    pub fn new() -> Self {
        Query::default()
    }

    pub fn in_parents(mut self, parent: &str) -> Self {
        self.clauses.push(format!("{} in parents", literal(parent)));
        self
    }

    pub fn name_is(mut self, name: &str) -> Self {
        self.clauses.push(format!("name = {}", literal(name)));
        self
    }

    pub fn mime_is(mut self, mime_type: &str) -> Self {
        self.clauses.push(format!("mimeType = {}", literal(mime_type)));
        self
    }

    pub fn folders(self) -> Self {
        self.mime_is(mime::FOLDER)
    }

    pub fn not_trashed(mut self) -> Self {
        self.clauses.push(String::from("trashed = false"));
        self
    }

    pub fn build(&self) -> String {
        let mut rtn = String::new();

        for (index, clause) in self.clauses.iter().enumerate() {
            if index > 0 {
                rtn.push_str(" and ");
            }

            rtn.push_str(clause);
        }

        rtn
    }
}
