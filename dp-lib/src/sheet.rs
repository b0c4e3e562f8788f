//! delimited text to spreadsheet grid conversion

pub const TAB: char = '\t';
pub const COMMA: char = ',';

fn is_line_break(ch: char) -> bool {
    ch == '\n' || ch == '\r'
}

/// picks the delimiter from the first non-blank line. tabs win ties so a
/// single column of plain values is read as one cell per line
pub fn delimiter_for(content: &str) -> Option<char> {
    let first = content.split(is_line_break)
        .map(str::trim)
        .find(|line| !line.is_empty())?;

    let tabs = first.matches(TAB).count();
    let commas = first.matches(COMMA).count();

    if tabs >= commas {
        Some(TAB)
    } else {
        Some(COMMA)
    }
}

/// parses comma or tab separated content into rows of trimmed cells.
///
/// a double quote opens a quoted field only as the first character of the
/// field, anywhere else it is kept as text. quoted fields may contain the
/// delimiter, line breaks and `""` escapes. lines containing only
/// whitespace are skipped and rows are not padded so the grid may be
/// ragged.
pub fn parse_grid(content: &str) -> Vec<Vec<String>> {
    let Some(delim) = delimiter_for(content) else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    let mut record = Record::default();
    let mut chars = content.chars().peekable();
    let mut in_quotes = false;

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    record.field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                record.field.push(ch);
            }

            continue;
        }

        match ch {
            '"' if record.field.is_empty() => {
                record.content = true;
                in_quotes = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.finish(&mut rows);
            }
            c if c == delim => {
                record.content = true;
                record.end_field();
            }
            c => {
                if !c.is_whitespace() {
                    record.content = true;
                }

                record.field.push(c);
            }
        }
    }

    record.finish(&mut rows);

    rows
}

#[derive(Default)]
struct Record {
    cells: Vec<String>,
    field: String,
    content: bool,
}

impl Record {
    fn end_field(&mut self) {
        let field = std::mem::take(&mut self.field);

        self.cells.push(field.trim().to_owned());
    }

    fn finish(&mut self, rows: &mut Vec<Vec<String>>) {
        if self.content {
            self.end_field();
            rows.push(std::mem::take(&mut self.cells));
        } else {
            self.cells.clear();
            self.field.clear();
        }

        self.content = false;
    }
}
