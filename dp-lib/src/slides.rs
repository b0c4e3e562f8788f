/// splits slide content into the title line and the remaining body. the
/// content is trimmed before the split and the body keeps its inner line
/// breaks
pub fn split_title_body(content: &str) -> (String, String) {
    let trimmed = content.trim();

    match trimmed.split_once('\n') {
        Some((title, body)) => (title.to_owned(), body.to_owned()),
        None => (trimmed.to_owned(), String::new()),
    }
}
