pub const MIN_PAGE_SIZE: u32 = 1;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 50;

pub const MAX_NAME_CHARS: usize = 1024;

pub fn page_size_valid(given: u32) -> bool {
    (MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&given)
}

/// object names are free form but must contain something other than
/// whitespace and may not carry control characters
pub fn name_valid<G>(given: G) -> bool
where
    G: AsRef<str>
{
    let given_ref = given.as_ref();
    let mut char_count = 0;
    let mut has_visible = false;

    for ch in given_ref.chars() {
        if ch.is_control() {
            return false;
        }

        if !ch.is_whitespace() {
            has_visible = true;
        }

        char_count += 1;

        if char_count > MAX_NAME_CHARS {
            return false;
        }
    }

    has_visible
}

/// ids are opaque but the remote store only hands out url safe ids
pub fn id_valid<G>(given: G) -> bool
where
    G: AsRef<str>
{
    let given_ref = given.as_ref();

    !given_ref.is_empty() && given_ref.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
    })
}
