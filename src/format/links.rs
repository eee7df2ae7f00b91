use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::form_urlencoded::byte_serialize;
use url::Url;

/// Namespace whose contributions are linked for bot bursts (User:).
pub const USER_NAMESPACE: i64 = 2;

/// Everything but unreserved characters and `/`, which subpage titles keep.
const TITLE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

fn encode_title(title: &str) -> String {
    utf8_percent_encode(title, TITLE_ENCODE_SET).to_string()
}

/// Form encoding (`+` for spaces), used for the contributions user name.
fn encode_form(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

/// Builds links into the wiki's web interface.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base_url: Url,
}

impl LinkBuilder {
    /// `base_url` is the directory `index.php` lives in, with a trailing slash.
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    pub fn revision(&self, revid: u64) -> String {
        format!("{}?oldid={}", self.base_url, revid)
    }

    pub fn diff(&self, revid: u64, old_revid: u64) -> String {
        format!("{}?diff={}&oldid={}", self.base_url, revid, old_revid)
    }

    pub fn page(&self, title: &str) -> String {
        format!("{}?title={}", self.base_url, encode_title(title))
    }

    /// Contributions of `user` older than `offset` (`YYYYMMDDHHMMSS`), outside
    /// the user namespace and its talk namespace.
    pub fn contributions(&self, user: &str, offset: &str, limit: usize) -> String {
        format!(
            "{}index.php?title=Special:Contributions/{}&offset={}&limit={}&namespace={}&wpfilters%5B%5D=nsInvert&wpfilters%5B%5D=associated",
            self.base_url,
            encode_form(user),
            offset,
            limit,
            USER_NAMESPACE
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> LinkBuilder {
        LinkBuilder::new(Url::parse("https://wiki.example.org/").unwrap())
    }

    #[test]
    fn test_revision_and_diff() {
        assert_eq!(links().revision(42), "https://wiki.example.org/?oldid=42");
        assert_eq!(
            links().diff(43, 42),
            "https://wiki.example.org/?diff=43&oldid=42"
        );
    }

    #[test]
    fn test_page_title_is_encoded() {
        assert_eq!(
            links().page("File:Logo & Co.png"),
            "https://wiki.example.org/?title=File%3ALogo%20%26%20Co.png"
        );
    }

    #[test]
    fn test_page_title_keeps_subpage_slash() {
        assert_eq!(
            links().page("Archives/New Name"),
            "https://wiki.example.org/?title=Archives/New%20Name"
        );
        assert_eq!(
            links().page("Caf\u{e9}"),
            "https://wiki.example.org/?title=Caf%C3%A9"
        );
    }

    #[test]
    fn test_contributions() {
        assert_eq!(
            links().contributions("Archive Bot", "20240501100001", 4),
            "https://wiki.example.org/index.php?title=Special:Contributions/Archive+Bot&offset=20240501100001&limit=4&namespace=2&wpfilters%5B%5D=nsInvert&wpfilters%5B%5D=associated"
        );
    }
}
