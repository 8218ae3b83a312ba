//! RFC 3986 URI handling for buffer and image references.
//!
//! Two value shapes: [`Uri`] borrows the input and never allocates (used for
//! peeking while parsing), [`UriBuf`] owns a percent-decoded copy. Component
//! positions are stored as offsets rather than sub-slices, so an owning value
//! can move freely.

use std::borrow::Cow;
use std::path::Path;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct Span {
    start: u32,
    len: u32,
}

impl Span {
    fn of(self) -> std::ops::Range<usize> {
        self.start as usize..(self.start + self.len) as usize
    }
}

/// Parsed component offsets, shared by both URI shapes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct Parts {
    scheme: Option<Span>,
    userinfo: Option<Span>,
    host: Option<Span>,
    port: Option<Span>,
    path: Span,
    query: Option<Span>,
    fragment: Option<Span>,
}

fn span(start: usize, end: usize) -> Span {
    Span {
        start: start as u32,
        len: (end - start) as u32,
    }
}

/// One-pass split into scheme / userinfo / host / port / path / query /
/// fragment. Data URIs short-circuit after the scheme: the entire remainder
/// becomes the path.
fn parse_parts(text: &str) -> Parts {
    let bytes = text.as_bytes();
    let mut parts = Parts::default();
    let mut pos = 0;

    // Scheme ends at the first ':' that precedes any '/', '?' or '#'.
    for (i, &c) in bytes.iter().enumerate() {
        match c {
            b':' => {
                parts.scheme = Some(span(0, i));
                pos = i + 1;
                break;
            }
            b'/' | b'?' | b'#' => break,
            _ => {}
        }
    }

    if let Some(scheme) = parts.scheme {
        if &text[scheme.of()] == "data" {
            parts.path = span(pos, text.len());
            return parts;
        }
    }

    // Authority.
    if bytes[pos..].starts_with(b"//") {
        pos += 2;
        let authority_end = bytes[pos..]
            .iter()
            .position(|&c| matches!(c, b'/' | b'?' | b'#'))
            .map_or(text.len(), |i| pos + i);
        let mut host_start = pos;
        if let Some(at) = bytes[pos..authority_end].iter().position(|&c| c == b'@') {
            parts.userinfo = Some(span(pos, pos + at));
            host_start = pos + at + 1;
        }
        let host_end;
        if bytes.get(host_start) == Some(&b'[') {
            // IPv6 literal; the closing bracket is part of the host.
            let close = bytes[host_start..authority_end]
                .iter()
                .position(|&c| c == b']')
                .map_or(authority_end, |i| host_start + i + 1);
            host_end = close;
        } else {
            host_end = bytes[host_start..authority_end]
                .iter()
                .position(|&c| c == b':')
                .map_or(authority_end, |i| host_start + i);
        }
        parts.host = Some(span(host_start, host_end));
        if bytes.get(host_end) == Some(&b':') {
            parts.port = Some(span(host_end + 1, authority_end));
        }
        pos = authority_end;
    }

    // Path runs to '?' or '#'.
    let path_end = bytes[pos..]
        .iter()
        .position(|&c| matches!(c, b'?' | b'#'))
        .map_or(text.len(), |i| pos + i);
    parts.path = span(pos, path_end);
    pos = path_end;

    if bytes.get(pos) == Some(&b'?') {
        let query_end = bytes[pos + 1..]
            .iter()
            .position(|&c| c == b'#')
            .map_or(text.len(), |i| pos + 1 + i);
        parts.query = Some(span(pos + 1, query_end));
        pos = query_end;
    }
    if bytes.get(pos) == Some(&b'#') {
        parts.fragment = Some(span(pos + 1, text.len()));
    }

    parts
}

macro_rules! component_accessors {
    () => {
        /// The URI scheme, without the trailing `:`.
        pub fn scheme(&self) -> Option<&str> {
            self.parts.scheme.map(|s| &self.text_ref()[s.of()])
        }

        /// The userinfo component, without the trailing `@`.
        pub fn userinfo(&self) -> Option<&str> {
            self.parts.userinfo.map(|s| &self.text_ref()[s.of()])
        }

        /// The host component.
        pub fn host(&self) -> Option<&str> {
            self.parts.host.map(|s| &self.text_ref()[s.of()])
        }

        /// The port component, without the leading `:`.
        pub fn port(&self) -> Option<&str> {
            self.parts.port.map(|s| &self.text_ref()[s.of()])
        }

        /// The path component. For data URIs this is everything after the
        /// scheme.
        pub fn path(&self) -> &str {
            &self.text_ref()[self.parts.path.of()]
        }

        /// The query component, without the leading `?`.
        pub fn query(&self) -> Option<&str> {
            self.parts.query.map(|s| &self.text_ref()[s.of()])
        }

        /// The fragment component, without the leading `#`.
        pub fn fragment(&self) -> Option<&str> {
            self.parts.fragment.map(|s| &self.text_ref()[s.of()])
        }

        /// Whether this is a `data:` URI.
        pub fn is_data_uri(&self) -> bool {
            self.scheme() == Some("data")
        }

        /// Whether the URI names a path on the local filesystem: either no
        /// scheme at all, or the `file` scheme with an empty host.
        pub fn is_local_path(&self) -> bool {
            match self.scheme() {
                None => true,
                Some("file") => self.host().map_or(true, str::is_empty),
                Some(_) => false,
            }
        }

        /// The local filesystem path, when [`Self::is_local_path`] holds.
        pub fn fs_path(&self) -> Option<&Path> {
            if self.is_local_path() {
                Some(Path::new(self.path()))
            } else {
                None
            }
        }

        /// A URI is valid when it is nonempty and its scheme, if present, is
        /// nonempty.
        pub fn valid(&self) -> bool {
            !self.text_ref().is_empty() && self.parts.scheme.map_or(true, |s| s.len > 0)
        }
    };
}

/// A borrowed, zero-allocation URI view.
#[derive(Clone, Copy, Debug)]
pub struct Uri<'a> {
    text: &'a str,
    parts: Parts,
}

impl<'a> Uri<'a> {
    /// Splits `text` without copying or decoding.
    pub fn parse(text: &'a str) -> Self {
        Self {
            text,
            parts: parse_parts(text),
        }
    }

    /// The unmodified input.
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    fn text_ref(&self) -> &str {
        self.text
    }

    component_accessors!();
}

impl std::fmt::Display for Uri<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text)
    }
}

/// An owning URI whose text has been percent-decoded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UriBuf {
    text: String,
    parts: Parts,
}

impl UriBuf {
    /// Copies `text`, collapses `%XX` escapes and re-parses the components
    /// against the decoded string.
    pub fn parse(text: &str) -> Self {
        let decoded: Cow<'_, str> = if text.contains('%') {
            match urlencoding::decode(text) {
                Ok(decoded) => decoded,
                Err(_) => Cow::Borrowed(text),
            }
        } else {
            Cow::Borrowed(text)
        };
        let text = decoded.into_owned();
        let parts = parse_parts(&text);
        Self { text, parts }
    }

    /// The decoded text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Borrows as a [`Uri`].
    pub fn as_uri(&self) -> Uri<'_> {
        Uri {
            text: &self.text,
            parts: self.parts,
        }
    }

    fn text_ref(&self) -> &str {
        &self.text
    }

    component_accessors!();
}

impl std::fmt::Display for UriBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_form() {
        let uri = Uri::parse("https://user:pw@example.com:8080/a/b?q=1#frag");
        assert_eq!(uri.scheme(), Some("https"));
        assert_eq!(uri.userinfo(), Some("user:pw"));
        assert_eq!(uri.host(), Some("example.com"));
        assert_eq!(uri.port(), Some("8080"));
        assert_eq!(uri.path(), "/a/b");
        assert_eq!(uri.query(), Some("q=1"));
        assert_eq!(uri.fragment(), Some("frag"));
        assert!(uri.valid());
        assert!(!uri.is_local_path());
    }

    #[test]
    fn relative_path() {
        let uri = Uri::parse("textures/diffuse.png");
        assert_eq!(uri.scheme(), None);
        assert_eq!(uri.path(), "textures/diffuse.png");
        assert!(uri.is_local_path());
        assert_eq!(uri.fs_path(), Some(Path::new("textures/diffuse.png")));
    }

    #[test]
    fn data_uri_short_circuits() {
        let uri = Uri::parse("data:application/octet-stream;base64,SGVsbG8=");
        assert!(uri.is_data_uri());
        assert_eq!(uri.path(), "application/octet-stream;base64,SGVsbG8=");
        assert_eq!(uri.query(), None);
    }

    #[test]
    fn file_scheme_is_local() {
        let uri = Uri::parse("file:///var/models/box.bin");
        assert_eq!(uri.scheme(), Some("file"));
        assert_eq!(uri.host(), Some(""));
        assert!(uri.is_local_path());
        assert_eq!(uri.fs_path(), Some(Path::new("/var/models/box.bin")));
    }

    #[test]
    fn ipv6_host() {
        let uri = Uri::parse("http://[::1]:9000/x");
        assert_eq!(uri.host(), Some("[::1]"));
        assert_eq!(uri.port(), Some("9000"));
        assert_eq!(uri.path(), "/x");
    }

    #[test]
    fn display_round_trips() {
        for text in [
            "https://example.com/a?b#c",
            "buffer.bin",
            "data:application/octet-stream;base64,AAAA",
            "file:///tmp/x.bin",
        ] {
            assert_eq!(Uri::parse(text).to_string(), text);
        }
    }

    #[test]
    fn percent_decoding() {
        let uri = UriBuf::parse("my%20model/mesh%20data.bin");
        assert_eq!(uri.as_str(), "my model/mesh data.bin");
        assert_eq!(uri.fs_path(), Some(Path::new("my model/mesh data.bin")));
    }

    #[test]
    fn empty_is_invalid() {
        assert!(!Uri::parse("").valid());
        assert!(!Uri::parse("://host/x").valid());
    }
}
