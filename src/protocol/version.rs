//! The version-exchange line that precedes all framed traffic on a
//! connection.
//!
//! Both peers write one LF-terminated line of the form
//! `venti-<ver>[:<ver>]*-<comment>\n` before any packet is exchanged, then
//! read the peer's line and settle on the highest mutually-supported
//! version. This core speaks exactly one version, `"04"`.

/// The versions this core advertises, in preference order (highest first).
pub const VERSIONS: &[&str] = &["04"];

/// Free-text comment appended to our version line, purely informational.
pub const COMMENT: &str = "venti-rs";

/// Builds the version line this core sends, e.g. `"venti-04-venti-rs\n"`.
pub fn line() -> String {
    format!("venti-{}-{}\n", VERSIONS.join(":"), COMMENT)
}

/// Extracts the list of versions advertised in a peer's version line.
///
/// The line has the form `venti-<ver>[:<ver>]*-<comment>`; everything before
/// the first `-` and after the second is discarded.
pub fn parse(line: &str) -> Vec<String> {
    let line = line.trim_end_matches('\n').trim_end_matches('\r');
    match line.splitn(3, '-').nth(1) {
        Some(vs) => vs.split(':').map(str::to_owned).collect(),
        None => Vec::new(),
    }
}

/// Finds the best version both peers support, walking our own preference
/// list (highest first) and returning the first one the peer also lists.
pub fn negotiate(peer_line: &str) -> Option<&'static str> {
    let peer_versions = parse(peer_line);
    VERSIONS
        .iter()
        .find(|v| peer_versions.iter().any(|p| p == *v))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_roundtrips_through_parse() {
        let l = line();
        assert_eq!(parse(&l), vec!["04".to_string()]);
    }

    #[test]
    fn negotiate_common_version() {
        assert_eq!(negotiate("venti-04-plan9port\n"), Some("04"));
    }

    #[test]
    fn negotiate_multiple_peer_versions() {
        assert_eq!(negotiate("venti-05:04:03-foo\n"), Some("04"));
    }

    #[test]
    fn negotiate_no_overlap() {
        assert_eq!(negotiate("venti-99-foo\n"), None);
    }

    #[test]
    fn parse_malformed_line() {
        assert_eq!(parse("garbage"), Vec::<String>::new());
    }
}
