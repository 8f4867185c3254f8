//! Canonical feed URLs.
//!
//! The canonical form is the uniqueness key for registered feeds, so the
//! function here must be idempotent and must never fail.

const DEFAULT_SCHEME: &str = "http";
const SEPARATOR: &str = "://";

/// Canonicalize a feed or site URL.
///
/// - a missing scheme becomes `http://`
/// - the scheme is lowercased
/// - every run of `/` after the `://` separator collapses to a single `/`,
///   and slashes directly after the separator are dropped
///
/// Malformed input is passed through on a best-effort basis.
///
/// ```
/// use freshet::normalizer::url::normalize_url;
///
/// assert_eq!(normalize_url("xkcd.com"), "http://xkcd.com");
/// assert_eq!(normalize_url("https://xkcd.com//rss.xml"), "https://xkcd.com/rss.xml");
/// ```
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();

    let (scheme, rest) = match split_scheme(url) {
        Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
        None => (DEFAULT_SCHEME.to_string(), url),
    };

    let mut normalized = String::with_capacity(scheme.len() + SEPARATOR.len() + rest.len());
    normalized.push_str(&scheme);
    normalized.push_str(SEPARATOR);

    let mut last_was_slash = true; // drops slashes right after the separator
    for c in rest.chars() {
        if c == '/' {
            if last_was_slash {
                continue;
            }
            last_was_slash = true;
        } else {
            last_was_slash = false;
        }
        normalized.push(c);
    }

    normalized
}

/// Split `scheme://rest` when the prefix is a valid RFC 3986 scheme.
fn split_scheme(url: &str) -> Option<(&str, &str)> {
    let idx = url.find(SEPARATOR)?;
    let scheme = &url[..idx];

    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }

    Some((scheme, &url[idx + SEPARATOR.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_prepends_http_scheme() {
        assert_eq!(normalize_url("xkcd.com"), "http://xkcd.com");
        assert_eq!(normalize_url("xkcd.com/rss.xml"), "http://xkcd.com/rss.xml");
        assert_eq!(
            normalize_url("localhost:8080/feed"),
            "http://localhost:8080/feed"
        );
    }

    #[test]
    fn test_keeps_existing_scheme() {
        assert_eq!(normalize_url("http://xkcd.com"), "http://xkcd.com");
        assert_eq!(
            normalize_url("https://xkcd.com/atom.xml"),
            "https://xkcd.com/atom.xml"
        );
        assert_eq!(normalize_url("HTTPS://xkcd.com"), "https://xkcd.com");
    }

    #[test]
    fn test_collapses_slash_runs() {
        assert_eq!(
            normalize_url("http://xkcd.com//rss.xml"),
            "http://xkcd.com/rss.xml"
        );
        assert_eq!(
            normalize_url("http:///xkcd.com///a//b/"),
            "http://xkcd.com/a/b/"
        );
        assert_eq!(normalize_url("xkcd.com//rss.xml"), "http://xkcd.com/rss.xml");
        assert_eq!(normalize_url("//xkcd.com/rss.xml"), "http://xkcd.com/rss.xml");
    }

    #[test]
    fn test_same_resource_same_key() {
        let variants = [
            "xkcd.com/rss.xml",
            "http://xkcd.com/rss.xml",
            "http://xkcd.com//rss.xml",
            "  http://xkcd.com/rss.xml ",
            "HTTP://xkcd.com/rss.xml",
        ];
        for v in variants {
            assert_eq!(normalize_url(v), "http://xkcd.com/rss.xml", "input: {v:?}");
        }
    }

    #[test]
    fn test_invalid_scheme_is_not_a_scheme() {
        assert_eq!(normalize_url("1http://x.com"), "http://1http:/x.com");
    }

    #[test]
    fn test_empty_input_best_effort() {
        assert_eq!(normalize_url(""), "http://");
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(s in "\\PC*") {
            let once = normalize_url(&s);
            prop_assert_eq!(normalize_url(&once), once);
        }

        #[test]
        fn prop_separator_survives(
            scheme in prop::option::of("(http|https|HTTP)"),
            path in "[a-z0-9./:?=&-]{0,40}",
        ) {
            let input = match scheme {
                Some(s) => format!("{s}://{path}"),
                None => path,
            };
            let once = normalize_url(&input);
            prop_assert_eq!(normalize_url(&once), once.clone());

            let (_, rest) = once.split_once("://").expect("separator preserved");
            prop_assert!(!rest.contains("//"));
        }
    }
}
