//! Pure rules deciding whether a stored cookie applies to a request.

use std::net::{Ipv4Addr, Ipv6Addr};

// http://tools.ietf.org/html/rfc6265#section-5.1.3
pub(crate) fn domain_matches(request_host: &str, cookie_domain: &str) -> bool {
    if cookie_domain.eq_ignore_ascii_case(request_host) {
        return true;
    }

    let request_host = &request_host.to_lowercase();
    let cookie_domain = &cookie_domain.to_lowercase();

    request_host.ends_with(cookie_domain)
        && request_host.as_bytes()[request_host.len() - cookie_domain.len() - 1] == b'.'
        && request_host.parse::<Ipv4Addr>().is_err()
        && request_host.parse::<Ipv6Addr>().is_err()
}

// http://tools.ietf.org/html/rfc6265#section-5.1.4
pub(crate) fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }

    if request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
    {
        return true;
    }

    false
}

/// Enumerate the stored domain keys that could match the given request
/// host: the host itself, plus every suffix beginning at a label boundary.
///
/// Restricting lookups to these keys is what makes the dot-boundary rule
/// structural: `evilyahoo.com` never visits the `yahoo.com` table because
/// `yahoo.com` is not one of its label suffixes.
pub(crate) fn candidate_domains(host: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(Some(host), |current| {
        current.find('.').map(|idx| &current[idx + 1..])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("127.0.0.1", "127.0.0.1", true)]
    #[test_case("127.0.0.2", "0.0.2", false)]
    #[test_case("bar.com", "bar.com", true)]
    #[test_case("Bar.Com", "bar.com", true; "host case insensitive")]
    #[test_case("baz.com", "bar.com", false)]
    #[test_case("baz.bar.com", "bar.com", true)]
    #[test_case("www.baz.com", "baz.com", true)]
    #[test_case("baz.bar.com", "com", true)]
    #[test_case("evilyahoo.com", "yahoo.com", false)]
    #[test_case("yahoo.com", "yahoo.com", true)]
    #[test_case("mail.yahoo.com", "yahoo.com", true)]
    fn test_domain_matches(request_host: &str, cookie_domain: &str, should_match: bool) {
        assert_eq!(domain_matches(request_host, cookie_domain), should_match);
    }

    #[test_case("/foo", "/foo", true)]
    #[test_case("/Bar", "/bar", false)]
    #[test_case("/fo", "/foo", false)]
    #[test_case("/foo/bar", "/foo", true)]
    #[test_case("/foo/bar/baz", "/foo", true)]
    #[test_case("/foo/bar//baz", "/foo", true; "double slash under prefix")]
    #[test_case("/foobar", "/foo", false)]
    #[test_case("/foo", "/foo/bar", false)]
    #[test_case("/foobar", "/foo/bar", false)]
    #[test_case("/foo/bar", "/foo/bar", true)]
    #[test_case("/foo/bar/", "/foo/bar", true; "trailing slash request")]
    #[test_case("/foo/bar/baz", "/foo/bar", true)]
    #[test_case("/foo/bar", "/foo/bar/", false)]
    #[test_case("/foo/bar/", "/foo/bar/", true; "trailing slash both")]
    #[test_case("/foo/bar/baz", "/foo/bar/", true; "deep path trailing slash cookie")]
    #[test_case("/anything", "/", true)]
    fn test_path_matches(request_path: &str, cookie_path: &str, should_match: bool) {
        assert_eq!(path_matches(request_path, cookie_path), should_match);
    }

    #[test]
    fn candidate_domains_walk_label_boundaries() {
        let candidates: Vec<_> = candidate_domains("a.b.example.com").collect();

        assert_eq!(candidates, ["a.b.example.com", "b.example.com", "example.com", "com"]);
    }

    #[test]
    fn candidate_domains_for_bare_host() {
        let candidates: Vec<_> = candidate_domains("localhost").collect();

        assert_eq!(candidates, ["localhost"]);
    }
}
