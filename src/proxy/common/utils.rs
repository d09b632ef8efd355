// Path and query utilities for forwarding

use url::form_urlencoded;

/// Request path split into workload name and the remainder to forward
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadPath<'a> {
    pub workload: &'a str,
    /// Remaining segments joined by `/`, empty when there are none
    pub sub_path: String,
}

/// Split a URL path on `/`, dropping empty segments.
///
/// Returns `None` when no segment is left (`/`, `//`, empty path).
pub fn split_workload_path(path: &str) -> Option<WorkloadPath<'_>> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let workload = segments.next()?;
    let sub_path = segments.collect::<Vec<_>>().join("/");
    Some(WorkloadPath { workload, sub_path })
}

/// Re-serialize a query string, encoding both keys and values.
///
/// Pair order and repeated keys are preserved. Returns `None` when the
/// query holds no pairs.
pub fn reencode_query(query: Option<&str>) -> Option<String> {
    let query = query?;
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut count = 0;
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        serializer.append_pair(&key, &value);
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(serializer.finish())
}

/// Build `{scheme}://{host}[/{sub_path}][?{query}]`
pub fn build_target_url(scheme: &str, host: &str, sub_path: &str, query: Option<&str>) -> String {
    let mut url = format!("{}://{}", scheme, host);
    if !sub_path.is_empty() {
        url.push('/');
        url.push_str(sub_path);
    }
    if let Some(qs) = reencode_query(query) {
        url.push('?');
        url.push_str(&qs);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_workload_path() {
        let parts = split_workload_path("/foo/bar/baz").unwrap();
        assert_eq!(parts.workload, "foo");
        assert_eq!(parts.sub_path, "bar/baz");

        let parts = split_workload_path("/foo").unwrap();
        assert_eq!(parts.workload, "foo");
        assert_eq!(parts.sub_path, "");

        // Empty segments are dropped
        let parts = split_workload_path("//foo//bar/").unwrap();
        assert_eq!(parts.workload, "foo");
        assert_eq!(parts.sub_path, "bar");
    }

    #[test]
    fn test_split_empty_path() {
        assert_eq!(split_workload_path(""), None);
        assert_eq!(split_workload_path("/"), None);
        assert_eq!(split_workload_path("///"), None);
    }

    #[test]
    fn test_build_target_url() {
        assert_eq!(
            build_target_url("https", "api.example.com", "v1/items", Some("limit=10")),
            "https://api.example.com/v1/items?limit=10"
        );
        assert_eq!(
            build_target_url("https", "api.example.com", "", None),
            "https://api.example.com"
        );
        assert_eq!(
            build_target_url("http", "127.0.0.1:8081", "a", Some("")),
            "http://127.0.0.1:8081/a"
        );
    }

    #[test]
    fn test_build_target_url_is_deterministic() {
        let first = build_target_url("https", "h.example.com", "x/y", Some("b=2&a=1"));
        let second = build_target_url("https", "h.example.com", "x/y", Some("b=2&a=1"));
        assert_eq!(first, second);
    }

    // Keys are encoded too and repeated keys survive, unlike a
    // value-only `encodeURIComponent` rewrite.
    #[test]
    fn test_reencode_query_encodes_keys_and_keeps_repeats() {
        assert_eq!(
            reencode_query(Some("tag=a&tag=b")).as_deref(),
            Some("tag=a&tag=b")
        );
        assert_eq!(
            reencode_query(Some("a%20key=x%26y")).as_deref(),
            Some("a+key=x%26y")
        );
        assert_eq!(reencode_query(Some("q=hello world")).as_deref(), Some("q=hello+world"));
        assert_eq!(reencode_query(Some("flag")).as_deref(), Some("flag="));
    }

    #[test]
    fn test_reencode_query_empty() {
        assert_eq!(reencode_query(None), None);
        assert_eq!(reencode_query(Some("")), None);
        assert_eq!(reencode_query(Some("&&")), None);
    }
}
