//! URL normalization and merge-request reference extraction

use once_cell::sync::Lazy;
use regex::Regex;

/// Stored URLs are capped at this many characters
const MAX_URL_LEN: usize = 300;

static MR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"gitlab\.com/([^/]+/[^/]+)(?:/-)?/merge_requests/(\d+)")
        .expect("merge-request pattern is valid")
});

/// Normalizes a free-text URL field.
///
/// Trims whitespace and treats an empty result as absent. A value
/// without an `http://` or `https://` scheme gets `https://`
/// prefixed, and the result is truncated to 300 characters. The
/// function is idempotent for values that survive untruncated.
pub fn normalize_url(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    if url.chars().count() > MAX_URL_LEN {
        Some(url.chars().take(MAX_URL_LEN).collect())
    } else {
        Some(url)
    }
}

/// Repository slug and request number inferred from a merge-request URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MrRef {
    /// `group/project` slug
    pub repo: Option<String>,
    /// Request number formatted as `!<number>`
    pub iid: Option<String>,
}

/// Attempts to recognize a GitLab merge-request URL.
///
/// Matches `gitlab.com/<group>/<project>/-/merge_requests/<n>` (the
/// `-` segment is optional). Unrecognized URLs are still valid links,
/// they just yield no metadata.
pub fn extract_mr_ref(url: &str) -> MrRef {
    match MR_RE.captures(url) {
        Some(caps) => MrRef {
            repo: Some(caps[1].to_string()),
            iid: Some(format!("!{}", &caps[2])),
        },
        None => MrRef::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_https_scheme() {
        assert_eq!(
            normalize_url(Some("example.com/path")).as_deref(),
            Some("https://example.com/path")
        );
    }

    #[test]
    fn test_normalize_keeps_existing_scheme() {
        assert_eq!(
            normalize_url(Some("http://example.com")).as_deref(),
            Some("http://example.com")
        );
        assert_eq!(
            normalize_url(Some("https://example.com")).as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn test_normalize_blank_is_absent() {
        assert_eq!(normalize_url(None), None);
        assert_eq!(normalize_url(Some("")), None);
        assert_eq!(normalize_url(Some("   ")), None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["example.com", "https://example.com/a?b=c", "  spaced.io  "] {
            let once = normalize_url(Some(raw)).unwrap();
            let twice = normalize_url(Some(&once)).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_normalize_truncates_to_300_chars() {
        let long = format!("example.com/{}", "a".repeat(400));
        let normalized = normalize_url(Some(&long)).unwrap();
        assert_eq!(normalized.chars().count(), 300);
        assert!(normalized.starts_with("https://example.com/"));
    }

    #[test]
    fn test_extract_gitlab_url() {
        let mr = extract_mr_ref("https://gitlab.com/group/proj/-/merge_requests/42");
        assert_eq!(mr.repo.as_deref(), Some("group/proj"));
        assert_eq!(mr.iid.as_deref(), Some("!42"));
    }

    #[test]
    fn test_extract_gitlab_url_without_dash_segment() {
        let mr = extract_mr_ref("https://gitlab.com/team/app/merge_requests/7");
        assert_eq!(mr.repo.as_deref(), Some("team/app"));
        assert_eq!(mr.iid.as_deref(), Some("!7"));
    }

    #[test]
    fn test_extract_requires_two_segment_repo_path() {
        // Subgroup URLs carry three path segments and are not recognized
        let mr = extract_mr_ref("https://gitlab.com/group/sub/proj/-/merge_requests/9");
        assert_eq!(mr, MrRef::default());
    }

    #[test]
    fn test_extract_non_gitlab_url_yields_nothing() {
        let mr = extract_mr_ref("https://example.com/mr/42");
        assert_eq!(mr, MrRef::default());
    }

    #[test]
    fn test_extract_ignores_non_numeric_request() {
        let mr = extract_mr_ref("https://gitlab.com/group/proj/-/merge_requests/abc");
        assert_eq!(mr, MrRef::default());
    }
}
