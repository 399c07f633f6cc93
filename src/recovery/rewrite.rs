//! Pure URL rewrite strategies.
//!
//! Each strategy returns candidate URLs in probe order. Rewrites never
//! fail: an unparseable or unmatchable URL degrades to itself, leaving the
//! probe to decide.

use crate::metrics::types::ErrorKind;
use url::Url;

/// Candidate rewrites for `url` given the failure classification.
pub fn candidates_for(url: &str, kind: ErrorKind) -> Vec<String> {
    match kind {
        ErrorKind::Optimization => vec![unwrap_proxy(url)],
        ErrorKind::Network => cdn_substitutions(url),
        ErrorKind::Validation => validation_fixes(url),
        ErrorKind::Unknown => vec![url.to_string()],
    }
}

/// Strip an image-proxy wrapper, recovering the underlying asset URL from
/// its `url` (or `src`) query parameter.
fn unwrap_proxy(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    for (key, value) in parsed.query_pairs() {
        if key == "url" || key == "src" {
            let inner = value.into_owned();
            if !inner.is_empty() {
                return inner;
            }
        }
    }
    url.to_string()
}

fn is_cdn_url(parsed: &Url) -> bool {
    parsed
        .host_str()
        .is_some_and(|host| host.contains("cloudinary") || host.contains("imgix") || host.contains("cdn"))
}

/// Ordered parameter substitutions for CDN-served images: quality, then
/// format, then dimensions, each relaxed to `auto`. Non-CDN URLs get a
/// single retest of the original.
fn cdn_substitutions(url: &str) -> Vec<String> {
    let Ok(parsed) = Url::parse(url) else {
        return vec![url.to_string()];
    };
    if !is_cdn_url(&parsed) {
        return vec![url.to_string()];
    }

    let mut candidates = Vec::new();
    for keys in [
        &["quality", "q"][..],
        &["format", "f"][..],
        &["width", "height", "w", "h"][..],
    ] {
        if let Some(candidate) = replace_query_params(&parsed, keys, "auto") {
            candidates.push(candidate);
        }
    }

    if candidates.is_empty() {
        candidates.push(url.to_string());
    }
    candidates
}

/// Rewrite the values of `keys` to `value`, returning `None` when nothing
/// changed.
fn replace_query_params(parsed: &Url, keys: &[&str], value: &str) -> Option<String> {
    let mut changed = false;
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            if keys.contains(&k.as_ref()) && v != value {
                changed = true;
                (k.into_owned(), value.to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();

    if !changed {
        return None;
    }

    let mut rewritten = parsed.clone();
    rewritten.query_pairs_mut().clear().extend_pairs(pairs);
    Some(rewritten.to_string())
}

/// Ordered fixes for malformed URLs: https upgrade, duplicate-slash
/// collapse, whitespace trim.
fn validation_fixes(url: &str) -> Vec<String> {
    let trimmed = url.trim();
    let mut candidates = Vec::new();

    if let Some(rest) = trimmed.strip_prefix("http://") {
        candidates.push(format!("https://{rest}"));
    }

    let collapsed = collapse_slashes(trimmed);
    if collapsed != trimmed {
        candidates.push(collapsed);
    }

    if trimmed != url {
        candidates.push(trimmed.to_string());
    }

    if candidates.is_empty() {
        candidates.push(url.to_string());
    }
    candidates
}

/// Collapse runs of slashes in the path while keeping the scheme's `//`.
fn collapse_slashes(url: &str) -> String {
    let Some(idx) = url.find("://") else {
        return url.to_string();
    };
    let (scheme, rest) = url.split_at(idx + 3);

    let mut out = String::with_capacity(url.len());
    out.push_str(scheme);
    let mut prev_slash = false;
    for ch in rest.chars() {
        if ch == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_proxy_extracts_inner_url() {
        let wrapped =
            "https://site.test/_image/optimize?url=https%3A%2F%2Fassets.test%2Fphoto.jpg&w=640&q=75";
        let candidates = candidates_for(wrapped, ErrorKind::Optimization);
        assert_eq!(candidates, vec!["https://assets.test/photo.jpg".to_string()]);
    }

    #[test]
    fn test_unwrap_proxy_without_wrapper_returns_original() {
        let plain = "https://assets.test/photo.jpg";
        let candidates = candidates_for(plain, ErrorKind::Optimization);
        assert_eq!(candidates, vec![plain.to_string()]);
    }

    #[test]
    fn test_cdn_substitutions_in_order() {
        let url = "https://cdn.example.com/photo.jpg?quality=90&format=webp&width=1200";
        let candidates = candidates_for(url, ErrorKind::Network);

        assert_eq!(candidates.len(), 3);
        assert!(candidates[0].contains("quality=auto"));
        assert!(candidates[0].contains("format=webp"), "only quality changes first");
        assert!(candidates[1].contains("format=auto"));
        assert!(candidates[2].contains("width=auto"));
    }

    #[test]
    fn test_cdn_substitutions_skip_absent_params() {
        let url = "https://cdn.example.com/photo.jpg?q=80";
        let candidates = candidates_for(url, ErrorKind::Network);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].contains("q=auto"));
    }

    #[test]
    fn test_non_cdn_url_is_retested_verbatim() {
        let url = "https://plain.example.org/photo.jpg?quality=90";
        let candidates = candidates_for(url, ErrorKind::Network);
        assert_eq!(candidates, vec![url.to_string()]);
    }

    #[test]
    fn test_validation_https_upgrade() {
        let candidates = candidates_for("http://assets.test/photo.jpg", ErrorKind::Validation);
        assert_eq!(candidates[0], "https://assets.test/photo.jpg");
    }

    #[test]
    fn test_validation_collapses_slashes_keeps_scheme() {
        let candidates =
            candidates_for("https://assets.test//images///photo.jpg", ErrorKind::Validation);
        assert!(candidates.contains(&"https://assets.test/images/photo.jpg".to_string()));
    }

    #[test]
    fn test_validation_trims_whitespace() {
        let candidates = candidates_for("  https://assets.test/photo.jpg \n", ErrorKind::Validation);
        assert!(candidates.contains(&"https://assets.test/photo.jpg".to_string()));
    }

    #[test]
    fn test_validation_clean_url_retested() {
        let url = "https://assets.test/photo.jpg";
        let candidates = candidates_for(url, ErrorKind::Validation);
        assert_eq!(candidates, vec![url.to_string()]);
    }

    #[test]
    fn test_unknown_kind_retests_original() {
        let url = "https://assets.test/photo.jpg";
        assert_eq!(candidates_for(url, ErrorKind::Unknown), vec![url.to_string()]);
    }

    #[test]
    fn test_garbage_input_degrades_to_itself() {
        assert_eq!(
            candidates_for("not a url at all", ErrorKind::Optimization),
            vec!["not a url at all".to_string()]
        );
        assert_eq!(candidates_for("", ErrorKind::Network), vec![String::new()]);
    }
}
