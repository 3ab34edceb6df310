//! Path template compilation and matching.
//!
//! # Responsibilities
//! - Normalize route templates (`users/` → `/users`, `` → `/`)
//! - Compile a template into literal and placeholder segments
//! - Test a concrete path and extract named captures
//!
//! # Design Decisions
//! - A placeholder is a whole segment of the form `{name}`, name in `[A-Za-z0-9_]+`
//! - Anything else is literal, including malformed braces; compilation never fails
//! - Matching is anchored at both ends and segment-wise, so a capture never spans `/`
//! - No regex to guarantee O(n) matching

use crate::routing::params::{Param, Params};

/// One compiled path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path segment byte for byte.
    Literal(String),
    /// Captures any non-empty path segment under the given name.
    Param(String),
}

/// Compiled form of a route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    template: String,
    segments: Vec<Segment>,
}

impl Matcher {
    /// Compile a template. The template is normalized first.
    pub fn compile(template: &str) -> Self {
        let template = normalize_template(template);
        let segments = split_segments(&template)
            .map(|segment| match placeholder_name(segment) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();

        Self { template, segments }
    }

    /// The normalized template this matcher was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in left-to-right order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Returns true if the whole path matches this template.
    pub fn matches(&self, path: &str) -> bool {
        self.captures(path).is_some()
    }

    /// Match the whole path, returning the captures in template order.
    pub fn captures(&self, path: &str) -> Option<Params> {
        if !path.starts_with('/') {
            return None;
        }

        let mut parts = split_segments(path);
        let mut params = Params::new();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.push(Param::new(name.as_str(), part));
                }
            }
        }

        // Anchored: leftover path segments mean no match.
        if parts.next().is_some() {
            return None;
        }

        Some(params)
    }
}

/// Normalize a template so that it starts with exactly one `/` and has no
/// trailing `/`. Empty and `/.` templates become `/`.
pub fn normalize_template(template: &str) -> String {
    let trimmed = template.trim_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        return "/".to_string();
    }
    format!("/{}", trimmed)
}

/// Returns the placeholder name if `segment` is exactly `{identifier}`.
pub(crate) fn placeholder_name(segment: &str) -> Option<&str> {
    let name = segment.strip_prefix('{')?.strip_suffix('}')?;
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_');
    valid.then_some(name)
}

/// Segments of an absolute path; `/` has none.
fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    let rest = path.strip_prefix('/').unwrap_or(path);
    let mut parts = rest.split('/');
    if rest.is_empty() {
        parts.next();
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_template() {
        assert_eq!(normalize_template(""), "/");
        assert_eq!(normalize_template("/"), "/");
        assert_eq!(normalize_template("."), "/");
        assert_eq!(normalize_template("/./"), "/");
        assert_eq!(normalize_template("users"), "/users");
        assert_eq!(normalize_template("/users/"), "/users");
        assert_eq!(normalize_template("//users/{id}//"), "/users/{id}");
    }

    #[test]
    fn test_extracts_named_captures() {
        let matcher = Matcher::compile("/posts/{slug}/comments/{cid}");
        let params = matcher.captures("/posts/hello-world/comments/42").unwrap();

        assert_eq!(params.get("slug"), Some("hello-world"));
        assert_eq!(params.get("cid"), Some("42"));
        assert_eq!(params.values().collect::<Vec<_>>(), vec!["hello-world", "42"]);
    }

    #[test]
    fn test_placeholder_never_spans_slash() {
        let matcher = Matcher::compile("/files/{name}");

        assert!(matcher.matches("/files/report.pdf"));
        assert!(!matcher.matches("/files/a/b"));
        assert!(!matcher.matches("/files"));
        assert!(!matcher.matches("/files/"));
    }

    #[test]
    fn test_anchored_at_both_ends() {
        let matcher = Matcher::compile("/users");

        assert!(matcher.matches("/users"));
        assert!(!matcher.matches("/users/7"));
        assert!(!matcher.matches("/api/users"));
        assert!(!matcher.matches("users"));
    }

    #[test]
    fn test_root_template() {
        let matcher = Matcher::compile("/");

        assert!(matcher.matches("/"));
        assert!(!matcher.matches("/home"));
        assert!(matcher.captures("/").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_braces_are_literal() {
        for template in ["/a/{", "/a/{}", "/a/{b-c}", "/a/{b", "/a/b}", "/a/x{id}"] {
            let matcher = Matcher::compile(template);
            assert_eq!(matcher.param_names().count(), 0, "template {template}");
            assert!(matcher.matches(template), "template {template}");
        }

        let partial = Matcher::compile("/files/file-{id}");
        assert!(!partial.matches("/files/file-7"));
        assert!(partial.matches("/files/file-{id}"));
    }

    #[test]
    fn test_literal_segments_are_case_sensitive() {
        let matcher = Matcher::compile("/About");
        assert!(matcher.matches("/About"));
        assert!(!matcher.matches("/about"));
    }

    #[test]
    fn test_compile_is_pure() {
        let first = Matcher::compile("/users/{id}/posts/{post_id}");
        let second = Matcher::compile("/users/{id}/posts/{post_id}");
        assert_eq!(first, second);

        for path in ["/users/1/posts/2", "/users/1/posts", "/users//posts/2", "/"] {
            assert_eq!(first.captures(path), second.captures(path), "path {path}");
        }
    }

    #[test]
    fn test_empty_segment_does_not_satisfy_placeholder() {
        let matcher = Matcher::compile("/users/{id}/edit");
        assert!(!matcher.matches("/users//edit"));
        assert!(matcher.matches("/users/9/edit"));
    }
}
