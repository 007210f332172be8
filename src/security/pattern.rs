//! Ant-style request patterns.
//!
//! # Responsibilities
//! - Parse path globs (`*`, `?`, `**`) into segment matchers
//! - Optionally bind a pattern to one HTTP method (`"OPTIONS /**"`)
//! - Match request paths segment by segment
//!
//! # Design Decisions
//! - Matching is case-sensitive
//! - `*` and `?` never cross a `/`; `**` spans zero or more whole segments
//! - Empty segments are dropped, so `/api/` and `/api` are the same path
//! - No regex, patterns are compiled once at build time

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::security::error::PatternError;

#[derive(Debug, Clone)]
enum Segment {
    /// `**`
    AnyPath,
    /// Literal or `*`/`?` glob within one segment.
    Glob(String),
}

/// A compiled path glob such as `/api/**` or `/**/*.png`.
#[derive(Debug, Clone)]
pub struct AntPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl AntPattern {
    /// Compile a path pattern. The bare pattern `*` means "any path".
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }
        if raw == "*" {
            return Self::parse("/**");
        }
        if !raw.starts_with('/') {
            return Err(PatternError::NotAbsolute(raw.to_string()));
        }

        let mut segments = Vec::new();
        for part in raw.split('/').filter(|s| !s.is_empty()) {
            if part == "**" {
                // Collapse `**/**` runs, they match the same set of paths.
                if !matches!(segments.last(), Some(Segment::AnyPath)) {
                    segments.push(Segment::AnyPath);
                }
            } else if part.contains("**") {
                return Err(PatternError::MisplacedDoubleStar(raw.to_string()));
            } else {
                segments.push(Segment::Glob(part.to_string()));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the pattern matches every path (`/**`).
    pub fn is_catch_all(&self) -> bool {
        matches!(self.segments.as_slice(), [Segment::AnyPath])
    }

    /// Returns true if `path` matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match_segments(&self.segments, &parts)
    }
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyPath, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((Segment::Glob(glob), rest)) => match path.split_first() {
            Some((head, tail)) => glob_matches(glob, head) && match_segments(rest, tail),
            None => false,
        },
    }
}

/// Wildcard match of one segment: `*` any run of characters, `?` exactly one.
fn glob_matches(glob: &str, text: &str) -> bool {
    let pattern: Vec<char> = glob.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut resume = 0usize;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            resume = t;
            p += 1;
        } else if let Some(s) = star {
            p = s + 1;
            resume += 1;
            t = resume;
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

impl PartialEq for AntPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for AntPattern {}

impl Hash for AntPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl PartialOrd for AntPattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AntPattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl fmt::Display for AntPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A path pattern optionally restricted to one HTTP method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestPattern {
    /// Upper-case method name, `None` for any method.
    method: Option<String>,
    path: AntPattern,
}

impl RequestPattern {
    /// Parse `"/path/**"` or `"METHOD /path/**"`.
    pub fn parse(spec: &str) -> Result<Self, PatternError> {
        let spec = spec.trim();
        match spec.split_once(char::is_whitespace) {
            Some((method, path)) => {
                if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(PatternError::InvalidMethod(method.to_string()));
                }
                Ok(Self {
                    method: Some(method.to_ascii_uppercase()),
                    path: AntPattern::parse(path)?,
                })
            }
            None => Ok(Self {
                method: None,
                path: AntPattern::parse(spec)?,
            }),
        }
    }

    /// Pattern matching any method on `path`.
    pub fn any_method(path: AntPattern) -> Self {
        Self { method: None, path }
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn path(&self) -> &AntPattern {
        &self.path
    }

    /// True for `/**` with no method restriction.
    pub fn is_catch_all(&self) -> bool {
        self.method.is_none() && self.path.is_catch_all()
    }

    pub fn matches(&self, method: &str, path: &str) -> bool {
        if let Some(expected) = &self.method {
            if !expected.eq_ignore_ascii_case(method) {
                return false;
            }
        }
        self.path.matches(path)
    }
}

impl fmt::Display for RequestPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{} {}", method, self.path),
            None => write!(f, "{}", self.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ant(raw: &str) -> AntPattern {
        AntPattern::parse(raw).unwrap()
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let p = ant("/api/*");
        assert!(p.matches("/api/users"));
        assert!(!p.matches("/api/users/1"));
        assert!(!p.matches("/api"));
    }

    #[test]
    fn test_double_star_spans_segments() {
        let p = ant("/static/**");
        assert!(p.matches("/static"));
        assert!(p.matches("/static/css/site.css"));
        assert!(!p.matches("/statics/a"));

        let root = ant("/**");
        assert!(root.matches("/"));
        assert!(root.matches("/anything/at/all"));
        assert!(root.is_catch_all());
    }

    #[test]
    fn test_double_star_in_middle() {
        let p = ant("/**/*.png");
        assert!(p.matches("/logo.png"));
        assert!(p.matches("/img/icons/logo.png"));
        assert!(!p.matches("/img/logo.jpg"));
    }

    #[test]
    fn test_question_mark_and_case_sensitivity() {
        let p = ant("/v?/Items");
        assert!(p.matches("/v1/Items"));
        assert!(!p.matches("/v10/Items"));
        assert!(!p.matches("/v1/items"));
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        assert!(ant("/login").matches("/login/"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(AntPattern::parse(""), Err(PatternError::Empty));
        assert!(matches!(AntPattern::parse("api/*"), Err(PatternError::NotAbsolute(_))));
        assert!(matches!(
            AntPattern::parse("/a**b"),
            Err(PatternError::MisplacedDoubleStar(_))
        ));
        assert!(matches!(
            RequestPattern::parse("GE1 /x"),
            Err(PatternError::InvalidMethod(_))
        ));
    }

    #[test]
    fn test_request_pattern_method() {
        let p = RequestPattern::parse("options *").unwrap();
        assert_eq!(p.method(), Some("OPTIONS"));
        assert!(p.matches("OPTIONS", "/any/path"));
        assert!(!p.matches("GET", "/any/path"));
        assert_eq!(p.to_string(), "OPTIONS /**");
        assert!(!p.is_catch_all());
    }
}
