//! Request paths that skip token work entirely.
//!
//! Patterns are `/`-separated; a segment written as `{name}` matches one or
//! more ASCII digits, every other segment must match literally.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    fn parse(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .map(|seg| {
                if seg.len() > 2 && seg.starts_with('{') && seg.ends_with('}') {
                    Segment::Numeric
                } else {
                    Segment::Literal(seg.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    fn matches(&self, path: &str) -> bool {
        let mut parts = path.split('/');
        for seg in &self.segments {
            let Some(part) = parts.next() else {
                return false;
            };
            let ok = match seg {
                Segment::Literal(lit) => lit == part,
                Segment::Numeric => !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()),
            };
            if !ok {
                return false;
            }
        }
        parts.next().is_none()
    }
}

#[derive(Debug, Clone)]
pub struct PublicPaths {
    patterns: Vec<PathPattern>,
}

impl Default for PublicPaths {
    fn default() -> Self {
        Self::new([
            "/health",
            "/api/v1/auth/login",
            "/api/v1/auth/register",
            "/api/v1/auth/verify-code",
            "/api/v1/auth/roles",
            "/api/v1/users/{id}/photo",
        ])
    }
}

impl PublicPaths {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| PathPattern::parse(p.as_ref()))
                .collect(),
        }
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_paths_match_exactly() {
        let paths = PublicPaths::default();
        assert!(paths.is_public("/api/v1/auth/login"));
        assert!(paths.is_public("/api/v1/auth/register"));
        assert!(paths.is_public("/health"));

        assert!(!paths.is_public("/api/v1/auth/login/"));
        assert!(!paths.is_public("/api/v1/auth/logout"));
        assert!(!paths.is_public("/api/v1/auth/loginx"));
        assert!(!paths.is_public("/api/v1/auth"));
    }

    #[test]
    fn numeric_segment_requires_digits() {
        let paths = PublicPaths::default();
        assert!(paths.is_public("/api/v1/users/42/photo"));
        assert!(paths.is_public("/api/v1/users/0/photo"));

        assert!(!paths.is_public("/api/v1/users//photo"));
        assert!(!paths.is_public("/api/v1/users/abc/photo"));
        assert!(!paths.is_public("/api/v1/users/4a/photo"));
        assert!(!paths.is_public("/api/v1/users/42/photo/extra"));
        assert!(!paths.is_public("/api/v1/users/42"));
    }

    #[test]
    fn empty_list_matches_nothing() {
        let paths = PublicPaths::new(Vec::<String>::new());
        assert!(!paths.is_public("/"));
        assert!(!paths.is_public("/health"));
    }
}
