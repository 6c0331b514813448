use edgesign_core::{Error, Result};
use regex::Regex;

/// Router decides which request paths need verification and signing.
///
/// A path is protected when it is `/<segment>` or `/<segment>/...` for one of
/// the configured segments.
#[derive(Debug, Clone)]
pub struct Router {
    pattern: Option<Regex>,
}

impl Router {
    /// Build a router from protected first path segments.
    ///
    /// An empty segment list protects nothing.
    pub fn new<S: AsRef<str>>(segments: &[S]) -> Result<Self> {
        let segments = segments
            .iter()
            .map(|s| s.as_ref().trim().trim_matches('/'))
            .collect::<Vec<_>>();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::config_invalid(
                "protected path segments must not be empty",
            ));
        }
        if segments.is_empty() {
            return Ok(Self { pattern: None });
        }

        let alternatives = segments
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        Self::with_pattern(&format!("^/({alternatives})(/.*)?$"))
    }

    /// Build a router from a full regular expression over the path.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            Error::config_invalid(format!("invalid protected path pattern: {pattern}"))
                .with_source(e)
        })?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Check if the request at `path` must be verified and signed.
    pub fn should_intercept(&self, path: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_PROTECTED_SEGMENTS;
    use test_case::test_case;

    #[test_case("/api", true)]
    #[test_case("/api/", true)]
    #[test_case("/api/widgets", true)]
    #[test_case("/api/widgets/42?x=1", true)]
    #[test_case("/ws", true)]
    #[test_case("/lexmind/a/b", true)]
    #[test_case("/confidence", true)]
    #[test_case("/lexhyper/x", true)]
    #[test_case("/apis", false)]
    #[test_case("/apiv2/widgets", false)]
    #[test_case("/static/app.js", false)]
    #[test_case("/static/api/app.js", false)]
    #[test_case("/", false)]
    #[test_case("", false)]
    #[test_case("api/widgets", false)]
    #[test_case("/API/widgets", false)]
    fn test_default_segments(path: &str, expected: bool) {
        let router = Router::new(DEFAULT_PROTECTED_SEGMENTS).unwrap();
        assert_eq!(router.should_intercept(path), expected, "path: {path}");
    }

    #[test]
    fn test_segments_are_escaped() {
        let router = Router::new(&["v1.0"]).unwrap();
        assert!(router.should_intercept("/v1.0/items"));
        assert!(!router.should_intercept("/v1x0/items"));
    }

    #[test]
    fn test_empty_segments() {
        let router = Router::new::<&str>(&[]).unwrap();
        assert!(!router.should_intercept("/api"));
        assert!(!router.should_intercept("/"));

        assert!(Router::new(&["api", " "]).is_err());
    }

    #[test]
    fn test_custom_pattern() {
        let router = Router::with_pattern("^/graphql$").unwrap();
        assert!(router.should_intercept("/graphql"));
        assert!(!router.should_intercept("/graphql/x"));

        let err = Router::with_pattern("^/(api").unwrap_err();
        assert_eq!(err.kind(), edgesign_core::ErrorKind::ConfigInvalid);
    }
}
