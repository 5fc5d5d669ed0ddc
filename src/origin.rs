//! Origin checks against the server's accepted domain patterns.
//!
//! Patterns are shell globs (`*`, `?`, `[...]`) matched against the host part
//! of the origin. Pages loaded from the local file system are matched as the
//! pseudo-domain `file://`.

use glob::{MatchOptions, Pattern};
use url::Url;

/// The pseudo-domain for origins of local files.
pub const FILE_DOMAIN: &str = "file://";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
	case_sensitive: true,
	require_literal_separator: false,
	require_literal_leading_dot: false,
};

/// Extracts the domain an origin is matched as.
///
/// `file://` and `null` (what browsers send for local files) map to
/// `file://`. Anything else maps to the host of the origin URL, or to the
/// empty string when the origin has no parseable host.
pub fn origin_to_domain(origin: &str) -> String {
	if origin == FILE_DOMAIN || origin == "null" {
		return FILE_DOMAIN.to_string();
	}
	Url::parse(origin)
		.ok()
		.and_then(|url| url.host_str().map(str::to_string))
		.unwrap_or_default()
}

/// Returns true if any of the patterns matches the origin's domain.
pub fn is_accepted<S>(origin: &str, patterns: &[S]) -> bool
where
	S: AsRef<str>,
{
	let domain = origin_to_domain(origin);
	patterns
		.iter()
		.any(|pattern| DomainPattern::new(pattern.as_ref()).matches(&domain))
}

/// One accepted domain pattern.
#[derive(Clone, Debug)]
struct DomainPattern {
	source: String,
	glob: Option<Pattern>,
}

impl DomainPattern {
	fn new(source: &str) -> DomainPattern {
		DomainPattern {
			source: source.to_string(),
			// not a valid glob, so it can only match itself
			glob: Pattern::new(source).ok(),
		}
	}

	fn matches(&self, domain: &str) -> bool {
		match self.glob {
			Some(ref glob) => glob.matches_with(domain, MATCH_OPTIONS),
			None => self.source == domain,
		}
	}
}

/// The accepted domain patterns of a server, compiled once.
#[derive(Clone, Debug)]
pub struct OriginPolicy {
	patterns: Vec<DomainPattern>,
}

impl OriginPolicy {
	/// Compiles the given patterns, keeping their order.
	pub fn new<I, S>(patterns: I) -> OriginPolicy
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		OriginPolicy {
			patterns: patterns
				.into_iter()
				.map(|p| DomainPattern::new(p.as_ref()))
				.collect(),
		}
	}

	/// A policy accepting every origin.
	pub fn any() -> OriginPolicy {
		OriginPolicy::new(vec!["*"])
	}

	/// Returns true if the origin's domain matches one of the patterns.
	pub fn accepts(&self, origin: &str) -> bool {
		let domain = origin_to_domain(origin);
		self.patterns.iter().any(|p| p.matches(&domain))
	}

	/// The patterns as they were configured.
	pub fn patterns(&self) -> Vec<String> {
		self.patterns.iter().map(|p| p.source.clone()).collect()
	}

	/// Iterates over the configured patterns without copying them.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.patterns.iter().map(|p| p.source.as_str())
	}

	/// True if no pattern is configured; such a policy rejects everything.
	pub fn is_empty(&self) -> bool {
		self.patterns.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn domain_is_the_origin_host() {
		assert_eq!(origin_to_domain("http://example.com"), "example.com");
		assert_eq!(origin_to_domain("https://chat.example.com:8443"), "chat.example.com");
		assert_eq!(origin_to_domain("file://"), "file://");
		assert_eq!(origin_to_domain("null"), "file://");
		assert_eq!(origin_to_domain("not an origin"), "");
	}

	#[test]
	fn wildcard_accepts_everything() {
		let patterns = ["other.com", "*"];
		for origin in &[
			"http://example.com",
			"http://127.0.0.1:8080",
			"file://",
			"null",
			"garbage",
			"",
		] {
			assert!(is_accepted(origin, &patterns), "{} rejected", origin);
		}
	}

	#[test]
	fn file_origin_needs_file_pattern() {
		assert!(is_accepted("file://", &["file://"]));
		assert!(!is_accepted("file://", &["*.example.com"]));
		assert!(!is_accepted("http://example.com", &["file://"]));
	}

	#[test]
	fn globs_match_hosts_only() {
		let policy = OriginPolicy::new(vec!["*.example.com", "localhost"]);
		assert!(policy.accepts("http://www.example.com"));
		assert!(policy.accepts("http://a.b.example.com:8080"));
		assert!(policy.accepts("http://localhost:3000"));
		assert!(!policy.accepts("http://example.com"));
		assert!(!policy.accepts("http://example.com.evil.org"));
	}

	#[test]
	fn invalid_glob_matches_literally() {
		let policy = OriginPolicy::new(vec!["[bad"]);
		assert!(!policy.accepts("http://bad"));
		assert!(is_accepted("http://example.com", &["example.com"]));
	}

	#[test]
	fn keeps_patterns_in_order() {
		let policy = OriginPolicy::new(vec!["b.com", "a.com", "file://"]);
		assert_eq!(policy.patterns(), vec!["b.com", "a.com", "file://"]);
		assert_eq!(policy.iter().count(), 3);
		assert!(!policy.is_empty());
		assert!(OriginPolicy::new(Vec::<String>::new()).is_empty());
	}
}
