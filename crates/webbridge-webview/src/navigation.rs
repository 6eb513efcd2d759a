//! Navigation allowlist for the embedded page.

/// Origins the web view may always navigate to.
///
/// - `webbridge://` bundled content
/// - `http://webbridge.localhost/` the same, as rewritten by WebView2
/// - `about:blank`
///
/// Host prefixes end in `/` so `webbridge.localhost.other.net` does not match.
pub const DEFAULT_ALLOWED_PREFIXES: &[&str] = &[
    "webbridge://",
    "http://webbridge.localhost/",
    "about:blank",
];

/// Prefix-based URL allowlist.
#[derive(Debug, Clone)]
pub struct NavigationPolicy {
    prefixes: Vec<String>,
}

impl NavigationPolicy {
    /// Default allowlist plus the origin of `start_url` when it is remote.
    pub fn for_start_url(start_url: &str) -> Self {
        let mut policy = Self::default();
        if let Some(origin) = remote_origin(start_url) {
            policy.allow(origin);
        }
        policy
    }

    pub fn allow(&mut self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        if !self.prefixes.contains(&prefix) {
            self.prefixes.push(prefix);
        }
    }

    pub fn is_allowed(&self, url: &str) -> bool {
        self.prefixes.iter().any(|p| url.starts_with(p.as_str()))
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl Default for NavigationPolicy {
    fn default() -> Self {
        Self {
            prefixes: DEFAULT_ALLOWED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// `scheme://host[:port]/` for http(s) URLs.
fn remote_origin(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme != "http" && scheme != "https" {
        return None;
    }
    let host = rest.split(['/', '?', '#']).next()?;
    if host.is_empty() {
        return None;
    }
    Some(format!("{scheme}://{host}/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_bundled_content() {
        let policy = NavigationPolicy::default();
        assert!(policy.is_allowed("webbridge://localhost/index.html"));
        assert!(policy.is_allowed("http://webbridge.localhost/index.html"));
        assert!(policy.is_allowed("about:blank"));
    }

    #[test]
    fn blocks_everything_else_by_default() {
        let policy = NavigationPolicy::default();
        for url in [
            "https://evil.com",
            "http://localhost:8080",
            "file:///etc/passwd",
            "http://webbridge.localhost.evil.net/",
            "http://webbridge.localhost@evil.net/",
            "http://webbridge.localhost:8080/",
            "javascript:alert(1)",
            "data:text/html,<h1>x</h1>",
            "",
        ] {
            assert!(!policy.is_allowed(url), "{url} should be blocked");
        }
    }

    #[test]
    fn remote_start_url_allows_its_origin_only() {
        let policy = NavigationPolicy::for_start_url("https://app.example.com/bridge/index.html");
        assert!(policy.is_allowed("https://app.example.com/other"));
        assert!(!policy.is_allowed("https://app.example.com.evil.net/"));
        assert!(!policy.is_allowed("http://app.example.com/"));
    }

    #[test]
    fn local_start_url_adds_nothing() {
        let policy = NavigationPolicy::for_start_url("webbridge://localhost/index.html");
        assert_eq!(policy.prefixes().len(), DEFAULT_ALLOWED_PREFIXES.len());
    }

    #[test]
    fn allow_is_deduplicated() {
        let mut policy = NavigationPolicy::default();
        policy.allow("https://a.test/");
        policy.allow("https://a.test/");
        assert_eq!(policy.prefixes().len(), DEFAULT_ALLOWED_PREFIXES.len() + 1);
    }
}
