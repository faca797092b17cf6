//! Route Policy
//!
//! Decides, per request path, whether a visitor may proceed:
//!
//! - everything under the dashboard prefix needs a live session; visitors
//!   without one are sent to the launch page with the path they wanted
//! - the launch page is the sign-in screen; signed-in visitors are bounced to
//!   their pending callback URL, or to the landing route
//! - all other paths are public

/// Outcome of a policy check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(String),
}

/// Path-based access rules
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    protected_prefix: String,
    launch_path: String,
    landing_path: String,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::new("/dashboard")
    }
}

impl RoutePolicy {
    pub fn new(landing_path: impl Into<String>) -> Self {
        Self {
            protected_prefix: "/dashboard".to_string(),
            launch_path: "/launch".to_string(),
            landing_path: landing_path.into(),
        }
    }

    pub fn launch_path(&self) -> &str {
        &self.launch_path
    }

    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    /// True for the protected prefix itself and anything beneath it
    pub fn is_protected(&self, path: &str) -> bool {
        match path.strip_prefix(self.protected_prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Decide what to do with a request for `path_and_query`.
    pub fn decide(&self, path: &str, query: Option<&str>, authenticated: bool) -> RouteDecision {
        if self.is_protected(path) {
            if authenticated {
                return RouteDecision::Allow;
            }
            let wanted = match query {
                Some(q) if !q.is_empty() => format!("{}?{}", path, q),
                _ => path.to_string(),
            };
            return RouteDecision::Redirect(self.launch_url(Some(&wanted)));
        }

        if path == self.launch_path && authenticated {
            let target = query
                .and_then(callback_from_query)
                .and_then(|url| sanitize_callback(&url))
                .unwrap_or_else(|| self.landing_path.clone());
            return RouteDecision::Redirect(target);
        }

        RouteDecision::Allow
    }

    /// Launch page URL carrying an optional callback
    pub fn launch_url(&self, callback: Option<&str>) -> String {
        match callback {
            Some(callback) => format!(
                "{}?callbackUrl={}",
                self.launch_path,
                urlencoding::encode(callback)
            ),
            None => self.launch_path.clone(),
        }
    }

    /// Where to send a user after signing in
    pub fn post_sign_in_target(&self, callback: Option<&str>) -> String {
        callback
            .and_then(sanitize_callback)
            .unwrap_or_else(|| self.landing_path.clone())
    }
}

/// Pull `callbackUrl` out of a raw query string, percent-decoded
pub fn callback_from_query(query: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == "callbackUrl")
        .and_then(|(_, value)| {
            urlencoding::decode(&value.replace('+', " "))
                .ok()
                .map(|decoded| decoded.into_owned())
        })
}

/// Accept only same-origin relative paths ("/x", not "//host" or "/\host")
pub fn sanitize_callback(url: &str) -> Option<String> {
    let url = url.trim();
    let mut chars = url.chars();
    if chars.next() != Some('/') {
        return None;
    }
    match chars.next() {
        Some('/') | Some('\\') => None,
        _ if url.chars().any(char::is_control) => None,
        _ => Some(url.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths_allowed() {
        let policy = RoutePolicy::default();
        for path in ["/", "/about", "/api/canvas/courses", "/dashboards", "/launch"] {
            assert_eq!(policy.decide(path, None, false), RouteDecision::Allow);
        }
    }

    #[test]
    fn test_dashboard_requires_session() {
        let policy = RoutePolicy::default();
        assert_eq!(
            policy.decide("/dashboard/courses", Some("tab=2"), false),
            RouteDecision::Redirect("/launch?callbackUrl=%2Fdashboard%2Fcourses%3Ftab%3D2".into())
        );
        assert_eq!(
            policy.decide("/dashboard", None, true),
            RouteDecision::Allow
        );
    }

    #[test]
    fn test_launch_bounces_signed_in_users() {
        let policy = RoutePolicy::default();
        assert_eq!(
            policy.decide("/launch", Some("callbackUrl=%2Fdashboard%2Fgrades"), true),
            RouteDecision::Redirect("/dashboard/grades".into())
        );
        assert_eq!(
            policy.decide("/launch", None, true),
            RouteDecision::Redirect("/dashboard".into())
        );
    }

    #[test]
    fn test_open_redirects_rejected() {
        let policy = RoutePolicy::default();
        for callback in ["https%3A%2F%2Fevil.example", "%2F%2Fevil.example", "%2F%5Cevil"] {
            let query = format!("callbackUrl={}", callback);
            assert_eq!(
                policy.decide("/launch", Some(&query), true),
                RouteDecision::Redirect("/dashboard".into())
            );
        }
    }

    #[test]
    fn test_callback_from_query_decodes() {
        assert_eq!(
            callback_from_query("tab=1&callbackUrl=%2Fdashboard%2Fnotes?q=a+b").as_deref(),
            Some("/dashboard/notes?q=a b")
        );
        assert_eq!(callback_from_query("tab=1"), None);
    }

    #[test]
    fn test_post_sign_in_target() {
        let policy = RoutePolicy::new("/dashboard/home");
        assert_eq!(policy.post_sign_in_target(None), "/dashboard/home");
        assert_eq!(policy.post_sign_in_target(Some("/dashboard/x")), "/dashboard/x");
        assert_eq!(policy.post_sign_in_target(Some("//evil")), "/dashboard/home");
    }
}
