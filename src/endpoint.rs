//! Fixed collection endpoints, relative to the configured root URL.

/// One of the five server scripts the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GetMode,
    PushSessionData,
    PushPerformanceData,
    PullSessionData,
    PullPerformanceData,
}

impl Endpoint {
    /// Path appended to the root URL.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::GetMode => "get_mode.php",
            Endpoint::PushSessionData => "push_session_data.php",
            Endpoint::PushPerformanceData => "push_performance_data.php",
            Endpoint::PullSessionData => "pull_session_data.php",
            Endpoint::PullPerformanceData => "pull_performance_data.php",
        }
    }

    /// Full URL for this endpoint.
    ///
    /// Plain concatenation: the root URL is expected to end with `/`.
    pub fn url(&self, root_url: &str) -> String {
        format!("{root_url}{}", self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let root = "https://collect.example.org/xv/";
        assert_eq!(
            Endpoint::GetMode.url(root),
            "https://collect.example.org/xv/get_mode.php"
        );
        assert_eq!(
            Endpoint::PushPerformanceData.url(root),
            "https://collect.example.org/xv/push_performance_data.php"
        );
        assert_eq!(
            Endpoint::PullSessionData.url(root),
            "https://collect.example.org/xv/pull_session_data.php"
        );
    }
}
