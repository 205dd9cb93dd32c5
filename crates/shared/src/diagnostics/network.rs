use std::fmt::Display;

/// A failed network call seen by the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkFailure {
    /// fetch resolved with a non-success status
    FetchStatus { url: String, status: u16, status_text: String },
    /// fetch rejected
    FetchError { url: String, error: String },
    XhrError { url: String },
    XhrAborted { url: String },
    XhrStatus { url: String, status: u16, status_text: String },
}

impl NetworkFailure {
    pub fn url(&self) -> &str {
        use NetworkFailure::*;
        match self {
            FetchStatus { url, .. }
            | FetchError { url, .. }
            | XhrError { url }
            | XhrAborted { url }
            | XhrStatus { url, .. } => url,
        }
    }

    /// Whether an XHR load with this status counts as a failure
    pub fn is_xhr_failure_status(status: u16) -> bool {
        status >= 400
    }
}

impl Display for NetworkFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use NetworkFailure::*;
        match self {
            FetchStatus { url, status, status_text } => {
                write!(f, "Fetch failed: {url} → {status} {status_text}")
            }
            FetchError { url, error } => write!(f, "Fetch error: {url} → {error}"),
            XhrError { url } => write!(f, "XHR error: {url}"),
            XhrAborted { url } => write!(f, "XHR aborted: {url}"),
            XhrStatus { url, status, status_text } => {
                write!(f, "XHR failed: {url} → {status} {status_text}")
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn xhr_failure_threshold() {
        assert!(!NetworkFailure::is_xhr_failure_status(200));
        assert!(!NetworkFailure::is_xhr_failure_status(304));
        assert!(NetworkFailure::is_xhr_failure_status(400));
        assert!(NetworkFailure::is_xhr_failure_status(502));
    }

    #[test]
    fn xhr_failure_text() {
        let failures = [
            NetworkFailure::XhrError { url: "/api/sync".to_string() },
            NetworkFailure::XhrAborted { url: "/api/sync".to_string() },
            NetworkFailure::XhrStatus {
                url: "/api/sync".to_string(),
                status: 404,
                status_text: "Not Found".to_string(),
            },
        ];

        let text: Vec<String> = failures.iter().map(ToString::to_string).collect();
        assert_eq!(text, vec![
            "XHR error: /api/sync",
            "XHR aborted: /api/sync",
            "XHR failed: /api/sync → 404 Not Found",
        ]);
        assert!(failures.iter().all(|f| f.url() == "/api/sync"));
    }

    #[test]
    fn fetch_error_text() {
        let failure = NetworkFailure::FetchError {
            url: "/api/ping".to_string(),
            error: "TypeError: Failed to fetch".to_string(),
        };
        assert_eq!(failure.url(), "/api/ping");
        assert_eq!(failure.to_string(), "Fetch error: /api/ping → TypeError: Failed to fetch");
    }
}
