//! Error page model

/// Data shown on the error page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorViewModel {
    /// Correlation id of the failed request
    pub request_id: Option<String>,
}

impl ErrorViewModel {
    pub fn new(request_id: Option<String>) -> Self {
        Self { request_id }
    }

    /// Whether there is an id worth showing (present and non-empty)
    pub fn show_request_id(&self) -> bool {
        self.request_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_request_id() {
        assert!(ErrorViewModel::new(Some("0HMVD5J3JQ1OK:00000001".to_string())).show_request_id());
        assert!(ErrorViewModel::new(Some(" ".to_string())).show_request_id());
        assert!(!ErrorViewModel::new(Some(String::new())).show_request_id());
        assert!(!ErrorViewModel::new(None).show_request_id());
        assert!(!ErrorViewModel::default().show_request_id());
    }
}
