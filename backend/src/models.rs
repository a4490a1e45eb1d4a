use serde::{Deserialize, Serialize};

pub const WELCOME_MESSAGE: &str = "Welcome to the model prediction API!";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WelcomeResponse {
    pub message: String,
}

impl Default for WelcomeResponse {
    fn default() -> Self {
        WelcomeResponse {
            message: WELCOME_MESSAGE.to_string(),
        }
    }
}

/// Error body: `{"detail": "..."}`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        ErrorDetail {
            detail: detail.into(),
        }
    }
}
