//! Error types shared by the kiosk core.
//!
//! Every failure that can reach the screen has a `user_message` rendering;
//! the UI never shows a raw `Debug` value.

use std::path::PathBuf;

use thiserror::Error;

/// Shown for any failure with a 400 status.
pub const BAD_REQUEST_MESSAGE: &str = "Error: Bad request. Please check your input and try again. \
The media format might be unsupported or the content may have been blocked.";

/// Shown when a failure carries nothing worth displaying.
pub const UNKNOWN_FAILURE_MESSAGE: &str = "Failed to generate content due to an unknown error.";

/// Errors from a single generation request
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The API answered with a non-success status
    #[error("Gemini API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, connection, decode)
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The response parsed but held no candidate text
    #[error("The model returned no text")]
    EmptyResponse,

    /// The background task running the request went away
    #[error("request task ended before completing")]
    Aborted,
}

impl GenerateError {
    /// HTTP status attached to the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            Self::EmptyResponse | Self::Aborted => None,
        }
    }

    /// The string shown in the kiosk's error block.
    pub fn user_message(&self) -> String {
        if matches!(self, Self::Aborted) {
            return UNKNOWN_FAILURE_MESSAGE.to_string();
        }

        let message = self.to_string();
        if message.trim().is_empty() {
            return UNKNOWN_FAILURE_MESSAGE.to_string();
        }
        if self.is_bad_request() {
            return BAD_REQUEST_MESSAGE.to_string();
        }
        format!("Error generating content: {}", message)
    }

    fn is_bad_request(&self) -> bool {
        if let Some(status) = self.status() {
            return status == 400;
        }
        mentions_bad_request(&self.text_without_url())
    }

    /// Display text with any request URL removed, so ports and paths
    /// are not mistaken for a status code.
    fn text_without_url(&self) -> String {
        match self {
            Self::Transport(err) => {
                let text = err.to_string();
                match err.url() {
                    Some(url) => text.replace(url.as_str(), ""),
                    None => text,
                }
            }
            _ => self.to_string(),
        }
    }
}

/// True when `400` appears as a standalone number, not inside `4000` or `1400`.
fn mentions_bad_request(text: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token == "400")
}

/// Errors while turning a file into an attachment
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Not a base64 data URL")]
    MalformedDataUrl,
}

/// Errors while loading the settings file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_status_maps_to_fixed_message() {
        let err = GenerateError::Api {
            status: 400,
            message: "Unsupported MIME type: application/zip".to_string(),
        };
        assert_eq!(err.user_message(), BAD_REQUEST_MESSAGE);
    }

    #[test]
    fn test_status_decides_before_message_text() {
        let err = GenerateError::Api {
            status: 500,
            message: "upstream returned 400".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "Error generating content: Gemini API error 500: upstream returned 400"
        );
    }

    #[test]
    fn test_larger_numbers_are_not_a_bad_request() {
        let err = GenerateError::Api {
            status: 503,
            message: "Overloaded; retry requests under 4000 tokens".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "Error generating content: Gemini API error 503: Overloaded; retry requests under 4000 tokens"
        );
    }

    #[test]
    fn test_bad_request_token_is_whole_word() {
        assert!(mentions_bad_request("status 400 (Bad Request)"));
        assert!(!mentions_bad_request("127.0.0.1:4000"));
        assert!(!mentions_bad_request("limit 1400"));
        assert!(!mentions_bad_request("HTTP400x"));
    }

    #[test]
    fn test_other_failures_keep_original_message() {
        let err = GenerateError::Api {
            status: 503,
            message: "The model is overloaded".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "Error generating content: Gemini API error 503: The model is overloaded"
        );
    }

    #[test]
    fn test_empty_response_is_displayable() {
        assert_eq!(
            GenerateError::EmptyResponse.user_message(),
            "Error generating content: The model returned no text"
        );
    }

    #[test]
    fn test_aborted_task_is_unknown_failure() {
        assert_eq!(GenerateError::Aborted.user_message(), UNKNOWN_FAILURE_MESSAGE);
    }
}
