#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use chrono::TimeZone;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use thiserror::Error;

/// Classified failure of a generation attempt. All variants are terminal for
/// the attempt, nothing is retried automatically.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("rate limit exceeded ({remaining}/{limit} remaining, resets at {reset})")]
    RateLimited { limit: u32, remaining: u32, reset: i64 },
    #[error("provider overloaded: {0}")]
    Overloaded(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// JSON body the gate answers failures with.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset: Option<i64>,
}

impl GenerationError {
    /// Maps an HTTP failure to the taxonomy. Status codes win, then markers in
    /// the message.
    pub fn classify(status: u16, body: &str) -> GenerationError {
        let payload = serde_json::from_str::<ErrorBody>(body).unwrap_or_default();
        let mut message = payload.error.clone();
        if message.is_empty() {
            message = body.trim().to_string();
        }
        if message.is_empty() {
            message = format!("status {status}");
        }

        let rate_limited = || {
            return GenerationError::RateLimited {
                limit: payload.limit.unwrap_or(0),
                remaining: payload.remaining.unwrap_or(0),
                reset: payload.reset.unwrap_or(0),
            };
        };

        match status {
            429 => return rate_limited(),
            503 | 529 => return GenerationError::Overloaded(message),
            401 | 403 => return GenerationError::AccessDenied(message),
            _ => {}
        }

        let lowered = message.to_lowercase();
        if lowered.contains("limit") {
            return rate_limited();
        }
        if lowered.contains("overloaded") {
            return GenerationError::Overloaded(message);
        }
        if lowered.contains("access denied") || lowered.contains("api key") {
            return GenerationError::AccessDenied(message);
        }

        return GenerationError::Unexpected(message);
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::RateLimited { .. } => return "rate_limited",
            GenerationError::Overloaded(_) => return "overloaded",
            GenerationError::AccessDenied(_) => return "access_denied",
            GenerationError::Unexpected(_) => return "unexpected",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            GenerationError::RateLimited { .. } => return 429,
            GenerationError::Overloaded(_) => return 529,
            GenerationError::AccessDenied(_) => return 403,
            GenerationError::Unexpected(_) => return 500,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        return matches!(self, GenerationError::RateLimited { .. });
    }

    pub fn to_body(&self) -> ErrorBody {
        let mut body = ErrorBody {
            error: self.to_string(),
            kind: self.kind().to_string(),
            ..Default::default()
        };

        if let GenerationError::RateLimited {
            limit,
            remaining,
            reset,
        } = self
        {
            body.limit = Some(*limit);
            body.remaining = Some(*remaining);
            body.reset = Some(*reset);
        }

        return body;
    }

    /// Message shown in the transcript when an attempt fails.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::RateLimited { reset, .. } => {
                let when = Utc
                    .timestamp_opt(*reset, 0)
                    .single()
                    .filter(|_| return *reset > 0)
                    .map(|time| return time.format("%Y-%m-%d %H:%M UTC").to_string());

                if let Some(when) = when {
                    return format!("You've reached your request limit for the day. It resets at {when}, or set your own API key to keep going.");
                }
                return "You've reached your request limit for the day. Set your own API key to keep going.".to_string();
            }
            GenerationError::Overloaded(_) => {
                return "The model is currently overloaded. Please try again later.".to_string();
            }
            GenerationError::AccessDenied(_) => {
                return "Access denied. Check that an API key is configured for this provider.".to_string();
            }
            GenerationError::Unexpected(_) => {
                return "An unexpected error has occurred. Please try again later.".to_string();
            }
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> GenerationError {
        return GenerationError::Unexpected(err.to_string());
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> GenerationError {
        return GenerationError::Unexpected(format!("malformed stream payload: {err}"));
    }
}

impl From<std::io::Error> for GenerationError {
    fn from(err: std::io::Error) -> GenerationError {
        return GenerationError::Unexpected(err.to_string());
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for GenerationError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> GenerationError {
        return GenerationError::Unexpected("event channel closed".to_string());
    }
}
