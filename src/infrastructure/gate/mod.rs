#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;

mod credentials;
mod rate_limiter;

use std::env;
use std::time::Duration;

use anyhow::Result;
pub use credentials::*;
pub use rate_limiter::*;

use crate::configuration::parse_window;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatRequest;
use crate::domain::models::GenerationError;

/// What the gate hands to the upstream call once a request is let through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Admission {
    pub api_key: Option<String>,
    /// Set when the request was counted against the caller's rate limit.
    pub rate_limit: Option<RateLimitStatus>,
}

/// Server side checks run before any generation is started.
pub struct RequestGate {
    limiter: RateLimiter,
    lookup_env: fn(&str) -> Option<String>,
}

fn lookup_process_env(name: &str) -> Option<String> {
    return env::var(name).ok();
}

impl RequestGate {
    pub fn new(max_requests: u32, window: Duration) -> RequestGate {
        return RequestGate {
            limiter: RateLimiter::new(max_requests, window),
            lookup_env: lookup_process_env,
        };
    }

    pub fn from_config() -> Result<RequestGate> {
        let max_requests = Config::get(ConfigKey::RateLimitMaxRequests).parse::<u32>()?;
        let window = parse_window(&Config::get(ConfigKey::RateLimitWindow))?;

        return Ok(RequestGate::new(max_requests, window));
    }

    /// Callers bringing their own key skip the rate limit. Everyone else needs
    /// a key for the provider on the server, unless it works without one, and
    /// is then counted by `caller`. Refused credentials never use up a slot.
    pub fn admit(&self, request: &ChatRequest, caller: &str) -> Result<Admission, GenerationError> {
        let api_key = resolve_credential(
            &request.model.provider_id,
            request.api_key(),
            self.lookup_env,
        )?;

        let mut rate_limit = None;
        if request.api_key().is_none() {
            let status = self.limiter.check(caller)?;
            rate_limit = Some(status);
        }

        return Ok(Admission {
            api_key,
            rate_limit,
        });
    }
}
