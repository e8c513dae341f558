//! Claude credential probe
//!
//! Claude is only reachable for key validation: a one-token messages call
//! whose status tells whether Anthropic accepts the key.

use reqwest::{Client, RequestBuilder};
use serde_json::json;

use crate::error::AppResult;
use crate::proxy::headers::anthropic_headers;

/// Cheapest model, used for the probe
pub const PROBE_MODEL: &str = "claude-3-haiku-20240307";

/// Build the one-token messages call
pub fn probe_request(client: &Client, base_url: &str, api_key: &str) -> AppResult<RequestBuilder> {
    Ok(client
        .post(format!("{}/messages", base_url))
        .headers(anthropic_headers(api_key)?)
        .json(&json!({
            "model": PROBE_MODEL,
            "max_tokens": 1,
            "messages": [{"role": "user", "content": "Hi"}]
        })))
}

/// Whether a probe status means the key was rejected
pub fn is_rejected(status: u16) -> bool {
    status == 401 || status == 403
}
