//! Cookie-encoded session payload.

use serde::{Deserialize, Serialize};

use super::Context;

/// Name of the cookie carrying the scenario id and context in cookie mode.
pub const CONTEXT_COOKIE_NAME: &str = "scenario-mock-server";

/// The `{scenarioId, context}` object stored in the session cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookiePayload {
    pub scenario_id: String,
    pub context: Context,
}

impl CookiePayload {
    pub fn new(scenario_id: impl Into<String>, context: Context) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            context,
        }
    }

    /// Decode a raw cookie value. Returns `None` for anything that is not a
    /// JSON object with a string `scenarioId` and an object `context`.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn encode(&self) -> String {
        // Map<String, Value> and String always serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}
