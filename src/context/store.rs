//! Context storage policies.
//!
//! Each request resolves to exactly one [`Session`], which names the active
//! scenario and the slot holding the context:
//!
//! - the process-wide slot owned by the server state (default),
//! - a request-scoped copy decoded from the session cookie (cookie mode),
//! - an LRU cache entry keyed by the context-correlation header, used when
//!   the request selects its scenario with the scenario header.
//!
//! Locks are held only for the duration of a read or read-modify-write,
//! never across a producer or delay await, so interleaved requests see each
//! other's completed writes but never a torn one.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{Context, CookiePayload, CONTEXT_COOKIE_NAME};
use crate::cache::LruCache;
use crate::request::MockRequest;
use crate::router::DispatchError;
use crate::scenario::scenario_context;
use crate::mock_server::ServerState;

/// Header selecting a scenario for a single request.
pub const SCENARIO_HEADER: &str = "sms-scenario-id";

/// Header correlating requests that share one cached context.
pub const CONTEXT_HEADER: &str = "sms-context-id";

/// Cache of per-session contexts keyed by correlation id.
pub(crate) type ContextCache = Arc<Mutex<LruCache<String, Context>>>;

/// Process-wide active scenario and context.
#[derive(Debug, Clone)]
pub(crate) struct ServerSlots {
    pub scenario_id: String,
    pub context: Context,
}

/// The cell holding a request's current context.
#[derive(Debug, Clone)]
pub(crate) enum ContextSlot {
    Server(Arc<RwLock<ServerSlots>>),
    Cookie(Arc<Mutex<CookiePayload>>),
    Cached {
        cache: ContextCache,
        id: String,
        defaults: Arc<Context>,
    },
}

impl ContextSlot {
    pub async fn get(&self) -> Context {
        match self {
            Self::Server(slots) => slots.read().await.context.clone(),
            Self::Cookie(payload) => payload.lock().await.context.clone(),
            Self::Cached {
                cache,
                id,
                defaults,
            } => cache
                .lock()
                .await
                .get(id.as_str())
                .cloned()
                .unwrap_or_else(|| defaults.as_ref().clone()),
        }
    }

    /// Replace the context with `f(current)` atomically and return the new value.
    pub async fn update<F>(&self, f: F) -> Context
    where
        F: FnOnce(&Context) -> Context,
    {
        match self {
            Self::Server(slots) => {
                let mut slots = slots.write().await;
                let next = f(&slots.context);
                slots.context = next.clone();
                next
            }
            Self::Cookie(payload) => {
                let mut payload = payload.lock().await;
                let next = f(&payload.context);
                payload.context = next.clone();
                next
            }
            Self::Cached {
                cache,
                id,
                defaults,
            } => {
                let mut cache = cache.lock().await;
                let next = match cache.get(id.as_str()) {
                    Some(current) => f(current),
                    None => f(defaults),
                };
                if let Some((evicted, _)) = cache.set(id.clone(), next.clone()) {
                    tracing::debug!(context_id = %evicted, "evicted least recently used context");
                }
                next
            }
        }
    }
}

/// The scenario and context slot a request runs against.
#[derive(Debug)]
pub(crate) struct Session {
    pub scenario_id: String,
    pub slot: ContextSlot,
    /// Payload to write back as the session cookie once dispatch finishes.
    pub cookie: Option<Arc<Mutex<CookiePayload>>>,
}

impl Session {
    /// Pick the isolation policy for `request` and open its session.
    pub async fn open(state: &ServerState, request: &MockRequest) -> Result<Self, DispatchError> {
        if let Some(scenario_id) = request.header(SCENARIO_HEADER).filter(|id| !id.is_empty()) {
            if state.options().cookie_mode {
                return Err(DispatchError::ScenarioHeaderInCookieMode);
            }
            return Self::cached(state, request, scenario_id);
        }

        if state.options().cookie_mode {
            let payload = state.cookie_payload(request.cookie(CONTEXT_COOKIE_NAME));
            let scenario_id = payload.scenario_id.clone();
            let shared = Arc::new(Mutex::new(payload));

            return Ok(Self {
                scenario_id,
                slot: ContextSlot::Cookie(shared.clone()),
                cookie: Some(shared),
            });
        }

        let slots = state.slots();
        let scenario_id = slots.read().await.scenario_id.clone();
        Ok(Self {
            scenario_id,
            slot: ContextSlot::Server(slots),
            cookie: None,
        })
    }

    fn cached(
        state: &ServerState,
        request: &MockRequest,
        scenario_id: &str,
    ) -> Result<Self, DispatchError> {
        let scenario = state
            .scenarios()
            .get(scenario_id)
            .ok_or_else(|| DispatchError::UnknownScenario(scenario_id.to_string()))?;

        // Without a correlation id every request starts from the scenario defaults.
        let context_id = request
            .header(CONTEXT_HEADER)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let defaults = scenario_context(scenario, state.scenarios().map())?;

        Ok(Self {
            scenario_id: scenario_id.to_string(),
            slot: ContextSlot::Cached {
                cache: state.contexts(),
                id: context_id,
                defaults: Arc::new(defaults),
            },
            cookie: None,
        })
    }

    /// Encoded cookie payload to send back, if this is a cookie session.
    pub async fn cookie_value(&self) -> Option<String> {
        match &self.cookie {
            Some(payload) => Some(payload.lock().await.encode()),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::to_context;
    use serde_json::json;

    fn cache(capacity: usize) -> ContextCache {
        Arc::new(Mutex::new(LruCache::new(capacity).unwrap()))
    }

    #[tokio::test]
    async fn test_cached_slot_defaults_until_written() {
        let contexts = cache(2);
        let slot = ContextSlot::Cached {
            cache: contexts.clone(),
            id: "a".to_string(),
            defaults: Arc::new(to_context(json!({"user": "Zed"}))),
        };

        assert_eq!(slot.get().await.get("user"), Some(&json!("Zed")));
        assert!(contexts.lock().await.is_empty());

        slot.update(|ctx| {
            let mut next = ctx.clone();
            next.insert("user".into(), json!("Ann"));
            next
        })
        .await;

        assert_eq!(slot.get().await.get("user"), Some(&json!("Ann")));
        assert!(contexts.lock().await.contains("a"));
    }

    fn session(contexts: &ContextCache, id: usize) -> ContextSlot {
        ContextSlot::Cached {
            cache: contexts.clone(),
            id: format!("session-{id}"),
            defaults: Arc::new(Context::new()),
        }
    }

    #[tokio::test]
    async fn test_cached_sessions_evict_least_recently_used() {
        let contexts = cache(10);
        for id in 0..10 {
            session(&contexts, id)
                .update(|_| to_context(json!({ "user": id })))
                .await;
        }

        // Reading session-0 makes session-1 the eviction candidate.
        assert_eq!(session(&contexts, 0).get().await.get("user"), Some(&json!(0)));
        session(&contexts, 10)
            .update(|_| to_context(json!({ "user": 10 })))
            .await;

        let contexts = contexts.lock().await;
        assert_eq!(contexts.len(), 10);
        assert!(contexts.contains("session-0"));
        assert!(!contexts.contains("session-1"));
        assert!(contexts.contains("session-10"));
    }

    #[tokio::test]
    async fn test_cookie_slot_mutates_shared_payload() {
        let payload = Arc::new(Mutex::new(CookiePayload::new("s", Context::new())));
        let slot = ContextSlot::Cookie(payload.clone());

        slot.update(|_| to_context(json!({"n": 1}))).await;

        assert_eq!(payload.lock().await.context.get("n"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_server_slot_shared_between_handles() {
        let slots = Arc::new(RwLock::new(ServerSlots {
            scenario_id: "default".to_string(),
            context: Context::new(),
        }));
        let first = ContextSlot::Server(slots.clone());
        let second = ContextSlot::Server(slots);

        first.update(|_| to_context(json!({"x": true}))).await;

        assert_eq!(second.get().await.get("x"), Some(&json!(true)));
    }
}
