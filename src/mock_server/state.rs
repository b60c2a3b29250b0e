//! Shared server state.
//!
//! Owns the immutable scenario set and options together with the mutable
//! slots every context policy writes to. Handlers receive it as
//! `Arc<ServerState>`.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::cache::LruCache;
use crate::config::ServerOptions;
use crate::context::{Context, ContextCache, CookiePayload, ServerSlots, CONTEXT_COOKIE_NAME};
use crate::error::Result;
use crate::request::MockRequest;
use crate::response::{MockResult, ProducerError};
use crate::router::{dispatch, DispatchError, Reply};
use crate::scenario::{scenario_context, ScenarioSet};

/// State shared by every request a server handles.
#[derive(Debug)]
pub struct ServerState {
    scenarios: ScenarioSet,
    options: ServerOptions,
    initial_context: Context,
    slots: Arc<RwLock<ServerSlots>>,
    contexts: ContextCache,
}

impl ServerState {
    /// Build the state with the first scenario active.
    ///
    /// # Errors
    ///
    /// Fails if `options.parallel_context_size` is zero.
    pub fn new(scenarios: ScenarioSet, options: ServerOptions) -> Result<Self> {
        let unnamed = scenarios.unnamed_groups();
        if !unnamed.is_empty() {
            tracing::warn!(
                groups = %unnamed.join(", "),
                "the following groups do not have a name"
            );
        }

        let initial = scenarios.initial();
        let initial_context = scenario_context(initial, scenarios.map())?;
        let slots = ServerSlots {
            scenario_id: initial.id.clone(),
            context: initial_context.clone(),
        };
        let contexts = LruCache::new(options.parallel_context_size)?;

        Ok(Self {
            scenarios,
            options,
            initial_context,
            slots: Arc::new(RwLock::new(slots)),
            contexts: Arc::new(Mutex::new(contexts)),
        })
    }

    pub fn scenarios(&self) -> &ScenarioSet {
        &self.scenarios
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    pub(crate) fn slots(&self) -> Arc<RwLock<ServerSlots>> {
        self.slots.clone()
    }

    pub(crate) fn contexts(&self) -> ContextCache {
        self.contexts.clone()
    }

    /// Active scenario id of the process-wide slot.
    pub async fn active_scenario(&self) -> String {
        self.slots.read().await.scenario_id.clone()
    }

    /// Current context of the process-wide slot.
    pub async fn server_context(&self) -> Context {
        self.slots.read().await.context.clone()
    }

    /// The cookie payload of a fresh session.
    pub fn initial_payload(&self) -> CookiePayload {
        CookiePayload::new(self.scenarios.initial().id.clone(), self.initial_context.clone())
    }

    /// Decode a session cookie, falling back to the initial payload.
    pub(crate) fn cookie_payload(&self, raw: Option<&str>) -> CookiePayload {
        raw.and_then(|raw| self.decode_cookie(raw))
            .unwrap_or_else(|| self.initial_payload())
    }

    fn decode_cookie(&self, raw: &str) -> Option<CookiePayload> {
        match CookiePayload::decode(raw) {
            Some(payload) if self.scenarios.contains(&payload.scenario_id) => Some(payload),
            Some(payload) => {
                tracing::warn!(scenario = %payload.scenario_id, "cookie names an unknown scenario");
                None
            }
            None => {
                tracing::warn!("cookie value could not be parsed");
                None
            }
        }
    }

    /// The scenario listing, with the caller's active scenario selected.
    ///
    /// In cookie mode a malformed session cookie is reset on the reply.
    pub async fn list_scenarios(&self, cookie: Option<&str>) -> Reply {
        let (selected, reset) = if self.options.cookie_mode {
            match cookie.map(|raw| self.decode_cookie(raw)) {
                Some(Some(payload)) => (payload.scenario_id, None),
                Some(None) => {
                    let payload = self.initial_payload();
                    (payload.scenario_id.clone(), Some(payload.encode()))
                }
                None => (self.scenarios.initial().id.clone(), None),
            }
        } else {
            (self.active_scenario().await, None)
        };

        let summaries = self.scenarios.summaries(&selected);
        let reply = Reply::from(MockResult::json(200, serde_json::json!(summaries)));
        match reset {
            Some(value) => reply.with_cookie(CONTEXT_COOKIE_NAME, value),
            None => reply,
        }
    }

    /// Make `scenario_id` the active scenario and reset its context.
    ///
    /// In cookie mode nothing is stored; the new session travels in the
    /// reply's cookie.
    #[tracing::instrument(skip(self))]
    pub async fn select_scenario(&self, scenario_id: &str) -> Reply {
        let Some(scenario) = self.scenarios.get(scenario_id) else {
            return DispatchError::UnknownScenario(scenario_id.to_string())
                .into_result()
                .into();
        };

        let context = match scenario_context(scenario, self.scenarios.map()) {
            Ok(context) => context,
            Err(error) => return DispatchError::from(error).into_result().into(),
        };

        tracing::info!("scenario selected");

        if self.options.cookie_mode {
            let payload = CookiePayload::new(scenario_id, context);
            return Reply::from(MockResult::no_content())
                .with_cookie(CONTEXT_COOKIE_NAME, payload.encode());
        }

        let mut slots = self.slots.write().await;
        slots.scenario_id = scenario_id.to_string();
        slots.context = context;
        MockResult::no_content().into()
    }

    /// Configured scenario groups.
    pub fn groups(&self) -> Reply {
        Reply::from(MockResult::json(
            200,
            serde_json::json!(self.scenarios.groups()),
        ))
    }

    /// Serve `request` from the active scenario's mocks.
    pub async fn dispatch(&self, request: MockRequest) -> std::result::Result<Reply, ProducerError> {
        dispatch(self, request).await
    }
}
