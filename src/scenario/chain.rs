//! Scenario inheritance chains.
//!
//! A chain lists a scenario's ancestors root first and the scenario itself
//! last. Context merging and mock flattening both walk it in that order, so a
//! descendant's context keys and mocks win over its ancestors'.

use std::collections::HashSet;

use super::{Mock, Scenario, ScenarioMap};
use crate::context::Context;
use crate::error::{MockServerError, Result};

/// Resolve the ids from the root ancestor down to `scenario`.
///
/// The walk stops at a scenario without `extend` or whose parent is not in
/// `scenarios`.
///
/// # Errors
///
/// Returns [`MockServerError::ExtendCycle`] if the walk revisits a scenario.
pub fn resolve_chain<'a>(scenario: &'a Scenario, scenarios: &'a ScenarioMap) -> Result<Vec<&'a str>> {
    let mut chain = vec![scenario.id.as_str()];
    let mut visited = HashSet::from([scenario.id.as_str()]);
    let mut current = scenario;

    while let Some(parent) = current
        .extend
        .as_deref()
        .and_then(|parent_id| scenarios.get(parent_id))
    {
        if !visited.insert(parent.id.as_str()) {
            return Err(MockServerError::ExtendCycle {
                scenario: scenario.id.clone(),
                repeated: parent.id.clone(),
            });
        }
        chain.push(parent.id.as_str());
        current = parent;
    }

    chain.reverse();
    Ok(chain)
}

/// Fold each scenario's own context over an empty context, root first.
pub fn merge_context(chain: &[&str], scenarios: &ScenarioMap) -> Context {
    chain
        .iter()
        .filter_map(|id| scenarios.get(*id)?.context.as_ref())
        .fold(Context::new(), |mut merged, context| {
            merged.extend(context.iter().map(|(k, v)| (k.clone(), v.clone())));
            merged
        })
}

/// Concatenate each scenario's own mocks, root first.
pub fn flatten_mocks<'a>(chain: &[&str], scenarios: &'a ScenarioMap) -> Vec<&'a Mock> {
    chain
        .iter()
        .filter_map(|id| scenarios.get(*id))
        .flat_map(|scenario| scenario.mocks.iter())
        .collect()
}

/// The merged default context of `scenario`.
pub fn scenario_context(scenario: &Scenario, scenarios: &ScenarioMap) -> Result<Context> {
    let chain = resolve_chain(scenario, scenarios)?;
    Ok(merge_context(&chain, scenarios))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{HttpMock, ScenarioSet};
    use serde_json::{json, Value};

    fn map(scenarios: Vec<Scenario>) -> ScenarioMap {
        scenarios
            .into_iter()
            .map(|scenario| (scenario.id.clone(), scenario))
            .collect()
    }

    #[test]
    fn test_chain_is_root_first() {
        let scenarios = map(vec![
            Scenario::new("child").extend("parent"),
            Scenario::new("parent").extend("root"),
            Scenario::new("root"),
        ]);

        let chain = resolve_chain(&scenarios["child"], &scenarios).unwrap();
        assert_eq!(chain, vec!["root", "parent", "child"]);
    }

    #[test]
    fn test_missing_parent_terminates_chain() {
        let scenarios = map(vec![Scenario::new("child").extend("ghost")]);

        let chain = resolve_chain(&scenarios["child"], &scenarios).unwrap();
        assert_eq!(chain, vec!["child"]);
    }

    #[test]
    fn test_self_extension_is_a_cycle() {
        let scenarios = map(vec![Scenario::new("loop").extend("loop")]);

        let error = resolve_chain(&scenarios["loop"], &scenarios).unwrap_err();
        assert!(matches!(
            error,
            MockServerError::ExtendCycle { ref scenario, ref repeated } if scenario == "loop" && repeated == "loop"
        ));
    }

    #[test]
    fn test_descendant_context_overwrites_by_key() {
        let set = ScenarioSet::new(vec![
            Scenario::new("ancestor").with_context(json!({"a": 1})),
            Scenario::new("middle").extend("ancestor"),
            Scenario::new("descendant")
                .extend("middle")
                .with_context(json!({"a": 2, "b": 3})),
        ])
        .unwrap();

        let context = scenario_context(set.get("descendant").unwrap(), set.map()).unwrap();
        assert_eq!(Value::Object(context), json!({"a": 2, "b": 3}));
    }

    #[test]
    fn test_mocks_flatten_ancestor_first() {
        let scenarios = map(vec![
            Scenario::new("base")
                .mock(HttpMock::get("/one").unwrap())
                .mock(HttpMock::get("/two").unwrap()),
            Scenario::new("leaf")
                .extend("base")
                .mock(HttpMock::get("/three").unwrap()),
        ]);

        let chain = resolve_chain(&scenarios["leaf"], &scenarios).unwrap();
        let paths: Vec<String> = flatten_mocks(&chain, &scenarios)
            .into_iter()
            .map(|mock| match mock {
                Mock::Http(http) => http.path.key(),
                Mock::GraphQl(graphql) => graphql.path.clone(),
            })
            .collect();

        assert_eq!(paths, vec!["/one", "/two", "/three"]);
    }
}
