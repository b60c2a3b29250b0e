//! Table output for the CLI.

use tabled::{Table, Tabled};

use crate::scenario::{Scenario, ScenarioSet};

/// One scenario as a table row.
#[derive(Debug, Tabled)]
pub struct ScenarioRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Group")]
    pub group: String,
    #[tabled(rename = "Extends")]
    pub extend: String,
    #[tabled(rename = "Mocks")]
    pub mocks: usize,
    #[tabled(rename = "Description")]
    pub description: String,
}

impl From<&Scenario> for ScenarioRow {
    fn from(scenario: &Scenario) -> Self {
        Self {
            id: scenario.id.clone(),
            name: scenario.name.clone(),
            group: scenario.group.clone().unwrap_or_default(),
            extend: scenario.extend.clone().unwrap_or_default(),
            mocks: scenario.mocks.len(),
            description: truncate(scenario.description.as_deref().unwrap_or_default(), 50),
        }
    }
}

/// Render every scenario as a table, in declaration order.
pub fn scenario_table(scenarios: &ScenarioSet) -> String {
    let rows: Vec<ScenarioRow> = scenarios.iter().map(ScenarioRow::from).collect();
    Table::new(rows).to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
