use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::{collections::BTreeMap, fs, path::Path};
use tracing::{info, warn};

use super::{Dashboard, InsightColumns};
use crate::schema::{NameMatching, Schema};

const PROPELLER_COLUMNS: [&str; 16] = [
    "Propeller ID",
    "Date",
    "Time",
    "Handler",
    "Preforming (Yet-to-Start)",
    "Preforming (In-Progress)",
    "Moulding (Yet-to-Start)",
    "Moulding (In-Progress)",
    "CNC Trimming",
    "Trimming",
    "Balancing",
    "Polishing",
    "Quality",
    "Performance",
    "Packaging",
    "Shipping",
];

const EFFICIENCY_COLUMNS: [&str; 3] = ["Status", "Overall Efficiency", "Standard Overall Efficiency"];

const STATUS_COLUMNS: [&str; 4] = ["Propeller ID", "Handler", "Stage", "Status"];

static BUILTIN: Lazy<Registry> = Lazy::new(|| {
    let mut dashboards = BTreeMap::new();
    for dash in [propeller(), efficiency(), status()] {
        dashboards.insert(dash.name.clone(), dash);
    }
    Registry { dashboards }
});

fn owned(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

fn propeller() -> Dashboard {
    let stages = owned(&PROPELLER_COLUMNS[4..]);
    Dashboard {
        name: "propeller".into(),
        title: "Propeller Manufacturing Process Analysis".into(),
        schema: Schema {
            name: "propeller".into(),
            columns: owned(&PROPELLER_COLUMNS),
            matching: NameMatching::Exact,
        },
        identifiers: owned(&["Propeller ID"]),
        numeric_stages: stages.clone(),
        stages,
        category: None,
        insight: None,
    }
}

fn efficiency() -> Dashboard {
    Dashboard {
        name: "efficiency".into(),
        title: "Excel Data Visualization".into(),
        schema: Schema {
            name: "efficiency".into(),
            columns: owned(&EFFICIENCY_COLUMNS),
            matching: NameMatching::Exact,
        },
        identifiers: Vec::new(),
        stages: owned(&EFFICIENCY_COLUMNS[1..]),
        numeric_stages: owned(&EFFICIENCY_COLUMNS[1..]),
        category: Some("Status".into()),
        insight: Some(InsightColumns {
            categorical: "Status".into(),
            numeric_a: "Overall Efficiency".into(),
            numeric_b: "Standard Overall Efficiency".into(),
        }),
    }
}

fn status() -> Dashboard {
    Dashboard {
        name: "status".into(),
        title: "Propeller Status Tracking".into(),
        schema: Schema {
            name: "status".into(),
            columns: owned(&STATUS_COLUMNS),
            matching: NameMatching::TrimLowercase,
        },
        identifiers: owned(&["Propeller ID"]),
        stages: owned(&STATUS_COLUMNS[1..]),
        numeric_stages: Vec::new(),
        category: Some("Status".into()),
        insight: None,
    }
}

#[derive(Debug, Deserialize)]
struct DashboardFile {
    dashboards: Vec<Dashboard>,
}

/// Named dashboard definitions.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    dashboards: BTreeMap<String, Dashboard>,
}

impl Registry {
    /// `propeller`, `efficiency` and `status`.
    pub fn builtin() -> Registry {
        BUILTIN.clone()
    }

    pub fn get(&self, name: &str) -> Option<&Dashboard> {
        self.dashboards.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.dashboards.keys().map(String::as_str).collect()
    }

    /// Add or replace a dashboard after checking that every column it melts
    /// or summarizes is part of its schema.
    pub fn insert(&mut self, dashboard: Dashboard) -> Result<()> {
        dashboard
            .schema
            .check()
            .with_context(|| format!("dashboard `{}`", dashboard.name))?;

        let insight_cols = dashboard
            .insight
            .iter()
            .flat_map(|i| [&i.categorical, &i.numeric_a, &i.numeric_b]);
        let referenced = dashboard
            .identifiers
            .iter()
            .chain(&dashboard.stages)
            .chain(&dashboard.numeric_stages)
            .chain(&dashboard.category)
            .chain(insight_cols);
        for col in referenced {
            if !dashboard.schema.columns.contains(col) {
                bail!(
                    "dashboard `{}` uses column `{}` which is not in its schema",
                    dashboard.name,
                    col
                );
            }
        }
        if dashboard.stages.is_empty() {
            bail!("dashboard `{}` has no stage columns", dashboard.name);
        }
        for col in &dashboard.numeric_stages {
            if !dashboard.stages.contains(col) {
                bail!(
                    "dashboard `{}`: numeric stage `{}` is not a stage",
                    dashboard.name,
                    col
                );
            }
        }

        if self.dashboards.contains_key(&dashboard.name) {
            warn!(dashboard = %dashboard.name, "replacing dashboard definition");
        }
        self.dashboards.insert(dashboard.name.clone(), dashboard);
        Ok(())
    }

    /// Parse a YAML document with a top-level `dashboards:` list.
    pub fn extend_from_yaml(&mut self, text: &str) -> Result<usize> {
        let file: DashboardFile = serde_yaml::from_str(text).context("parsing dashboard YAML")?;
        let n = file.dashboards.len();
        for dash in file.dashboards {
            self.insert(dash)?;
        }
        Ok(n)
    }

    pub fn load_yaml<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        let n = self
            .extend_from_yaml(&text)
            .with_context(|| format!("loading dashboards from {:?}", path))?;
        info!(count = n, path = %path.display(), "loaded dashboard definitions");
        Ok(n)
    }
}
