//! Adapter-side state saved next to the LP model file, and the index remap
//! used to re-bind handles after a reload.

use crate::domain::{
    solver_service::{Result, SolverError},
    value_objects::Domain,
    Variable,
};
use crate::native::{LinearExpr, NativeEnvironment, NativeModel};
use serde::{Deserialize, Serialize};

/// Side-channel record persisted alongside the model file.
///
/// `has_goal` tells an objective that was set apart from the empty one the
/// LP importer always creates. Only `has_goal` is required when reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub has_goal: bool,
    #[serde(default)]
    pub goal_name: Option<String>,
    /// Native column names, indexed by persistence index
    #[serde(default)]
    pub columns: Vec<String>,
    /// Name table entries
    #[serde(default)]
    pub variables: Vec<VariableRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRecord {
    pub name: String,
    pub domain: Domain,
    pub persistence_index: usize,
    #[serde(default)]
    pub precomputed_value: Option<f64>,
}

impl ModelMetadata {
    /// Capture the adapter state for `model`; only column variables are kept.
    pub fn capture<'a>(
        model: &NativeModel,
        has_goal: bool,
        goal_name: Option<&str>,
        variables: impl IntoIterator<Item = &'a Variable>,
    ) -> Self {
        let mut records: Vec<VariableRecord> = variables
            .into_iter()
            .filter_map(|variable| {
                variable.persistence_index().map(|index| VariableRecord {
                    name: variable.name().to_string(),
                    domain: variable.domain(),
                    persistence_index: index,
                    precomputed_value: variable.precomputed_value(),
                })
            })
            .collect();
        records.sort_by(|a, b| {
            a.persistence_index
                .cmp(&b.persistence_index)
                .then_with(|| a.name.cmp(&b.name))
        });

        Self {
            has_goal,
            goal_name: goal_name.map(str::to_string),
            columns: model.columns.iter().map(|c| c.name.clone()).collect(),
            variables: records,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }
}

/// Old persistence index to column index in a reloaded environment
#[derive(Debug, Clone, PartialEq)]
pub struct RemapTable {
    columns: Vec<String>,
    indices: Vec<Option<usize>>,
}

impl RemapTable {
    /// Match the saved column names against the columns of `env`
    pub fn build(columns: &[String], env: &NativeEnvironment) -> Self {
        Self {
            columns: columns.to_vec(),
            indices: columns.iter().map(|name| env.column_index(name)).collect(),
        }
    }

    pub fn index(&self, persistence_index: usize) -> Result<usize> {
        match self.indices.get(persistence_index) {
            Some(Some(index)) => Ok(*index),
            Some(None) => Err(SolverError::Remap {
                column: self.columns[persistence_index].clone(),
                index: persistence_index,
            }),
            None => Err(SolverError::Remap {
                column: String::from("<unknown>"),
                index: persistence_index,
            }),
        }
    }

    pub fn expr(&self, expr: &LinearExpr) -> Result<LinearExpr> {
        expr.map_columns(|index| self.index(index))
    }
}
