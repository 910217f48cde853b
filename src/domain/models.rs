use super::solver_service::{Result, SolverError};
use super::value_objects::{NativeStatus, SolverBackend};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub backend: SolverBackend,
    /// Prefix of generated variable names (`x_0`, `x_1`, ...)
    pub variable_prefix: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Auto,
            variable_prefix: "x_".to_string(),
        }
    }
}

impl SessionSettings {
    pub fn with_backend(mut self, backend: SolverBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_variable_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.variable_prefix = prefix.into();
        self
    }

    /// Parse settings from a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let settings: Self = toml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Generated column names are written to LP files, so the prefix must
    /// read back as a single column name: a leading letter, then letters,
    /// digits, `_` or `.`.
    pub fn validate(&self) -> Result<()> {
        let mut chars = self.variable_prefix.chars();
        let leading = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        if !leading || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
            return Err(SolverError::InvalidProblem(format!(
                "Variable prefix '{}' cannot be used in an LP column name",
                self.variable_prefix
            )));
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

/// Destination of a saved model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFileSettings {
    /// Model file in LP format
    pub model_path: PathBuf,
    /// Side-channel metadata; defaults to `<model_path>.meta.json`
    #[serde(default)]
    pub metadata_path: Option<PathBuf>,
}

impl SaveFileSettings {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            metadata_path: None,
        }
    }

    pub fn with_metadata_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata_path = Some(path.into());
        self
    }

    pub fn metadata_path(&self) -> PathBuf {
        match &self.metadata_path {
            Some(path) => path.clone(),
            None => {
                let mut path = self.model_path.clone().into_os_string();
                path.push(".meta.json");
                PathBuf::from(path)
            }
        }
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_columns: u32,
    pub num_rows: u32,
    pub num_integer_columns: u32,
    pub num_binary_columns: u32,
}

/// Result of one native solve
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: NativeStatus,
    pub objective_value: Option<f64>,
    /// One value per native column, empty when the status carries no solution
    pub column_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
}

impl Solution {
    pub fn new(status: NativeStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            objective_value: None,
            column_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn optimal(column_values: Vec<f64>, objective_value: Option<f64>) -> Self {
        Self {
            status: NativeStatus::Optimal,
            objective_value,
            column_values,
            message: "Optimal solution found".to_string(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == NativeStatus::Optimal
    }

    pub fn has_values(&self) -> bool {
        self.status.has_solution()
    }
}
