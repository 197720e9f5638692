//! JSON exporter for simulation runs.
//!
//! Bundles the inputs, the trajectories and their summary into one document
//! for plotting outside the service.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::dynamics::{SimulationParams, SimulationResult};
use crate::error::SimError;
use crate::summary::TrajectorySummary;

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Preset name, if the run came from one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,

    /// Parameters used
    pub params: SimulationParams,

    /// Derived metrics
    pub summary: TrajectorySummary,

    /// Full trajectories
    pub result: SimulationResult,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(params: SimulationParams, result: SimulationResult) -> Self {
        let summary = TrajectorySummary::from_result(&params, &result);
        Self {
            scenario: None,
            params,
            summary,
            result,
        }
    }

    /// Tags the export with a preset name.
    pub fn with_scenario(mut self, name: impl Into<String>) -> Self {
        self.scenario = Some(name.into());
        self
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path.as_ref())?;
        file.write_all(json.as_bytes())?;
        tracing::debug!(path = %path.as_ref().display(), bytes = json.len(), "wrote export");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::simulate;

    #[test]
    fn test_write_export() {
        let params = SimulationParams::default().with_t_max(5);
        let export = SimExport::new(params.clone(), simulate(&params)).with_scenario("baseline");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        export.write_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["scenario"], "baseline");
        assert_eq!(value["params"]["t_max"], 5);
        assert_eq!(value["summary"]["steps"], 5);
        assert_eq!(value["result"]["T"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let params = SimulationParams::default().with_t_max(2);
        let export = SimExport::new(params.clone(), simulate(&params));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("run.json");

        assert!(matches!(export.write_to_file(&path), Err(SimError::Io(_))));
    }
}
