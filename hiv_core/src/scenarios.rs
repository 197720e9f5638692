//! Named parameter presets.

use crate::dynamics::SimulationParams;
use crate::error::SimError;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Default parameters
    Baseline,

    /// Therapy never switches on within the window
    NoTherapy,

    /// Therapy from the first step at the default rate
    EarlyTherapy,

    /// Kill rate high enough to turn viral growth into decline
    Aggressive,

    /// Therapy switched on late in the window
    LateTherapy,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Baseline,
            ScenarioId::NoTherapy,
            ScenarioId::EarlyTherapy,
            ScenarioId::Aggressive,
            ScenarioId::LateTherapy,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "baseline",
            ScenarioId::NoTherapy => "no_therapy",
            ScenarioId::EarlyTherapy => "early_therapy",
            ScenarioId::Aggressive => "aggressive",
            ScenarioId::LateTherapy => "late_therapy",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "200 steps, therapy at step 30, 10% kill rate",
            ScenarioId::NoTherapy => "Untreated infection: unchecked viral growth, reservoir intact",
            ScenarioId::EarlyTherapy => "Therapy from step 0 at 10% kill rate",
            ScenarioId::Aggressive => "Therapy at step 30 with 60% kill rate, viral load declines",
            ScenarioId::LateTherapy => "Therapy delayed until step 150",
        }
    }

    /// Returns the parameters for this scenario.
    pub fn params(&self) -> SimulationParams {
        let base = SimulationParams::default();
        match self {
            ScenarioId::Baseline => base,
            ScenarioId::NoTherapy => {
                let t_max = base.t_max;
                base.with_therapy_start(i64::from(t_max))
            }
            ScenarioId::EarlyTherapy => base.with_therapy_start(0),
            ScenarioId::Aggressive => base.with_release_rate(0.6),
            ScenarioId::LateTherapy => base.with_therapy_start(150),
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" | "default" => Ok(ScenarioId::Baseline),
            "no_therapy" | "notherapy" | "untreated" => Ok(ScenarioId::NoTherapy),
            "early_therapy" | "earlytherapy" | "early" => Ok(ScenarioId::EarlyTherapy),
            "aggressive" => Ok(ScenarioId::Aggressive),
            "late_therapy" | "latetherapy" | "late" => Ok(ScenarioId::LateTherapy),
            _ => Err(SimError::UnknownScenario(s.to_string())),
        }
    }
}
