//! Dynamics Simulator - discrete-time HIV infection model.
//!
//! Three coupled populations are advanced one step at a time:
//! - **T**: healthy T cells, regenerating at a constant rate and depleted by virus
//! - **V**: viral load, growing 50% per step and suppressed by therapy
//! - **L**: latent reservoir, decaying only while therapy is active
//!
//! Therapy is a binary switch: off before `therapy_start`, fully on from it.
//!
//! ```text
//! kill = (i >= therapy_start) ? release_rate : 0
//!
//! T[i] = T[i-1] + 2 - 0.01 * V[i-1]
//! V[i] = V[i-1] + 0.5 * V[i-1] - kill * V[i-1]
//! L[i] = L[i-1] - kill * L[i-1] * 0.5
//! ```
//!
//! All three values are floored at zero after each step.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

// =============================================================================
// MODEL CONSTANTS
// =============================================================================

/// Healthy T cells at step 0
pub const INITIAL_HEALTHY: f64 = 1000.0;

/// Viral load at step 0
pub const INITIAL_VIRAL: f64 = 50.0;

/// Latent reservoir size at step 0
pub const INITIAL_LATENT: f64 = 300.0;

/// Healthy cells produced per step
const T_REGENERATION: f64 = 2.0;

/// Healthy cells lost per unit of viral load
const T_DEPLETION: f64 = 0.01;

/// Intrinsic viral growth per step
const V_GROWTH: f64 = 0.5;

/// Fraction of the kill factor applied to the latent reservoir
const L_KILL_SHARE: f64 = 0.5;

/// Default upper bound on `t_max` accepted by [`SimulationParams::validate`].
///
/// Untreated viral load overflows `f64` at step 1741.
pub const DEFAULT_MAX_STEPS: u32 = 1_500;

// =============================================================================
// PARAMETERS
// =============================================================================

/// Input to a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Number of discrete steps to simulate
    pub t_max: u32,

    /// Step index at which therapy switches on
    pub therapy_start: i64,

    /// Fractional kill rate applied while therapy is active
    pub release_rate: f64,

    /// Payload label, carried for display only
    pub payload_type: String,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            t_max: 200,
            therapy_start: 30,
            release_rate: 0.1,
            payload_type: "siRNA".to_string(),
        }
    }
}

impl SimulationParams {
    pub fn with_t_max(mut self, t_max: u32) -> Self {
        self.t_max = t_max;
        self
    }

    pub fn with_therapy_start(mut self, therapy_start: i64) -> Self {
        self.therapy_start = therapy_start;
        self
    }

    pub fn with_release_rate(mut self, release_rate: f64) -> Self {
        self.release_rate = release_rate;
        self
    }

    pub fn with_payload_type(mut self, payload_type: impl Into<String>) -> Self {
        self.payload_type = payload_type.into();
        self
    }

    /// Returns true if therapy is switched on for the update producing step `i`.
    pub fn therapy_active(&self, i: u32) -> bool {
        i64::from(i) >= self.therapy_start
    }

    /// Kill factor applied by the update producing step `i`.
    pub fn kill_factor(&self, i: u32) -> f64 {
        if self.therapy_active(i) {
            self.release_rate
        } else {
            0.0
        }
    }

    /// Checks the parameters against the given limits.
    ///
    /// Negative `therapy_start` and `release_rate` pass; see [`Self::warnings`].
    pub fn validate(&self, limits: &SimulationLimits) -> Result<(), SimError> {
        if self.t_max < 1 {
            return Err(SimError::InvalidHorizon(i64::from(self.t_max)));
        }
        if self.t_max > limits.max_steps {
            return Err(SimError::HorizonTooLarge {
                requested: i64::from(self.t_max),
                limit: limits.max_steps,
            });
        }
        if !self.release_rate.is_finite() {
            return Err(SimError::NonFiniteRate(self.release_rate));
        }
        Ok(())
    }

    /// Notes about parameters that simulate fine but are not physical.
    pub fn warnings(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if self.release_rate < 0.0 {
            notes.push(format!(
                "release_rate {} is negative; therapy will amplify viral load",
                self.release_rate
            ));
        }
        if self.therapy_start < 0 {
            notes.push(format!(
                "therapy_start {} is negative; therapy is active from the first step",
                self.therapy_start
            ));
        }
        notes
    }
}

/// Bounds enforced on caller-supplied parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationLimits {
    /// Largest `t_max` accepted
    pub max_steps: u32,
}

impl Default for SimulationLimits {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Population sizes at a single step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellState {
    pub healthy: f64,
    pub viral: f64,
    pub latent: f64,
}

impl CellState {
    /// State at step 0.
    pub const INITIAL: CellState = CellState {
        healthy: INITIAL_HEALTHY,
        viral: INITIAL_VIRAL,
        latent: INITIAL_LATENT,
    };

    /// Advances one step under the given kill factor.
    ///
    /// All three values are computed from `self` before any is floored.
    pub fn step(&self, kill_factor: f64) -> CellState {
        let healthy = self.healthy + T_REGENERATION - T_DEPLETION * self.viral;
        let viral = self.viral + V_GROWTH * self.viral - kill_factor * self.viral;
        let latent = self.latent - kill_factor * self.latent * L_KILL_SHARE;

        CellState {
            healthy: floor_at_zero(healthy),
            viral: floor_at_zero(viral),
            latent: floor_at_zero(latent),
        }
    }

    /// Returns true if all three populations are finite.
    pub fn is_finite(&self) -> bool {
        self.healthy.is_finite() && self.viral.is_finite() && self.latent.is_finite()
    }
}

/// Clamps negatives to zero. NaN and infinities pass through unchanged.
fn floor_at_zero(x: f64) -> f64 {
    if x < 0.0 {
        0.0
    } else {
        x
    }
}

// =============================================================================
// RESULT
// =============================================================================

/// Trajectories produced by [`simulate`].
///
/// Serializes as `{ "time", "T", "V", "L" }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Step indices `0..t_max`
    pub time: Vec<u32>,

    /// Healthy T-cell count per step
    #[serde(rename = "T")]
    pub healthy: Vec<f64>,

    /// Viral load per step
    #[serde(rename = "V")]
    pub viral: Vec<f64>,

    /// Latent reservoir size per step
    #[serde(rename = "L")]
    pub latent: Vec<f64>,
}

impl SimulationResult {
    fn with_capacity(steps: usize) -> Self {
        Self {
            time: Vec::with_capacity(steps),
            healthy: Vec::with_capacity(steps),
            viral: Vec::with_capacity(steps),
            latent: Vec::with_capacity(steps),
        }
    }

    fn push(&mut self, step: u32, state: CellState) {
        self.time.push(step);
        self.healthy.push(state.healthy);
        self.viral.push(state.viral);
        self.latent.push(state.latent);
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// State at step `i`, if recorded.
    pub fn state_at(&self, i: usize) -> Option<CellState> {
        Some(CellState {
            healthy: *self.healthy.get(i)?,
            viral: *self.viral.get(i)?,
            latent: *self.latent.get(i)?,
        })
    }

    /// Last recorded state.
    pub fn final_state(&self) -> Option<CellState> {
        self.len().checked_sub(1).and_then(|i| self.state_at(i))
    }
}

// =============================================================================
// SIMULATOR
// =============================================================================

/// Runs the recurrence for `params.t_max` steps.
///
/// Returns empty sequences when `t_max` is 0. Values stay finite for every
/// run [`simulate_checked`] accepts; past that an overflowed population is
/// recorded as-is.
pub fn simulate(params: &SimulationParams) -> SimulationResult {
    let mut result = SimulationResult::with_capacity(params.t_max as usize);
    if params.t_max == 0 {
        return result;
    }

    let mut state = CellState::INITIAL;
    result.push(0, state);

    for i in 1..params.t_max {
        state = state.step(params.kill_factor(i));
        result.push(i, state);
    }

    tracing::trace!(
        steps = result.len(),
        final_viral = state.viral,
        final_latent = state.latent,
        "simulation complete"
    );

    result
}

/// Like [`simulate`], but fails on the first step whose state is not finite.
pub fn simulate_checked(params: &SimulationParams) -> Result<SimulationResult, SimError> {
    let mut result = SimulationResult::with_capacity(params.t_max as usize);
    if params.t_max == 0 {
        return Ok(result);
    }

    let mut state = CellState::INITIAL;
    result.push(0, state);

    for i in 1..params.t_max {
        state = state.step(params.kill_factor(i));
        if !state.is_finite() {
            tracing::debug!(step = i, ?state, "state left the finite range");
            return Err(SimError::NonFiniteState { step: i });
        }
        result.push(i, state);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_initial_conditions() {
        let result = simulate(&SimulationParams::default());

        assert_eq!(result.time[0], 0);
        assert_eq!(result.healthy[0], 1000.0);
        assert_eq!(result.viral[0], 50.0);
        assert_eq!(result.latent[0], 300.0);
    }

    #[test]
    fn test_default_lengths() {
        let result = simulate(&SimulationParams::default());

        assert_eq!(result.len(), 200);
        assert_eq!(result.healthy.len(), 200);
        assert_eq!(result.viral.len(), 200);
        assert_eq!(result.latent.len(), 200);
        assert_eq!(result.time, (0..200).collect::<Vec<u32>>());
    }

    #[test]
    fn test_two_step_full_kill() {
        let params = SimulationParams::default()
            .with_t_max(2)
            .with_therapy_start(0)
            .with_release_rate(1.0);
        let result = simulate(&params);

        assert_eq!(result.time, vec![0, 1]);
        assert_relative_eq!(result.healthy[1], 1001.5, epsilon = 1e-12);
        assert_relative_eq!(result.viral[1], 25.0, epsilon = 1e-12);
        assert_relative_eq!(result.latent[1], 150.0, epsilon = 1e-12);
    }

    #[test]
    fn test_therapy_switches_on_at_start_step() {
        let result = simulate(&SimulationParams::default());

        // Before onset: pure 50% growth, reservoir untouched
        assert_relative_eq!(result.viral[29], 1.5 * result.viral[28], max_relative = 1e-12);
        assert_eq!(result.latent[29], 300.0);

        // At onset: kill factor 0.1
        assert_relative_eq!(result.viral[30], 1.4 * result.viral[29], max_relative = 1e-12);
        assert_relative_eq!(result.latent[30], 0.95 * result.latent[29], max_relative = 1e-12);
    }

    #[test]
    fn test_therapy_never_active() {
        let params = SimulationParams::default().with_t_max(50).with_therapy_start(50);
        let result = simulate(&params);

        assert!(result.latent.iter().all(|&l| l == 300.0));
        for i in 1..result.len() {
            assert_relative_eq!(result.viral[i], 1.5 * result.viral[i - 1], max_relative = 1e-12);
        }
    }

    #[test]
    fn test_zero_release_rate_is_inert() {
        for start in [0, 10, 1000] {
            let params = SimulationParams::default()
                .with_t_max(40)
                .with_therapy_start(start)
                .with_release_rate(0.0);
            let result = simulate(&params);

            assert!(result.latent.iter().all(|&l| l == 300.0));
            for i in 1..result.len() {
                assert_relative_eq!(result.viral[i], 1.5 * result.viral[i - 1], max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_healthy_cells_floor_at_zero() {
        // Unchecked viral growth eventually drives T negative before the clamp
        let result = simulate(&SimulationParams::default().with_therapy_start(10_000));

        assert_eq!(*result.healthy.last().unwrap(), 0.0);
        assert!(result.healthy.iter().all(|&t| t >= 0.0));
    }

    #[test]
    fn test_zero_horizon_is_empty() {
        let result = simulate(&SimulationParams::default().with_t_max(0));

        assert!(result.is_empty());
        assert!(result.healthy.is_empty());
        assert!(result.final_state().is_none());
    }

    #[test]
    fn test_single_step_horizon() {
        let result = simulate(&SimulationParams::default().with_t_max(1));

        assert_eq!(result.len(), 1);
        assert_eq!(result.final_state(), Some(CellState::INITIAL));
    }

    #[test]
    fn test_negative_release_rate_amplifies_virus() {
        let params = SimulationParams::default()
            .with_t_max(3)
            .with_therapy_start(0)
            .with_release_rate(-0.5);
        let result = simulate(&params);

        assert_relative_eq!(result.viral[1], 100.0, epsilon = 1e-12);
        assert_relative_eq!(result.latent[1], 375.0, epsilon = 1e-12);
    }

    #[test]
    fn test_json_field_names() {
        let result = simulate(&SimulationParams::default().with_t_max(2));
        let json = serde_json::to_value(&result).unwrap();
        let obj = json.as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["L", "T", "V", "time"]);
        assert_eq!(json["time"], serde_json::json!([0, 1]));
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let params: SimulationParams = serde_json::from_str(r#"{"release_rate": 0.3}"#).unwrap();

        assert_eq!(params.t_max, 200);
        assert_eq!(params.therapy_start, 30);
        assert_relative_eq!(params.release_rate, 0.3);
        assert_eq!(params.payload_type, "siRNA");
    }

    #[test]
    fn test_validate() {
        let limits = SimulationLimits { max_steps: 500 };

        assert!(SimulationParams::default().validate(&limits).is_ok());
        assert!(matches!(
            SimulationParams::default().with_t_max(0).validate(&limits),
            Err(SimError::InvalidHorizon(0))
        ));
        assert!(matches!(
            SimulationParams::default().with_t_max(501).validate(&limits),
            Err(SimError::HorizonTooLarge { requested: 501, limit: 500 })
        ));
        assert!(matches!(
            SimulationParams::default().with_release_rate(f64::NAN).validate(&limits),
            Err(SimError::NonFiniteRate(_))
        ));
        // Non-physical but accepted
        let odd = SimulationParams::default()
            .with_release_rate(-0.2)
            .with_therapy_start(-5);
        assert!(odd.validate(&limits).is_ok());
        assert_eq!(odd.warnings().len(), 2);
        assert!(SimulationParams::default().warnings().is_empty());
    }

    #[test]
    fn test_untreated_overflow_is_reported() {
        let params = SimulationParams::default()
            .with_t_max(2000)
            .with_therapy_start(100_000);

        assert!(matches!(
            simulate_checked(&params),
            Err(SimError::NonFiniteState { step: 1741 })
        ));
        // Unchecked run keeps the overflow visible instead of flooring it to zero
        let result = simulate(&params);
        assert!(result.viral[1741].is_infinite());
        assert!(result.viral[1760..].iter().all(|v| !v.is_finite()));
    }

    #[test]
    fn test_default_limit_rejects_overflowing_horizons() {
        let limits = SimulationLimits::default();
        let params = SimulationParams::default().with_t_max(2000);

        assert!(matches!(
            params.validate(&limits),
            Err(SimError::HorizonTooLarge { requested: 2000, .. })
        ));
    }

    #[test]
    fn test_longest_accepted_horizon_stays_finite() {
        let limits = SimulationLimits::default();
        let params = SimulationParams::default()
            .with_t_max(limits.max_steps)
            .with_therapy_start(i64::MAX);
        params.validate(&limits).unwrap();

        let result = simulate_checked(&params).unwrap();
        assert_eq!(result.len(), limits.max_steps as usize);
        assert!(result.viral.iter().all(|v| v.is_finite() && *v >= 0.0));
        assert!(result.healthy.iter().all(|t| t.is_finite() && *t >= 0.0));
        assert!(result.latent.iter().all(|l| l.is_finite() && *l >= 0.0));
        assert_eq!(result, simulate(&params));
    }

    #[test]
    fn test_floor_keeps_nan_visible() {
        assert_eq!(floor_at_zero(-3.0), 0.0);
        assert_eq!(floor_at_zero(2.5), 2.5);
        assert!(floor_at_zero(f64::NAN).is_nan());
        assert_eq!(floor_at_zero(f64::INFINITY), f64::INFINITY);
    }

    proptest! {
        #[test]
        fn prop_checked_runs_are_finite(
            t_max in 1u32..=DEFAULT_MAX_STEPS,
            therapy_start in -50i64..3000,
            release_rate in -2.0f64..5.0,
        ) {
            let params = SimulationParams::default()
                .with_t_max(t_max)
                .with_therapy_start(therapy_start)
                .with_release_rate(release_rate);

            match simulate_checked(&params) {
                Ok(result) => {
                    prop_assert_eq!(result.len(), t_max as usize);
                    prop_assert!(result.viral.iter().all(|v| v.is_finite() && *v >= 0.0));
                    prop_assert!(result.healthy.iter().all(|t| t.is_finite() && *t >= 0.0));
                    prop_assert!(result.latent.iter().all(|l| l.is_finite() && *l >= 0.0));
                }
                Err(SimError::NonFiniteState { step }) => prop_assert!(step < t_max),
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }


        #[test]
        fn prop_lengths_match_horizon(
            t_max in 0u32..400,
            therapy_start in -50i64..500,
            release_rate in -2.0f64..2.0,
        ) {
            let params = SimulationParams::default()
                .with_t_max(t_max)
                .with_therapy_start(therapy_start)
                .with_release_rate(release_rate);
            let result = simulate(&params);

            prop_assert_eq!(result.time.len(), t_max as usize);
            prop_assert_eq!(result.healthy.len(), t_max as usize);
            prop_assert_eq!(result.viral.len(), t_max as usize);
            prop_assert_eq!(result.latent.len(), t_max as usize);
        }

        #[test]
        fn prop_values_non_negative(
            t_max in 1u32..400,
            therapy_start in -50i64..500,
            release_rate in -2.0f64..5.0,
        ) {
            let params = SimulationParams::default()
                .with_t_max(t_max)
                .with_therapy_start(therapy_start)
                .with_release_rate(release_rate);
            let result = simulate(&params);

            prop_assert!(result.healthy.iter().all(|&t| t >= 0.0));
            prop_assert!(result.viral.iter().all(|&v| v >= 0.0));
            prop_assert!(result.latent.iter().all(|&l| l >= 0.0));
        }

        #[test]
        fn prop_deterministic(
            t_max in 1u32..300,
            therapy_start in 0i64..300,
            release_rate in 0.0f64..1.0,
        ) {
            let params = SimulationParams::default()
                .with_t_max(t_max)
                .with_therapy_start(therapy_start)
                .with_release_rate(release_rate);

            let a = simulate(&params);
            let b = simulate(&params);
            for i in 0..a.len() {
                prop_assert_eq!(a.healthy[i].to_bits(), b.healthy[i].to_bits());
                prop_assert_eq!(a.viral[i].to_bits(), b.viral[i].to_bits());
                prop_assert_eq!(a.latent[i].to_bits(), b.latent[i].to_bits());
            }
        }
    }
}
