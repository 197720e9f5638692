//! Trajectory summary - scalar metrics derived from a finished run.
//!
//! Key metrics:
//! - Peak viral load and when it happened
//! - Final population sizes
//! - Healthy-cell nadir
//! - Reservoir reduction relative to step 0
//! - Whether therapy turned viral growth into decline

use serde::{Deserialize, Serialize};

use crate::dynamics::{SimulationParams, SimulationResult};

/// Scalar view of a [`SimulationResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySummary {
    /// Number of recorded steps
    pub steps: usize,

    /// First step whose update applied the kill factor
    pub therapy_onset: Option<u32>,

    /// Largest viral load observed
    pub peak_viral_load: Option<f64>,

    /// Step of the first occurrence of the peak
    pub peak_viral_step: Option<u32>,

    /// Lowest healthy T-cell count observed
    pub min_healthy_cells: Option<f64>,

    /// Step of the first occurrence of the nadir
    pub min_healthy_step: Option<u32>,

    pub final_t: Option<f64>,
    pub final_v: Option<f64>,
    pub final_l: Option<f64>,

    /// `1 - L_final / L[0]`, 0 when the reservoir is untouched
    pub reservoir_reduction: f64,

    /// Therapy is on and viral load never rises from the onset onwards
    pub viral_suppressed: bool,
}

impl TrajectorySummary {
    /// Builds the summary of `result`, which must come from `params`.
    pub fn from_result(params: &SimulationParams, result: &SimulationResult) -> Self {
        let steps = result.len();
        let final_state = result.final_state();

        let therapy_onset = (1..params.t_max.min(steps as u32)).find(|&i| params.therapy_active(i));

        let (peak_viral_step, peak_viral_load) = arg_extreme(&result.viral, |cand, best| cand > best);
        let (min_healthy_step, min_healthy_cells) =
            arg_extreme(&result.healthy, |cand, best| cand < best);

        let reservoir_reduction = match (result.latent.first(), final_state) {
            (Some(&initial), Some(last)) if initial > 0.0 => 1.0 - last.latent / initial,
            _ => 0.0,
        };

        let viral_suppressed = therapy_onset
            .map(|onset| {
                let from = onset as usize - 1;
                result.viral[from..].windows(2).all(|w| w[1] <= w[0])
            })
            .unwrap_or(false);

        Self {
            steps,
            therapy_onset,
            peak_viral_load,
            peak_viral_step,
            min_healthy_cells,
            min_healthy_step,
            final_t: final_state.map(|s| s.healthy),
            final_v: final_state.map(|s| s.viral),
            final_l: final_state.map(|s| s.latent),
            reservoir_reduction,
            viral_suppressed,
        }
    }
}

/// Index and value of the first element preferred by `better` over all others.
fn arg_extreme(values: &[f64], better: impl Fn(f64, f64) -> bool) -> (Option<u32>, Option<f64>) {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if !better(v, b) => {}
            _ => best = Some((i, v)),
        }
    }
    match best {
        Some((i, v)) => (Some(i as u32), Some(v)),
        None => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::simulate;
    use approx::assert_relative_eq;

    fn summarize(params: SimulationParams) -> TrajectorySummary {
        let result = simulate(&params);
        TrajectorySummary::from_result(&params, &result)
    }

    #[test]
    fn test_no_therapy_summary() {
        let summary = summarize(SimulationParams::default().with_therapy_start(500));

        assert_eq!(summary.steps, 200);
        assert_eq!(summary.therapy_onset, None);
        assert_eq!(summary.reservoir_reduction, 0.0);
        assert!(!summary.viral_suppressed);
        assert_eq!(summary.peak_viral_step, Some(199));
        assert_eq!(summary.final_l, Some(300.0));
    }

    #[test]
    fn test_default_summary() {
        let summary = summarize(SimulationParams::default());

        assert_eq!(summary.therapy_onset, Some(30));
        // 1.4x growth after onset is not suppression
        assert!(!summary.viral_suppressed);
        // 170 steps of 5% decay
        assert_relative_eq!(
            summary.reservoir_reduction,
            1.0 - 0.95f64.powi(170),
            max_relative = 1e-9
        );
        assert_eq!(summary.min_healthy_cells, Some(0.0));
    }

    #[test]
    fn test_aggressive_therapy_suppresses() {
        let summary = summarize(SimulationParams::default().with_release_rate(0.6));

        assert!(summary.viral_suppressed);
        assert_eq!(summary.peak_viral_step, Some(29));
    }

    #[test]
    fn test_early_therapy_onset_is_first_update() {
        let summary = summarize(SimulationParams::default().with_therapy_start(-3));

        assert_eq!(summary.therapy_onset, Some(1));
    }

    #[test]
    fn test_empty_result_summary() {
        let summary = summarize(SimulationParams::default().with_t_max(0));

        assert_eq!(summary.steps, 0);
        assert_eq!(summary.therapy_onset, None);
        assert_eq!(summary.peak_viral_load, None);
        assert_eq!(summary.final_t, None);
        assert_eq!(summary.reservoir_reduction, 0.0);
    }

    #[test]
    fn test_single_step_summary() {
        let summary = summarize(SimulationParams::default().with_t_max(1).with_therapy_start(0));

        assert_eq!(summary.steps, 1);
        assert_eq!(summary.therapy_onset, None);
        assert_eq!(summary.peak_viral_load, Some(50.0));
        assert_eq!(summary.min_healthy_step, Some(0));
    }
}
