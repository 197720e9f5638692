//! HIV Dynamics Core - discrete-time infection model under therapy
//!
//! This library advances three coupled populations through a fixed
//! update rule:
//! 1. **Healthy T cells**: constant regeneration, depletion by virus
//! 2. **Viral load**: exponential growth, suppressed once therapy starts
//! 3. **Latent reservoir**: decays only while therapy is active
//!
//! Every run is a pure function of [`SimulationParams`]; there is no
//! shared state between calls.
//!
//! ```
//! use hiv_core::{simulate, SimulationParams};
//!
//! let params = SimulationParams::default().with_t_max(50);
//! let result = simulate(&params);
//! assert_eq!(result.len(), 50);
//! ```

pub mod dynamics;
pub mod error;
pub mod exporter;
pub mod scenarios;
pub mod summary;

// Re-export key types for convenience
pub use dynamics::{
    simulate, simulate_checked, CellState, SimulationLimits, SimulationParams, SimulationResult,
};
pub use error::SimError;
pub use exporter::SimExport;
pub use scenarios::ScenarioId;
pub use summary::TrajectorySummary;
