//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use hiv_core::SimulationLimits;

use crate::cors::CorsPolicy;
use crate::error::ServerError;

/// Default port, matching what browser clients of the simulator expect.
pub const DEFAULT_PORT: u16 = 8000;

/// Configuration for a server run.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,

    /// Bounds on request parameters
    pub limits: SimulationLimits,

    /// Cross-origin policy applied to every route
    pub cors: CorsPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            limits: SimulationLimits::default(),
            cors: CorsPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Creates a config bound to `host:port` with default limits and policy.
    pub fn bind(host: &str, port: u16) -> Result<Self, ServerError> {
        let ip: IpAddr = host
            .parse()
            .map_err(|_| ServerError::InvalidHost(host.to_string()))?;
        Ok(Self {
            addr: SocketAddr::new(ip, port),
            ..Default::default()
        })
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.limits.max_steps = max_steps;
        self
    }

    pub fn with_cors(mut self, cors: CorsPolicy) -> Self {
        self.cors = cors;
        self
    }
}
