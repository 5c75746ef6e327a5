//! Configuration management for Turnstile.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Main configuration for the Turnstile gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnstileConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Admission control configuration
    #[serde(default)]
    pub admission: AdmissionConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// gRPC server address
    #[serde(default = "default_grpc_addr")]
    pub grpc_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            grpc_addr: default_grpc_addr(),
        }
    }
}

fn default_grpc_addr() -> SocketAddr {
    "127.0.0.1:8081".parse().unwrap()
}

/// Admission control configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Ordered list of rate limit tiers, evaluated in the order given
    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierConfig>,

    /// Operation names exempt from all tiers
    #[serde(default = "default_bypass")]
    pub bypass: Vec<String>,

    /// Interval between stale counter sweeps, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            bypass: default_bypass(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// Configuration for a single rate limit tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Unique tier name
    pub name: String,
    /// Window length in milliseconds
    pub window_ms: u64,
    /// Calls admitted per window
    pub limit: u64,
}

fn default_tiers() -> Vec<TierConfig> {
    vec![TierConfig {
        name: "default".to_string(),
        window_ms: 60_000,
        limit: 100,
    }]
}

fn default_bypass() -> Vec<String> {
    vec!["publicUserStats".to_string()]
}

fn default_sweep_interval() -> u64 {
    60
}

impl TurnstileConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: TurnstileConfig = serde_yaml::from_str(&contents)
            .map_err(|e| crate::error::TurnstileError::Config(e.to_string()))?;
        Ok(config)
    }
}
