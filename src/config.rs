use crate::constants::*;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for persisted score cache records.
    pub cache_dir: PathBuf,
    /// League scored when the caller does not name one.
    pub league: String,
    pub optimizer: OptimizerConfig,
}

/// Optimizer tuning knobs. These are frozen per deployment: changing
/// them can select different (still valid) turnpoints on ambiguous
/// tracks, so results stop being comparable with previous runs.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Maximum start/finish gap (km) for a circuit to count as closed.
    pub circuit_close_km: f64,

    /// Fix spacing (km) of the downsampled track that seeds triangle and
    /// quadrilateral searches.
    pub downsample_km: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            circuit_close_km: DEFAULT_CIRCUIT_CLOSE_KM,
            downsample_km: DEFAULT_DOWNSAMPLE_KM,
        }
    }
}

impl OptimizerConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let circuit_close_km: f64 = env::var("XCSCORE_CIRCUIT_CLOSE_KM")
            .unwrap_or_else(|_| defaults.circuit_close_km.to_string())
            .parse()
            .map_err(|_| "Invalid XCSCORE_CIRCUIT_CLOSE_KM")?;
        if circuit_close_km <= 0.0 {
            return Err("XCSCORE_CIRCUIT_CLOSE_KM must be positive".to_string());
        }

        let downsample_km: f64 = env::var("XCSCORE_DOWNSAMPLE_KM")
            .unwrap_or_else(|_| defaults.downsample_km.to_string())
            .parse()
            .map_err(|_| "Invalid XCSCORE_DOWNSAMPLE_KM")?;
        if downsample_km <= 0.0 {
            return Err("XCSCORE_DOWNSAMPLE_KM must be positive".to_string());
        }

        Ok(Self {
            circuit_close_km,
            downsample_km,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        Ok(Config {
            cache_dir: env::var("XCSCORE_CACHE_DIR")
                .unwrap_or_else(|_| DEFAULT_CACHE_DIR.to_string())
                .into(),
            league: env::var("XCSCORE_LEAGUE").unwrap_or_else(|_| DEFAULT_LEAGUE.to_string()),
            optimizer: OptimizerConfig::from_env()?,
        })
    }
}
