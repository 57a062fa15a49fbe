//! Stable application-wide constants.
//!
//! Values here are structural invariants and algorithm coefficients that
//! scoring reproducibility depends on. Deployment-specific settings live
//! in [`Config`](crate::config::Config) instead.

/// Mean Earth radius (km) for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// --- Circuit closing ---

/// Maximum gap (km) between a circuit's start and finish fixes for the
/// flight to count as closed.
pub const DEFAULT_CIRCUIT_CLOSE_KM: f64 = 3.0;

/// Weight applied to the start/finish gap when refining a circuit's
/// closing pair. Dominates the in/out legs so the refinement prefers the
/// tightest closure that still qualifies.
pub const CIRCUIT_GAP_WEIGHT: f64 = 256.0;

// --- Triangle / quadrilateral seeding ---

/// Minimum spacing (km) between fixes on the downsampled track used to
/// seed triangle and quadrilateral bounds before the full-track pass.
pub const DEFAULT_DOWNSAMPLE_KM: f64 = 0.5;

// --- CLI defaults (used when env vars are absent) ---

/// Default directory for persisted score cache records. Overridden by
/// `XCSCORE_CACHE_DIR`.
pub const DEFAULT_CACHE_DIR: &str = "tmp/xc";

/// Default league scored by the CLI. Overridden by `XCSCORE_LEAGUE`.
pub const DEFAULT_LEAGUE: &str = "FRCFD";
