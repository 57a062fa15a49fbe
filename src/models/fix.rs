use super::Coordinates;
use serde::{Deserialize, Serialize};

/// One timestamped GPS sample from a track log.
///
/// Times are UTC epoch seconds. Keeping the raw integer (rather than a
/// date-time type) lets cache records round-trip to the identical fix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Fix {
    pub coordinates: Coordinates,
    pub time: i64,
}

impl Fix {
    pub fn new(coordinates: Coordinates, time: i64) -> Self {
        Fix { coordinates, time }
    }
}
