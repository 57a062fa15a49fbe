//! Turnpoint optimization: finds, for every flight type a league
//! declares, the turnpoint tuple maximizing that type's distance.
//!
//! Searches are chained through shared lower bounds wherever one type's
//! optimum bounds another's (a route via N+1 turnpoints is never shorter
//! than via N; every FAI triangle is a flat triangle), so later searches
//! mostly verify rather than explore. Triangle and quadrilateral
//! searches are seeded from a downsampled copy of the track first, then
//! confirmed against the full track.

mod circuit;
mod open;
mod track;

pub use circuit::{close_circuit, out_and_return, quadrilateral, triangle, triangle_fai};
pub use open::{
    open_distance, open_distance_one_point, open_distance_three_points, open_distance_two_points,
};
pub use track::{CircuitTables, Track};

use crate::cache::{CacheRecord, ScoreCache};
use crate::constants::{DEFAULT_CIRCUIT_CLOSE_KM, DEFAULT_DOWNSAMPLE_KM};
use crate::error::{Result, ScoreError};
use crate::models::{Fix, Flight, FlightType, League, LeagueRegistry};
use std::collections::HashMap;
use std::sync::Arc;

/// Scoring outcome for one flight type on one track.
///
/// `Ok(None)` means the search completed but nothing qualified (for
/// example no circuit closes, or a longer type cannot beat a shorter
/// one); an error affects this type only.
pub struct TypeScore {
    pub flight_type: &'static str,
    pub outcome: Result<Option<Flight>>,
}

fn insufficient(flight_type: &FlightType, track: &Track) -> ScoreError {
    ScoreError::InsufficientFixes {
        required: flight_type.required_fixes(),
        actual: track.len(),
    }
}

fn flight_from_indices(
    league: &League,
    flight_type: &FlightType,
    track: &Track,
    indexes: &[usize],
) -> Result<Flight> {
    let fixes: Vec<Fix> = indexes.iter().map(|&i| track.fixes()[i]).collect();
    Flight::new(league, flight_type, &fixes)
}

/// Map indices found on a downsampled track back onto the full track
/// through their timestamps (downsampled fixes are a subset, so every
/// timestamp resolves).
fn map_indices(from: &Track, to: &Track, indexes: &[usize]) -> Option<Vec<usize>> {
    indexes
        .iter()
        .map(|&i| to.first_fix_at_or_after(from.fixes()[i].time))
        .collect()
}

/// Run every flight type of `league` over `track`. Results come back in
/// the league's declaration order, one per flight type.
pub fn optimize(
    league: &League,
    track: &Track,
    close_km: f64,
    downsample_km: f64,
) -> Vec<TypeScore> {
    let mut winners: HashMap<&'static str, Result<Option<Vec<usize>>>> = HashMap::new();

    // Open types share one running bound, in increasing turnpoint count.
    // The plain pair search runs unseeded so even unqualifying flights
    // are reported (they score zero); everything after starts at the
    // league minimum.
    let mut open_types: Vec<&FlightType> =
        league.flight_types.iter().filter(|t| !t.circuit).collect();
    open_types.sort_by_key(|t| t.turnpoints);

    let mut bound = 0.0;
    for ft in open_types {
        if track.len() < ft.required_fixes() {
            winners.insert(ft.name, Err(insufficient(ft, track)));
            continue;
        }
        if ft.turnpoints > 0 && bound < league.minimum_distance_km {
            bound = league.minimum_distance_km;
        }
        let found: Option<Vec<usize>> = match ft.turnpoints {
            0 => {
                let (b, r) = open_distance(track, bound);
                bound = b;
                r.map(|ix| ix.to_vec())
            }
            1 => {
                let (b, r) = open_distance_one_point(track, bound);
                bound = b;
                r.map(|ix| ix.to_vec())
            }
            2 => {
                let (b, r) = open_distance_two_points(track, bound);
                bound = b;
                r.map(|ix| ix.to_vec())
            }
            3 => {
                let (b, r) = open_distance_three_points(track, bound);
                bound = b;
                r.map(|ix| ix.to_vec())
            }
            other => {
                tracing::warn!(
                    flight_type = ft.name,
                    turnpoints = other,
                    "open distance via more than three turnpoints is not supported"
                );
                None
            }
        };
        winners.insert(ft.name, Ok(found));
    }

    let mut circuit_types: Vec<&FlightType> = Vec::new();
    for ft in league.flight_types.iter().filter(|t| t.circuit) {
        if track.len() < ft.required_fixes() {
            winners.insert(ft.name, Err(insufficient(ft, track)));
        } else {
            circuit_types.push(ft);
        }
    }

    if !circuit_types.is_empty() {
        let tables = track.circuit_tables(close_km);
        let coarse = if circuit_types.iter().any(|t| t.turnpoints >= 3) {
            let coarse_track = track.downsample(downsample_km);
            let coarse_tables = coarse_track.circuit_tables(close_km);
            Some((coarse_track, coarse_tables))
        } else {
            None
        };

        for ft in circuit_types.iter().filter(|t| t.turnpoints == 2) {
            let (_, found) = out_and_return(track, &tables, league.minimum_distance_km);
            let found = found.map(|mut ix| {
                close_circuit(track, &mut ix, close_km);
                ix.to_vec()
            });
            winners.insert(ft.name, Ok(found));
        }

        // Triangles: the constrained (FAI) search runs first and its
        // bound seeds the flat search, which falls back to the coarse or
        // FAI tuple when the seeded full pass cannot improve on it.
        let mut tri_bound = league.minimum_distance_km;
        let mut fai_fallback: Option<Vec<usize>> = None;
        for ft in circuit_types
            .iter()
            .filter(|t| t.turnpoints == 3 && t.min_leg_fraction.is_some())
        {
            let fraction = ft.min_leg_fraction.unwrap_or(0.0);
            let mut coarse_found = None;
            if let Some((coarse_track, coarse_tables)) = &coarse {
                let (b, r) = triangle_fai(coarse_track, coarse_tables, fraction, tri_bound);
                tri_bound = b;
                coarse_found = r.and_then(|mut ix| {
                    close_circuit(coarse_track, &mut ix, close_km);
                    map_indices(coarse_track, track, &ix)
                });
            }
            let (b, full) = triangle_fai(track, &tables, fraction, tri_bound);
            tri_bound = b;
            let found = match full {
                Some(mut ix) => {
                    close_circuit(track, &mut ix, close_km);
                    Some(ix.to_vec())
                }
                None => coarse_found,
            };
            fai_fallback = found.clone();
            winners.insert(ft.name, Ok(found));
        }
        for ft in circuit_types
            .iter()
            .filter(|t| t.turnpoints == 3 && t.min_leg_fraction.is_none())
        {
            let mut coarse_found = None;
            if let Some((coarse_track, coarse_tables)) = &coarse {
                let (b, r) = triangle(coarse_track, coarse_tables, tri_bound);
                tri_bound = b;
                coarse_found = r.and_then(|mut ix| {
                    close_circuit(coarse_track, &mut ix, close_km);
                    map_indices(coarse_track, track, &ix)
                });
            }
            let (b, full) = triangle(track, &tables, tri_bound);
            tri_bound = b;
            let found = match full {
                Some(mut ix) => {
                    close_circuit(track, &mut ix, close_km);
                    Some(ix.to_vec())
                }
                None => coarse_found.or_else(|| fai_fallback.clone()),
            };
            winners.insert(ft.name, Ok(found));
        }

        // Quadrilaterals only run on the coarse track; the full-track
        // pass costs more than the tighter tuple is worth.
        for ft in circuit_types.iter().filter(|t| t.turnpoints == 4) {
            let found = match (ft.min_leg_fraction, &coarse) {
                (Some(fraction), Some((coarse_track, coarse_tables))) => {
                    let (_, r) = quadrilateral(
                        coarse_track,
                        coarse_tables,
                        fraction,
                        league.minimum_distance_km,
                    );
                    r.and_then(|mut ix| {
                        close_circuit(coarse_track, &mut ix, close_km);
                        map_indices(coarse_track, track, &ix)
                    })
                }
                _ => {
                    tracing::warn!(
                        flight_type = ft.name,
                        "quadrilateral types need a minimum leg fraction"
                    );
                    None
                }
            };
            winners.insert(ft.name, Ok(found));
        }

        for ft in circuit_types
            .iter()
            .filter(|t| !(2..=4).contains(&t.turnpoints))
        {
            tracing::warn!(
                flight_type = ft.name,
                turnpoints = ft.turnpoints,
                "unsupported circuit turnpoint count"
            );
            winners.insert(ft.name, Ok(None));
        }
    }

    let mut results = Vec::with_capacity(league.flight_types.len());
    for ft in &league.flight_types {
        let outcome: Result<Option<Flight>> = match winners.remove(ft.name) {
            Some(Err(e)) => Err(e),
            Some(Ok(Some(indexes))) => flight_from_indices(league, ft, track, &indexes).map(Some),
            Some(Ok(None)) | None => Ok(None),
        };
        if let Ok(Some(flight)) = &outcome {
            tracing::debug!(
                league = league.name,
                flight_type = ft.name,
                distance_km = flight.distance_km,
                score = flight.score,
                "flight scored"
            );
        }
        results.push(TypeScore {
            flight_type: ft.name,
            outcome,
        });
    }
    results
}

/// League-aware scoring front door: resolves the league, replays a
/// cached record when one matches the track, otherwise optimizes and
/// stores the winning turnpoint timestamps.
pub struct Scorer {
    registry: LeagueRegistry,
    cache: Option<Arc<dyn ScoreCache>>,
    circuit_close_km: f64,
    downsample_km: f64,
}

impl Scorer {
    pub fn new(registry: LeagueRegistry) -> Self {
        Scorer {
            registry,
            cache: None,
            circuit_close_km: DEFAULT_CIRCUIT_CLOSE_KM,
            downsample_km: DEFAULT_DOWNSAMPLE_KM,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ScoreCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override the circuit closing tolerance and downsample spacing
    /// (defaults come from [`crate::constants`]).
    pub fn with_tuning(mut self, circuit_close_km: f64, downsample_km: f64) -> Self {
        self.circuit_close_km = circuit_close_km;
        self.downsample_km = downsample_km;
        self
    }

    pub fn registry(&self) -> &LeagueRegistry {
        &self.registry
    }

    /// Score `track` under the named league. `track_id` keys the cache;
    /// pass `None` to force a fresh optimization without persisting.
    pub fn score(
        &self,
        league_name: &str,
        track: &Track,
        track_id: Option<&str>,
    ) -> Result<Vec<TypeScore>> {
        let league = self
            .registry
            .get(league_name)
            .ok_or_else(|| ScoreError::UnknownLeague(league_name.to_string()))?;

        if let (Some(cache), Some(id)) = (self.cache.as_deref(), track_id) {
            if let Some(record) = cache.load(league.name, id) {
                match replay(league, track, &record) {
                    Ok(scores) => {
                        tracing::debug!(league = league.name, track = id, "scored from cache");
                        return Ok(scores);
                    }
                    Err(e) => {
                        tracing::warn!(
                            league = league.name,
                            track = id,
                            error = %e,
                            "cache record does not match track, re-optimizing"
                        );
                    }
                }
            }
        }

        let scores = optimize(league, track, self.circuit_close_km, self.downsample_km);

        if let (Some(cache), Some(id)) = (self.cache.as_deref(), track_id) {
            let mut record = CacheRecord::new();
            for score in &scores {
                if let Ok(Some(flight)) = &score.outcome {
                    record.insert(
                        score.flight_type,
                        flight.turnpoints.iter().map(|tp| tp.time).collect(),
                    );
                }
            }
            cache.store(league.name, id, &record);
        }

        Ok(scores)
    }
}

/// Rebuild flights from a stored record by resolving each timestamp to
/// the first fix at or after it. Any anomaly invalidates the whole
/// record so the caller falls back to a fresh optimization.
fn replay(league: &League, track: &Track, record: &CacheRecord) -> Result<Vec<TypeScore>> {
    for (name, _) in record.iter() {
        if league.flight_type(name).is_none() {
            return Err(ScoreError::CacheRecordInvalid(format!(
                "unknown flight type {}",
                name
            )));
        }
    }

    let mut results = Vec::with_capacity(league.flight_types.len());
    for ft in &league.flight_types {
        if track.len() < ft.required_fixes() {
            results.push(TypeScore {
                flight_type: ft.name,
                outcome: Err(ScoreError::InsufficientFixes {
                    required: ft.required_fixes(),
                    actual: track.len(),
                }),
            });
            continue;
        }
        let outcome = match record.get(ft.name) {
            None => Ok(None),
            Some(times) => {
                if times.len() != ft.required_fixes() {
                    return Err(ScoreError::CacheRecordInvalid(format!(
                        "{} stores {} turnpoints but the flight type needs {}",
                        ft.name,
                        times.len(),
                        ft.required_fixes()
                    )));
                }
                let fixes: Vec<Fix> = times
                    .iter()
                    .map(|&t| {
                        track
                            .first_fix_at_or_after(t)
                            .map(|i| track.fixes()[i])
                            .ok_or_else(|| {
                                ScoreError::CacheRecordInvalid(format!(
                                    "timestamp {} has no matching fix",
                                    t
                                ))
                            })
                    })
                    .collect::<Result<_>>()?;
                Flight::new(league, ft, &fixes).map(Some)
            }
        };
        results.push(TypeScore {
            flight_type: ft.name,
            outcome,
        });
    }
    Ok(results)
}
