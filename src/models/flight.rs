use super::{Coordinates, Fix, FlightType, League};
use crate::error::{Result, ScoreError};
use serde::Serialize;

/// A fix promoted to a scoring waypoint, with its league display name.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Turnpoint {
    pub coordinates: Coordinates,
    pub time: i64,
    pub name: String,
}

/// A scored flight: one flight type's winning turnpoint tuple with its
/// derived distance and score.
///
/// Constructed only from an optimizer result (or a cache record resolved
/// against the same track) and immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Flight {
    pub league: &'static str,
    pub flight_type: &'static str,
    pub description: &'static str,
    pub circuit: bool,
    pub multiplier: f64,
    pub distance_km: f64,
    pub score: f64,
    pub turnpoints: Vec<Turnpoint>,
}

impl Flight {
    /// Build a flight from the `turnpoints + 2` fixes selected for
    /// `flight_type` (start, interior turnpoints, finish, in track order).
    pub fn new(league: &League, flight_type: &FlightType, fixes: &[Fix]) -> Result<Flight> {
        let expected = flight_type.required_fixes();
        if fixes.len() != expected {
            return Err(ScoreError::InvalidTurnpointCount {
                expected,
                actual: fixes.len(),
            });
        }

        let turnpoints: Vec<Turnpoint> = fixes
            .iter()
            .enumerate()
            .map(|(i, fix)| Turnpoint {
                coordinates: fix.coordinates,
                time: fix.time,
                name: league.turnpoint_name(i, fixes.len()),
            })
            .collect();

        let distance_km = if flight_type.circuit {
            // A circuit is scored over its interior turnpoints, with a
            // synthetic closing leg from the last interior turnpoint back
            // to the first; the start and finish fixes only witness that
            // the track closes.
            let interior = &turnpoints[1..turnpoints.len() - 1];
            match interior.last() {
                Some(last) => {
                    let legs: f64 = interior
                        .windows(2)
                        .map(|w| w[0].coordinates.distance_to(&w[1].coordinates))
                        .sum();
                    legs + last.coordinates.distance_to(&interior[0].coordinates)
                }
                None => 0.0,
            }
        } else {
            turnpoints
                .windows(2)
                .map(|w| w[0].coordinates.distance_to(&w[1].coordinates))
                .sum()
        };

        let multiplier = if distance_km < league.minimum_distance_km {
            0.0
        } else {
            flight_type.multiplier
        };

        Ok(Flight {
            league: league.name,
            flight_type: flight_type.name,
            description: flight_type.description,
            circuit: flight_type.circuit,
            multiplier: flight_type.multiplier,
            distance_km,
            score: multiplier * distance_km,
            turnpoints,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LeagueRegistry;

    fn fix(coordinates: Coordinates, time: i64) -> Fix {
        Fix::new(coordinates, time)
    }

    #[test]
    fn test_out_and_return_square() {
        // Two turnpoints 10 km apart under an out-and-return type with
        // multiplier 2.0: the closing leg doubles the distance.
        let registry = LeagueRegistry::builtin();
        let league = registry.get("UKXCL").unwrap();
        let circuit2 = league.flight_type("Circuit2").unwrap();

        let p0 = Coordinates::new(45.0, 6.0, 1000.0).unwrap();
        let p1 = p0.destination(0.0, 10.0);
        let p2 = p1.destination(90.0, 10.0);
        let p3 = p0.destination(90.0, 10.0);

        let fixes = vec![fix(p0, 0), fix(p1, 60), fix(p2, 120), fix(p3, 180)];
        let flight = Flight::new(league, circuit2, &fixes).unwrap();

        assert!((flight.distance_km - 20.0).abs() < 1e-6);
        assert!((flight.score - 40.0).abs() < 1e-6);
        assert!(flight.circuit);
        assert_eq!(flight.turnpoints[0].name, "Start");
        assert_eq!(flight.turnpoints[1].name, "TP1");
        assert_eq!(flight.turnpoints[3].name, "Finish");
    }

    #[test]
    fn test_open_distance_sums_all_legs() {
        let registry = LeagueRegistry::builtin();
        let league = registry.get("UKXCL").unwrap();
        let open1 = league.flight_type("Open1").unwrap();

        let p0 = Coordinates::new(45.0, 6.0, 0.0).unwrap();
        let p1 = p0.destination(0.0, 12.0);
        let p2 = p1.destination(0.0, 8.0);

        let fixes = vec![fix(p0, 0), fix(p1, 60), fix(p2, 120)];
        let flight = Flight::new(league, open1, &fixes).unwrap();

        assert!((flight.distance_km - 20.0).abs() < 1e-6);
        assert!((flight.score - 20.0).abs() < 1e-6);
        assert!(!flight.circuit);
    }

    #[test]
    fn test_score_zeroed_below_minimum_distance() {
        let registry = LeagueRegistry::builtin();
        let league = registry.get("UKXCL").unwrap();
        let open0 = league.flight_type("Open0").unwrap();

        let p0 = Coordinates::new(45.0, 6.0, 0.0).unwrap();
        let p1 = p0.destination(0.0, 14.9);
        let short = Flight::new(league, open0, &[fix(p0, 0), fix(p1, 60)]).unwrap();
        assert!(short.distance_km > 14.0);
        assert_eq!(short.score, 0.0);

        // Continuous at the threshold: 15 km scores 15 points
        let p2 = p0.destination(0.0, 15.0);
        let at_min = Flight::new(league, open0, &[fix(p0, 0), fix(p2, 60)]).unwrap();
        assert!((at_min.score - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_multiplier_open_distance() {
        // Straight line of 5 fixes 1 km apart scored under the raw Open
        // league: distance accrues, score stays 0.
        let registry = LeagueRegistry::builtin();
        let league = registry.get("Open").unwrap();
        let open0 = league.flight_type("Open0").unwrap();

        let p0 = Coordinates::new(45.0, 6.0, 0.0).unwrap();
        let p4 = p0.destination(0.0, 4.0);
        let flight = Flight::new(league, open0, &[fix(p0, 0), fix(p4, 240)]).unwrap();

        assert!((flight.distance_km - 4.0).abs() < 1e-6);
        assert_eq!(flight.score, 0.0);
    }

    #[test]
    fn test_invalid_turnpoint_count() {
        let registry = LeagueRegistry::builtin();
        let league = registry.get("UKXCL").unwrap();
        let circuit2 = league.flight_type("Circuit2").unwrap();

        let p0 = Coordinates::new(45.0, 6.0, 0.0).unwrap();
        let fixes = vec![fix(p0, 0), fix(p0.destination(0.0, 1.0), 60)];

        match Flight::new(league, circuit2, &fixes) {
            Err(ScoreError::InvalidTurnpointCount { expected, actual }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 2);
            }
            other => panic!("expected InvalidTurnpointCount, got {:?}", other.map(|f| f.score)),
        }
    }
}
