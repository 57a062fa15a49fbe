//! Optimizer correctness against brute force on synthetic tracks.

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use xcscore::constants::{DEFAULT_CIRCUIT_CLOSE_KM, DEFAULT_DOWNSAMPLE_KM};
use xcscore::models::{Coordinates, Fix, Flight, LeagueRegistry};
use xcscore::optimizer::{
    open_distance, open_distance_one_point, open_distance_two_points, optimize, Track,
};
use xcscore::{ScoreError, TypeScore};

/// Random walk with tunable leg lengths. `outlier_every` injects a long
/// glide every few fixes so `max_delta` is unrepresentative of typical
/// legs, the worst case for the pruning.
fn random_track(seed: u64, n: usize, step_km: f64, outlier_every: Option<usize>) -> Track {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut position = Coordinates::new(45.5, 6.3, 1500.0).unwrap();
    let mut fixes = vec![Fix::new(position, 0)];
    for i in 1..n {
        let bearing: f64 = rng.random_range(0.0..360.0);
        let mut step: f64 = rng.random_range(0.05..step_km);
        if let Some(every) = outlier_every {
            if i % every == 0 {
                step *= 15.0;
            }
        }
        position = position.destination(bearing, step);
        fixes.push(Fix::new(position, 10 * i as i64));
    }
    Track::new(fixes).unwrap()
}

/// Closed triangle course: three ~20 km legs flown corner to corner,
/// ending back at the launch. Longitude offsets are stretched for the
/// cos(45°) shrink so the legs stay near-equilateral.
fn triangle_course() -> Track {
    let corners = [(0.0, 0.0), (0.25, 0.0), (0.125, 0.155), (0.0, 0.0)];
    let origin = Coordinates::new(45.0, 6.0, 1000.0).unwrap();
    let mut fixes = Vec::new();
    let mut time = 0i64;
    for pair in corners.windows(2) {
        let steps = 40;
        for k in 0..steps {
            let t = k as f64 / steps as f64;
            let lat = origin.lat + pair[0].1 + t * (pair[1].1 - pair[0].1);
            let lng = origin.lng + pair[0].0 + t * (pair[1].0 - pair[0].0);
            fixes.push(Fix::new(Coordinates::new(lat, lng, 1000.0).unwrap(), time));
            time += 30;
        }
    }
    let last = *corners.last().unwrap();
    fixes.push(Fix::new(
        Coordinates::new(origin.lat + last.1, origin.lng + last.0, 1000.0).unwrap(),
        time,
    ));
    Track::new(fixes).unwrap()
}

fn brute_open(track: &Track) -> f64 {
    let mut best = 0.0f64;
    for i in 0..track.len() {
        for j in i + 1..track.len() {
            best = best.max(track.delta(i, j));
        }
    }
    best
}

fn outcome<'a>(scores: &'a [TypeScore], name: &str) -> &'a xcscore::Result<Option<Flight>> {
    &scores
        .iter()
        .find(|s| s.flight_type == name)
        .expect("flight type present")
        .outcome
}

#[test]
fn open_distance_equals_brute_force_on_random_tracks() {
    let cases = [
        (1u64, 120, 1.0, None),
        (2, 300, 0.4, None),
        (3, 200, 0.8, Some(37)),
        (4, 80, 1.5, Some(11)),
        (5, 500, 0.3, None),
        (6, 250, 2.0, Some(5)),
    ];
    for (seed, n, step, outliers) in cases {
        let track = random_track(seed, n, step, outliers);
        let (pruned, indices) = open_distance(&track, 0.0);
        let brute = brute_open(&track);
        assert!(
            (pruned - brute).abs() < 1e-9,
            "seed {}: pruned {} != brute {}",
            seed,
            pruned,
            brute
        );
        let [start, finish] = indices.expect("maximum exists");
        assert!((track.delta(start, finish) - brute).abs() < 1e-9);
    }
}

#[test]
fn one_point_route_equals_brute_force() {
    let track = random_track(7, 60, 1.0, Some(13));
    let (pruned, _) = open_distance_one_point(&track, 0.0);

    let n = track.len();
    let mut brute = 0.0f64;
    for s in 0..n {
        for tp in s + 1..n {
            for f in tp + 1..n {
                brute = brute.max(track.delta(s, tp) + track.delta(tp, f));
            }
        }
    }
    assert!((pruned - brute).abs() < 1e-9);
}

#[test]
fn two_point_route_equals_brute_force() {
    let track = random_track(8, 26, 1.2, None);
    let (pruned, _) = open_distance_two_points(&track, 0.0);

    let n = track.len();
    let mut brute = 0.0f64;
    for s in 0..n {
        for tp1 in s + 1..n {
            for tp2 in tp1 + 1..n {
                for f in tp2 + 1..n {
                    brute = brute.max(
                        track.delta(s, tp1) + track.delta(tp1, tp2) + track.delta(tp2, f),
                    );
                }
            }
        }
    }
    assert!((pruned - brute).abs() < 1e-9);
}

#[test]
fn generated_tracks_satisfy_triangle_inequality() {
    let track = random_track(9, 150, 1.0, Some(20));
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..200 {
        let i = rng.random_range(0..track.len());
        let k = rng.random_range(0..track.len());
        let j = rng.random_range(0..track.len());
        assert!(track.delta(i, j) <= track.delta(i, k) + track.delta(k, j) + 1e-9);
    }
}

#[test]
fn optimize_is_deterministic() {
    let registry = LeagueRegistry::builtin();
    let league = registry.get("FRCFD").unwrap();
    let track = triangle_course();

    let first = optimize(league, &track, DEFAULT_CIRCUIT_CLOSE_KM, DEFAULT_DOWNSAMPLE_KM);
    let second = optimize(league, &track, DEFAULT_CIRCUIT_CLOSE_KM, DEFAULT_DOWNSAMPLE_KM);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.flight_type, b.flight_type);
        match (&a.outcome, &b.outcome) {
            (Ok(Some(fa)), Ok(Some(fb))) => {
                assert_eq!(fa.distance_km, fb.distance_km);
                assert_eq!(fa.score, fb.score);
                let ta: Vec<i64> = fa.turnpoints.iter().map(|t| t.time).collect();
                let tb: Vec<i64> = fb.turnpoints.iter().map(|t| t.time).collect();
                assert_eq!(ta, tb);
            }
            (Ok(None), Ok(None)) => {}
            (Err(_), Err(_)) => {}
            _ => panic!("{}: outcomes diverge", a.flight_type),
        }
    }
}

#[test]
fn frcfd_pipeline_scores_a_closed_triangle() {
    let registry = LeagueRegistry::builtin();
    let league = registry.get("FRCFD").unwrap();
    let track = triangle_course();

    let scores = optimize(league, &track, DEFAULT_CIRCUIT_CLOSE_KM, DEFAULT_DOWNSAMPLE_KM);

    let open0 = outcome(&scores, "Open0").as_ref().unwrap().as_ref().unwrap();
    assert!(open0.distance_km > 15.0);

    let circuit3 = outcome(&scores, "Circuit3")
        .as_ref()
        .unwrap()
        .as_ref()
        .expect("closed triangle course must score a flat triangle");
    assert!(circuit3.circuit);
    // Interior perimeter close to the 3-leg course length
    assert!(circuit3.distance_km > 40.0);
    assert!((circuit3.score - 1.2 * circuit3.distance_km).abs() < 1e-9);

    // Roughly equilateral, so the FAI variant qualifies too and cannot
    // out-measure the unconstrained triangle
    let fai = outcome(&scores, "Circuit3FAI")
        .as_ref()
        .unwrap()
        .as_ref()
        .expect("equilateral course must score an FAI triangle");
    assert!(fai.distance_km <= circuit3.distance_km + 1e-9);
    assert!((fai.score - 1.4 * fai.distance_km).abs() < 1e-9);

    // Every tuple is time-ordered
    for score in &scores {
        if let Ok(Some(flight)) = &score.outcome {
            let times: Vec<i64> = flight.turnpoints.iter().map(|t| t.time).collect();
            let mut sorted = times.clone();
            sorted.sort();
            assert_eq!(times, sorted, "{} turnpoints out of order", score.flight_type);
        }
    }
}

#[test]
fn ukxcl_out_and_return_on_out_and_back_course() {
    let registry = LeagueRegistry::builtin();
    let league = registry.get("UKXCL").unwrap();

    // 25 km out, 25 km back
    let origin = Coordinates::new(45.0, 6.0, 800.0).unwrap();
    let mut fixes = Vec::new();
    for i in 0..=50i64 {
        fixes.push(Fix::new(origin.destination(0.0, 0.5 * i as f64), 30 * i));
    }
    for i in 1..=50i64 {
        fixes.push(Fix::new(
            origin.destination(0.0, 25.0 - 0.5 * i as f64),
            1500 + 30 * i,
        ));
    }
    let track = Track::new(fixes).unwrap();

    let scores = optimize(league, &track, DEFAULT_CIRCUIT_CLOSE_KM, DEFAULT_DOWNSAMPLE_KM);
    let circuit2 = outcome(&scores, "Circuit2")
        .as_ref()
        .unwrap()
        .as_ref()
        .expect("out-and-back course must close");

    // Twice the 25 km leg, scored at UKXCL's 2.0 multiplier
    assert!((circuit2.distance_km - 50.0).abs() < 1.5);
    assert!((circuit2.score - 2.0 * circuit2.distance_km).abs() < 1e-9);

    // No triangle with legs >= 28% exists on a straight out-and-back
    assert!(matches!(outcome(&scores, "Circuit3FAI"), Ok(None)));
}

#[test]
fn straight_line_open_league_scores_zero() {
    // The concrete scenario: five fixes in a line, 1 km apart, under the
    // raw open-distance league (multiplier 0)
    let registry = LeagueRegistry::builtin();
    let league = registry.get("Open").unwrap();

    let origin = Coordinates::new(45.0, 6.0, 0.0).unwrap();
    let fixes: Vec<Fix> = (0..5)
        .map(|i| Fix::new(origin.destination(0.0, i as f64), 60 * i as i64))
        .collect();
    let track = Track::new(fixes).unwrap();

    let scores = optimize(league, &track, DEFAULT_CIRCUIT_CLOSE_KM, DEFAULT_DOWNSAMPLE_KM);
    let open0 = outcome(&scores, "Open0").as_ref().unwrap().as_ref().unwrap();
    assert!((open0.distance_km - 4.0).abs() < 1e-6);
    assert_eq!(open0.score, 0.0);
}

#[test]
fn score_is_monotone_in_distance_with_threshold() {
    let registry = LeagueRegistry::builtin();
    let league = registry.get("UKXCL").unwrap();
    let open0 = league.flight_type("Open0").unwrap();
    let origin = Coordinates::new(45.0, 6.0, 0.0).unwrap();

    let mut previous = -1.0f64;
    for distance in [1.0, 5.0, 14.9, 14.999, 15.0, 15.001, 30.0, 120.0] {
        let fixes = [
            Fix::new(origin, 0),
            Fix::new(origin.destination(0.0, distance), 3600),
        ];
        let flight = Flight::new(league, open0, &fixes).unwrap();
        if distance < 15.0 {
            assert_eq!(flight.score, 0.0);
        } else {
            assert!((flight.score - distance).abs() < 1e-6);
        }
        assert!(flight.score >= previous, "score regressed at {} km", distance);
        previous = flight.score;
    }
}

#[test]
fn short_track_fails_only_the_big_types() {
    let registry = LeagueRegistry::builtin();
    let league = registry.get("FRCFD").unwrap();

    let origin = Coordinates::new(45.0, 6.0, 0.0).unwrap();
    let fixes: Vec<Fix> = (0..4)
        .map(|i| Fix::new(origin.destination(0.0, 8.0 * i as f64), 60 * i as i64))
        .collect();
    let track = Track::new(fixes).unwrap();

    let scores = optimize(league, &track, DEFAULT_CIRCUIT_CLOSE_KM, DEFAULT_DOWNSAMPLE_KM);

    assert!(matches!(outcome(&scores, "Open0"), Ok(Some(_))));
    assert!(matches!(outcome(&scores, "Open1"), Ok(_)));
    assert!(matches!(outcome(&scores, "Open2"), Ok(_)));
    assert!(matches!(
        outcome(&scores, "Circuit3"),
        Err(ScoreError::InsufficientFixes {
            required: 5,
            actual: 4
        })
    ));
    assert!(matches!(
        outcome(&scores, "Circuit4"),
        Err(ScoreError::InsufficientFixes { .. })
    ));
}
