//! Open-distance searches: the longest route through zero to three
//! interior turnpoints.
//!
//! Every search takes and returns a running lower bound in km. Only a
//! route strictly longer than the incoming bound is reported, so chained
//! searches (each flight type seeded with the previous one's result)
//! skip work that cannot improve the score. The returned index tuples
//! are `[start, turnpoints.., finish]` in track order.

use super::track::Track;

/// Globally furthest pair of fixes.
pub fn open_distance(track: &Track, mut bound: f64) -> (f64, Option<[usize; 2]>) {
    let mut result = None;
    for start in 0..track.len().saturating_sub(1) {
        if let Some(finish) = track.furthest_from(start, start + 1, track.len(), &mut bound) {
            result = Some([start, finish]);
        }
    }
    (bound, result)
}

/// Longest route via one turnpoint. The best leg into and out of each
/// candidate comes straight from the track's limit tables; moving the
/// turnpoint one fix changes the total by at most two legs, hence the
/// halved skip.
pub fn open_distance_one_point(track: &Track, mut bound: f64) -> (f64, Option<[usize; 3]>) {
    let mut result = None;
    let n = track.len();
    let mut tp1 = 1;
    while tp1 + 1 < n {
        let total = track.before(tp1).distance + track.after(tp1).distance;
        if total > bound {
            result = Some([track.before(tp1).index, tp1, track.after(tp1).index]);
            bound = total;
            tp1 += 1;
        } else {
            tp1 = track.fast_forward(tp1, 0.5 * (bound - total));
        }
    }
    (bound, result)
}

/// Longest route via two turnpoints.
pub fn open_distance_two_points(track: &Track, mut bound: f64) -> (f64, Option<[usize; 4]>) {
    let mut result = None;
    let n = track.len();
    for tp1 in 1..n.saturating_sub(2) {
        let leg1 = track.before(tp1).distance;
        let mut bound23 = bound - leg1;
        let mut tp2 = tp1 + 1;
        while tp2 + 1 < n {
            let legs23 = track.delta(tp1, tp2) + track.after(tp2).distance;
            if legs23 > bound23 {
                result = Some([
                    track.before(tp1).index,
                    tp1,
                    tp2,
                    track.after(tp2).index,
                ]);
                bound23 = legs23;
                tp2 += 1;
            } else {
                tp2 = track.fast_forward(tp2, 0.5 * (bound23 - legs23));
            }
        }
        bound = leg1 + bound23;
    }
    (bound, result)
}

/// Longest route via three turnpoints.
pub fn open_distance_three_points(track: &Track, mut bound: f64) -> (f64, Option<[usize; 5]>) {
    let mut result = None;
    let n = track.len();
    for tp1 in 1..n.saturating_sub(3) {
        let leg1 = track.before(tp1).distance;
        let mut bound234 = bound - leg1;
        for tp2 in tp1 + 1..n.saturating_sub(2) {
            let leg2 = track.delta(tp1, tp2);
            let mut bound34 = bound234 - leg2;
            let mut tp3 = tp2 + 1;
            while tp3 + 1 < n {
                let legs34 = track.delta(tp2, tp3) + track.after(tp3).distance;
                if legs34 > bound34 {
                    result = Some([
                        track.before(tp1).index,
                        tp1,
                        tp2,
                        tp3,
                        track.after(tp3).index,
                    ]);
                    bound34 = legs34;
                    tp3 += 1;
                } else {
                    tp3 = track.fast_forward(tp3, 0.5 * (bound34 - legs34));
                }
            }
            bound234 = leg2 + bound34;
        }
        bound = leg1 + bound234;
    }
    (bound, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, Fix};

    /// Deterministic wandering track: heading changes derived from the
    /// index so the route doubles back on itself.
    fn wandering_track(n: usize) -> Track {
        let mut position = Coordinates::new(45.3, 6.1, 800.0).unwrap();
        let mut fixes = vec![Fix::new(position, 0)];
        for i in 1..n {
            let bearing = (i as f64 * 73.0) % 360.0;
            let step = 0.3 + ((i * 7) % 5) as f64 * 0.25;
            position = position.destination(bearing, step);
            fixes.push(Fix::new(position, 30 * i as i64));
        }
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

    fn brute_one_point(track: &Track) -> f64 {
        let n = track.len();
        let mut best = 0.0f64;
        for s in 0..n {
            for tp in s + 1..n {
                for f in tp + 1..n {
                    best = best.max(track.delta(s, tp) + track.delta(tp, f));
                }
            }
        }
        best
    }

    fn brute_two_points(track: &Track) -> f64 {
        let n = track.len();
        let mut best = 0.0f64;
        for s in 0..n {
            for tp1 in s + 1..n {
                for tp2 in tp1 + 1..n {
                    for f in tp2 + 1..n {
                        best = best.max(
                            track.delta(s, tp1) + track.delta(tp1, tp2) + track.delta(tp2, f),
                        );
                    }
                }
            }
        }
        best
    }

    #[test]
    fn test_open_distance_equals_brute_force() {
        for n in [5, 12, 40, 90] {
            let track = wandering_track(n);
            let (pruned, indices) = open_distance(&track, 0.0);
            let brute = brute_open(&track);
            assert!(
                (pruned - brute).abs() < 1e-9,
                "n={}: pruned {} != brute {}",
                n,
                pruned,
                brute
            );
            let [s, f] = indices.unwrap();
            assert!((track.delta(s, f) - pruned).abs() < 1e-9);
        }
    }

    #[test]
    fn test_one_point_equals_brute_force() {
        let track = wandering_track(30);
        let (pruned, indices) = open_distance_one_point(&track, 0.0);
        assert!((pruned - brute_one_point(&track)).abs() < 1e-9);

        let [s, tp, f] = indices.unwrap();
        assert!(s < tp && tp < f);
        assert!((track.delta(s, tp) + track.delta(tp, f) - pruned).abs() < 1e-9);
    }

    #[test]
    fn test_two_points_equals_brute_force() {
        let track = wandering_track(18);
        let (pruned, indices) = open_distance_two_points(&track, 0.0);
        assert!((pruned - brute_two_points(&track)).abs() < 1e-9);

        let [s, tp1, tp2, f] = indices.unwrap();
        assert!(s < tp1 && tp1 < tp2 && tp2 < f);
    }

    #[test]
    fn test_searches_report_nothing_below_bound() {
        let track = wandering_track(20);
        let (open, _) = open_distance(&track, 0.0);

        // Seeding with the known optimum hides it: nothing is strictly better
        let (bound, indices) = open_distance(&track, open);
        assert_eq!(indices, None);
        assert_eq!(bound, open);
    }

    #[test]
    fn test_bound_chains_across_searches() {
        let track = wandering_track(25);
        let (b0, _) = open_distance(&track, 0.0);
        let (b1, via_one) = open_distance_one_point(&track, b0);

        // A route via a turnpoint is at least as long as the open pair
        assert!(b1 >= b0);
        if let Some([s, tp, f]) = via_one {
            assert!((track.delta(s, tp) + track.delta(tp, f) - b1).abs() < 1e-9);
        }
    }
}
