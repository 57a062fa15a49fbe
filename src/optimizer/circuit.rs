//! Circuit searches: routes that must close back near their starting
//! point.
//!
//! Start/finish candidates come from [`CircuitTables`]: for each first
//! turnpoint the search takes the start with the furthest reachable
//! finish and only considers turnpoints witnessed between them. The
//! closing pair is then refined by [`close_circuit`]. Index tuples are
//! `[start, turnpoints.., finish]`; scoring uses only the interior
//! turnpoints, so the returned bound is the interior leg sum (for
//! out-and-return, the single outbound leg).

use super::track::{CircuitTables, Track};
use crate::constants::CIRCUIT_GAP_WEIGHT;

/// Longest out-and-return: one turnpoint as far as possible from the
/// first, inside a closable start/finish window. Flight distance is
/// twice the returned leg.
pub fn out_and_return(
    track: &Track,
    tables: &CircuitTables,
    mut bound: f64,
) -> (f64, Option<[usize; 4]>) {
    let mut result = None;
    let n = track.len();
    for tp1 in 0..n.saturating_sub(2) {
        let start = tables.best_start(tp1);
        let finish = tables.last_finish(start);
        if finish < tp1 + 1 {
            continue;
        }
        let mut leg = bound;
        if let Some(tp2) = track.furthest_from(tp1, tp1 + 1, finish + 1, &mut leg) {
            result = Some([start, tp1, tp2, finish]);
            bound = leg;
        }
    }
    (bound, result)
}

/// Largest flat triangle by interior perimeter.
pub fn triangle(
    track: &Track,
    tables: &CircuitTables,
    mut bound: f64,
) -> (f64, Option<[usize; 5]>) {
    let mut result = None;
    let n = track.len();
    for tp1 in 0..n.saturating_sub(1) {
        // Path length remaining after tp1 caps what any triangle rooted
        // here can span.
        if track.sigma(n - 1) - track.sigma(tp1) < bound {
            break;
        }
        let start = tables.best_start(tp1);
        let finish = tables.last_finish(start);
        if track.sigma(finish) - track.sigma(tp1) < bound {
            continue;
        }
        let mut tp3 = finish;
        while tp3 > tp1 + 1 {
            let leg31 = track.delta(tp3, tp1);
            let mut legs123 = bound - leg31;
            if let Some(tp2) = track.furthest_from_via(tp1, tp3, tp1 + 1, tp3, &mut legs123) {
                bound = leg31 + legs123;
                result = Some([start, tp1, tp2, tp3, finish]);
            }
            tp3 -= 1;
        }
    }
    (bound, result)
}

/// Largest triangle whose every leg is at least `min_fraction` of the
/// perimeter (0.28 for FAI triangles).
///
/// The leg constraint prunes hard: candidate third turnpoints are
/// narrowed to the window far enough from the first, and each candidate
/// pair is skipped by its worst leg-length deficit before the perimeter
/// bound is even consulted.
pub fn triangle_fai(
    track: &Track,
    tables: &CircuitTables,
    min_fraction: f64,
    mut bound: f64,
) -> (f64, Option<[usize; 5]>) {
    let mut result = None;
    let n = track.len();
    let rest = 1.0 - 2.0 * min_fraction;
    let mut legbound = min_fraction * bound;

    for tp1 in 0..n.saturating_sub(2) {
        let start = tables.best_start(tp1);
        let finish = tables.last_finish(start);
        let Some(tp3_first) = track.first_at_least(tp1, tp1 + 2, finish + 1, legbound) else {
            continue;
        };
        let Some(tp3_last) = track.last_at_least(tp1, tp3_first, finish + 1, legbound) else {
            continue;
        };

        let mut tp3 = tp3_last;
        'tp3: while tp3 >= tp3_first {
            let leg3 = track.delta(tp3, tp1);
            if leg3 < legbound {
                match track.fast_backward(tp3, legbound - leg3) {
                    Some(next) => tp3 = next,
                    None => break,
                }
                continue;
            }

            let shortest = min_fraction * leg3 / rest;
            let longest = rest * leg3 / min_fraction;
            let tp2_window = track
                .first_at_least(tp1, tp1 + 1, tp3 - 1, shortest)
                .and_then(|first| {
                    track
                        .last_at_least(tp3, first, tp3, shortest)
                        .map(|last| (first, last))
                });
            let Some((tp2_first, tp2_last)) = tp2_window else {
                if tp3 == 0 {
                    break;
                }
                tp3 -= 1;
                continue;
            };

            let mut tp2 = tp2_first;
            while tp2 <= tp2_last {
                let mut deficit = 0.0;
                let leg1 = track.delta(tp1, tp2);
                if leg1 < shortest {
                    deficit = shortest - leg1;
                }
                if leg1 > longest && leg1 - longest > deficit {
                    deficit = leg1 - longest;
                }
                let leg2 = track.delta(tp2, tp3);
                if leg2 < shortest && shortest - leg2 > deficit {
                    deficit = shortest - leg2;
                }
                if leg2 > longest && leg2 - longest > deficit {
                    deficit = leg2 - longest;
                }
                if deficit > 0.0 {
                    tp2 = track.fast_forward(tp2, deficit);
                    continue;
                }

                let total = leg1 + leg2 + leg3;
                let this_legbound = min_fraction * total;
                if leg1 < this_legbound {
                    deficit = this_legbound - leg1;
                }
                if leg2 < this_legbound && this_legbound - leg2 > deficit {
                    deficit = this_legbound - leg2;
                }
                if leg3 < this_legbound && this_legbound - leg3 > deficit {
                    deficit = this_legbound - leg3;
                }
                if deficit > 0.0 {
                    tp2 = track.fast_forward(tp2, 0.5 * deficit);
                    continue;
                }

                if total < bound {
                    tp2 = track.fast_forward(tp2, 0.5 * (bound - total));
                    continue;
                }

                bound = total;
                legbound = this_legbound;
                result = Some([start, tp1, tp2, tp3, finish]);
                tp2 += 1;
            }

            if tp3 == 0 {
                break 'tp3;
            }
            tp3 -= 1;
        }
    }
    (bound, result)
}

/// Largest quadrilateral whose every leg is at least `min_fraction` of
/// the perimeter (0.15 under FRCFD rules). Same windowing strategy as
/// the FAI triangle with one more nesting level; intended to run on a
/// downsampled track.
pub fn quadrilateral(
    track: &Track,
    tables: &CircuitTables,
    min_fraction: f64,
    mut bound: f64,
) -> (f64, Option<[usize; 6]>) {
    let mut result = None;
    let n = track.len();
    let rest = 1.0 - 3.0 * min_fraction;
    let mut legbound = min_fraction * bound;

    for tp1 in 0..n.saturating_sub(3) {
        let start = tables.best_start(tp1);
        let finish = tables.last_finish(start);
        let Some(tp4_first) = track.first_at_least(tp1, tp1 + 2, finish + 1, legbound) else {
            continue;
        };
        let Some(tp4_last) = track.last_at_least(tp1, tp4_first, finish + 1, legbound) else {
            continue;
        };

        let mut tp4 = tp4_last;
        while tp4 >= tp4_first {
            let leg4 = track.delta(tp4, tp1);
            if leg4 < legbound {
                match track.fast_backward(tp4, legbound - leg4) {
                    Some(next) => tp4 = next,
                    None => break,
                }
                continue;
            }

            let shortest = min_fraction * leg4 / rest;
            let longest = rest * leg4 / min_fraction;
            let windows = track
                .first_at_least(tp1, tp1 + 1, tp4 - 1, shortest)
                .and_then(|tp2_first| {
                    track
                        .last_at_least(tp4, tp2_first + 1, tp4, shortest)
                        .map(|tp3_last| (tp2_first, tp3_last))
                })
                .and_then(|(tp2_first, tp3_last)| {
                    track
                        .last_at_least(tp4, tp2_first + 1, tp3_last - 1, shortest)
                        .map(|tp2_last| (tp2_first, tp2_last, tp3_last))
                });
            let Some((tp2_first, tp2_last, tp3_last)) = windows else {
                if tp4 == 0 {
                    break;
                }
                tp4 -= 1;
                continue;
            };

            let mut tp2 = tp2_first;
            while tp2 <= tp2_last {
                let leg1 = track.delta(tp1, tp2);
                let shortest2 = (min_fraction * (leg1 + leg4) / (1.0 - 2.0 * min_fraction))
                    .min(shortest);
                let longest2 = (rest * (leg1 + leg4) / (2.0 * min_fraction)).max(longest);
                let Some(tp3_first) = track.first_at_least(tp2, tp2 + 1, tp3_last + 1, shortest2)
                else {
                    tp2 += 1;
                    continue;
                };

                let mut tp3 = tp3_last;
                while tp3 >= tp3_first {
                    let mut deficit = 0.0;
                    let leg2 = track.delta(tp2, tp3);
                    if leg2 < shortest2 {
                        deficit = shortest2 - leg2;
                    }
                    if leg2 > longest2 && leg2 - longest2 > deficit {
                        deficit = leg2 - longest2;
                    }
                    let leg3 = track.delta(tp3, tp4);
                    if leg3 < shortest2 && shortest2 - leg3 > deficit {
                        deficit = shortest2 - leg3;
                    }
                    if leg3 > longest2 && leg3 - longest2 > deficit {
                        deficit = leg3 - longest2;
                    }
                    if deficit > 0.0 {
                        match track.fast_backward(tp3, deficit) {
                            Some(next) => tp3 = next,
                            None => break,
                        }
                        continue;
                    }

                    let total = leg1 + leg2 + leg3 + leg4;
                    let this_legbound = min_fraction * total;
                    if leg1 < this_legbound {
                        deficit = this_legbound - leg1;
                    }
                    if leg2 < this_legbound && this_legbound - leg2 > deficit {
                        deficit = this_legbound - leg2;
                    }
                    if leg3 < this_legbound && this_legbound - leg3 > deficit {
                        deficit = this_legbound - leg3;
                    }
                    if leg4 < this_legbound && this_legbound - leg4 > deficit {
                        deficit = this_legbound - leg4;
                    }
                    if deficit > 0.0 {
                        match track.fast_backward(tp3, 0.5 * deficit) {
                            Some(next) => tp3 = next,
                            None => break,
                        }
                        continue;
                    }

                    if total < bound {
                        match track.fast_backward(tp3, 0.5 * (bound - total)) {
                            Some(next) => tp3 = next,
                            None => break,
                        }
                        continue;
                    }

                    bound = total;
                    legbound = this_legbound;
                    result = Some([start, tp1, tp2, tp3, tp4, finish]);
                    if tp3 == 0 {
                        break;
                    }
                    tp3 -= 1;
                }

                tp2 += 1;
            }

            if tp4 == 0 {
                break;
            }
            tp4 -= 1;
        }
    }
    (bound, result)
}

/// Refine a found circuit's start/finish pair: slide the start up to the
/// first turnpoint and the finish back to the last turnpoint, keeping
/// the pair whose entry leg + weighted closing gap + exit leg is
/// smallest, among pairs whose gap stays within `close_km`.
pub fn close_circuit(track: &Track, indexes: &mut [usize], close_km: f64) {
    let n = indexes.len();
    let first_tp = indexes[1];
    let last_tp = indexes[n - 2];
    let mut best = track.delta(first_tp, indexes[0])
        + CIRCUIT_GAP_WEIGHT * track.delta(indexes[0], indexes[n - 1])
        + track.delta(indexes[n - 1], last_tp);

    let start_range = indexes[0]..=first_tp;
    for start in start_range {
        let entry = track.delta(first_tp, start);
        let mut finish = indexes[n - 1];
        loop {
            let gap = track.delta(start, finish);
            if gap < close_km {
                let exit = track.delta(finish, last_tp);
                let score = entry + CIRCUIT_GAP_WEIGHT * gap + exit;
                if score < best {
                    indexes[0] = start;
                    indexes[n - 1] = finish;
                    best = score;
                }
            }
            if finish == last_tp {
                break;
            }
            finish -= 1;
        }
    }
}
