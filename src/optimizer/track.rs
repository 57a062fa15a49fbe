use crate::constants::EARTH_RADIUS_KM;
use crate::error::{Result, ScoreError};
use crate::models::Fix;

/// Unit-sphere projection of one fix, precomputed so the inner distance
/// loop is a single fused law-of-cosines evaluation.
#[derive(Debug, Clone, Copy)]
struct SpherePoint {
    sin_lat: f64,
    cos_lat: f64,
    lng: f64,
}

impl SpherePoint {
    fn from_fix(fix: &Fix) -> Self {
        let lat = fix.coordinates.lat.to_radians();
        SpherePoint {
            sin_lat: lat.sin(),
            cos_lat: lat.cos(),
            lng: fix.coordinates.lng.to_radians(),
        }
    }
}

/// Furthest fix on one side of an index, with its distance in km.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Limit {
    pub(crate) index: usize,
    pub(crate) distance: f64,
}

/// Start/finish closure lookup for circuit searches.
///
/// `last_finish[i]` is the last index whose fix lies within the closing
/// tolerance of fix `i`; `best_start[i]` is the start index at or before
/// `i` whose reachable finish extends furthest.
pub struct CircuitTables {
    last_finish: Vec<usize>,
    best_start: Vec<usize>,
}

impl CircuitTables {
    pub(crate) fn last_finish(&self, i: usize) -> usize {
        self.last_finish[i]
    }

    pub(crate) fn best_start(&self, i: usize) -> usize {
        self.best_start[i]
    }
}

/// An immutable, time-ordered view over a flight's fixes, with the
/// derived tables the pruned searches run on.
///
/// The searches rely on two bounds that hold for any indices `j <= k`:
/// straight-line distance between `j` and `k` never exceeds
/// `(k - j) * max_delta` (the largest consecutive leg), nor the path
/// distance `sigma_delta[k] - sigma_delta[j]` actually flown between
/// them. Both follow from the triangle inequality over consecutive legs.
pub struct Track {
    fixes: Vec<Fix>,
    points: Vec<SpherePoint>,
    max_delta: f64,
    sigma_delta: Vec<f64>,
    before: Vec<Limit>,
    after: Vec<Limit>,
}

impl Track {
    /// Build a track from time-ordered fixes.
    pub fn new(fixes: Vec<Fix>) -> Result<Track> {
        if fixes.is_empty() {
            return Err(ScoreError::EmptyTrack);
        }
        for (i, pair) in fixes.windows(2).enumerate() {
            if pair[1].time < pair[0].time {
                return Err(ScoreError::MalformedFix(format!(
                    "timestamp at fix {} goes backwards ({} after {})",
                    i + 1,
                    pair[1].time,
                    pair[0].time
                )));
            }
        }
        Ok(Self::build(fixes))
    }

    /// Invariant-preserving constructor for fixes already known to be
    /// ordered (downsampling an existing track).
    fn build(fixes: Vec<Fix>) -> Track {
        let points: Vec<SpherePoint> = fixes.iter().map(SpherePoint::from_fix).collect();
        let n = fixes.len();

        let mut track = Track {
            fixes,
            points,
            max_delta: 0.0,
            sigma_delta: vec![0.0; n],
            before: Vec::with_capacity(n),
            after: Vec::with_capacity(n),
        };

        for i in 1..n {
            let delta = track.delta(i - 1, i);
            track.sigma_delta[i] = track.sigma_delta[i - 1] + delta;
            if delta > track.max_delta {
                track.max_delta = delta;
            }
        }

        track.compute_limit_tables();

        tracing::debug!(
            fixes = n,
            max_delta_km = track.max_delta,
            path_km = track.sigma_delta[n - 1],
            "track tables built"
        );

        track
    }

    /// Furthest-fix lookup tables for both directions. Each entry is
    /// seeded from its neighbour's distance minus `max_delta`, a valid
    /// lower bound, so most scans prune immediately.
    fn compute_limit_tables(&mut self) {
        let n = self.len();

        self.before.push(Limit {
            index: 0,
            distance: 0.0,
        });
        for i in 1..n {
            let seed = self.before[i - 1].distance - self.max_delta;
            let mut bound = seed;
            let limit = match self.furthest_from(i, 0, i, &mut bound) {
                Some(index) => Limit {
                    index,
                    distance: bound,
                },
                // Nothing strictly beat the seed, so the previous witness
                // attains it exactly.
                None => Limit {
                    index: self.before[i - 1].index,
                    distance: seed.max(0.0),
                },
            };
            self.before.push(limit);
        }

        let mut bound = 0.0;
        let first = match self.furthest_from(0, 1, n, &mut bound) {
            Some(index) => Limit {
                index,
                distance: bound,
            },
            None => Limit {
                index: n - 1,
                distance: 0.0,
            },
        };
        self.after.push(first);
        for i in 1..n.saturating_sub(1) {
            let seed = self.after[i - 1].distance - self.max_delta;
            let mut bound = seed;
            let limit = match self.furthest_from(i, i + 1, n, &mut bound) {
                Some(index) => Limit {
                    index,
                    distance: bound,
                },
                None => Limit {
                    index: self.after[i - 1].index.max(i + 1),
                    distance: seed.max(0.0),
                },
            };
            self.after.push(limit);
        }
        if n > 1 {
            self.after.push(Limit {
                index: n - 1,
                distance: 0.0,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn fixes(&self) -> &[Fix] {
        &self.fixes
    }

    /// Largest great-circle distance between consecutive fixes, in km.
    pub fn max_delta(&self) -> f64 {
        self.max_delta
    }

    /// Great-circle distance between fixes `i` and `j`, in km.
    pub fn delta(&self, i: usize, j: usize) -> f64 {
        let a = &self.points[i];
        let b = &self.points[j];
        let x = a.sin_lat * b.sin_lat + a.cos_lat * b.cos_lat * (a.lng - b.lng).cos();
        if x < 1.0 {
            EARTH_RADIUS_KM * x.acos()
        } else {
            0.0
        }
    }

    pub(crate) fn before(&self, i: usize) -> Limit {
        self.before[i]
    }

    pub(crate) fn after(&self, i: usize) -> Limit {
        self.after[i]
    }

    /// Cumulative path distance from the first fix to fix `i`, in km.
    pub(crate) fn sigma(&self, i: usize) -> f64 {
        self.sigma_delta[i]
    }

    /// First index a scan may need to probe after skipping a distance
    /// deficit of `d` km: `k` steps ahead can gain at most
    /// `k * max_delta`, so the step is `ceil(d / max_delta)`, never less
    /// than one so scans always make progress.
    fn forward(&self, i: usize, d: f64) -> usize {
        let step = (d / self.max_delta).ceil();
        if step.is_finite() {
            i.saturating_add((step as usize).max(1))
        } else if d > 0.0 {
            // max_delta is zero and the deficit is real: no index can
            // ever close it.
            usize::MAX
        } else {
            i + 1
        }
    }

    /// Like [`forward`](Self::forward), then refined against the
    /// cumulative path distance: the scan cannot succeed before the
    /// track has actually flown `d` further km.
    pub(crate) fn fast_forward(&self, i: usize, d: f64) -> usize {
        let target = self.sigma_delta[i] + d;
        let mut i = self.forward(i, d);
        while i < self.len() {
            let error = target - self.sigma_delta[i];
            if error <= 0.0 {
                return i;
            }
            i = self.forward(i, error);
        }
        self.len()
    }

    fn backward(&self, i: usize, d: f64) -> Option<usize> {
        let step = (d / self.max_delta).ceil();
        let step = if step.is_finite() {
            (step as usize).max(1)
        } else if d > 0.0 {
            return None;
        } else {
            1
        };
        i.checked_sub(step)
    }

    pub(crate) fn fast_backward(&self, i: usize, d: f64) -> Option<usize> {
        let target = self.sigma_delta[i] - d;
        let mut i = self.backward(i, d)?;
        loop {
            let error = self.sigma_delta[i] - target;
            if error <= 0.0 {
                return Some(i);
            }
            i = self.backward(i, error)?;
        }
    }

    /// Index in `[begin, end)` furthest from fix `i`, provided something
    /// strictly beats the incoming `bound`. `bound` always ends up at
    /// the best distance seen, even when `None` is returned (nothing
    /// exceeded it).
    pub fn furthest_from(
        &self,
        i: usize,
        begin: usize,
        end: usize,
        bound: &mut f64,
    ) -> Option<usize> {
        let mut result = None;
        let mut j = begin;
        while j < end {
            let d = self.delta(i, j);
            if d > *bound {
                *bound = d;
                result = Some(j);
                j += 1;
            } else {
                j = self.fast_forward(j, *bound - d);
            }
        }
        result
    }

    /// Convenience: furthest fix from the start of the track.
    pub fn max_distance_from_start(&self, bound: &mut f64) -> Option<usize> {
        self.furthest_from(0, 1, self.len(), bound)
    }

    /// Index `k` in `[begin, end)` maximizing the dogleg
    /// `delta(i, k) + delta(k, j)`. One index step moves both legs by at
    /// most `max_delta`, so the skip distance is halved.
    pub(crate) fn furthest_from_via(
        &self,
        i: usize,
        j: usize,
        begin: usize,
        end: usize,
        bound: &mut f64,
    ) -> Option<usize> {
        let mut result = None;
        let mut k = begin;
        while k < end {
            let d = self.delta(i, k) + self.delta(k, j);
            if d > *bound {
                *bound = d;
                result = Some(k);
                k += 1;
            } else {
                k = self.fast_forward(k, (*bound - d) / 2.0);
            }
        }
        result
    }

    /// First index in `[begin, end)` strictly further than `bound` from
    /// fix `i`.
    pub(crate) fn first_at_least(
        &self,
        i: usize,
        begin: usize,
        end: usize,
        bound: f64,
    ) -> Option<usize> {
        let mut j = begin;
        while j < end {
            let d = self.delta(i, j);
            if d > bound {
                return Some(j);
            }
            j = self.fast_forward(j, bound - d);
        }
        None
    }

    /// Last index in `[begin, end)` strictly further than `bound` from
    /// fix `i`.
    pub(crate) fn last_at_least(
        &self,
        i: usize,
        begin: usize,
        end: usize,
        bound: f64,
    ) -> Option<usize> {
        if end <= begin {
            return None;
        }
        let mut j = end - 1;
        loop {
            if j < begin {
                return None;
            }
            let d = self.delta(i, j);
            if d > bound {
                return Some(j);
            }
            j = self.fast_backward(j, bound - d)?;
        }
    }

    /// Closure lookup tables for circuit searches: for each index, the
    /// last fix within `close_km` of it, and the start at or before it
    /// whose reachable finish extends furthest.
    pub fn circuit_tables(&self, close_km: f64) -> CircuitTables {
        let n = self.len();
        let mut last_finish = Vec::with_capacity(n);
        let mut best_start = Vec::with_capacity(n);
        let mut current_best = 0usize;

        for i in 0..n {
            // Scan backwards from the end for the last fix close enough
            // to i. The fix itself always qualifies, so the scan cannot
            // run past i.
            let mut finish = i;
            let mut j = n - 1;
            while j >= i {
                let d = self.delta(i, j);
                if d < close_km {
                    finish = j;
                    break;
                }
                match self.fast_backward(j, d - close_km) {
                    Some(next) => j = next,
                    None => break,
                }
            }
            last_finish.push(finish);

            if last_finish[i] > last_finish[current_best] {
                current_best = i;
            }
            // The running best may only reach a finish before i; rescan
            // the prefix when that happens.
            if last_finish[current_best] < i {
                current_best = 0;
                for j in 1..=i {
                    if last_finish[j] > last_finish[current_best] {
                        current_best = j;
                    }
                }
            }
            best_start.push(current_best);
        }

        CircuitTables {
            last_finish,
            best_start,
        }
    }

    /// Coarser copy of this track keeping only fixes at least
    /// `threshold_km` from the previously kept fix. Used to seed
    /// triangle and quadrilateral bounds before the full-track pass.
    pub fn downsample(&self, threshold_km: f64) -> Track {
        let mut fixes = vec![self.fixes[0]];
        let mut i = 0;
        for j in 1..self.len() {
            if self.delta(i, j) > threshold_km {
                fixes.push(self.fixes[j]);
                i = j;
            }
        }
        let track = Self::build(fixes);
        tracing::debug!(
            from = self.len(),
            to = track.len(),
            threshold_km,
            "track downsampled"
        );
        track
    }

    /// First fix whose timestamp is at or after `time`. Cache records
    /// resolve their stored timestamps through this; `None` means the
    /// record does not match this track.
    pub fn first_fix_at_or_after(&self, time: i64) -> Option<usize> {
        let i = self.fixes.partition_point(|f| f.time < time);
        (i < self.len()).then_some(i)
    }
}
