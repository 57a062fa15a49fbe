use super::{CacheRecord, ScoreCache};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File-backed score cache: one human-diffable text record per
/// (league, track) pair at `<root>/<league>/<track_id>`.
///
/// Record format, one flight type per line:
///
/// ```text
/// Open0: 1188733200 1188741330
/// Circuit2: 1188733260 1188734400 1188738000 1188740100
/// ```
///
/// Writes go through a sibling temp file and a rename, so readers only
/// ever observe complete records. Anything that fails to parse is
/// treated as a miss: the worst a damaged record can cost is one
/// re-optimization.
pub struct FileScoreCache {
    root: PathBuf,
}

impl FileScoreCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileScoreCache { root: root.into() }
    }

    fn record_path(&self, league: &str, track_id: &str) -> Option<PathBuf> {
        if !valid_key(league) || !valid_key(track_id) {
            tracing::warn!(league, track_id, "refusing cache key unfit for a path component");
            return None;
        }
        Some(self.root.join(league).join(track_id))
    }
}

fn valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains('/') && !key.contains('\\') && key != "." && key != ".."
}

fn parse_record(contents: &str) -> Option<CacheRecord> {
    let mut record = CacheRecord::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (name, rest) = line.split_once(':')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let times: Option<Vec<i64>> = rest
            .split_whitespace()
            .map(|t| t.parse::<i64>().ok())
            .collect();
        match times {
            Some(times) if !times.is_empty() => record.insert(name, times),
            _ => return None,
        }
    }
    // An empty record carries no information; report a miss so the
    // caller re-optimizes.
    if record.is_empty() {
        None
    } else {
        Some(record)
    }
}

fn write_record(path: &Path, record: &CacheRecord) -> io::Result<()> {
    let dir = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::Other, "cache record path has no parent")
    })?;
    fs::create_dir_all(dir)?;

    let mut contents = String::new();
    for (name, times) in record.iter() {
        contents.push_str(name);
        contents.push(':');
        for t in times {
            contents.push(' ');
            contents.push_str(&t.to_string());
        }
        contents.push('\n');
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

impl ScoreCache for FileScoreCache {
    fn load(&self, league: &str, track_id: &str) -> Option<CacheRecord> {
        let path = self.record_path(league, track_id)?;
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(league, track_id, "cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "failed to read cache record");
                return None;
            }
        };
        match parse_record(&contents) {
            Some(record) => {
                tracing::debug!(league, track_id, "cache hit");
                Some(record)
            }
            None => {
                tracing::warn!(league, track_id, "discarding unreadable cache record");
                None
            }
        }
    }

    fn store(&self, league: &str, track_id: &str, record: &CacheRecord) {
        let Some(path) = self.record_path(league, track_id) else {
            return;
        };
        match write_record(&path, record) {
            Ok(()) => tracing::debug!(league, track_id, "cache record stored"),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "failed to store cache record")
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
