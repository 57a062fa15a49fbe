use std::collections::hash_map::DefaultHasher;
use std::env;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xcscore::cache::FileScoreCache;
use xcscore::config::Config;
use xcscore::models::LeagueRegistry;
use xcscore::optimizer::{Scorer, Track, TypeScore};

fn print_help() {
    eprintln!(
        "\
Usage: xcscore [OPTIONS] FILE...

Score IGC track logs against a league's flight types.

Options:
  --league=NAME         League to score under (default: from config, FRCFD)
  --cache-dir=DIR       Directory for score cache records
  --no-cache            Always optimize, never read or write the cache
  --json                Output results as JSON
  --gpx                 Output scored routes as GPX
  --help                Show this help message"
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xcscore=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse CLI args
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help") {
        print_help();
        return Ok(());
    }

    let league_flag = args.iter().find_map(|a| a.strip_prefix("--league="));
    let cache_dir_flag = args.iter().find_map(|a| a.strip_prefix("--cache-dir="));
    let no_cache = args.iter().any(|a| a == "--no-cache");
    let json_output = args.iter().any(|a| a == "--json");
    let gpx_output = args.iter().any(|a| a == "--gpx");
    let files: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    if files.is_empty() {
        print_help();
        return Err("no track files given".into());
    }

    let config = Config::from_env().map_err(|e| format!("Config error: {}", e))?;
    let league = league_flag.unwrap_or(&config.league).to_string();
    let cache_dir = cache_dir_flag
        .map(PathBuf::from)
        .unwrap_or_else(|| config.cache_dir.clone());

    let mut scorer = Scorer::new(LeagueRegistry::builtin()).with_tuning(
        config.optimizer.circuit_close_km,
        config.optimizer.downsample_km,
    );
    if no_cache {
        tracing::info!("cache disabled");
    } else {
        tracing::info!(dir = %cache_dir.display(), "using file score cache");
        scorer = scorer.with_cache(Arc::new(FileScoreCache::new(cache_dir)));
    }

    let stdout = std::io::stdout();
    for path in files {
        let contents =
            fs::read(path).map_err(|e| format!("failed to read {}: {}", path, e))?;
        let track_id = content_hash(&contents);
        let fixes = xcscore::igc::parse_igc(&contents[..])
            .map_err(|e| format!("failed to parse {}: {}", path, e))?;
        let track = Track::new(fixes).map_err(|e| format!("{}: {}", path, e))?;
        tracing::info!(file = path.as_str(), fixes = track.len(), "track loaded");

        let scores = scorer.score(&league, &track, Some(&track_id))?;

        if json_output {
            print_json(&stdout, path, &league, &scores)?;
        } else if gpx_output {
            let flights: Vec<_> = scores
                .iter()
                .filter_map(|s| s.outcome.as_ref().ok().and_then(|o| o.clone()))
                .collect();
            xcscore::gpx::write_gpx(&mut stdout.lock(), &flights)?;
        } else {
            print_table(&stdout, path, &league, &scores)?;
        }
    }

    Ok(())
}

/// Track identity for the score cache: a hash of the raw file bytes, so
/// the same log scores from cache wherever it came from.
fn content_hash(contents: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    contents.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn print_table(
    stdout: &std::io::Stdout,
    path: &str,
    league: &str,
    scores: &[TypeScore],
) -> std::io::Result<()> {
    let mut out = stdout.lock();
    writeln!(out, "{} ({})", path, league)?;
    for score in scores {
        match &score.outcome {
            Ok(Some(flight)) => writeln!(
                out,
                "  {:<12} {:<50} {:>9.3} km {:>9.2} pts",
                score.flight_type, flight.description, flight.distance_km, flight.score
            )?,
            Ok(None) => writeln!(out, "  {:<12} no qualifying flight", score.flight_type)?,
            Err(e) => writeln!(out, "  {:<12} {}", score.flight_type, e)?,
        }
    }
    Ok(())
}

fn print_json(
    stdout: &std::io::Stdout,
    path: &str,
    league: &str,
    scores: &[TypeScore],
) -> Result<(), Box<dyn std::error::Error>> {
    let flights: Vec<_> = scores
        .iter()
        .filter_map(|s| s.outcome.as_ref().ok().and_then(|o| o.as_ref()))
        .collect();
    let failures: Vec<_> = scores
        .iter()
        .filter_map(|s| {
            s.outcome.as_ref().err().map(|e| {
                serde_json::json!({
                    "flight_type": s.flight_type,
                    "error": e.to_string(),
                })
            })
        })
        .collect();
    let report = serde_json::json!({
        "file": path,
        "league": league,
        "flights": flights,
        "failures": failures,
    });
    writeln!(stdout.lock(), "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}
