//! Repair dataset files in place.
//!
//! Usage: `fix_datasets [DIR]` (defaults to the configured datasets directory).
//! Files wrapped in markdown fences or stray prose are rewritten as a plain
//! JSON array; files that cannot be recovered are reported and left alone.

use std::fs;
use std::path::{Path, PathBuf};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wisdom_cards::config::AppConfig;
use wisdom_cards::dataset::repair::{repair_source, Repair};

#[derive(Debug, Default)]
struct Summary {
  valid: usize,
  fixed: usize,
  failed: usize,
}

fn fix_file(path: &Path, summary: &mut Summary) {
  let raw = match fs::read_to_string(path) {
    Ok(raw) => raw,
    Err(e) => {
      tracing::error!("{}: read failed: {}", path.display(), e);
      summary.failed += 1;
      return;
    }
  };

  match repair_source(&raw) {
    Repair::Valid(count) => {
      tracing::debug!("{}: ok ({} items)", path.display(), count);
      summary.valid += 1;
    }
    Repair::Fixed(text, count) => match fs::write(path, text) {
      Ok(()) => {
        tracing::info!("{}: fixed ({} items)", path.display(), count);
        summary.fixed += 1;
      }
      Err(e) => {
        tracing::error!("{}: write failed: {}", path.display(), e);
        summary.failed += 1;
      }
    },
    Repair::Unrecoverable => {
      tracing::warn!("{}: no JSON array found", path.display());
      summary.failed += 1;
    }
  }
}

fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fix_datasets=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let dir = match std::env::args().nth(1) {
    Some(dir) => PathBuf::from(dir),
    None => AppConfig::load().datasets_dir,
  };

  let entries = match fs::read_dir(&dir) {
    Ok(entries) => entries,
    Err(e) => {
      eprintln!("Cannot read {}: {}", dir.display(), e);
      std::process::exit(1);
    }
  };

  let mut paths: Vec<_> = entries
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
    .collect();
  paths.sort();

  let mut summary = Summary::default();
  for path in &paths {
    fix_file(path, &mut summary);
  }

  tracing::info!(
    "{} file(s): {} valid, {} fixed, {} failed",
    paths.len(),
    summary.valid,
    summary.fixed,
    summary.failed
  );

  if summary.failed > 0 {
    std::process::exit(1);
  }
}
