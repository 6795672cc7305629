//! Turn a directory of markdown reading notes into datasets.
//!
//! Usage: `generate_datasets [NOTES_DIR] [OUT_DIR]`
//! (defaults: `book_data` and the configured datasets directory).
//!
//! Each `<name>.md` becomes `<name>.md.json`. The model reply goes through the
//! same repair as `fix_datasets` before it is written. Notes whose output
//! already exists are skipped, so an interrupted run can be resumed.

use std::fs;
use std::path::{Path, PathBuf};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wisdom_cards::config::AppConfig;
use wisdom_cards::dataset::repair::{repair_source, Repair};
use wisdom_cards::generator::{build_note_prompt, parse_note_cards, CardGenerator, GenerateError};

const DEFAULT_NOTES_DIR: &str = "book_data";

#[derive(Debug, Default)]
struct Summary {
  written: usize,
  skipped: usize,
  failed: usize,
}

#[derive(Debug)]
enum NoteError {
  Io(String),
  Generate(GenerateError),
  Unrecoverable,
}

impl std::fmt::Display for NoteError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      NoteError::Io(e) => write!(f, "{}", e),
      NoteError::Generate(e) => write!(f, "{}", e),
      NoteError::Unrecoverable => write!(f, "no JSON array in model reply"),
    }
  }
}

impl From<GenerateError> for NoteError {
  fn from(e: GenerateError) -> Self {
    NoteError::Generate(e)
  }
}

/// Output path for a note: the note's file name plus `.json`.
fn output_path(note: &Path, out_dir: &Path) -> Option<PathBuf> {
  let name = note.file_name()?.to_str()?;
  Some(out_dir.join(format!("{}.json", name)))
}

async fn convert_note(
  generator: &CardGenerator,
  note: &Path,
  output: &Path,
) -> Result<usize, NoteError> {
  let text = fs::read_to_string(note).map_err(|e| NoteError::Io(e.to_string()))?;
  if text.trim().is_empty() {
    return Err(GenerateError::EmptyInput.into());
  }

  let reply = generator.complete_prompt(&build_note_prompt(&text)).await?;
  let json = match repair_source(&reply) {
    Repair::Valid(_) => reply,
    Repair::Fixed(fixed, _) => fixed,
    Repair::Unrecoverable => return Err(NoteError::Unrecoverable),
  };

  let items = parse_note_cards(&json)?;
  let pretty =
    serde_json::to_string_pretty(&items).map_err(|e| NoteError::Io(e.to_string()))?;
  fs::write(output, pretty).map_err(|e| NoteError::Io(e.to_string()))?;
  Ok(items.len())
}

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "generate_datasets=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = AppConfig::load();
  let mut args = std::env::args().skip(1);
  let notes_dir = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_NOTES_DIR.to_string()));
  let out_dir = args.next().map(PathBuf::from).unwrap_or_else(|| config.datasets_dir.clone());

  let generator = CardGenerator::from_config(&config);
  if !generator.is_configured() {
    eprintln!("GEMINI_API_KEY is not set");
    std::process::exit(1);
  }

  let entries = match fs::read_dir(&notes_dir) {
    Ok(entries) => entries,
    Err(e) => {
      eprintln!("Cannot read {}: {}", notes_dir.display(), e);
      std::process::exit(1);
    }
  };
  if let Err(e) = fs::create_dir_all(&out_dir) {
    eprintln!("Cannot create {}: {}", out_dir.display(), e);
    std::process::exit(1);
  }

  let mut notes: Vec<_> = entries
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
    .collect();
  notes.sort();

  let mut summary = Summary::default();
  for note in &notes {
    let Some(output) = output_path(note, &out_dir) else {
      summary.failed += 1;
      continue;
    };
    if output.exists() {
      tracing::debug!("{}: already converted", note.display());
      summary.skipped += 1;
      continue;
    }

    tracing::info!("Processing {}", note.display());
    match convert_note(&generator, note, &output).await {
      Ok(count) => {
        tracing::info!("{} -> {} ({} items)", note.display(), output.display(), count);
        summary.written += 1;
      }
      Err(e) => {
        tracing::warn!("{}: {}", note.display(), e);
        summary.failed += 1;
      }
    }
  }

  tracing::info!(
    "{} note(s): {} written, {} skipped, {} failed",
    notes.len(),
    summary.written,
    summary.skipped,
    summary.failed
  );

  if summary.failed > 0 {
    std::process::exit(1);
  }
}
