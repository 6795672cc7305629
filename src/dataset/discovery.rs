//! Dataset discovery - scanning the datasets directory for JSON sources.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{classify, dataset_id, strip_code_fence, DatasetError};
use crate::domain::{Dataset, Item};

/// Reads every `*.json` file in a directory into a [`Dataset`].
#[derive(Debug, Clone)]
pub struct DatasetStore {
    dir: PathBuf,
}

impl DatasetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load all datasets, ordered by file name.
    ///
    /// A missing directory yields an empty list. Files that fail to parse or
    /// are not a non-empty array are logged and skipped; only a failure to
    /// list the directory itself is an error.
    pub fn load_all(&self) -> Result<Vec<Dataset>, DatasetError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("Datasets directory {} does not exist", self.dir.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(DatasetError::IoError(
                    self.dir.display().to_string(),
                    e.to_string(),
                ));
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".json"))
            })
            .collect();
        files.sort();

        let mut datasets = Vec::new();
        for path in files {
            match load_file(&path) {
                Ok(dataset) => datasets.push(dataset),
                Err(e) => {
                    // Skip the broken file, keep loading the rest
                    tracing::warn!("Skipping dataset file: {}", e);
                }
            }
        }

        tracing::info!(
            "Loaded {} dataset(s) from {}",
            datasets.len(),
            self.dir.display()
        );
        Ok(datasets)
    }
}

/// Load a single dataset file.
pub fn load_file(path: &Path) -> Result<Dataset, DatasetError> {
    let display = path.display().to_string();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
        .ok_or_else(|| DatasetError::InvalidFormat(display.clone()))?;

    let raw = fs::read_to_string(path)
        .map_err(|e| DatasetError::IoError(display.clone(), e.to_string()))?;

    let items = parse_items(&raw).map_err(|e| match e {
        ParseFailure::Json(err) => DatasetError::ParseError(display.clone(), err),
        ParseFailure::NotArray => DatasetError::InvalidFormat(display.clone()),
    })?;

    let id = dataset_id(&file_name).to_string();
    let (name, category) = classify(&id);

    Ok(Dataset {
        id,
        name,
        file_name,
        category,
        items,
    })
}

enum ParseFailure {
    Json(String),
    NotArray,
}

fn parse_items(raw: &str) -> Result<Vec<Item>, ParseFailure> {
    let text = strip_code_fence(raw);
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ParseFailure::Json(e.to_string()))?;

    match value.as_array() {
        Some(items) if !items.is_empty() => {}
        _ => return Err(ParseFailure::NotArray),
    }

    serde_json::from_value(value).map_err(|e| ParseFailure::Json(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const THREE_ITEMS: &str = r#"[
        {"id": 1, "question": "学而时习之", "answer": "不亦说乎", "author": "孔子"},
        {"id": 2, "question": "Q2", "answer": "A2", "author": null},
        {"id": 40, "question": "Q3", "answer": "A3", "category": "misc"}
    ]"#;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = DatasetStore::new(temp.path().join("nope"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_load_preserves_items_and_ids() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "quotes.json", THREE_ITEMS);

        let datasets = DatasetStore::new(temp.path()).load_all().unwrap();
        assert_eq!(datasets.len(), 1);

        let quotes = &datasets[0];
        assert_eq!(quotes.id, "quotes");
        assert_eq!(quotes.name, "智慧名言");
        assert_eq!(quotes.file_name, "quotes.json");
        let ids: Vec<i64> = quotes.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 40]);
    }

    #[test]
    fn test_fenced_file_matches_plain_file() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "plain.json", THREE_ITEMS);
        write(
            temp.path(),
            "fenced.json",
            &format!("```json\n{}\n```\n", THREE_ITEMS),
        );

        let datasets = DatasetStore::new(temp.path()).load_all().unwrap();
        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[0].items, datasets[1].items);
    }

    #[test]
    fn test_bad_files_are_skipped() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a-empty.json", "[]");
        write(temp.path(), "b-object.json", r#"{"id": 1}"#);
        write(temp.path(), "c-broken.json", "[{\"id\": ");
        write(temp.path(), "d-good.md.json", THREE_ITEMS);
        write(temp.path(), "notes.txt", THREE_ITEMS);

        let datasets = DatasetStore::new(temp.path()).load_all().unwrap();
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].id, "d-good");
        assert_eq!(datasets[0].category, "其他");
    }

    #[test]
    fn test_load_order_follows_file_names() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "poems.json", THREE_ITEMS);
        write(temp.path(), "example.json", THREE_ITEMS);

        let datasets = DatasetStore::new(temp.path()).load_all().unwrap();
        let ids: Vec<_> = datasets.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["example", "poems"]);
    }

    #[test]
    fn test_load_file_reports_invalid_format() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "empty.json", "[]");
        let err = load_file(&temp.path().join("empty.json")).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidFormat(_)));
        assert_eq!(err.user_message(), "Invalid data format");
    }
}
