//! Dataset store: question/answer decks loaded from a directory of JSON files.
//!
//! # Source files
//!
//! Each `*.json` file under the datasets directory holds a JSON array of items.
//! Files produced by language models are often wrapped in a markdown code fence;
//! the wrapper is stripped before parsing.
//!
//! # Identity and classification
//!
//! - Dataset id: file name without `.md.json` / `.json`
//! - Built-in ids (`quotes`, `poems`, `example`) get a display name and the
//!   built-in category
//! - Everything else is classified by file-name prefix

pub mod discovery;
pub mod repair;

pub use discovery::{load_file, DatasetStore};
pub use repair::{repair_source, strip_code_fence};

use crate::domain::Dataset;

/// Category for the datasets shipped with the app
pub const BUILTIN_CATEGORY: &str = "内置数据集";

/// Category for anything no prefix rule matches
pub const OTHER_CATEGORY: &str = "其他";

/// Built-in dataset ids and their display names
const BUILTIN_NAMES: [(&str, &str); 3] = [
    ("quotes", "智慧名言"),
    ("poems", "古诗词"),
    ("example", "示例数据"),
];

/// File-name prefix rules, checked in order
const PREFIX_CATEGORIES: [(&str, &str); 2] = [
    ("读书笔记--", "读书笔记"),
    ("读书笔记，重读", "重读系列"),
];

/// Derive the dataset id from a source file name.
pub fn dataset_id(file_name: &str) -> &str {
    file_name
        .strip_suffix(".md.json")
        .or_else(|| file_name.strip_suffix(".json"))
        .unwrap_or(file_name)
}

/// Display name and category for a dataset id.
pub fn classify(id: &str) -> (String, String) {
    if let Some((_, name)) = BUILTIN_NAMES.iter().find(|(builtin, _)| *builtin == id) {
        return (name.to_string(), BUILTIN_CATEGORY.to_string());
    }

    let category = PREFIX_CATEGORIES
        .iter()
        .find(|(prefix, _)| id.starts_with(prefix))
        .map(|(_, category)| *category)
        .unwrap_or(OTHER_CATEGORY);

    (id.to_string(), category.to_string())
}

/// Error loading a single dataset file or the datasets directory.
#[derive(Debug)]
pub enum DatasetError {
    IoError(String, String),
    ParseError(String, String),
    InvalidFormat(String),
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::IoError(path, err) => write!(f, "IO error reading {}: {}", path, err),
            DatasetError::ParseError(path, err) => write!(f, "Parse error in {}: {}", path, err),
            DatasetError::InvalidFormat(path) => {
                write!(f, "{} is not a non-empty JSON array", path)
            }
        }
    }
}

impl DatasetError {
    /// Returns a user-facing error message without exposing filesystem paths.
    pub fn user_message(&self) -> &str {
        match self {
            DatasetError::IoError(_, _) => "Failed to load datasets",
            DatasetError::ParseError(_, _) => "Failed to parse dataset file",
            DatasetError::InvalidFormat(_) => "Invalid data format",
        }
    }
}

impl std::error::Error for DatasetError {}

/// All datasets currently available, in load order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    datasets: Vec<Dataset>,
}

/// Datasets sharing a category, for the sidebar.
#[derive(Debug, Clone)]
pub struct CategoryGroup<'a> {
    pub category: &'a str,
    pub datasets: Vec<&'a Dataset>,
}

impl Catalog {
    pub fn new(datasets: Vec<Dataset>) -> Self {
        Self { datasets }
    }

    pub fn get(&self, id: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn first(&self) -> Option<&Dataset> {
        self.datasets.first()
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Group datasets by category, keeping first-seen category order.
    pub fn grouped(&self) -> Vec<CategoryGroup<'_>> {
        let mut groups: Vec<CategoryGroup<'_>> = Vec::new();
        for dataset in &self.datasets {
            match groups.iter_mut().find(|g| g.category == dataset.category) {
                Some(group) => group.datasets.push(dataset),
                None => groups.push(CategoryGroup {
                    category: &dataset.category,
                    datasets: vec![dataset],
                }),
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Item;

    fn dataset(id: &str) -> Dataset {
        let (name, category) = classify(id);
        Dataset {
            id: id.to_string(),
            name,
            file_name: format!("{}.json", id),
            category,
            items: vec![Item::new(1, "Q", "A")],
        }
    }

    #[test]
    fn test_dataset_id_strips_suffixes() {
        assert_eq!(dataset_id("quotes.json"), "quotes");
        assert_eq!(dataset_id("读书笔记--林肯.md.json"), "读书笔记--林肯");
        assert_eq!(dataset_id("notes.md"), "notes.md");
    }

    #[test]
    fn test_classify_builtin() {
        assert_eq!(
            classify("poems"),
            ("古诗词".to_string(), BUILTIN_CATEGORY.to_string())
        );
    }

    #[test]
    fn test_classify_by_prefix() {
        assert_eq!(classify("读书笔记--梵高").1, "读书笔记");
        assert_eq!(classify("读书笔记，重读论语").1, "重读系列");
        assert_eq!(classify("my-deck"), ("my-deck".to_string(), OTHER_CATEGORY.to_string()));
    }

    #[test]
    fn test_catalog_grouping_keeps_order() {
        let catalog = Catalog::new(vec![
            dataset("quotes"),
            dataset("读书笔记--李斯"),
            dataset("poems"),
            dataset("misc"),
        ]);
        let groups = catalog.grouped();
        let categories: Vec<_> = groups.iter().map(|g| g.category).collect();
        assert_eq!(categories, vec![BUILTIN_CATEGORY, "读书笔记", OTHER_CATEGORY]);
        assert_eq!(groups[0].datasets.len(), 2);
        assert_eq!(catalog.first().map(|d| d.id.as_str()), Some("quotes"));
        assert!(catalog.contains("misc"));
    }
}
