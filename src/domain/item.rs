use serde::{Deserialize, Serialize};

/// A single question/answer record ("quote").
///
/// `id` is unique only within its owning dataset; every lookup is scoped by
/// `(dataset id, item id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
  pub id: i64,
  pub question: String,
  pub answer: String,
  #[serde(default)]
  pub author: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
}

impl Item {
  pub fn new(id: i64, question: impl Into<String>, answer: impl Into<String>) -> Self {
    Self {
      id,
      question: question.into(),
      answer: answer.into(),
      author: None,
      category: None,
    }
  }

  /// Attribution shown under a revealed answer
  pub fn author_or_anonymous(&self) -> &str {
    match self.author.as_deref() {
      Some(author) if !author.trim().is_empty() => author,
      _ => "佚名",
    }
  }
}

/// A named, categorized collection of items loaded from one source file.
///
/// Never mutated after load: shuffling and mastery are tracked by the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
  pub id: String,
  pub name: String,
  pub file_name: String,
  pub category: String,
  #[serde(rename = "data")]
  pub items: Vec<Item>,
}

impl Dataset {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn contains(&self, item_id: i64) -> bool {
    self.items.iter().any(|item| item.id == item_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_item_deserialize_optional_fields() {
    let item: Item = serde_json::from_str(r#"{"id": 7, "question": "Q", "answer": "A"}"#).unwrap();
    assert_eq!(item.id, 7);
    assert!(item.author.is_none());
    assert!(item.category.is_none());
  }

  #[test]
  fn test_item_serializes_null_author() {
    let json = serde_json::to_value(Item::new(1, "Q", "A")).unwrap();
    assert!(json["author"].is_null());
    assert!(json.get("category").is_none());
  }

  #[test]
  fn test_author_or_anonymous() {
    let mut item = Item::new(1, "Q", "A");
    assert_eq!(item.author_or_anonymous(), "佚名");
    item.author = Some("孔子".to_string());
    assert_eq!(item.author_or_anonymous(), "孔子");
  }

  #[test]
  fn test_dataset_wire_shape() {
    let dataset = Dataset {
      id: "quotes".into(),
      name: "智慧名言".into(),
      file_name: "quotes.json".into(),
      category: "内置数据集".into(),
      items: vec![Item::new(1, "Q", "A")],
    };
    let json = serde_json::to_value(&dataset).unwrap();
    assert_eq!(json["fileName"], "quotes.json");
    assert_eq!(json["data"][0]["id"], 1);
    assert!(dataset.contains(1));
    assert!(!dataset.contains(2));
  }
}
