use serde::{Deserialize, Serialize};

/// How the visible sequence is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ViewMode {
  /// One card at a time with prev/next navigation
  #[default]
  Focus,
  /// Every visible card in a grid
  Feed,
}

impl ViewMode {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "FOCUS" | "focus" => Some(Self::Focus),
      "FEED" | "feed" => Some(Self::Feed),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Focus => "FOCUS",
      Self::Feed => "FEED",
    }
  }
}
