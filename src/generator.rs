//! Card generation client.
//!
//! Sends free-form text to a Gemini model and asks for question/answer pairs
//! back as a JSON array. Models like to wrap the array in prose or a code
//! fence, so the reply is searched for its outermost `[` ... `]` span.

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::dataset::repair::outer_array_span;
use crate::domain::Item;

/// Category given to generated cards that come back without one
pub const DEFAULT_GENERATED_CATEGORY: &str = "自定义";

#[derive(Debug)]
pub enum GenerateError {
    /// No source text was supplied
    EmptyInput,
    /// `GEMINI_API_KEY` is not configured
    MissingCredential,
    /// The request body could not be read
    InvalidRequest(String),
    /// The model replied, but not with a usable JSON array
    UpstreamFormat(String),
    /// Transport or provider failure
    Upstream(String),
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateError::EmptyInput => write!(f, "Source text is empty"),
            GenerateError::MissingCredential => write!(f, "GEMINI_API_KEY is not configured"),
            GenerateError::InvalidRequest(e) => write!(f, "Invalid generate request: {}", e),
            GenerateError::UpstreamFormat(e) => write!(f, "Unusable model response: {}", e),
            GenerateError::Upstream(e) => write!(f, "Generation request failed: {}", e),
        }
    }
}

impl GenerateError {
    /// Message shown to the learner.
    pub fn user_message(&self) -> &str {
        match self {
            GenerateError::EmptyInput => "内容不能为空",
            GenerateError::MissingCredential => "GEMINI_API_KEY 未配置",
            GenerateError::UpstreamFormat(_) => "生成格式错误",
            GenerateError::InvalidRequest(_) | GenerateError::Upstream(_) => "生成失败，请重试",
        }
    }
}

impl std::error::Error for GenerateError {}

// ==================== Gemini wire types ====================

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Default)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// One entry of the array the model is asked to produce
#[derive(Deserialize)]
struct GeneratedCard {
    question: String,
    answer: String,
    #[serde(default)]
    category: Option<String>,
}

/// Instruction sent ahead of the learner's text.
pub fn build_prompt(source_text: &str, count: u32) -> String {
    format!(
        r#"请阅读下面的内容，并据此出 {count} 道问答题，帮助学习者理解和记住其中的要点。

要求：
1. 每道题都围绕内容里的关键知识点
2. 答案简短、准确
3. 以 JSON 数组返回，每个元素包含 question（问题）、answer（答案）、category（分类）三个字段
4. 除 JSON 之外不要输出任何文字

内容：
{source_text}

返回示例：
[
  {{"question": "问题1", "answer": "答案1", "category": "分类1"}},
  {{"question": "问题2", "answer": "答案2", "category": "分类2"}}
]"#
    )
}

/// Turn raw model output into items with ids 1..=n.
pub fn parse_generated(text: &str) -> Result<Vec<Item>, GenerateError> {
    let array = outer_array_span(text)
        .ok_or_else(|| GenerateError::UpstreamFormat("no JSON array in response".to_string()))?;

    let cards: Vec<GeneratedCard> = serde_json::from_str(array)
        .map_err(|e| GenerateError::UpstreamFormat(e.to_string()))?;

    Ok(cards
        .into_iter()
        .enumerate()
        .map(|(i, card)| Item {
            id: i as i64 + 1,
            question: card.question,
            answer: card.answer,
            author: None,
            category: Some(
                card.category
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_GENERATED_CATEGORY.to_string()),
            ),
        })
        .collect())
}

/// Instruction for splitting a reading note into cards without rewording it.
///
/// Each passage is cut in two at a natural pause: the first half becomes the
/// question, the rest the answer.
pub fn build_note_prompt(note: &str) -> String {
    format!(
        r#"你是一个智能文本整理专家，擅长把长文本整理成便于记忆的问答卡片。

规则：
1. 你只做"剪刀"：不改写、不总结、不省略、不补写，question 与 answer 拼起来要与原文一致
2. 有序列表（1. 2. 3. …）中的每一条是一段原文，各自拆成一张卡片
3. 以"- "开头的内容是读者的个人看法，不参与拆分，可作为补充附在 answer 末尾
4. 优先在逗号、冒号或"说道""写道"等动词前后切分，不要拆散引号内的完整语义
5. 只修正明显的 OCR 错误，去掉乱码、水印、页码
6. 原文中明确出现作者时提取为 author，否则 author 为 null

只输出一个合法的 JSON 数组，不要任何解释：
[
  {{"id": 1, "question": "你若盛开，", "answer": "蝴蝶自来。", "author": null}}
]

待处理文本如下：
{note}"#,
        note = note.trim()
    )
}

#[derive(Deserialize)]
struct NoteCard {
    question: String,
    answer: String,
    #[serde(default)]
    author: Option<String>,
}

/// Parse a JSON array of note cards, renumbering ids 1..=n.
///
/// Blank authors and the literal text `null` become `None`.
pub fn parse_note_cards(json: &str) -> Result<Vec<Item>, GenerateError> {
    let cards: Vec<NoteCard> =
        serde_json::from_str(json).map_err(|e| GenerateError::UpstreamFormat(e.to_string()))?;

    Ok(cards
        .into_iter()
        .enumerate()
        .map(|(i, card)| Item {
            id: i as i64 + 1,
            question: card.question,
            answer: card.answer,
            author: card
                .author
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty() && a != "null"),
            category: None,
        })
        .collect())
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct CardGenerator {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl CardGenerator {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.gemini_endpoint.clone(),
            config.gemini_model.clone(),
            config.gemini_api_key.clone(),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate `count` cards from `source_text`.
    pub async fn generate(&self, source_text: &str, count: u32) -> Result<Vec<Item>, GenerateError> {
        if source_text.trim().is_empty() {
            return Err(GenerateError::EmptyInput);
        }

        let prompt = build_prompt(source_text, count);
        let text = self.complete_prompt(&prompt).await?;
        let items = parse_generated(&text)?;

        tracing::info!("Generated {} card(s) with {}", items.len(), self.model);
        Ok(items)
    }

    /// Send a prompt as-is and return the model's text reply.
    pub async fn complete_prompt(&self, prompt: &str) -> Result<String, GenerateError> {
        let api_key = self.api_key.as_deref().ok_or(GenerateError::MissingCredential)?;
        self.complete(api_key, prompt).await
    }

    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String, GenerateError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerateError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!("Gemini returned {}: {}", status, detail);
            return Err(GenerateError::Upstream(format!("status {}", status)));
        }

        let reply: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Upstream(e.to_string()))?;

        Ok(reply
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, Json, Router};

    /// Serve a canned Gemini reply on a random local port.
    async fn fake_gemini(status: StatusCode, reply: &'static str) -> String {
        let app = Router::new().fallback(move || async move {
            let body = serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": reply}], "role": "model"}}]
            });
            (status, Json(body))
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_parse_prose_wrapped_array() {
        let items = parse_generated(r#"Sure! [{"question":"Q","answer":"A"}]"#).unwrap();
        assert_eq!(items, vec![Item {
            id: 1,
            question: "Q".into(),
            answer: "A".into(),
            author: None,
            category: Some("自定义".into()),
        }]);
    }

    #[test]
    fn test_parse_assigns_sequential_ids_and_keeps_category() {
        let text = "```json\n[\n{\"question\":\"a\",\"answer\":\"b\",\"category\":\"历史\"},\n{\"question\":\"c\",\"answer\":\"d\",\"category\":\"\"}\n]\n```";
        let items = parse_generated(text).unwrap();
        assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(items[0].category.as_deref(), Some("历史"));
        assert_eq!(items[1].category.as_deref(), Some(DEFAULT_GENERATED_CATEGORY));
    }

    #[test]
    fn test_parse_without_array_is_format_error() {
        let err = parse_generated("I cannot help with that.").unwrap_err();
        assert!(matches!(err, GenerateError::UpstreamFormat(_)));
        assert_eq!(err.user_message(), "生成格式错误");
    }

    #[test]
    fn test_parse_bad_json_is_format_error() {
        let err = parse_generated("[{\"question\": }]").unwrap_err();
        assert!(matches!(err, GenerateError::UpstreamFormat(_)));
    }

    #[test]
    fn test_prompt_mentions_count_and_text() {
        let prompt = build_prompt("光合作用", 7);
        assert!(prompt.contains("7 道问答题"));
        assert!(prompt.contains("光合作用"));
    }

    #[tokio::test]
    async fn test_empty_input_checked_first() {
        let generator = CardGenerator::new("http://127.0.0.1:9", "m", None);
        let err = generator.generate("   ", 10).await.unwrap_err();
        assert!(matches!(err, GenerateError::EmptyInput));
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let generator = CardGenerator::new("http://127.0.0.1:9", "m", None);
        assert!(!generator.is_configured());
        let err = generator.generate("some text", 10).await.unwrap_err();
        assert!(matches!(err, GenerateError::MissingCredential));
    }

    #[tokio::test]
    async fn test_generate_against_fake_upstream() {
        let endpoint = fake_gemini(
            StatusCode::OK,
            "好的，以下是题目：[{\"question\":\"Q\",\"answer\":\"A\",\"category\":\"c\"}]",
        )
        .await;
        let generator = CardGenerator::new(endpoint, "test-model", Some("key".into()));

        let items = generator.generate("text", 1).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question, "Q");
        assert_eq!(items[0].category.as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let endpoint = fake_gemini(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
        let generator = CardGenerator::new(endpoint, "test-model", Some("key".into()));

        let err = generator.generate("text", 1).await.unwrap_err();
        assert!(matches!(err, GenerateError::Upstream(_)));
        assert_eq!(err.user_message(), "生成失败，请重试");
    }

    #[test]
    fn test_note_prompt_carries_note() {
        let prompt = build_note_prompt("\n1. 你若盛开，蝴蝶自来。\n");
        assert!(prompt.ends_with("1. 你若盛开，蝴蝶自来。"));
    }

    #[test]
    fn test_parse_note_cards_renumbers_and_cleans_authors() {
        let json = r#"[
            {"id": 7, "question": "Hard times", "answer": "build character.", "author": null},
            {"id": 7, "question": "你若盛开，", "answer": "蝴蝶自来。", "author": "null"},
            {"question": "学而时习之，", "answer": "不亦说乎？", "author": " 孔子 "}
        ]"#;
        let items = parse_note_cards(json).unwrap();
        assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(items[0].author, None);
        assert_eq!(items[1].author, None);
        assert_eq!(items[2].author.as_deref(), Some("孔子"));
        assert!(items.iter().all(|i| i.category.is_none()));
    }

    #[test]
    fn test_parse_note_cards_rejects_wrong_shape() {
        let err = parse_note_cards(r#"[{"question": "only"}]"#).unwrap_err();
        assert!(matches!(err, GenerateError::UpstreamFormat(_)));
    }

    #[tokio::test]
    async fn test_complete_prompt_requires_credential() {
        let generator = CardGenerator::new("http://127.0.0.1:9", "m", None);
        let err = generator.complete_prompt("hi").await.unwrap_err();
        assert!(matches!(err, GenerateError::MissingCredential));
    }

    #[tokio::test]
    async fn test_complete_prompt_returns_raw_text() {
        let endpoint = fake_gemini(StatusCode::OK, "```json\n[]\n```").await;
        let generator = CardGenerator::new(endpoint, "test-model", Some("key".into()));
        assert_eq!(generator.complete_prompt("hi").await.unwrap(), "```json\n[]\n```");
    }
}
