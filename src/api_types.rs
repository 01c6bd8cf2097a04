use serde::{Deserialize, Serialize};

/// Analysis payload exactly as the language model returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAnalysis {
    pub overall_score: f64,               // nominally -1..1, clamped on the way in
    #[serde(default)]
    pub review_count: Option<i64>,        // not always present
    pub sentiment_trend: Vec<ApiReviewPoint>,
    pub word_cloud_data: Vec<ApiWordNode>,
    pub executive_summary: String,
    pub actionable_insights: Vec<ApiInsight>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReviewPoint {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub date: Option<String>,             // extracted date or "Review N"
    pub sentiment_score: f64,
    #[serde(default)]
    pub excerpt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiWordNode {
    pub text: String,
    pub value: f64,                       // frequency count
    #[serde(rename = "type", default)]
    pub kind: String,                     // "praise" | "complaint" | "neutral"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiInsight {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: String,                 // "High" | "Medium" | "Low"
}

/* OpenAI-compatible chat completions */

#[derive(Debug, Clone, Serialize)]
pub struct ApiChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ApiResponseFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiMessage {
    pub role: String,                     // "system" | "user" | "assistant"
    pub content: String,
}

impl ApiMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiChatResponse {
    #[serde(default)]
    pub choices: Vec<ApiChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiChoice {
    pub message: ApiChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}
