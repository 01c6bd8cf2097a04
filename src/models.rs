use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Praise,
    Complaint,
    Neutral,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Praise => "praise",
            Category::Complaint => "complaint",
            Category::Neutral => "neutral",
        }
    }
}

/// A keyword/theme with a frequency-like weight and a sentiment category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedItem {
    pub label: String,
    pub weight: f64, // > 0 for anything that gets laid out
    pub category: Category,
}

impl WeightedItem {
    pub fn new(label: impl Into<String>, weight: f64, category: Category) -> Self {
        Self {
            label: label.into(),
            weight,
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedCircle {
    pub item: WeightedItem,
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub sequence_id: u32,
    pub label: String, // extracted date, or "Review N"
    pub score: f64,    // [-1.0, 1.0]
    pub excerpt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

/// The structured outcome of one analyze call, already validated at the
/// provider boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub overall_score: f64, // [-1.0, 1.0]
    pub review_count: u32,
    pub trend: Vec<TrendPoint>,
    pub keywords: Vec<WeightedItem>,
    pub summary: String,
    pub insights: Vec<Insight>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: u64, // unique, increasing in creation order
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// What a chat turn is allowed to know about the current analysis: the
/// executive summary and the insight list, nothing bulkier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    pub summary: String,
    pub insights: Vec<Insight>,
}

impl ChatContext {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            summary: result.summary.clone(),
            insights: result.insights.clone(),
        }
    }
}
