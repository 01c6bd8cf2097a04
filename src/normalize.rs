use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

use crate::api_types::{ApiAnalysis, ApiInsight, ApiReviewPoint, ApiWordNode};
use crate::error::ProviderError;
use crate::models::{AnalysisResult, Category, Insight, Priority, TrendPoint, WeightedItem};

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n(?P<body>.*?)\n?\s*```\s*$")
        .expect("code fence pattern is valid")
});

/// Models sometimes wrap JSON in a Markdown fence even when asked not to.
pub fn strip_code_fences(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.name("body")) {
        Some(body) => body.as_str(),
        None => text.trim(),
    }
}

/// Decode raw provider text into a validated result.
pub fn parse_analysis_json(text: &str) -> Result<AnalysisResult, ProviderError> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    let api: ApiAnalysis = serde_json::from_str(body)?;
    normalize_analysis(api)
}

pub fn normalize_analysis(api: ApiAnalysis) -> Result<AnalysisResult, ProviderError> {
    if !api.overall_score.is_finite() {
        return Err(ProviderError::MalformedResponse(format!(
            "overallScore is not a finite number ({})",
            api.overall_score
        )));
    }

    let trend: Vec<TrendPoint> = api
        .sentiment_trend
        .into_iter()
        .enumerate()
        .map(|(idx, p)| normalize_point(idx, p))
        .collect();

    let review_count = match api.review_count {
        Some(n) if n < 0 => {
            warn!("Negative reviewCount from provider - value={}, using 0", n);
            0
        }
        Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
        None => {
            debug!("reviewCount missing - defaulting to trend length {}", trend.len());
            trend.len() as u32
        }
    };

    let before = api.word_cloud_data.len();
    let keywords: Vec<WeightedItem> = api
        .word_cloud_data
        .into_iter()
        .filter_map(normalize_word)
        .collect();
    if keywords.len() < before {
        debug!("Keywords with empty labels dropped - removed={}", before - keywords.len());
    }

    let insights = api.actionable_insights.into_iter().map(normalize_insight).collect();

    Ok(AnalysisResult {
        overall_score: clamp_score(api.overall_score),
        review_count,
        trend,
        keywords,
        summary: api.executive_summary.trim().to_string(),
        insights,
    })
}

fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

fn normalize_point(idx: usize, p: ApiReviewPoint) -> TrendPoint {
    let position = idx as u32 + 1;
    let label = p
        .date
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("Review {position}"));
    TrendPoint {
        sequence_id: p
            .id
            .and_then(|id| u32::try_from(id).ok())
            .unwrap_or(position),
        label,
        score: clamp_score(p.sentiment_score),
        excerpt: p.excerpt.trim().to_string(),
    }
}

fn normalize_label(s: &str) -> String {
    s.nfc().collect::<String>().trim().to_string()
}

fn normalize_word(w: ApiWordNode) -> Option<WeightedItem> {
    let label = normalize_label(&w.text);
    if label.is_empty() {
        return None;
    }
    // Weight validity is the layout's concern; keep whatever the provider sent.
    Some(WeightedItem::new(label, w.value, parse_category(&w.kind)))
}

pub fn parse_category(s: &str) -> Category {
    match s.trim().to_ascii_lowercase().as_str() {
        "praise" => Category::Praise,
        "complaint" => Category::Complaint,
        _ => Category::Neutral,
    }
}

pub fn parse_priority(s: &str) -> Priority {
    match s.trim().to_ascii_lowercase().as_str() {
        "high" => Priority::High,
        "medium" => Priority::Medium,
        _ => Priority::Low,
    }
}

fn normalize_insight(i: ApiInsight) -> Insight {
    Insight {
        title: i.title.trim().to_string(),
        description: i.description.trim().to_string(),
        priority: parse_priority(&i.priority),
    }
}
