// src/render.rs
use crate::models::{AnalysisResult, Category, ChatTurn, Priority, Role};

pub fn format_score(score: f64) -> String {
    if score > 0.0 {
        format!("+{:.2}", score)
    } else if score < 0.0 {
        format!("{:.2}", score)
    } else {
        "0.00".to_string()
    }
}

pub fn category_color(category: Category) -> &'static str {
    match category {
        Category::Praise => "#22c55e",
        Category::Complaint => "#ef4444",
        Category::Neutral => "#94a3b8",
    }
}

pub fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "High",
        Priority::Medium => "Medium",
        Priority::Low => "Low",
    }
}

pub fn priority_badge(priority: Priority) -> String {
    format!("{} PRIORITY", priority_label(priority).to_uppercase())
}

/// Label font size for a bubble of radius `r`.
pub fn bubble_font_size(r: f64) -> f64 {
    (r / 2.0).min(16.0)
}

pub fn render_report_markdown(r: &AnalysisResult) -> String {
    let mut md = String::new();
    md.push_str("# Customer Sentiment Report\n\n");

    md.push_str("## Overall Sentiment\n");
    md.push_str(&format!(
        "**{}** (based on {} reviews processed)\n\n",
        format_score(r.overall_score),
        r.review_count
    ));

    md.push_str("## Executive Summary\n");
    md.push_str(&format!("{}\n\n", r.summary.trim()));

    if !r.trend.is_empty() {
        md.push_str("## Sentiment Trend\n");
        md.push_str("| # | When | Score | Excerpt |\n|---|---|---|---|\n");
        for p in &r.trend {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                p.sequence_id,
                p.label,
                format_score(p.score),
                p.excerpt.replace('|', "\\|")
            ));
        }
        md.push('\n');
    }

    if !r.keywords.is_empty() {
        md.push_str("## Keywords\n");
        for (category, heading) in [
            (Category::Praise, "Praise"),
            (Category::Complaint, "Complaints"),
            (Category::Neutral, "Neutral"),
        ] {
            let words: Vec<String> = r
                .keywords
                .iter()
                .filter(|k| k.category == category)
                .map(|k| format!("{} ({})", k.label, k.weight))
                .collect();
            if !words.is_empty() {
                md.push_str(&format!("- **{}:** {}\n", heading, words.join(", ")));
            }
        }
        md.push('\n');
    }

    if !r.insights.is_empty() {
        md.push_str("## Strategic Insights\n");
        for i in &r.insights {
            md.push_str(&format!(
                "- **{}** [{}]: {}\n",
                i.title,
                priority_badge(i.priority),
                i.description
            ));
        }
    }

    md
}

pub fn render_transcript_markdown(turns: &[ChatTurn]) -> String {
    let mut md = String::new();
    md.push_str("# Data Assistant\n\n");
    for t in turns {
        let who = match t.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        md.push_str(&format!(
            "**{}** ({}):\n{}\n\n",
            who,
            t.created_at.format("%H:%M:%S"),
            t.text.trim()
        ));
    }
    md
}
