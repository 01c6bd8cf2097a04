// src/viz_export.rs
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::{fs, path::Path};

use crate::models::{AnalysisResult, Bounds, PackedCircle};
use crate::render::{bubble_font_size, category_color, priority_badge, priority_label};

/* -------------------------------------------------------------------------- */
/* Entry point                                                                */
/* -------------------------------------------------------------------------- */

pub const VIZ_FILES: [&str; 3] = ["viz.trend.json", "viz.keywords.json", "viz.insights.json"];

/// Public entry point: write the D3-ready chart JSONs into `out_dir`.
pub fn write_all_viz(
    out_dir: &Path,
    result: &AnalysisResult,
    circles: &[PackedCircle], // already packed for `bounds`
    bounds: Bounds,
    padding: f64,
) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("create {:?}", out_dir))?;

    // 1) Sentiment trend line
    let trend = build_trend(result);
    write_json(out_dir.join(VIZ_FILES[0]), &trend)?;

    // 2) Keyword bubbles
    let keywords = build_keywords(circles, bounds, padding);
    write_json(out_dir.join(VIZ_FILES[1]), &keywords)?;

    // 3) Insight cards
    let insights = build_insights(result);
    write_json(out_dir.join(VIZ_FILES[2]), &insights)?;

    // 4) Index
    let idx = json!({
        "version": 1,
        "overall_score": result.overall_score,
        "counts": {
            "reviews": result.review_count,
            "trend_points": result.trend.len(),
            "keywords": circles.len(),
            "insights": result.insights.len(),
        },
        "files": VIZ_FILES,
    });
    write_json(out_dir.join("viz.index.json"), &idx)?;

    Ok(())
}

pub fn write_json<P: AsRef<Path>, T: ?Sized + Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("write {}", path.display()))
}

/* -------------------------------------------------------------------------- */
/* 1) Trend                                                                   */
/* -------------------------------------------------------------------------- */

#[derive(Serialize)]
struct VTrendPoint {
    id: u32,
    label: String,
    score: f64,
    excerpt: String,
}

#[derive(Serialize)]
struct VTrend {
    domain: [f64; 2],     // y axis, fixed
    reference_line: f64,  // neutral sentiment
    points: Vec<VTrendPoint>,
}

fn build_trend(result: &AnalysisResult) -> VTrend {
    VTrend {
        domain: [-1.0, 1.0],
        reference_line: 0.0,
        points: result
            .trend
            .iter()
            .map(|p| VTrendPoint {
                id: p.sequence_id,
                label: p.label.clone(),
                score: p.score,
                excerpt: p.excerpt.clone(),
            })
            .collect(),
    }
}

/* -------------------------------------------------------------------------- */
/* 2) Keyword bubbles                                                         */
/* -------------------------------------------------------------------------- */

#[derive(Serialize)]
struct VBubble {
    label: String,
    weight: f64,
    category: &'static str,
    color: &'static str,
    x: f64,
    y: f64,
    r: f64,
    font_size: f64,
    tooltip: String,
}

#[derive(Serialize)]
struct VKeywords {
    width: f64,
    height: f64,
    padding: f64,
    state: &'static str, // ready | no_data
    bubbles: Vec<VBubble>,
}

fn build_keywords(circles: &[PackedCircle], bounds: Bounds, padding: f64) -> VKeywords {
    let bubbles: Vec<VBubble> = circles
        .iter()
        .map(|c| VBubble {
            label: c.item.label.clone(),
            weight: c.item.weight,
            category: c.item.category.as_str(),
            color: category_color(c.item.category),
            x: c.center_x,
            y: c.center_y,
            r: c.radius,
            font_size: bubble_font_size(c.radius),
            tooltip: format!(
                "{}: {}\nFrequency: {}",
                c.item.category.as_str().to_uppercase(),
                c.item.label,
                c.item.weight
            ),
        })
        .collect();

    VKeywords {
        width: bounds.width,
        height: bounds.height,
        padding,
        state: if bubbles.is_empty() { "no_data" } else { "ready" },
        bubbles,
    }
}

/* -------------------------------------------------------------------------- */
/* 3) Insights                                                                */
/* -------------------------------------------------------------------------- */

#[derive(Serialize)]
struct VInsight {
    title: String,
    description: String,
    priority: &'static str,
    badge: String,
}

#[derive(Serialize)]
struct VInsights {
    summary: String,
    insights: Vec<VInsight>,
}

fn build_insights(result: &AnalysisResult) -> VInsights {
    VInsights {
        summary: result.summary.clone(),
        insights: result
            .insights
            .iter()
            .map(|i| VInsight {
                title: i.title.clone(),
                description: i.description.clone(),
                priority: priority_label(i.priority),
                badge: priority_badge(i.priority),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::pack;
    use crate::provider::test_support::sample_result;

    fn read(dir: &Path, name: &str) -> serde_json::Value {
        serde_json::from_slice(&fs::read(dir.join(name)).unwrap()).unwrap()
    }

    #[test]
    fn writes_full_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let result = sample_result("S");
        let bounds = Bounds::new(640.0, 400.0);
        let circles = pack(&result.keywords, bounds, 3.0);

        write_all_viz(dir.path(), &result, &circles, bounds, 3.0).unwrap();

        let idx = read(dir.path(), "viz.index.json");
        assert_eq!(idx["counts"]["keywords"], 2);
        assert_eq!(idx["files"].as_array().unwrap().len(), 3);

        let trend = read(dir.path(), "viz.trend.json");
        assert_eq!(trend["domain"], json!([-1.0, 1.0]));
        assert_eq!(trend["points"][1]["label"], "10/02");

        let kw = read(dir.path(), "viz.keywords.json");
        assert_eq!(kw["state"], "ready");
        assert_eq!(kw["bubbles"][0]["label"], "fast");
        assert_eq!(kw["bubbles"][0]["color"], "#22c55e");
        assert_eq!(kw["bubbles"][1]["category"], "complaint");

        let ins = read(dir.path(), "viz.insights.json");
        assert_eq!(ins["insights"][0]["badge"], "HIGH PRIORITY");
    }

    #[test]
    fn empty_layout_is_marked_no_data() {
        let kw = build_keywords(&[], Bounds::new(640.0, 400.0), 3.0);
        assert_eq!(kw.state, "no_data");
        assert!(kw.bubbles.is_empty());
    }
}
