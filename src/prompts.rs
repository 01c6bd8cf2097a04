use crate::models::ChatContext;

pub const SYSTEM_ANALYSIS: &str =
    "You are a customer insights analyst. Reply with a single JSON object and nothing else.";

pub fn user_analysis(raw_reviews: &str) -> String {
    format!(r#"Analyze the batch of raw customer reviews below.

Tasks:
1. Score the sentiment of each review from -1.0 (negative) to 1.0 (positive).
2. Order the scores as a trend. Use dates found in the reviews; otherwise label them "Review N" in sequence.
3. Extract frequent keywords and classify each as praise, complaint or neutral.
4. Write a short executive summary.
5. Give exactly 3 actionable insights for the business.

Output JSON with:
{{
  "overallScore": number,             // average sentiment, -1..1
  "reviewCount": integer,             // number of reviews analyzed
  "sentimentTrend": [{{"id": integer, "date": "", "sentimentScore": number, "excerpt": ""}}],
  "wordCloudData": [{{"text": "", "value": integer, "type": "praise|complaint|neutral"}}],
  "executiveSummary": "",
  "actionableInsights": [{{"title": "", "description": "", "priority": "High|Medium|Low"}}]
}}

REVIEWS:
<{reviews}>"#, reviews = raw_reviews)
}

/// System instruction for a chat turn. Only the summary and the insight list
/// are embedded, never the trend or keyword arrays.
pub fn system_chat(context: Option<&ChatContext>) -> String {
    let mut out = String::from(
        "You are a helpful data analyst assistant helping a user understand their customer reviews.\n",
    );
    if let Some(ctx) = context {
        let summary = serde_json::to_string(&ctx.summary).unwrap_or_default();
        let insights = serde_json::to_string(&ctx.insights).unwrap_or_default();
        out.push_str(&format!(
            "Here is the analysis of the current dataset: {summary}\nTop insights: {insights}\n"
        ));
    }
    out.push_str("Be concise, professional, and insightful.");
    out
}
