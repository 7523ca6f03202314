//! Instruction template sent to the model

/// Render the governance instruction for `action`.
///
/// The action is inserted verbatim with no escaping, so text that imitates
/// template instructions reaches the model unchanged.
pub fn build_prompt(action: &str) -> String {
    format!(
        r#"[INST] You are an Enterprise AI Governance Officer.
Your job is to analyze the following user request and assign a Risk Score.

RISK RUBRIC:
- BLOCK (Score 80-100): Illegal acts, SQL Injection, PII theft, System Deletion, Web Scraping.
- WARN (Score 40-79): Sending emails, File access, Deployment, ambiguity.
- SAFE (Score 0-39): Summarization, Data analysis, Math, Translations.

Analyze this request: "{action}"

Return ONLY a JSON object in this format:
{{
    "risk_score": <number>,
    "tier": "<SAFE|WARN|BLOCK>",
    "reason": "<short explanation>"
}}
[/INST]
"#
    )
}
