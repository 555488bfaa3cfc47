//! Title, summary and tag generation.
//!
//! With an endpoint configured, outputs come from an OpenAI-style
//! chat-completion service; otherwise the deterministic offline
//! heuristics take over. Only tag generation survives a remote failure
//! (it falls back to the substring classifier); a failing title or
//! summary call fails the owning task.

use crate::{config, Error};

const TITLE_MAX_CHARS: usize = 20;
const SUMMARY_MAX_CHARS: usize = 120;
const MAX_TAGS: usize = 5;

/// Candidate vocabulary of the offline tag classifier.
const TAG_CANDIDATES: [&str; 10] = [
    "旅行", "美食", "学习", "日常", "运动", "音乐", "电影", "校园", "作业", "演示",
];
const DEFAULT_TAG: &str = "日常";
const TITLE_PLACEHOLDER: &str = "分享";

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn remote_endpoint() -> Option<&'static str> {
    config::INSTANCE
        .ai
        .endpoint
        .as_deref()
        .filter(|e| !e.is_empty())
}

/// A short label for the text, at most 20 characters.
pub async fn title(text: &str) -> crate::Result<String> {
    if let Some(endpoint) = remote_endpoint() {
        let raw = chat(
            endpoint,
            "你是一个内容运营助手。",
            &format!("根据以下内容生成一个不超过20个中文字符的标题，只输出标题：\n{text}"),
        )
        .await?;
        return Ok(truncate_chars(raw.trim(), TITLE_MAX_CHARS));
    }

    let base = if text.is_empty() {
        TITLE_PLACEHOLDER
    } else {
        text
    };
    Ok(truncate_chars(base, TITLE_MAX_CHARS))
}

/// Condense the text to at most 120 characters.
pub async fn summary(text: &str) -> crate::Result<String> {
    if let Some(endpoint) = remote_endpoint() {
        let raw = chat(
            endpoint,
            "你是一个内容助手。",
            &format!("请将以下内容总结为不超过120字的一段话，只输出总结：\n{text}"),
        )
        .await?;
        return Ok(truncate_chars(raw.trim(), SUMMARY_MAX_CHARS));
    }
    Ok(truncate_chars(text, SUMMARY_MAX_CHARS))
}

/// Tags for the text.
///
/// A remote failure falls back to the offline classifier instead of
/// failing the owning task.
pub async fn tags(text: &str) -> Vec<String> {
    if let Some(endpoint) = remote_endpoint() {
        match chat(
            endpoint,
            "你是一个内容标签助手。",
            &format!("为以下内容生成 3~5 个中文标签，返回 JSON 数组：\n{text}"),
        )
        .await
        {
            Ok(raw) => return parse_tags(&raw),
            Err(err) => {
                tracing::warn!("remote tag generation failed, using the classifier: {err}")
            }
        }
    }
    classify_tags(text)
}

/// Substring classifier over the fixed vocabulary: capped at five tags,
/// default tag when nothing matches.
pub(crate) fn classify_tags(text: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for candidate in TAG_CANDIDATES {
        if text.contains(candidate) {
            tags.push(candidate.to_string());
        }
    }
    if tags.is_empty() {
        tags.push(DEFAULT_TAG.to_string());
    }
    tags.truncate(MAX_TAGS);
    tags
}

/// Parse a tag list out of a free-form model reply: a JSON array when
/// the model obliged, delimiter splitting otherwise.
pub(crate) fn parse_tags(raw: &str) -> Vec<String> {
    if let Ok(serde_json::Value::Array(items)) = serde_json::from_str::<serde_json::Value>(raw) {
        return items
            .iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s.trim().to_string()),
                other => Some(other.to_string()),
            })
            .filter(|tag| !tag.is_empty())
            .take(MAX_TAGS)
            .collect();
    }

    raw.chars()
        .filter(|c| !matches!(c, '[' | ']' | '"' | '\''))
        .collect::<String>()
        .split(|c: char| c == ',' || c == '，' || c.is_whitespace())
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .take(MAX_TAGS)
        .map(str::to_string)
        .collect()
}

/// One chat-completion round trip against the configured service.
async fn chat(endpoint: &str, system: &str, user: &str) -> crate::Result<String> {
    let ai = &config::INSTANCE.ai;
    let response = reqwest::Client::new()
        .post(format!("{endpoint}/v1/chat/completions"))
        .bearer_auth(&ai.api_key)
        .json(&serde_json::json!({
            "model": ai.model,
            "temperature": ai.temperature,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(Error::TextGeneration(format!(
            "HTTP {}: {}",
            response.status(),
            response.text().await.unwrap_or_default()
        )));
    }

    let body: serde_json::Value = response.json().await?;
    match body
        .pointer("/choices/0/message/content")
        .and_then(|content| content.as_str())
    {
        Some(content) if !content.is_empty() => Ok(content.to_string()),
        _ => Err(Error::TextGeneration("empty completion".to_string())),
    }
}
