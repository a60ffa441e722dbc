//! Natural-language adherence insights and reminder sentences.
//!
//! Generation is delegated to a chat completion provider. Failures never
//! reach the caller: every adapter answers with a fixed fallback instead.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use medtrack_shared::insight::normalize_insights;
use medtrack_shared::{AiInsight, InsightRequest, ReminderRequest};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;

// ---------------------------------------------------------------------------
// Generator interface
// ---------------------------------------------------------------------------

#[async_trait]
pub trait InsightGenerator: Send + Sync {
    /// Zero to three insights about the given statistics.
    async fn generate_insights(&self, request: &InsightRequest) -> Vec<AiInsight>;

    /// One short reminder sentence for a scheduled dose.
    async fn generate_reminder(&self, request: &ReminderRequest) -> String;
}

/// Pick the provider-backed generator when an API key is configured.
pub fn from_config(config: &ServerConfig) -> Arc<dyn InsightGenerator> {
    let Some(api_key) = config.openai_api_key.clone() else {
        info!("No OPENAI_API_KEY configured, serving static insights");
        return Arc::new(StaticInsights);
    };

    match OpenAiInsights::new(
        &config.openai_base_url,
        api_key,
        &config.openai_model,
        config.ai_timeout,
    ) {
        Ok(generator) => {
            info!(model = %config.openai_model, "Insight generation enabled");
            Arc::new(generator)
        }
        Err(e) => {
            warn!(error = %e, "Could not build insight client, serving static insights");
            Arc::new(StaticInsights)
        }
    }
}

// ---------------------------------------------------------------------------
// Static adapter
// ---------------------------------------------------------------------------

/// Never calls out; always answers with the fallback values.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticInsights;

#[async_trait]
impl InsightGenerator for StaticInsights {
    async fn generate_insights(&self, _request: &InsightRequest) -> Vec<AiInsight> {
        vec![AiInsight::fallback()]
    }

    async fn generate_reminder(&self, request: &ReminderRequest) -> String {
        request.fallback_reminder()
    }
}

// ---------------------------------------------------------------------------
// Chat completion adapter
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider answered {0}")]
    Status(reqwest::StatusCode),

    #[error("Provider returned no message content")]
    EmptyResponse,

    #[error("Malformed content: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InsightsPayload {
    #[serde(default)]
    insights: Vec<AiInsight>,
}

#[derive(Debug, Deserialize)]
struct ReminderPayload {
    #[serde(default)]
    reminder: Option<String>,
}

/// Generator backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiInsights {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiInsights {
    pub fn new(
        base_url: &str,
        api_key: String,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, InsightError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model: model.to_string(),
        })
    }

    /// Send one user prompt, asking for a JSON object back, and return the
    /// message content.
    async fn complete(&self, prompt: String) -> Result<String, InsightError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "response_format": { "type": "json_object" },
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(InsightError::Status(resp.status()));
        }

        let chat: ChatResponse = resp.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(InsightError::EmptyResponse)
    }

    async fn try_insights(&self, request: &InsightRequest) -> Result<Vec<AiInsight>, InsightError> {
        let content = self.complete(insights_prompt(request)?).await?;
        parse_insights(&content)
    }

    async fn try_reminder(&self, request: &ReminderRequest) -> Result<String, InsightError> {
        let content = self.complete(reminder_prompt(request)).await?;
        parse_reminder(&content, request)
    }
}

#[async_trait]
impl InsightGenerator for OpenAiInsights {
    async fn generate_insights(&self, request: &InsightRequest) -> Vec<AiInsight> {
        match self.try_insights(request).await {
            Ok(insights) => {
                debug!(count = insights.len(), "Generated insights");
                insights
            }
            Err(e) => {
                warn!(error = %e, "Insight generation failed, using fallback");
                vec![AiInsight::fallback()]
            }
        }
    }

    async fn generate_reminder(&self, request: &ReminderRequest) -> String {
        match self.try_reminder(request).await {
            Ok(reminder) => reminder,
            Err(e) => {
                warn!(
                    error = %e,
                    medication = %request.medication_name,
                    "Reminder generation failed, using fallback"
                );
                request.fallback_reminder()
            }
        }
    }
}

fn insights_prompt(request: &InsightRequest) -> Result<String, InsightError> {
    let recent = serde_json::to_string(&request.recent_logs)?;
    Ok(format!(
        "You help busy professionals stay on top of their medication. \
         Review the statistics below and give two or three short, supportive, \
         actionable insights.\n\n\
         Weekly adherence: {}%\n\
         Doses missed today: {}\n\
         Active medications: {}\n\
         Today's doses: {}\n\n\
         Answer with a JSON object of the form \
         {{\"insights\": [{{\"type\": \"reminder|achievement|suggestion|warning\", \
         \"title\": \"short title\", \"message\": \"under 100 characters\", \
         \"priority\": \"low|medium|high\"}}]}}",
        request.adherence_rate, request.missed_today, request.active_medications, recent
    ))
}

fn reminder_prompt(request: &ReminderRequest) -> String {
    format!(
        "Write a friendly, encouraging medication reminder of at most 50 words.\n\n\
         Medication: {}\n\
         Scheduled time: {}\n\
         Context: {}\n\n\
         Answer with a JSON object of the form {{\"reminder\": \"...\"}}",
        request.medication_name, request.time, request.context
    )
}

/// A missing `insights` key yields an empty list.
fn parse_insights(content: &str) -> Result<Vec<AiInsight>, InsightError> {
    let payload: InsightsPayload = serde_json::from_str(content)?;
    Ok(normalize_insights(payload.insights))
}

/// A missing or blank `reminder` yields the default sentence.
fn parse_reminder(content: &str, request: &ReminderRequest) -> Result<String, InsightError> {
    let payload: ReminderPayload = serde_json::from_str(content)?;
    Ok(payload
        .reminder
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| request.default_reminder()))
}

#[cfg(test)]
mod tests {
    use axum::routing::post;
    use axum::{Json, Router};
    use medtrack_shared::{InsightKind, InsightPriority};

    use super::*;

    fn insight_request() -> InsightRequest {
        InsightRequest {
            adherence_rate: 80,
            missed_today: 1,
            active_medications: 2,
            recent_logs: Vec::new(),
        }
    }

    fn reminder_request() -> ReminderRequest {
        ReminderRequest {
            medication_name: "Metformin".into(),
            time: "08:00".into(),
            context: "before a client meeting".into(),
        }
    }

    /// Serve `content` as the message of a canned chat completion.
    async fn spawn_provider(content: serde_json::Value) -> String {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let content = content.clone();
                async move {
                    Json(serde_json::json!({
                        "choices": [{ "message": { "role": "assistant", "content": content } }]
                    }))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn client(base_url: &str) -> OpenAiInsights {
        OpenAiInsights::new(base_url, "sk-test".into(), "gpt-4o", Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_parse_insights() {
        let content = r#"{"insights":[
            {"type":"achievement","title":"Great week","message":"You took 80% of doses.","priority":"low"},
            {"type":"warning","title":"Missed dose","message":"You missed one dose today.","priority":"high"}
        ]}"#;
        let insights = parse_insights(content).unwrap();
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].kind, InsightKind::Achievement);
        assert_eq!(insights[1].priority, InsightPriority::High);

        assert!(parse_insights("{}").unwrap().is_empty());
        assert!(parse_insights("not json").is_err());
        assert!(parse_insights(r#"{"insights":[{"type":"shout"}]}"#).is_err());
    }

    #[test]
    fn test_parse_reminder() {
        let req = reminder_request();
        assert_eq!(
            parse_reminder(r#"{"reminder":"Metformin time!"}"#, &req).unwrap(),
            "Metformin time!"
        );
        assert_eq!(parse_reminder("{}", &req).unwrap(), req.default_reminder());
        assert!(parse_reminder("[", &req).is_err());
    }

    #[test]
    fn test_prompts_carry_statistics() {
        let prompt = insights_prompt(&insight_request()).unwrap();
        assert!(prompt.contains("Weekly adherence: 80%"));
        assert!(prompt.contains("Doses missed today: 1"));

        let prompt = reminder_prompt(&reminder_request());
        assert!(prompt.contains("Metformin"));
        assert!(prompt.contains("before a client meeting"));
    }

    #[tokio::test]
    async fn test_static_generator_returns_fallback() {
        let insights = StaticInsights.generate_insights(&insight_request()).await;
        assert_eq!(insights, vec![AiInsight::fallback()]);

        let reminder = StaticInsights.generate_reminder(&reminder_request()).await;
        assert_eq!(reminder, reminder_request().fallback_reminder());
    }

    #[tokio::test]
    async fn test_unreachable_provider_falls_back() {
        // Nothing listens on the discard port.
        let generator = client("http://127.0.0.1:9/v1");

        let insights = generator.generate_insights(&insight_request()).await;
        assert_eq!(insights, vec![AiInsight::fallback()]);

        let reminder = generator.generate_reminder(&reminder_request()).await;
        assert_eq!(reminder, reminder_request().fallback_reminder());
    }

    #[tokio::test]
    async fn test_provider_insights_are_capped() {
        let one = serde_json::json!({
            "type": "suggestion",
            "title": "Pair with a habit",
            "message": "Take your morning dose with coffee.",
            "priority": "medium"
        });
        let content = serde_json::json!({ "insights": [one, one, one, one] }).to_string();
        let base = spawn_provider(serde_json::Value::String(content)).await;

        let insights = client(&base).generate_insights(&insight_request()).await;
        assert_eq!(insights.len(), 3);
        assert_eq!(insights[0].title, "Pair with a habit");
    }

    #[tokio::test]
    async fn test_provider_malformed_content_falls_back() {
        let base = spawn_provider(serde_json::Value::String("sorry, no JSON".into())).await;
        let generator = client(&base);

        let insights = generator.generate_insights(&insight_request()).await;
        assert_eq!(insights, vec![AiInsight::fallback()]);

        let reminder = generator.generate_reminder(&reminder_request()).await;
        assert_eq!(reminder, reminder_request().fallback_reminder());
    }

    #[tokio::test]
    async fn test_provider_reminder() {
        let content = serde_json::json!({ "reminder": "Metformin at 8, then crush that meeting." });
        let base = spawn_provider(serde_json::Value::String(content.to_string())).await;

        let reminder = client(&base).generate_reminder(&reminder_request()).await;
        assert_eq!(reminder, "Metformin at 8, then crush that meeting.");
    }

    #[tokio::test]
    async fn test_from_config_without_key_is_static() {
        let generator = from_config(&ServerConfig::default());
        let insights = generator.generate_insights(&insight_request()).await;
        assert_eq!(insights, vec![AiInsight::fallback()]);
    }
}
