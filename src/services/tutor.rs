use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

const DEFAULT_MODEL: &str = "gemini-pro";
const DEFAULT_API_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_MS: u64 = 60_000;
const MAX_RETRIES: usize = 3;
const BASE_BACKOFF_MS: u64 = 200;

const HIGH_RATE_BAR: f64 = 80.0;
const MEDIUM_RATE_BAR: f64 = 60.0;

#[derive(Debug, Clone)]
pub struct TutorConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_endpoint: String,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum TutorError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty response")]
    EmptyCandidates,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .parts
            .first()
            .map(|part| part.text.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidatePart {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub title: String,
    pub content: String,
    pub exercises: Vec<String>,
    pub suggested_duration: String,
    pub learning_objectives: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalysis {
    pub overall_performance: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub predicted_outcome: String,
    pub intervention_needed: bool,
}

/// Prompt-template wrapper around the generative-language API. Falls back
/// to canned responses when no API key is configured, so the tutor keeps
/// answering in development setups.
#[derive(Clone)]
pub struct TutorService {
    config: TutorConfig,
    client: reqwest::Client,
}

impl TutorService {
    pub fn from_env() -> Self {
        let api_key = env_string("GEMINI_API_KEY");
        let model = env_string("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_endpoint = env_string("GEMINI_API_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();
        let timeout =
            Duration::from_millis(env_u64("GEMINI_TIMEOUT").unwrap_or(DEFAULT_TIMEOUT_MS));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            config: TutorConfig {
                api_key,
                model,
                api_endpoint,
                timeout,
            },
            client,
        }
    }

    pub fn is_live(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    pub async fn chat_reply(
        &self,
        message: &str,
        subject: &str,
        learning_rate: f64,
        history: &[String],
        context: Option<&str>,
    ) -> Result<String, TutorError> {
        let Some(api_key) = self.live_key() else {
            return Ok(mock_chat_reply(subject, learning_rate));
        };

        let prompt = build_tutor_prompt(message, subject, learning_rate, history, context);
        self.generate(&api_key, &prompt).await
    }

    pub async fn generate_content(
        &self,
        topic: &str,
        difficulty: &str,
        content_type: &str,
        target_audience: Option<&str>,
    ) -> Result<GeneratedContent, TutorError> {
        let Some(api_key) = self.live_key() else {
            return Ok(mock_content(topic, difficulty, content_type));
        };

        let prompt = build_content_prompt(topic, difficulty, content_type, target_audience);
        let body = self.generate(&api_key, &prompt).await?;

        let mut content = mock_content(topic, difficulty, content_type);
        content.content = body;
        Ok(content)
    }

    /// The upstream service never shipped a live implementation for this
    /// one; the canned analysis is the contract.
    pub fn analyze_performance(&self, subject: &str) -> PerformanceAnalysis {
        PerformanceAnalysis {
            overall_performance: "Good progress with room for improvement".to_string(),
            strengths: vec![
                format!("Strong understanding of basic {subject} concepts"),
                "Consistent engagement with course material".to_string(),
                "Good problem-solving approach".to_string(),
            ],
            weaknesses: vec![
                format!("Needs more practice with advanced {subject} topics"),
                "Could benefit from more interactive exercises".to_string(),
                "Occasional gaps in foundational knowledge".to_string(),
            ],
            recommendations: vec![
                format!("Focus on {subject} practice problems"),
                "Increase interaction with AI tutor".to_string(),
                "Review previous concepts before moving forward".to_string(),
            ],
            predicted_outcome: "With consistent effort, student should achieve B+ grade"
                .to_string(),
            intervention_needed: false,
        }
    }

    fn live_key(&self) -> Option<String> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, TutorError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.api_endpoint, self.config.model, api_key
        );
        let payload = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self.post_with_retry(&url, &payload).await?;
        response
            .first_text()
            .map(|text| text.trim().to_string())
            .ok_or(TutorError::EmptyCandidates)
    }

    async fn post_with_retry(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<GenerateResponse, TutorError> {
        let mut last_error: Option<TutorError> = None;

        for retry in 0..=MAX_RETRIES {
            match self.client.post(url).json(payload).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let bytes = resp.bytes().await?;
                        return serde_json::from_slice(&bytes).map_err(TutorError::Json);
                    }

                    let body = resp.text().await.unwrap_or_default();
                    let err = TutorError::HttpStatus { status, body };
                    if retry < MAX_RETRIES && is_retryable(status) {
                        warn!(retry, ?status, "tutor request failed, retrying");
                        sleep(backoff(retry)).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(err) => {
                    let err = TutorError::Request(err);
                    if retry < MAX_RETRIES {
                        warn!(retry, "tutor request error, retrying");
                        sleep(backoff(retry)).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
            }
        }

        Err(last_error.unwrap_or(TutorError::EmptyCandidates))
    }
}

fn build_tutor_prompt(
    message: &str,
    subject: &str,
    learning_rate: f64,
    history: &[String],
    context: Option<&str>,
) -> String {
    format!(
        "You are Ilm, an AI tutor specialized in personalized learning.\n\
         \n\
         Student Context:\n\
         - Subject: {subject}\n\
         - Learning Rate: {rate}% (1-100 scale)\n\
         - Chat History Summary: {history}\n\
         - Additional Context: {context}\n\
         \n\
         Learning Rate Guidelines:\n\
         - If learning rate > 80: Provide concise, challenging content\n\
         - If learning rate 60-80: Provide balanced explanations with examples\n\
         - If learning rate < 60: Provide detailed, step-by-step explanations\n\
         \n\
         Student Question: {message}\n\
         \n\
         Provide a helpful, personalized response that matches the student's learning level.",
        rate = format_rate(learning_rate),
        history = history.join("; "),
        context = context.unwrap_or("None"),
    )
}

fn build_content_prompt(
    topic: &str,
    difficulty: &str,
    content_type: &str,
    target_audience: Option<&str>,
) -> String {
    format!(
        "Write {content_type} learning material about {topic} at {difficulty} level\
         {audience}. Keep it focused and practical, with concrete examples.",
        audience = target_audience
            .map(|audience| format!(" for {audience}"))
            .unwrap_or_default(),
    )
}

fn mock_chat_reply(subject: &str, learning_rate: f64) -> String {
    let high = [
        "Great question! Since you're doing well, let's dive deeper. Here's the advanced concept...",
        "Excellent progress! You're ready for more challenging material. Consider this advanced perspective...",
        "Your strong performance allows us to explore complex applications. Here's how this connects to...",
    ];
    let medium = [
        "Good question! Let me explain this step by step with some examples...",
        "I can see you're making steady progress. Here's a balanced explanation with practical examples...",
        "This is a great learning opportunity. Let me break this down with clear examples...",
    ];
    let low = [
        "Don't worry, let's take this slowly and build your understanding step by step...",
        "This is a common question! Let me explain this very clearly with simple examples...",
        "Great that you're asking questions! Let's start with the basics and work our way up...",
    ];

    let pool: &[&str] = if learning_rate > HIGH_RATE_BAR {
        &high
    } else if learning_rate > MEDIUM_RATE_BAR {
        &medium
    } else {
        &low
    };

    let pick = rand::rng().random_range(0..pool.len());
    format!(
        "{} The key concept about {subject} is that it builds on fundamental principles. \
         Based on your current learning rate of {rate}%, I've tailored this explanation to match your level.",
        pool[pick],
        rate = format_rate(learning_rate),
    )
}

fn mock_content(topic: &str, difficulty: &str, content_type: &str) -> GeneratedContent {
    GeneratedContent {
        title: format!("{content_type}: {topic}"),
        content: format!(
            "This is AI-generated content about {topic} at {difficulty} level. \
             The content has been adapted for {content_type} format and includes interactive elements."
        ),
        exercises: vec![
            format!("Practice problem 1 about {topic}"),
            format!("Practice problem 2 about {topic}"),
            format!("Challenge question about {topic}"),
        ],
        suggested_duration: "30-45 minutes".to_string(),
        learning_objectives: vec![
            format!("Understand core concepts of {topic}"),
            format!("Apply {topic} principles to solve problems"),
            format!("Analyze real-world applications of {topic}"),
        ],
    }
}

fn format_rate(rate: f64) -> String {
    if rate.fract() == 0.0 {
        format!("{}", rate as i64)
    } else {
        format!("{rate:.2}")
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.parse().ok()
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn backoff(retry: usize) -> Duration {
    Duration::from_millis(BASE_BACKOFF_MS * (1 << retry))
}
