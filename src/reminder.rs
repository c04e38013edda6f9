//! # Reminder Text Generation
//!
//! Builds a natural-language prompt from a [`Profile`] and asks a
//! text-completion service for a hydration reminder schedule.
//!
//! ## Collaborator Seam
//!
//! The service sits behind the [`TextGenerator`] trait (prompt in, text or
//! error out). Production code uses [`CompletionsClient`], an OpenAI-style
//! `/completions` client configured from [`ApiConfig`]; tests substitute a
//! deterministic stub.
//!
//! ## Failure Handling
//!
//! [`request_reminder`] never fails. When the generator errors, the error's
//! description is inspected:
//! - contains "quota" (any case) → the fixed mock reminder
//! - anything else → the description behind a warning marker
//!
//! There is no retry. A failed call degrades once and the caller moves on.

use crate::config::ApiConfig;
use crate::Profile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Reminder shown when the completion service reports an exhausted quota.
pub const MOCK_REMINDER: &str =
    "💡 [Mock Reminder] Drink 200ml now, then take small sips every hour to stay hydrated.";

/// Prefix for reminders that carry an error description instead of advice.
pub const ERROR_MARKER: &str = "⚠️ AI Error:";

/// Errors raised by a [`TextGenerator`].
///
/// The `Display` text is what the quota check inspects, so API variants keep
/// the provider's own message verbatim.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// No credential configured (neither config file nor environment)
    #[error("no API key configured; set OPENAI_API_KEY or api.api_key")]
    MissingCredential,

    /// Transport failure (DNS, TLS, timeout, connection reset)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error status or error body
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be understood
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The response contained no completion choices
    #[error("response contained no completions")]
    EmptyCompletion,
}

/// Narrow interface to a text-generation service.
#[allow(async_fn_in_trait)]
pub trait TextGenerator {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// A reminder as shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderText {
    /// Trimmed text of the first completion
    Generated(String),
    /// The service reported an exhausted quota; [`MOCK_REMINDER`] is shown
    QuotaFallback,
    /// Any other failure; holds the raw error description
    ServiceError(String),
}

impl ReminderText {
    /// Text exactly as displayed and exported.
    pub fn text(&self) -> String {
        match self {
            ReminderText::Generated(text) => text.clone(),
            ReminderText::QuotaFallback => MOCK_REMINDER.to_string(),
            ReminderText::ServiceError(description) => format!("{ERROR_MARKER} {description}"),
        }
    }

    /// True when the text did not come from the generator.
    pub fn is_fallback(&self) -> bool {
        !matches!(self, ReminderText::Generated(_))
    }
}

impl fmt::Display for ReminderText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Render the reminder prompt for a profile.
///
/// Embeds age, lower-cased gender, activity level, weight, intake and
/// lower-cased climate.
///
/// # Example
/// ```
/// use hydro_lib::reminder::build_prompt;
/// use hydro_lib::{ActivityLevel, Climate, Gender, Profile};
///
/// let prompt = build_prompt(&Profile {
///     age: 25,
///     gender: Gender::Male,
///     weight_kg: 65.0,
///     activity: ActivityLevel::Low,
///     climate: Climate::Hot,
///     intake_l: 1.5,
/// });
/// assert!(prompt.starts_with("A 25-year-old male with Low activity weighs 65kg"));
/// assert!(prompt.contains("lives in a hot climate"));
/// ```
pub fn build_prompt(profile: &Profile) -> String {
    format!(
        "A {}-year-old {} with {} activity weighs {}kg, drank {}L water today, \
         and lives in a {} climate. Provide a friendly hydration reminder schedule \
         for the remaining day, including when and how much water to drink, \
         with motivational tone.",
        profile.age,
        profile.gender.label().to_lowercase(),
        profile.activity,
        profile.weight_kg,
        profile.intake_l,
        profile.climate.label().to_lowercase(),
    )
}

/// Map a generator failure description onto the displayed fallback.
pub fn degrade(description: &str) -> ReminderText {
    if description.to_lowercase().contains("quota") {
        ReminderText::QuotaFallback
    } else {
        ReminderText::ServiceError(description.to_string())
    }
}

/// Ask `generator` for a reminder, degrading to fixed text on failure.
pub async fn request_reminder<G: TextGenerator>(generator: &G, prompt: &str) -> ReminderText {
    match generator.generate(prompt).await {
        Ok(text) => ReminderText::Generated(text.trim().to_string()),
        Err(error) => {
            let description = error.to_string();
            let reminder = degrade(&description);
            if reminder == ReminderText::QuotaFallback {
                warn!("Completion quota exhausted, using mock reminder: {description}");
            } else {
                warn!("Completion request failed: {description}");
            }
            reminder
        }
    }
}

// -- OpenAI-style completions client --

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Text generator backed by an OpenAI-compatible `/completions` endpoint.
///
/// Generation parameters (model, token bound, temperature) are fixed at
/// construction from [`ApiConfig`].
pub struct CompletionsClient {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl CompletionsClient {
    /// Build a client from API configuration.
    ///
    /// A missing credential is not an error here; each [`generate`] call
    /// reports [`GenerationError::MissingCredential`] instead so the caller's
    /// fallback handling applies.
    ///
    /// [`generate`]: TextGenerator::generate
    pub fn new(config: &ApiConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hydro-tracker/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            endpoint: format!("{}/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TextGenerator for CompletionsClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredential)?;

        let body = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        debug!(
            "Completion request: model={}, max_tokens={}, temperature={}, prompt={} chars",
            self.model,
            self.max_tokens,
            self.temperature,
            prompt.len()
        );

        let start = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(
            "Completion response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        parse_completion(status.as_u16(), &text)
    }
}

/// Extract the first completion's text from a raw response.
pub fn parse_completion(status: u16, body: &str) -> Result<String, GenerationError> {
    let parsed = serde_json::from_str::<CompletionResponse>(body);

    if !(200..300).contains(&status) {
        let message = match parsed {
            Ok(CompletionResponse {
                error: Some(error), ..
            }) => error.message,
            _ => body.trim().to_string(),
        };
        return Err(GenerationError::Api { status, message });
    }

    let parsed = parsed.map_err(|e| GenerationError::Malformed(e.to_string()))?;
    if let Some(error) = parsed.error {
        return Err(GenerationError::Api {
            status,
            message: error.message,
        });
    }

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text)
        .ok_or(GenerationError::EmptyCompletion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActivityLevel, Climate, Gender};

    /// Generator returning a canned result
    struct Canned(Result<&'static str, &'static str>);

    impl TextGenerator for Canned {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.0
                .map(str::to_string)
                .map_err(|message| GenerationError::Malformed(message.to_string()))
        }
    }

    fn profile() -> Profile {
        Profile {
            age: 42,
            gender: Gender::Female,
            weight_kg: 58.5,
            activity: ActivityLevel::High,
            climate: Climate::Cold,
            intake_l: 0.75,
        }
    }

    #[test]
    fn test_prompt_embeds_profile_fields() {
        let prompt = build_prompt(&profile());
        assert!(prompt.contains("42-year-old female"));
        assert!(prompt.contains("with High activity"));
        assert!(prompt.contains("weighs 58.5kg"));
        assert!(prompt.contains("drank 0.75L water today"));
        assert!(prompt.contains("cold climate"));
        assert!(prompt.ends_with("with motivational tone."));
    }

    #[test]
    fn test_quota_description_yields_mock_reminder() {
        let reminder = degrade("Quota exceeded for this month");
        assert_eq!(reminder, ReminderText::QuotaFallback);
        assert_eq!(reminder.text(), MOCK_REMINDER);
        assert_eq!(degrade("You exceeded your current QUOTA"), ReminderText::QuotaFallback);
    }

    #[test]
    fn test_other_description_is_marked() {
        let reminder = degrade("network timeout");
        assert_eq!(reminder.text(), "⚠️ AI Error: network timeout");
        assert!(reminder.text().contains("network timeout"));
        assert!(reminder.is_fallback());
    }

    #[tokio::test]
    async fn test_request_reminder_trims_success() {
        let reminder = request_reminder(&Canned(Ok("  Drink a glass at 3pm.\n")), "p").await;
        assert_eq!(reminder, ReminderText::Generated("Drink a glass at 3pm.".to_string()));
        assert!(!reminder.is_fallback());
    }

    #[tokio::test]
    async fn test_request_reminder_degrades_failures() {
        let quota = request_reminder(&Canned(Err("Quota exceeded for this month")), "p").await;
        assert_eq!(quota, ReminderText::QuotaFallback);

        let other = request_reminder(&Canned(Err("network timeout")), "p").await;
        assert_eq!(
            other.text(),
            "⚠️ AI Error: malformed response: network timeout"
        );
    }

    #[tokio::test]
    async fn test_missing_credential_degrades_to_error_text() {
        let client = CompletionsClient::new(&ApiConfig::default()).unwrap();
        let reminder = request_reminder(&client, "p").await;
        assert!(matches!(reminder, ReminderText::ServiceError(_)));
        assert!(reminder.text().contains("no API key configured"));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = ApiConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..ApiConfig::default()
        };
        let client = CompletionsClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/completions");
    }

    #[test]
    fn test_parse_completion_success() {
        let body = r#"{"choices":[{"text":"\n\nSip 250ml every hour."},{"text":"x"}]}"#;
        assert_eq!(parse_completion(200, body).unwrap(), "\n\nSip 250ml every hour.");
    }

    #[test]
    fn test_parse_completion_quota_error_keeps_message() {
        let body = r#"{"error":{"message":"You exceeded your current quota, please check your plan.","type":"insufficient_quota"}}"#;
        let err = parse_completion(429, body).unwrap_err();
        assert!(matches!(err, GenerationError::Api { status: 429, .. }));
        assert_eq!(degrade(&err.to_string()), ReminderText::QuotaFallback);
    }

    #[test]
    fn test_parse_completion_non_json_error() {
        let err = parse_completion(502, "Bad Gateway").unwrap_err();
        assert_eq!(err.to_string(), "API error (HTTP 502): Bad Gateway");
    }

    #[test]
    fn test_parse_completion_empty_and_malformed() {
        assert!(matches!(
            parse_completion(200, r#"{"choices":[]}"#),
            Err(GenerationError::EmptyCompletion)
        ));
        assert!(matches!(
            parse_completion(200, "not json"),
            Err(GenerationError::Malformed(_))
        ));
    }
}
