//! Single-phase structured diagnosis: one non-streamed call whose reply must
//! contain a JSON object of a fixed shape.

use std::sync::Arc;
use std::time::Duration;

use futures_timer::Delay;
use hcommon::{Deadline, GenerationOptions};
use hprovider::{
    Message, ModelProvider, ModelRequest, NoopOperationHooks, ProviderOperation,
    ProviderOperationHooks, RetryPolicy, execute_with_retry,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::deadline::within_deadline;
use crate::json::{extract_json_object, preview};
use crate::orchestrator::{DEFAULT_CYCLE_TIMEOUT, DEFAULT_MODEL};
use crate::prompts::{DIAGNOSIS_SYSTEM_PROMPT, diagnosis_user_prompt};
use crate::ChatError;

const RAW_PREVIEW_CHARS: usize = 200;

fn default_severity() -> String {
    "中等".to_string()
}

fn default_duration() -> String {
    "1-2天".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiagnosisRequest {
    pub symptoms: Vec<String>,
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default = "default_duration")]
    pub duration: String,
    #[serde(default)]
    pub additional_info: Option<String>,
}

impl DiagnosisRequest {
    pub fn new(symptoms: Vec<String>) -> Self {
        Self {
            symptoms,
            severity: default_severity(),
            duration: default_duration(),
            additional_info: None,
        }
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = severity.into();
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    pub fn with_additional_info(mut self, additional_info: impl Into<String>) -> Self {
        self.additional_info = Some(additional_info.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PossibleDisease {
    pub name: String,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Recommendations {
    pub immediate_actions: Vec<String>,
    pub lifestyle_advice: Vec<String>,
    pub when_to_see_doctor: Vec<String>,
    pub prevention_tips: Vec<String>,
}

/// Typed view of a diagnosis reply. Missing or mistyped fields are left at
/// their defaults instead of failing the whole report.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DiagnosisReport {
    pub urgency_level: String,
    pub possible_diseases: Vec<PossibleDisease>,
    pub recommended_departments: Vec<String>,
    pub analysis: String,
    pub recommendations: Recommendations,
}

impl DiagnosisReport {
    pub fn from_value(value: &Value) -> Self {
        let recommendations = value.get("recommendations");
        let list = |key: &str| string_list(recommendations.and_then(|section| section.get(key)));

        Self {
            urgency_level: string_field(value.get("urgency_level")),
            possible_diseases: value
                .get("possible_diseases")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(possible_disease).collect())
                .unwrap_or_default(),
            recommended_departments: string_list(value.get("recommended_departments")),
            analysis: string_field(value.get("analysis")),
            recommendations: Recommendations {
                immediate_actions: list("immediate_actions"),
                lifestyle_advice: list("lifestyle_advice"),
                when_to_see_doctor: list("when_to_see_doctor"),
                prevention_tips: list("prevention_tips"),
            },
        }
    }
}

fn string_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| string_field(Some(item)))
            .collect(),
        Some(Value::String(text)) => vec![text.clone()],
        _ => Vec::new(),
    }
}

fn possible_disease(value: &Value) -> PossibleDisease {
    let confidence = match value.get("confidence") {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    };

    PossibleDisease {
        name: string_field(value.get("name")),
        confidence,
    }
}

/// A parsed diagnosis with the JSON object it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosis {
    pub report: DiagnosisReport,
    pub raw: Value,
}

/// Parses a diagnosis out of the model's reply text.
pub fn parse_diagnosis(text: &str) -> Result<Diagnosis, ChatError> {
    let span = extract_json_object(text.trim()).ok_or_else(|| {
        ChatError::malformed_payload(format!(
            "no JSON object found in model reply; raw reply: {}",
            preview(text, RAW_PREVIEW_CHARS)
        ))
    })?;

    let raw = serde_json::from_str::<Value>(span).map_err(|err| {
        ChatError::malformed_payload(format!(
            "model reply is not valid JSON: {err}; raw reply: {}",
            preview(text, RAW_PREVIEW_CHARS)
        ))
    })?;

    Ok(Diagnosis {
        report: DiagnosisReport::from_value(&raw),
        raw,
    })
}

#[derive(Clone)]
pub struct DiagnosisRequester {
    provider: Arc<dyn ModelProvider>,
    model: String,
    options: GenerationOptions,
    retry_policy: RetryPolicy,
    timeout: Option<Duration>,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
}

impl std::fmt::Debug for DiagnosisRequester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosisRequester")
            .field("provider", &self.provider.id())
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl DiagnosisRequester {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            model: DEFAULT_MODEL.to_string(),
            options: GenerationOptions::default(),
            retry_policy: RetryPolicy::default(),
            timeout: Some(DEFAULT_CYCLE_TIMEOUT),
            provider_hooks: Arc::new(NoopOperationHooks),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options.with_streaming(false);
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_provider_hooks(mut self, provider_hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.provider_hooks = provider_hooks;
        self
    }

    pub async fn diagnose(&self, request: &DiagnosisRequest) -> Result<Diagnosis, ChatError> {
        if request.symptoms.iter().all(|symptom| symptom.trim().is_empty()) {
            return Err(ChatError::invalid_request("symptoms must not be empty"));
        }

        let model_request = ModelRequest::new(
            self.model.clone(),
            vec![
                Message::system(DIAGNOSIS_SYSTEM_PROMPT),
                Message::user(diagnosis_user_prompt(request)),
            ],
        )
        .with_options(self.options);

        let provider = self.provider.as_ref();
        let call = execute_with_retry(
            provider.id(),
            ProviderOperation::Complete,
            &self.retry_policy,
            self.provider_hooks.as_ref(),
            |_| provider.complete(model_request.clone()),
            Delay::new,
        );

        let response = within_deadline(call, self.timeout.map(Deadline::after))
            .await
            .ok_or_else(|| ChatError::timeout("diagnosis request exceeded its deadline"))??;

        if !response.is_success() {
            return Err(ChatError::from(response.status_error()));
        }

        let content = response
            .first_content()
            .ok_or_else(|| ChatError::protocol("diagnosis response carried no content"))?;

        parse_diagnosis(content)
    }
}
