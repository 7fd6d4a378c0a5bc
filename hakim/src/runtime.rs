//! Runtime wiring from a loaded [`HakimConfig`].

use std::sync::Arc;

use hchat::{ConversationOrchestrator, DiagnosisRequester};
use hobserve::{SafeOrchestrationHooks, SafeProviderHooks, SafeToolHooks, TracingObservabilityHooks};
use hprovider::ModelProvider;
use htooling::{DefaultToolDispatcher, ToolRegistry};
use reqwest::Client;

use crate::tools::{AmapWeatherSource, CityCodeLookup, WeatherTool};
use crate::{HakimConfig, HakimError};

/// Everything a host needs to answer chat and diagnosis requests. Cheap to
/// clone and safe to share across concurrent requests.
#[derive(Debug, Clone)]
pub struct HakimRuntime {
    pub orchestrator: ConversationOrchestrator,
    pub diagnosis: DiagnosisRequester,
    pub tools: Arc<ToolRegistry>,
}

/// Builds the DashScope-backed runtime with the weather tool registered.
#[cfg(feature = "provider-dashscope")]
pub fn build_runtime(config: &HakimConfig) -> Result<HakimRuntime, HakimError> {
    let provider = dashscope_provider(config)?;
    let registry = default_registry(config)?;
    Ok(build_runtime_with(config, provider, registry))
}

#[cfg(feature = "provider-dashscope")]
pub fn dashscope_provider(config: &HakimConfig) -> Result<Arc<dyn ModelProvider>, HakimError> {
    use hprovider::SecureCredentialManager;
    use hprovider::adapters::dashscope::{DashScopeHttpTransport, DashScopeProvider};

    let api_key = config.model.api_key.as_ref().ok_or_else(|| {
        HakimError::credentials(format!(
            "no DashScope API key: set {} or model.api_key",
            crate::config::DASHSCOPE_API_KEY_VAR
        ))
    })?;

    let credentials = Arc::new(SecureCredentialManager::new());
    credentials.set_dashscope_api_key(api_key.expose())?;

    let http = Client::builder()
        .build()
        .map_err(|err| HakimError::configuration(format!("building HTTP client: {err}")))?;
    let transport = DashScopeHttpTransport::new(http).with_endpoint(config.model.base_url.trim());

    Ok(Arc::new(
        DashScopeProvider::new(credentials, Arc::new(transport))
            .with_fallback_model(config.model.name.clone()),
    ))
}

/// Loads the city-code table named by the configuration, or an empty one.
pub fn city_codes(config: &HakimConfig) -> Result<CityCodeLookup, HakimError> {
    match config.weather.city_codes_path.as_deref() {
        Some(path) if !path.trim().is_empty() => CityCodeLookup::load_csv(path.trim()),
        _ => {
            tracing::warn!(
                phase = "runtime",
                event = "city_codes_missing",
                "no city code table configured; every weather lookup will fail"
            );
            Ok(CityCodeLookup::new())
        }
    }
}

pub fn default_registry(config: &HakimConfig) -> Result<ToolRegistry, HakimError> {
    if config.weather.api_key.is_none() {
        tracing::warn!(
            phase = "runtime",
            event = "weather_key_missing",
            "weather API key not set; amap_weather calls will fail"
        );
    }

    let http = Client::builder()
        .timeout(config.weather_timeout())
        .build()
        .map_err(|err| HakimError::configuration(format!("building HTTP client: {err}")))?;
    let source = AmapWeatherSource::new(http, config.weather.api_key.clone())
        .with_endpoint(config.weather.endpoint.trim());

    let mut registry = ToolRegistry::new();
    registry.register(WeatherTool::new(
        Arc::new(city_codes(config)?),
        Arc::new(source),
    ))?;
    Ok(registry)
}

/// Wires an orchestrator and a diagnosis requester around `provider` and
/// `registry`, with tracing hooks on every seam.
pub fn build_runtime_with(
    config: &HakimConfig,
    provider: Arc<dyn ModelProvider>,
    registry: ToolRegistry,
) -> HakimRuntime {
    let tools = Arc::new(registry);
    let provider_hooks = Arc::new(SafeProviderHooks::new(TracingObservabilityHooks));

    let dispatcher = DefaultToolDispatcher::new(Arc::clone(&tools))
        .with_timeout(config.tool_timeout())
        .with_hooks(Arc::new(SafeToolHooks::new(TracingObservabilityHooks)));

    let orchestrator = ConversationOrchestrator::builder(Arc::clone(&provider), Arc::new(dispatcher))
        .model(config.model.name.clone())
        .system_prompt(config.system_prompt())
        .options(config.generation_options())
        .retry_policy(config.retry_policy())
        .cycle_timeout(config.cycle_timeout())
        .hooks(Arc::new(SafeOrchestrationHooks::new(TracingObservabilityHooks)))
        .provider_hooks(provider_hooks.clone())
        .build();

    let diagnosis = DiagnosisRequester::new(provider)
        .with_model(config.model.name.clone())
        .with_options(config.generation_options())
        .with_retry_policy(config.retry_policy())
        .with_timeout(config.cycle_timeout())
        .with_provider_hooks(provider_hooks);

    tracing::info!(
        phase = "runtime",
        event = "built",
        model = %config.model.name,
        tools = tools.len(),
    );

    HakimRuntime {
        orchestrator,
        diagnosis,
        tools,
    }
}
