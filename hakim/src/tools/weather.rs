//! `amap_weather`: live weather for a district or county.
//!
//! Locations are resolved to Amap administrative codes through a
//! [`CityCodeLookup`] loaded once at startup, then the live report is fetched
//! from a [`WeatherSource`].
//!
//! ```rust
//! use hakim::tools::CityCodeLookup;
//!
//! let lookup = CityCodeLookup::from_csv_str("中文名,adcode\n海淀区,110108\n锦江区,510104\n")
//!     .expect("table parses");
//! assert_eq!(lookup.adcode("海淀区"), Some("110108"));
//! assert_eq!(lookup.adcode("北京"), None);
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use hprovider::{SecretString, ToolDefinition};
use htooling::{Tool, ToolError, ToolExecutionContext, ToolFuture, required_string};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::HakimError;
use crate::config::AMAP_WEATHER_ENDPOINT;

pub const WEATHER_TOOL_NAME: &str = "amap_weather";

pub fn weather_definition() -> ToolDefinition {
    ToolDefinition::new(
        WEATHER_TOOL_NAME,
        "获取对应城市或区县的实时天气数据。请提供具体到区或县的名称，例如\"海淀区\"、\"锦江区\"等，而不是笼统的城市名。",
    )
    .with_parameter(
        "location",
        "string",
        "城市/区具体名称，如`北京市海淀区`请描述为`海淀区`",
        true,
    )
}

/// Exact-match table from location name to Amap adcode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityCodeLookup {
    codes: HashMap<String, String>,
}

impl CityCodeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, N, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        let mut lookup = Self::new();
        for (name, code) in pairs {
            lookup.insert(name, code);
        }
        lookup
    }

    /// Parses `name,adcode` rows. Blank lines, `#` comments and a header
    /// row whose code column is not numeric are skipped. The first entry for
    /// a name wins.
    ///
    /// Columns are split on every comma and there is no quoting, so a row
    /// containing `"` is rejected rather than misread.
    pub fn from_csv_str(csv: &str) -> Result<Self, HakimError> {
        let mut lookup = Self::new();

        for (index, line) in csv.lines().enumerate() {
            let line = line.trim_start_matches('\u{feff}').trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.contains('"') {
                return Err(HakimError::configuration(format!(
                    "city code line {}: quoted fields are not supported",
                    index + 1
                )));
            }

            let mut columns = line.split(',').map(str::trim);
            let (Some(name), Some(code)) = (columns.next(), columns.next()) else {
                return Err(HakimError::configuration(format!(
                    "city code line {}: expected 'name,adcode'",
                    index + 1
                )));
            };

            if code.is_empty() || !code.chars().all(|ch| ch.is_ascii_digit()) {
                if index == 0 {
                    continue;
                }
                return Err(HakimError::configuration(format!(
                    "city code line {}: adcode '{code}' is not numeric",
                    index + 1
                )));
            }

            if !name.is_empty() {
                lookup.codes.entry(name.to_string()).or_insert_with(|| code.to_string());
            }
        }

        Ok(lookup)
    }

    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self, HakimError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| {
            HakimError::io(format!("reading city codes from {}: {err}", path.display()))
        })?;
        Self::from_csv_str(&contents)
    }

    pub fn insert(&mut self, name: impl Into<String>, code: impl Into<String>) {
        self.codes.insert(name.into(), code.into());
    }

    pub fn adcode(&self, name: &str) -> Option<&str> {
        self.codes.get(name.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveWeather {
    pub weather: String,
    pub temperature: String,
}

/// Fetches the live report for an adcode.
pub trait WeatherSource: Send + Sync {
    fn live<'a>(&'a self, adcode: &'a str) -> ToolFuture<'a, Result<LiveWeather, ToolError>>;
}

#[derive(Debug, Clone)]
pub struct AmapWeatherSource {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

impl AmapWeatherSource {
    pub fn new(client: Client, api_key: Option<SecretString>) -> Self {
        Self {
            client,
            endpoint: AMAP_WEATHER_ENDPOINT.to_string(),
            api_key,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl WeatherSource for AmapWeatherSource {
    fn live<'a>(&'a self, adcode: &'a str) -> ToolFuture<'a, Result<LiveWeather, ToolError>> {
        Box::pin(async move {
            let Some(api_key) = self.api_key.as_ref() else {
                return Err(ToolError::execution("weather API key is not configured"));
            };

            tracing::debug!(phase = "tool", event = "amap_request", adcode);
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[("city", adcode), ("key", api_key.expose())])
                .send()
                .await
                .map_err(|err| {
                    if err.is_timeout() {
                        ToolError::timeout(format!("weather request timed out: {err}"))
                    } else {
                        ToolError::execution(format!("weather request failed: {err}"))
                    }
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(ToolError::execution(format!(
                    "weather endpoint returned HTTP {}",
                    status.as_u16()
                )));
            }

            let body = response
                .text()
                .await
                .map_err(|err| ToolError::execution(format!("reading weather response: {err}")))?;
            parse_amap_live(&body)
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct AmapResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    info: Option<String>,
    #[serde(default)]
    lives: Vec<AmapLive>,
}

#[derive(Debug, Default, Deserialize)]
struct AmapLive {
    #[serde(default)]
    weather: Option<String>,
    #[serde(default)]
    temperature: Option<String>,
}

/// Status `"0"` is an upstream failure described by `info`.
pub(crate) fn parse_amap_live(body: &str) -> Result<LiveWeather, ToolError> {
    let response = serde_json::from_str::<AmapResponse>(body)
        .map_err(|err| ToolError::execution(format!("malformed weather response: {err}")))?;

    if response.status.as_deref() == Some("0") {
        let info = response.info.as_deref().unwrap_or("Unknown error");
        return Err(ToolError::execution(format!("Amap API Error: {info}")));
    }

    let live = response
        .lives
        .into_iter()
        .next()
        .ok_or_else(|| ToolError::execution("weather response carried no live report"))?;

    match (live.weather, live.temperature) {
        (Some(weather), Some(temperature)) => Ok(LiveWeather {
            weather,
            temperature,
        }),
        _ => Err(ToolError::execution(
            "weather response is missing weather or temperature",
        )),
    }
}

pub struct WeatherTool {
    lookup: Arc<CityCodeLookup>,
    source: Arc<dyn WeatherSource>,
}

impl std::fmt::Debug for WeatherTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherTool")
            .field("locations", &self.lookup.len())
            .finish_non_exhaustive()
    }
}

impl WeatherTool {
    pub fn new(lookup: Arc<CityCodeLookup>, source: Arc<dyn WeatherSource>) -> Self {
        Self { lookup, source }
    }
}

impl Tool for WeatherTool {
    fn definition(&self) -> ToolDefinition {
        weather_definition()
    }

    fn invoke<'a>(
        &'a self,
        args: Map<String, Value>,
        _context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<Value, ToolError>> {
        Box::pin(async move {
            let location = required_string(&args, "location")?;
            let adcode = self.lookup.adcode(&location).ok_or_else(|| {
                ToolError::invalid_arguments(format!("location '{location}' not found"))
            })?;

            let live = self.source.live(adcode).await?;
            Ok(json!({
                "weather": live.weather,
                "temperature": live.temperature,
                "location": location,
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use htooling::ToolErrorKind;

    use super::*;

    struct FixedSource {
        seen: Mutex<Vec<String>>,
        reply: Result<LiveWeather, ToolError>,
    }

    impl FixedSource {
        fn new(reply: Result<LiveWeather, ToolError>) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                reply,
            }
        }
    }

    impl WeatherSource for FixedSource {
        fn live<'a>(&'a self, adcode: &'a str) -> ToolFuture<'a, Result<LiveWeather, ToolError>> {
            Box::pin(async move {
                self.seen.lock().expect("seen lock").push(adcode.to_string());
                self.reply.clone()
            })
        }
    }

    fn sunny() -> LiveWeather {
        LiveWeather {
            weather: "晴".to_string(),
            temperature: "25".to_string(),
        }
    }

    fn tool_with(source: Arc<FixedSource>) -> WeatherTool {
        WeatherTool::new(
            Arc::new(CityCodeLookup::from_pairs([("海淀区", "110108")])),
            source,
        )
    }

    fn args(json: &str) -> Map<String, Value> {
        htooling::parse_json_object(json).expect("test args parse")
    }

    #[tokio::test]
    async fn resolves_location_and_echoes_it() {
        let source = Arc::new(FixedSource::new(Ok(sunny())));
        let tool = tool_with(source.clone());

        let output = tool
            .invoke(args(r#"{"location":"海淀区"}"#), &ToolExecutionContext::new())
            .await
            .expect("lookup succeeds");

        assert_eq!(
            output,
            json!({"weather": "晴", "temperature": "25", "location": "海淀区"})
        );
        assert_eq!(*source.seen.lock().expect("seen lock"), vec!["110108"]);
    }

    #[tokio::test]
    async fn unknown_and_missing_locations_never_reach_the_source() {
        let source = Arc::new(FixedSource::new(Ok(sunny())));
        let tool = tool_with(source.clone());
        let context = ToolExecutionContext::new();

        let unknown = tool
            .invoke(args(r#"{"location":"亚特兰蒂斯"}"#), &context)
            .await
            .expect_err("unknown location fails");
        assert_eq!(unknown.kind, ToolErrorKind::InvalidArguments);
        assert!(unknown.message.contains("亚特兰蒂斯"));

        let missing = tool
            .invoke(args("{}"), &context)
            .await
            .expect_err("missing location fails");
        assert_eq!(missing.kind, ToolErrorKind::InvalidArguments);

        assert!(source.seen.lock().expect("seen lock").is_empty());
    }

    #[tokio::test]
    async fn source_failures_propagate_as_tool_errors() {
        let source = Arc::new(FixedSource::new(Err(ToolError::execution(
            "weather endpoint returned HTTP 503",
        ))));
        let tool = tool_with(source);

        let error = tool
            .invoke(args(r#"{"location":"海淀区"}"#), &ToolExecutionContext::new())
            .await
            .expect_err("upstream failure surfaces");
        assert_eq!(error.kind, ToolErrorKind::Execution);
        assert!(error.message.contains("503"));
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let source = AmapWeatherSource::new(Client::new(), None);
        let error = source.live("110108").await.expect_err("no key configured");
        assert_eq!(error.kind, ToolErrorKind::Execution);
    }

    #[test]
    fn amap_payloads_are_interpreted() {
        let live = parse_amap_live(
            r#"{"status":"1","info":"OK","lives":[{"province":"北京","weather":"晴","temperature":"25"}]}"#,
        )
        .expect("live report parses");
        assert_eq!(live, sunny());

        let error = parse_amap_live(r#"{"status":"0","info":"INVALID_USER_KEY"}"#)
            .expect_err("status 0 is an error");
        assert_eq!(error.message, "Amap API Error: INVALID_USER_KEY");

        assert!(parse_amap_live(r#"{"status":"1","lives":[]}"#).is_err());
        assert!(parse_amap_live("<html>").is_err());
    }

    #[test]
    fn csv_rows_are_validated() {
        let lookup = CityCodeLookup::from_csv_str("\u{feff}中文名,adcode,citycode\n\n# comment\n海淀区,110108,010\n海淀区,999999,010\n")
            .expect("table parses");
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.adcode(" 海淀区 "), Some("110108"));

        let error = CityCodeLookup::from_csv_str("海淀区,110108\n锦江区\n").expect_err("short row");
        assert!(error.message.contains("line 2"));

        let error =
            CityCodeLookup::from_csv_str("海淀区,110108\n锦江区,abc\n").expect_err("bad code");
        assert!(error.message.contains("not numeric"));
    }

    #[test]
    fn quoted_rows_are_rejected_instead_of_split_apart() {
        let error = CityCodeLookup::from_csv_str("name,adcode\n\"Haidian, Beijing\",110108\n")
            .expect_err("quoted name");
        assert_eq!(error.kind, crate::HakimErrorKind::Configuration);
        assert!(error.message.contains("line 2"));
        assert!(error.message.contains("quoted"));

        let error = CityCodeLookup::from_csv_str("\"中文名\",\"adcode\"\n").expect_err("quoted header");
        assert!(error.message.contains("line 1"));
    }

    #[test]
    fn definition_exports_one_required_location() {
        let definition = weather_definition();
        assert_eq!(definition.name, "amap_weather");
        assert_eq!(definition.required_parameters(), vec!["location"]);
    }
}
