//! weather_check - day forecast from WeatherAPI.com

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::{WEATHER_API_URL, http_client, parse_date, unwrap_params};
use crate::config::ToolsConfig;
use crate::error::ToolError;
use crate::tools::{BoxFuture, Tool, ToolOutput};

/// Arguments accepted by `weather_check`
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherParams {
    pub location: String,
    pub date: String,
}

/// Reduce a forecast response to a one-day summary
pub fn parse_weather_forecast(body: &Value, location: &str, date: &str) -> Option<Value> {
    let day = body
        .get("forecast")?
        .get("forecastday")?
        .as_array()?
        .first()?
        .get("day")?;

    Some(json!({
        "location": location,
        "date": date,
        "condition": day.get("condition").and_then(|c| c.get("text")).cloned().unwrap_or(Value::Null),
        "avg_temp_c": day.get("avgtemp_c").cloned().unwrap_or(Value::Null),
        "max_temp_c": day.get("maxtemp_c").cloned().unwrap_or(Value::Null),
        "min_temp_c": day.get("mintemp_c").cloned().unwrap_or(Value::Null),
        "source": "WeatherAPI.com",
    }))
}

/// Checks the forecast for a location on a date
pub struct WeatherCheck {
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    horizon_days: i64,
    /// Fixed "today" (tests); the local date otherwise
    today: Option<NaiveDate>,
}

impl WeatherCheck {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_settings(api_key, &ToolsConfig::default())
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::with_settings(config.weather_key(), config)
    }

    fn with_settings(api_key: Option<String>, config: &ToolsConfig) -> Self {
        Self {
            api_key,
            base_url: WEATHER_API_URL.to_string(),
            timeout: config.request_timeout(),
            horizon_days: config.forecast_horizon_days,
            today: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    async fn check(&self, params: WeatherParams) -> ToolOutput {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("WEATHER_API_KEY is not set");
            return ToolOutput::error("WEATHER_API_KEY environment variable is not set.");
        };

        let Some(date) = parse_date(&params.date) else {
            return ToolOutput::error(format!(
                "Invalid date format: {}. Must be in YYYY-MM-DD format.",
                params.date
            ));
        };

        let days_ahead = (date - self.today()).num_days();
        if days_ahead < 0 {
            return ToolOutput::error("Cannot check weather for a past date.");
        }
        if days_ahead > self.horizon_days {
            return ToolOutput::success(json!({
                "info": format!(
                    "Real-time weather forecast is not available for {} in {}. Here is a general weather \
                     summary for this time of year based on historical data and LLM knowledge.",
                    params.date, params.location
                )
            }));
        }

        info!(location = %params.location, date = %params.date, "Checking weather");
        match self.fetch(api_key, &params).await {
            Ok(body) => match parse_weather_forecast(&body, &params.location, &params.date) {
                Some(summary) => ToolOutput::success(summary),
                None => ToolOutput::error(format!(
                    "No weather data available for {} on {}.",
                    params.location, params.date
                )),
            },
            Err(e) => {
                warn!(error = %e, "Weather API error");
                ToolOutput::error(format!("Weather API error: {}", e))
            }
        }
    }

    async fn fetch(&self, api_key: &str, params: &WeatherParams) -> Result<Value, String> {
        let client = http_client(self.timeout)?;
        let response = client
            .get(&self.base_url)
            .query(&[
                ("key", api_key),
                ("q", params.location.as_str()),
                ("dt", params.date.as_str()),
                ("days", "1"),
                ("aqi", "no"),
                ("alerts", "no"),
            ])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let response = response.error_for_status().map_err(|e| e.to_string())?;
        response.json().await.map_err(|e| e.to_string())
    }
}

impl Tool for WeatherCheck {
    fn name(&self) -> &str {
        "weather_check"
    }

    fn description(&self) -> &str {
        "Check the weather forecast for a location on a date. Dates too far ahead return a note \
         that no real forecast exists, in which case describe typical weather for that time of year."
    }

    fn parameters_schema(&self) -> Value {
        crate::tool_params!(
            location: "string" => "City or location for the weather check",
            date: "string" => "Date for the forecast in YYYY-MM-DD format"
        )
    }

    fn execute(&self, params: Value) -> BoxFuture<'_, Result<ToolOutput, ToolError>> {
        Box::pin(async move {
            let params: WeatherParams = match unwrap_params(params) {
                Ok(p) => p,
                Err(e) => return Ok(ToolOutput::error(e)),
            };
            Ok(self.check(params).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> WeatherCheck {
        WeatherCheck::new(Some("key".to_string()))
            .with_base_url("http://127.0.0.1:9/forecast.json")
            .with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
    }

    #[tokio::test]
    async fn test_past_date_is_error() {
        let output = tool()
            .execute(json!({"location": "Sydney", "date": "2025-05-31"}))
            .await
            .unwrap();
        assert_eq!(output.failure_message().as_deref(), Some("Cannot check weather for a past date."));
    }

    #[tokio::test]
    async fn test_beyond_horizon_is_informational() {
        let output = tool()
            .execute(json!({"params": {"location": "Sydney", "date": "2025-06-16"}}))
            .await
            .unwrap();
        assert!(output.failure_message().is_none());
        assert!(output.content["info"].as_str().unwrap().contains("2025-06-16 in Sydney"));
    }

    #[tokio::test]
    async fn test_bad_date_and_missing_key() {
        let output = tool()
            .execute(json!({"location": "Sydney", "date": "June 3"}))
            .await
            .unwrap();
        assert!(output.failure_message().unwrap().starts_with("Invalid date format: June 3"));

        let output = WeatherCheck::new(None)
            .execute(json!({"location": "Sydney", "date": "2025-06-03"}))
            .await
            .unwrap();
        assert!(output.failure_message().unwrap().contains("WEATHER_API_KEY"));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_error() {
        let output = tool()
            .execute(json!({"location": "Sydney", "date": "2025-06-01"}))
            .await
            .unwrap();
        assert!(output.failure_message().unwrap().starts_with("Weather API error:"));
    }

    #[test]
    fn test_parse_weather_forecast() {
        let body = json!({
            "forecast": {"forecastday": [{"day": {
                "condition": {"text": "Partly cloudy"},
                "avgtemp_c": 14.2,
                "maxtemp_c": 18.0,
                "mintemp_c": 9.1
            }}]}
        });
        let summary = parse_weather_forecast(&body, "Sydney", "2025-06-03").unwrap();
        assert_eq!(summary["condition"], "Partly cloudy");
        assert_eq!(summary["max_temp_c"], 18.0);
        assert_eq!(summary["source"], "WeatherAPI.com");

        assert!(parse_weather_forecast(&json!({"forecast": {"forecastday": []}}), "Sydney", "x").is_none());
    }
}
