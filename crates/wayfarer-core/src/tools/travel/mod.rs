//! Travel search tools
//!
//! Flight, hotel and weather lookups backed by SerpAPI and WeatherAPI.com.
//! Every tool accepts its arguments either flat or wrapped as
//! `{"params": {...}}`, and reports bad input, missing credentials and
//! upstream failures as error payloads rather than raised errors.

mod flights;
mod hotels;
mod weather;

pub use flights::{FlightSummary, FlightsFinder, FlightsParams, parse_flight_results};
pub use hotels::{HotelsFinder, HotelsParams, parse_hotel_results};
pub use weather::{WeatherCheck, WeatherParams, parse_weather_forecast};

use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// SerpAPI search endpoint
pub const SERPAPI_URL: &str = "https://serpapi.com/search";

/// WeatherAPI.com forecast endpoint
pub const WEATHER_API_URL: &str = "https://api.weatherapi.com/v1/forecast.json";

/// Build the HTTP client shared by a tool's requests
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {}", e))
}

/// Error text for a non-2xx SerpAPI reply, keeping the body's `error` field
/// when there is one
pub(crate) async fn serpapi_status_error(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    describe_serpapi_error(status, &body)
}

fn describe_serpapi_error(status: reqwest::StatusCode, body: &str) -> String {
    let reason = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string));
    match reason {
        Some(reason) => format!("SerpAPI error ({}): {}", status, reason),
        None => format!("SerpAPI error: {}", status),
    }
}

/// A 3-letter alphabetic IATA code
pub fn validate_airport_code(code: &str) -> bool {
    code.chars().count() == 3 && code.chars().all(|c| c.is_alphabetic())
}

/// A calendar date written as `YYYY-MM-DD`
pub fn validate_date_format(date: &str) -> bool {
    parse_date(date).is_some()
}

pub(crate) fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Decode tool arguments, accepting both `{...}` and `{"params": {...}}`
pub fn unwrap_params<T: DeserializeOwned>(args: Value) -> Result<T, String> {
    let inner = match args {
        Value::Object(mut map) if map.len() == 1 && map.get("params").is_some_and(Value::is_object) => {
            map.remove("params").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(inner).map_err(|e| format!("Invalid parameters: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Probe {
        location: String,
        #[serde(default)]
        nights: u32,
    }

    #[test]
    fn test_serpapi_error_prefers_body_reason() {
        let status = reqwest::StatusCode::UNAUTHORIZED;
        assert_eq!(
            describe_serpapi_error(status, r#"{"error": "Invalid API key."}"#),
            "SerpAPI error (401 Unauthorized): Invalid API key."
        );
        assert_eq!(describe_serpapi_error(status, "<html>nope</html>"), "SerpAPI error: 401 Unauthorized");
    }

    #[test]
    fn test_validate_airport_code() {
        assert!(validate_airport_code("SYD"));
        assert!(validate_airport_code("mel"));
        assert!(!validate_airport_code("SY"));
        assert!(!validate_airport_code("SYDN"));
        assert!(!validate_airport_code("S1D"));
    }

    #[test]
    fn test_validate_date_format() {
        assert!(validate_date_format("2025-06-22"));
        assert!(!validate_date_format("22-06-2025"));
        assert!(!validate_date_format("2025-02-30"));
        assert!(!validate_date_format("tomorrow"));
    }

    #[test]
    fn test_unwrap_params_flat_and_wrapped() {
        let flat: Probe = unwrap_params(json!({"location": "Hobart", "nights": 2})).unwrap();
        let wrapped: Probe = unwrap_params(json!({"params": {"location": "Hobart", "nights": 2}})).unwrap();
        assert_eq!(flat, wrapped);

        let defaulted: Probe = unwrap_params(json!({"location": "Perth"})).unwrap();
        assert_eq!(defaulted.nights, 0);
    }

    #[test]
    fn test_unwrap_params_reports_missing_fields() {
        let err = unwrap_params::<Probe>(json!({"nights": 2})).unwrap_err();
        assert!(err.starts_with("Invalid parameters:"));
        assert!(err.contains("location"));
    }
}
