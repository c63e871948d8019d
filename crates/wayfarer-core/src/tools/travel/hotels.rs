//! hotels_finder - Google Hotels search through SerpAPI

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::{SERPAPI_URL, http_client, serpapi_status_error, unwrap_params};
use crate::config::ToolsConfig;
use crate::error::ToolError;
use crate::tools::{BoxFuture, Tool, ToolOutput};

const MAX_RESULTS: usize = 5;

/// Sort by highest rating
const DEFAULT_SORT_BY: i64 = 8;

/// Arguments accepted by `hotels_finder`
#[derive(Debug, Clone, Deserialize)]
pub struct HotelsParams {
    /// Location of the hotel
    pub q: String,
    pub check_in_date: String,
    pub check_out_date: String,
    /// SerpAPI sort code, given as a number or a numeric string
    #[serde(default)]
    pub sort_by: Option<Value>,
    #[serde(default = "one")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default = "one")]
    pub rooms: u32,
    /// Comma-separated hotel classes, e.g. "3,4"
    #[serde(default)]
    pub hotel_class: Option<Value>,
}

fn one() -> u32 {
    1
}

impl HotelsParams {
    /// Sort code as an integer; anything non-numeric falls back to 8
    pub fn sort_code(&self) -> i64 {
        match &self.sort_by {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(DEFAULT_SORT_BY),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(DEFAULT_SORT_BY),
            _ => DEFAULT_SORT_BY,
        }
    }

    fn hotel_class(&self) -> Option<String> {
        match &self.hotel_class {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Array(items)) => {
                let classes: Vec<String> = items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                (!classes.is_empty()).then(|| classes.join(","))
            }
            _ => None,
        }
    }

    fn query(&self, api_key: &str) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("api_key", api_key.to_string()),
            ("engine", "google_hotels".to_string()),
            ("hl", "en".to_string()),
            ("gl", "us".to_string()),
            ("q", self.q.clone()),
            ("check_in_date", self.check_in_date.clone()),
            ("check_out_date", self.check_out_date.clone()),
            ("currency", "USD".to_string()),
            ("adults", self.adults.to_string()),
            ("children", self.children.to_string()),
            ("rooms", self.rooms.to_string()),
            ("sort_by", self.sort_code().to_string()),
        ];
        if let Some(class) = self.hotel_class() {
            query.push(("hotel_class", class));
        }
        query
    }
}

/// Up to five `properties` from a SerpAPI response, or an empty list
pub fn parse_hotel_results(body: &Value) -> Vec<Value> {
    body.get("properties")
        .and_then(Value::as_array)
        .map(|props| props.iter().take(MAX_RESULTS).cloned().collect())
        .unwrap_or_default()
}

/// Finds hotels at a location
pub struct HotelsFinder {
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl HotelsFinder {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: SERPAPI_URL.to_string(),
            timeout: ToolsConfig::default().request_timeout(),
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self {
            api_key: config.serpapi_key(),
            base_url: SERPAPI_URL.to_string(),
            timeout: config.request_timeout(),
        }
    }

    /// Point the tool at a different SerpAPI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn search(&self, params: HotelsParams) -> Result<Vec<Value>, String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| "SERPAPI_API_KEY environment variable is not set.".to_string())?;

        info!(
            location = %params.q,
            check_in = %params.check_in_date,
            check_out = %params.check_out_date,
            adults = params.adults,
            children = params.children,
            rooms = params.rooms,
            "Searching hotels"
        );

        let client = http_client(self.timeout)?;
        let response = client
            .get(&self.base_url)
            .query(&params.query(api_key))
            .send()
            .await
            .map_err(|e| format!("Hotel search failed: {}", e))?;

        if !response.status().is_success() {
            return Err(serpapi_status_error(response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse SerpAPI response: {}", e))?;

        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(format!("SerpAPI error: {}", error));
        }

        let hotels = parse_hotel_results(&body);
        if hotels.is_empty() {
            warn!("No hotel properties found in results");
        } else {
            info!(count = hotels.len(), "Found hotels");
        }
        Ok(hotels)
    }
}

impl Tool for HotelsFinder {
    fn name(&self) -> &str {
        "hotels_finder"
    }

    fn description(&self) -> &str {
        "Find hotels using the Google Hotels engine. Returns up to 5 hotel properties \
         with prices, ratings, links and images."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "q": {
                    "type": "string",
                    "description": "Location of the hotel"
                },
                "check_in_date": {
                    "type": "string",
                    "description": "Check-in date in YYYY-MM-DD format, e.g. 2024-06-22"
                },
                "check_out_date": {
                    "type": "string",
                    "description": "Check-out date in YYYY-MM-DD format, e.g. 2024-06-28"
                },
                "sort_by": {
                    "type": "integer",
                    "description": "Sort order code. Default 8 (highest rating)."
                },
                "adults": {
                    "type": "integer",
                    "description": "Number of adults. Default 1."
                },
                "children": {
                    "type": "integer",
                    "description": "Number of children. Default 0."
                },
                "rooms": {
                    "type": "integer",
                    "description": "Number of rooms. Default 1."
                },
                "hotel_class": {
                    "type": "string",
                    "description": "Only include these hotel classes, e.g. 2,3,4"
                }
            },
            "required": ["q", "check_in_date", "check_out_date"]
        })
    }

    fn execute(&self, params: Value) -> BoxFuture<'_, Result<ToolOutput, ToolError>> {
        Box::pin(async move {
            let params: HotelsParams = match unwrap_params(params) {
                Ok(p) => p,
                Err(e) => return Ok(ToolOutput::error(e)),
            };
            match self.search(params).await {
                Ok(hotels) => Ok(ToolOutput::success(Value::Array(hotels))),
                Err(e) => {
                    warn!(error = %e, "Hotel search failed");
                    Ok(ToolOutput::error(e))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(extra: Value) -> HotelsParams {
        let mut base = json!({
            "q": "Melbourne CBD",
            "check_in_date": "2025-06-22",
            "check_out_date": "2025-06-28"
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        unwrap_params(base).unwrap()
    }

    #[test]
    fn test_sort_code_coercion() {
        assert_eq!(params(json!({})).sort_code(), 8);
        assert_eq!(params(json!({"sort_by": 3})).sort_code(), 3);
        assert_eq!(params(json!({"sort_by": "13"})).sort_code(), 13);
        assert_eq!(params(json!({"sort_by": "rating"})).sort_code(), 8);
    }

    #[test]
    fn test_defaults_and_optional_class() {
        let p = params(json!({}));
        assert_eq!((p.adults, p.children, p.rooms), (1, 0, 1));
        assert!(!p.query("k").iter().any(|(k, _)| *k == "hotel_class"));

        let classed = params(json!({"hotel_class": [4, 5]}));
        assert!(classed.query("k").contains(&("hotel_class", "4,5".to_string())));
    }

    #[test]
    fn test_parse_hotel_results() {
        let props: Vec<Value> = (0..7).map(|i| json!({"name": format!("Hotel {i}")})).collect();
        let hotels = parse_hotel_results(&json!({"properties": props}));
        assert_eq!(hotels.len(), 5);
        assert_eq!(hotels[0]["name"], "Hotel 0");

        assert!(parse_hotel_results(&json!({"search_metadata": {}})).is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_error_payload() {
        let tool = HotelsFinder::new(Some("key".to_string())).with_base_url("http://127.0.0.1:9/search");
        let output = tool
            .execute(json!({
                "params": {"q": "Hobart", "check_in_date": "2025-06-22", "check_out_date": "2025-06-24"}
            }))
            .await
            .unwrap();
        assert!(output.failure_message().unwrap().starts_with("Hotel search failed"));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_error_payload() {
        let output = HotelsFinder::new(None)
            .execute(json!({"q": "Hobart", "check_in_date": "2025-06-22", "check_out_date": "2025-06-24"}))
            .await
            .unwrap();
        assert!(output.failure_message().unwrap().contains("SERPAPI_API_KEY"));
    }
}
