//! flights_finder - Google Flights search through SerpAPI

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{SERPAPI_URL, http_client, serpapi_status_error, unwrap_params, validate_airport_code, validate_date_format};
use crate::config::ToolsConfig;
use crate::error::ToolError;
use crate::tools::{BoxFuture, Tool, ToolOutput};

const MAX_RESULTS: usize = 5;

/// Arguments accepted by `flights_finder`
#[derive(Debug, Clone, Deserialize)]
pub struct FlightsParams {
    pub departure_airport: String,
    pub arrival_airport: String,
    pub outbound_date: String,
    #[serde(default)]
    pub return_date: Option<String>,
    #[serde(default = "one")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants_in_seat: u32,
    #[serde(default)]
    pub infants_on_lap: u32,
    #[serde(default = "one")]
    pub max_stops: u32,
}

fn one() -> u32 {
    1
}

impl FlightsParams {
    /// First validation problem, if any
    fn validate(&self) -> Option<String> {
        if !validate_airport_code(&self.departure_airport) {
            return Some(format!(
                "Invalid departure airport code: {}. Must be a valid 3-letter IATA code.",
                self.departure_airport
            ));
        }
        if !validate_airport_code(&self.arrival_airport) {
            return Some(format!(
                "Invalid arrival airport code: {}. Must be a valid 3-letter IATA code.",
                self.arrival_airport
            ));
        }
        if !validate_date_format(&self.outbound_date) {
            return Some(format!(
                "Invalid outbound date format: {}. Must be in YYYY-MM-DD format.",
                self.outbound_date
            ));
        }
        if let Some(return_date) = &self.return_date
            && !validate_date_format(return_date)
        {
            return Some(format!(
                "Invalid return date format: {}. Must be in YYYY-MM-DD format.",
                return_date
            ));
        }
        None
    }

    fn query(&self, api_key: &str) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("api_key", api_key.to_string()),
            ("engine", "google_flights".to_string()),
            ("hl", "en".to_string()),
            ("gl", "us".to_string()),
            ("departure_id", self.departure_airport.to_uppercase()),
            ("arrival_id", self.arrival_airport.to_uppercase()),
            ("outbound_date", self.outbound_date.clone()),
            ("currency", "USD".to_string()),
            ("adults", self.adults.to_string()),
            ("children", self.children.to_string()),
            ("infants_in_seat", self.infants_in_seat.to_string()),
            ("infants_on_lap", self.infants_on_lap.to_string()),
            ("stops", self.max_stops.to_string()),
        ];
        match &self.return_date {
            Some(return_date) => query.push(("return_date", return_date.clone())),
            // One-way trip
            None => query.push(("type", "2".to_string())),
        }
        query
    }
}

/// One flight option as handed back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSummary {
    pub airline: String,
    pub flight_number: String,
    pub departure_time: String,
    pub arrival_time: String,
    /// Minutes, or "Unknown"
    pub duration: Value,
    pub price: String,
    /// Number of connections, or "Unknown"
    pub stops: Value,
}

fn text_or_unknown(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "Unknown".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Summarize the `best_flights` of a SerpAPI response.
///
/// Returns `None` when the response carries no `best_flights` section.
pub fn parse_flight_results(body: &Value) -> Option<Vec<FlightSummary>> {
    let options = body.get("best_flights")?.as_array()?;

    let summaries = options
        .iter()
        .take(MAX_RESULTS)
        .map(|option| {
            let legs = option.get("flights").and_then(Value::as_array).filter(|l| !l.is_empty());
            let first_leg = legs.and_then(|l| l.first());
            let leg_field = |key: &str| first_leg.and_then(|leg| leg.get(key));

            FlightSummary {
                airline: text_or_unknown(leg_field("airline")),
                flight_number: text_or_unknown(leg_field("flight_number")),
                departure_time: text_or_unknown(
                    leg_field("departure_airport").and_then(|a| a.get("time")),
                ),
                arrival_time: text_or_unknown(leg_field("arrival_airport").and_then(|a| a.get("time"))),
                duration: leg_field("duration")
                    .or_else(|| option.get("total_duration"))
                    .cloned()
                    .unwrap_or_else(|| json!("Unknown")),
                price: format!("${} USD", text_or_unknown(option.get("price"))),
                stops: legs.map_or_else(|| json!("Unknown"), |l| json!(l.len() - 1)),
            }
        })
        .collect();

    Some(summaries)
}

/// Finds flights between two airports
pub struct FlightsFinder {
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    max_attempts: u32,
    retry_delay: Duration,
}

impl FlightsFinder {
    pub fn new(api_key: Option<String>) -> Self {
        let defaults = ToolsConfig::default();
        Self {
            api_key,
            base_url: SERPAPI_URL.to_string(),
            timeout: defaults.request_timeout(),
            max_attempts: defaults.flight_retries,
            retry_delay: defaults.flight_retry_delay(),
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self {
            api_key: config.serpapi_key(),
            base_url: SERPAPI_URL.to_string(),
            timeout: config.request_timeout(),
            max_attempts: config.flight_retries.max(1),
            retry_delay: config.flight_retry_delay(),
        }
    }

    /// Point the tool at a different SerpAPI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retries(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    async fn fetch(&self, client: &reqwest::Client, query: &[(&'static str, String)]) -> Result<Value, String> {
        let response = client
            .get(&self.base_url)
            .query(query)
            .send()
            .await
            .map_err(|e| format!("SerpAPI request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(serpapi_status_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| format!("Failed to parse SerpAPI response: {}", e))
    }

    async fn search(&self, params: FlightsParams) -> ToolOutput {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("SERPAPI_API_KEY is not set");
            return ToolOutput::error("SERPAPI_API_KEY environment variable is not set.");
        };

        if let Some(problem) = params.validate() {
            warn!(%problem, "Rejected flight search");
            return ToolOutput::error(problem);
        }

        let client = match http_client(self.timeout) {
            Ok(client) => client,
            Err(e) => return ToolOutput::error(e),
        };

        info!(
            from = %params.departure_airport,
            to = %params.arrival_airport,
            date = %params.outbound_date,
            "Searching flights"
        );
        let query = params.query(api_key);

        let mut attempt = 1;
        let body = loop {
            match self.fetch(&client, &query).await {
                Ok(body) => break body,
                Err(e) if attempt < self.max_attempts => {
                    warn!(attempt, error = %e, "Flight search failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return ToolOutput::error(format!("{}. Please try again later.", e)),
            }
        };

        match parse_flight_results(&body) {
            Some(flights) => {
                debug!(count = flights.len(), "Flight results");
                ToolOutput::success(json!(flights))
            }
            None => ToolOutput::error("No flight results found or unexpected API response format."),
        }
    }
}

impl Tool for FlightsFinder {
    fn name(&self) -> &str {
        "flights_finder"
    }

    fn description(&self) -> &str {
        "Find flights using the Google Flights engine. Returns up to 5 of the best flight options \
         with airline, flight number, times, duration, price and number of stops."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "departure_airport": {
                    "type": "string",
                    "description": "Departure airport code (IATA)"
                },
                "arrival_airport": {
                    "type": "string",
                    "description": "Arrival airport code (IATA)"
                },
                "outbound_date": {
                    "type": "string",
                    "description": "Outbound date in YYYY-MM-DD format, e.g. 2024-06-22"
                },
                "return_date": {
                    "type": "string",
                    "description": "Return date in YYYY-MM-DD format, e.g. 2024-06-28. Omit for one-way trips."
                },
                "adults": {
                    "type": "integer",
                    "description": "Number of adults. Default 1."
                },
                "children": {
                    "type": "integer",
                    "description": "Number of children. Default 0."
                },
                "infants_in_seat": {
                    "type": "integer",
                    "description": "Number of infants in seat. Default 0."
                },
                "infants_on_lap": {
                    "type": "integer",
                    "description": "Number of infants on lap. Default 0."
                },
                "max_stops": {
                    "type": "integer",
                    "description": "Maximum number of stops allowed. Default 1."
                }
            },
            "required": ["departure_airport", "arrival_airport", "outbound_date"]
        })
    }

    fn execute(&self, params: Value) -> BoxFuture<'_, Result<ToolOutput, ToolError>> {
        Box::pin(async move {
            let params: FlightsParams = match unwrap_params(params) {
                Ok(p) => p,
                Err(e) => return Ok(ToolOutput::error(e)),
            };
            Ok(self.search(params).await)
        })
    }
}
