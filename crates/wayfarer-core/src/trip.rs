//! Trip planning requests
//!
//! Turns a structured trip request (the planning form) into the first human
//! message of a thread.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// An airport offered by the planner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Airport {
    pub city: &'static str,
    pub iata: &'static str,
    pub name: &'static str,
}

impl fmt::Display for Airport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) - {}", self.city, self.iata, self.name)
    }
}

/// Major airports in Australia and New Zealand
pub const AIRPORTS: &[Airport] = &[
    Airport { city: "Sydney", iata: "SYD", name: "Sydney Kingsford Smith" },
    Airport { city: "Melbourne", iata: "MEL", name: "Melbourne Tullamarine" },
    Airport { city: "Brisbane", iata: "BNE", name: "Brisbane" },
    Airport { city: "Perth", iata: "PER", name: "Perth" },
    Airport { city: "Adelaide", iata: "ADL", name: "Adelaide" },
    Airport { city: "Gold Coast", iata: "OOL", name: "Gold Coast" },
    Airport { city: "Cairns", iata: "CNS", name: "Cairns" },
    Airport { city: "Canberra", iata: "CBR", name: "Canberra" },
    Airport { city: "Hobart", iata: "HBA", name: "Hobart" },
    Airport { city: "Darwin", iata: "DRW", name: "Darwin" },
    Airport { city: "Auckland", iata: "AKL", name: "Auckland" },
    Airport { city: "Wellington", iata: "WLG", name: "Wellington" },
    Airport { city: "Christchurch", iata: "CHC", name: "Christchurch" },
    Airport { city: "Queenstown", iata: "ZQN", name: "Queenstown" },
    Airport { city: "Dunedin", iata: "DUD", name: "Dunedin" },
];

/// Look up an airport by IATA code (case-insensitive)
pub fn find_airport(iata: &str) -> Option<&'static Airport> {
    AIRPORTS.iter().find(|a| a.iata.eq_ignore_ascii_case(iata))
}

/// Hotel-area phrases recognised in free-text preferences, in priority order
const LOCATION_KEYWORDS: &[&str] = &[
    "cbd",
    "city center",
    "downtown",
    "beach",
    "beachfront",
    "airport",
    "near airport",
    "city centre",
    "central",
    "marina",
    "waterfront",
    "old town",
    "historic district",
    "business district",
];

/// Hotel search location: the destination city, narrowed by the first
/// location keyword found in the preferences
pub fn extract_location_from_preferences(preferences: &str, destination_city: &str) -> String {
    let lower = preferences.to_lowercase();
    match LOCATION_KEYWORDS.iter().find(|k| lower.contains(*k)) {
        Some(keyword) => {
            debug!(keyword, "Found location preference");
            format!("{} {}", destination_city, keyword)
        }
        None => destination_city.to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripType {
    #[default]
    Return,
    OneWay,
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TripType::Return => "return",
            TripType::OneWay => "one way",
        })
    }
}

impl FromStr for TripType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], " ").as_str() {
            "return" | "round trip" => Ok(TripType::Return),
            "one way" | "oneway" => Ok(TripType::OneWay),
            _ => Err(format!("Unknown trip type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyLevel {
    Relaxed,
    #[default]
    Balanced,
    Active,
}

impl fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EnergyLevel::Relaxed => "Relaxed",
            EnergyLevel::Balanced => "Balanced",
            EnergyLevel::Active => "Active",
        })
    }
}

impl FromStr for EnergyLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relaxed" => Ok(EnergyLevel::Relaxed),
            "balanced" => Ok(EnergyLevel::Balanced),
            "active" => Ok(EnergyLevel::Active),
            _ => Err(format!("Unknown energy level: {}", s)),
        }
    }
}

/// A structured trip request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub trip_type: TripType,
    /// Departure IATA code
    pub departure: String,
    /// Destination IATA code
    pub destination: String,
    /// Outbound / check-in date
    pub check_in: NaiveDate,
    /// Return / check-out date (return trips only)
    pub check_out: Option<NaiveDate>,
    pub preferences: String,
    pub energy_level: EnergyLevel,
    /// Total budget in AUD
    pub budget_aud: Option<String>,
}

impl TripRequest {
    /// Check the request can be planned
    pub fn validate(&self) -> Result<()> {
        if self.departure.trim().is_empty() || self.destination.trim().is_empty() {
            return Err(Error::InvalidTrip(
                "Please enter a departure, destination, and valid dates.".to_string(),
            ));
        }
        if self.trip_type == TripType::Return {
            match self.check_out {
                None => {
                    return Err(Error::InvalidTrip("A return trip needs a check-out date.".to_string()));
                }
                Some(check_out) if check_out <= self.check_in => {
                    return Err(Error::InvalidTrip(
                        "Check-out date must be after check-in date.".to_string(),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn destination_city(&self) -> String {
        find_airport(&self.destination)
            .map(|a| a.city.to_string())
            .unwrap_or_else(|| self.destination.clone())
    }

    /// Build the planning prompt sent as the thread's first human message
    pub fn to_prompt(&self) -> Result<String> {
        self.validate()?;

        let date_str = match (self.trip_type, self.check_out) {
            (TripType::Return, Some(check_out)) => format!(
                "from {} to {} ({} days)",
                self.check_in,
                check_out,
                (check_out - self.check_in).num_days()
            ),
            _ => format!("departing on {} (one way)", self.check_in),
        };

        let budget = self.budget_aud.as_deref().map(str::trim).filter(|b| !b.is_empty());
        let budget_str = budget
            .map(|b| {
                format!(
                    " The total budget for the trip is {} AUD. Please filter flights and hotels to fit within \
                     this budget if possible. If the API or tool requires USD, convert the budget from AUD to \
                     USD using the current exchange rate.",
                    b
                )
            })
            .unwrap_or_default();

        let hotel_preferences = if self.preferences.trim().is_empty() {
            String::new()
        } else {
            let location = extract_location_from_preferences(&self.preferences, &self.destination_city());
            format!(
                " When searching for hotels, use location '{}' and consider these preferences: {}.",
                location, self.preferences
            )
        };

        let (from, to) = (&self.departure, &self.destination);
        Ok(format!(
            "Plan a {trip} trip from {from} to {to} {date_str}. Preferences: {prefs}. Energy level: {energy}.{budget_str}\n\
             1. Suggest a daily travel planner (with activities, rest, and meals).\n\
             2. Recommend local attractions (museums, parks, landmarks) and restaurants.\n\
             3. Use the weather_check tool to provide a multi-day weather forecast and alerts for {to}. If the forecast is not available, provide a general weather summary based on historical data.\n\
             4. Suggest packing tips based on the weather.\n\
             5. Generate a travel checklist for this trip.\n\
             6. Find best flights (from {from} to {to}) and hotels for the trip, using these dates{budget_filter}.{hotel_preferences}\n\
             For each flight option, display all available details: flight number, airline, duration, departure time, arrival time, and price. Do not just show the price.\n\
             If flight or hotel information cannot be retrieved, continue to generate the rest of the plan (planner, attractions, restaurants, weather, packing tips, checklist).",
            trip = self.trip_type,
            prefs = self.preferences,
            energy = self.energy_level,
            budget_filter = if budget.is_some() { ", and filter by budget" } else { "" },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn request() -> TripRequest {
        TripRequest {
            trip_type: TripType::Return,
            departure: "SYD".to_string(),
            destination: "MEL".to_string(),
            check_in: date("2025-06-22"),
            check_out: Some(date("2025-06-28")),
            preferences: "Prefer hotels in the CBD, love museums".to_string(),
            energy_level: EnergyLevel::Active,
            budget_aud: Some("3000".to_string()),
        }
    }

    #[test]
    fn test_find_airport() {
        assert_eq!(find_airport("zqn").map(|a| a.city), Some("Queenstown"));
        assert!(find_airport("LAX").is_none());
        assert_eq!(AIRPORTS[0].to_string(), "Sydney (SYD) - Sydney Kingsford Smith");
    }

    #[test]
    fn test_extract_location_from_preferences() {
        assert_eq!(extract_location_from_preferences("Near the BEACH please", "Gold Coast"), "Gold Coast beach");
        assert_eq!(extract_location_from_preferences("quiet and green", "Hobart"), "Hobart");
        assert_eq!(extract_location_from_preferences("", "Hobart"), "Hobart");
        // Earlier keywords win
        assert_eq!(extract_location_from_preferences("downtown or cbd", "Perth"), "Perth cbd");
    }

    #[test]
    fn test_return_trip_prompt() {
        let prompt = request().to_prompt().unwrap();
        assert!(prompt.starts_with("Plan a return trip from SYD to MEL from 2025-06-22 to 2025-06-28 (6 days)."));
        assert!(prompt.contains("Energy level: Active."));
        assert!(prompt.contains("The total budget for the trip is 3000 AUD."));
        assert!(prompt.contains("using these dates, and filter by budget."));
        assert!(prompt.contains("use location 'Melbourne cbd'"));
    }

    #[test]
    fn test_one_way_prompt_without_budget() {
        let trip = TripRequest {
            trip_type: TripType::OneWay,
            check_out: None,
            budget_aud: None,
            preferences: String::new(),
            ..request()
        };
        let prompt = trip.to_prompt().unwrap();
        assert!(prompt.contains("departing on 2025-06-22 (one way)"));
        assert!(!prompt.contains("AUD"));
        assert!(!prompt.contains("When searching for hotels"));
    }

    #[test]
    fn test_validation() {
        let bad_dates = TripRequest {
            check_out: Some(date("2025-06-20")),
            ..request()
        };
        assert!(matches!(bad_dates.validate(), Err(Error::InvalidTrip(_))));

        let missing_return = TripRequest {
            check_out: None,
            ..request()
        };
        assert!(missing_return.to_prompt().is_err());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("One-Way".parse::<TripType>().unwrap(), TripType::OneWay);
        assert_eq!("relaxed".parse::<EnergyLevel>().unwrap(), EnergyLevel::Relaxed);
        assert!("sprint".parse::<EnergyLevel>().is_err());
    }
}
