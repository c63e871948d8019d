//! System prompt management
//!
//! The system prompt is derived from a constant template and the current
//! year, which is read once at process start.

use std::sync::LazyLock;

use chrono::Datelike;

static PROCESS_YEAR: LazyLock<i32> = LazyLock::new(|| chrono::Local::now().year());

/// Year captured when the process first asked for it
pub fn current_year() -> i32 {
    *PROCESS_YEAR
}

/// System prompt configuration and generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt {
    year: i32,
    /// Additional context appended after the template
    context: Option<String>,
}

impl Default for SystemPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemPrompt {
    /// Prompt for the process-start year
    pub fn new() -> Self {
        Self::for_year(current_year())
    }

    /// Prompt for an explicit year
    pub fn for_year(year: i32) -> Self {
        Self { year, context: None }
    }

    /// Add custom context
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Build the final system prompt
    pub fn build(&self) -> String {
        let base = TRAVEL_AGENT_PROMPT.replace("{year}", &self.year.to_string());
        match &self.context {
            Some(ctx) => format!("{}\n\n{}", base, ctx),
            None => base,
        }
    }
}

/// Build the human message sent when the failure threshold is reached
pub fn fallback_request(failed_tools: &[String], original_request: &str) -> String {
    FALLBACK_PROMPT
        .replace("{failed_tools}", &failed_tools.join(", "))
        .replace("{original_request}", original_request)
}

const TRAVEL_AGENT_PROMPT: &str = r#"You are a smart travel agency. Use the tools to look up information.
You are allowed to make multiple calls (either together or in sequence).
Only look up information when you are sure of what you want.
The current year is {year}.
If you need to look up some information before asking a follow up question, you are allowed to do that!
I want to have in your output links to hotels websites and flights websites (if possible).
I want to have as well the logo of the hotel. (if possible).
In your output always include the price of the flight and the price of the hotel and the currency as well (if possible).
for example for hotels-
Rate: $581 per night
Total: $3,488"#;

const FALLBACK_PROMPT: &str = r#"The following tools failed: {failed_tools}.
Original request: {original_request}

Please generate a travel plan using only the information we have available.
Focus on providing:
1. A general daily itinerary
2. Local attractions and restaurant recommendations
3. General packing tips
4. A basic travel checklist

Clearly indicate which information is missing and provide alternative suggestions where possible."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_year() {
        let prompt = SystemPrompt::for_year(2031).build();
        assert!(prompt.contains("The current year is 2031."));
        assert!(!prompt.contains("{year}"));
    }

    #[test]
    fn test_prompt_is_stable_for_a_year() {
        assert_eq!(SystemPrompt::for_year(2030).build(), SystemPrompt::for_year(2030).build());
        assert_eq!(SystemPrompt::new().year(), current_year());
    }

    #[test]
    fn test_prompt_with_context() {
        let prompt = SystemPrompt::for_year(2030).with_context("Budget: 3000 AUD").build();
        assert!(prompt.ends_with("Budget: 3000 AUD"));
    }

    #[test]
    fn test_fallback_request_names_failed_tools() {
        let text = fallback_request(
            &["flights_finder".to_string(), "hotels_finder".to_string()],
            "Plan Sydney to Melbourne",
        );
        assert!(text.starts_with("The following tools failed: flights_finder, hotels_finder."));
        assert!(text.contains("Original request: Plan Sydney to Melbourne"));
    }
}
