//! Tool Registry Factory Module
//!
//! Builds the registry bound to the agent. Centralizes registration of the
//! travel tools and lets callers add their own.

use std::sync::Arc;

use crate::config::ToolsConfig;
use crate::error::Result;
use crate::tools::travel::{FlightsFinder, HotelsFinder, WeatherCheck};
use crate::tools::{Tool, ToolRegistry};

/// Builder for creating a tool registry with customizable options
pub struct ToolRegistryBuilder {
    config: ToolsConfig,
    include_flights: bool,
    include_hotels: bool,
    include_weather: bool,
    extra: Vec<Arc<dyn Tool>>,
}

impl ToolRegistryBuilder {
    pub fn new(config: ToolsConfig) -> Self {
        Self {
            config,
            include_flights: true,
            include_hotels: true,
            include_weather: true,
            extra: Vec::new(),
        }
    }

    pub fn with_flights(mut self, include: bool) -> Self {
        self.include_flights = include;
        self
    }

    pub fn with_hotels(mut self, include: bool) -> Self {
        self.include_hotels = include;
        self
    }

    pub fn with_weather(mut self, include: bool) -> Self {
        self.include_weather = include;
        self
    }

    /// Register an additional tool after the built-in ones
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.extra.push(tool);
        self
    }

    /// Build the registry. Fails if two tools share a name.
    pub fn build(self) -> Result<ToolRegistry> {
        let mut registry = ToolRegistry::new();

        if self.include_flights {
            registry.register(Arc::new(FlightsFinder::from_config(&self.config)))?;
        }
        if self.include_hotels {
            registry.register(Arc::new(HotelsFinder::from_config(&self.config)))?;
        }
        if self.include_weather {
            registry.register(Arc::new(WeatherCheck::from_config(&self.config)))?;
        }
        for tool in self.extra {
            registry.register(tool)?;
        }

        Ok(registry)
    }
}

/// Registry with the flight, hotel and weather tools
pub fn create_travel_tool_registry(config: &ToolsConfig) -> Result<ToolRegistry> {
    ToolRegistryBuilder::new(config.clone()).build()
}
