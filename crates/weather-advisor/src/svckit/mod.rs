//! Service Kit - Agent Tools
//!
//! The weather tool that implements `agent_core::Tool` and the lookup client
//! it calls.

mod weather_lookup;
mod weather_tool;

pub use weather_lookup::{lookup_text, WeatherLookupClient, DEFAULT_MCP_URL, LOOKUP_TIMEOUT};
pub use weather_tool::{WeatherQuery, WeatherTool, TOOL_NAME};
