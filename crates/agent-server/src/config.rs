//! Server Configuration

use weather_advisor::svckit::DEFAULT_MCP_URL;

pub const DEFAULT_PORT: u16 = 8001;

/// Settings read once at startup
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listening port (`AGENT_PORT`)
    pub port: u16,

    /// Weather normalization server base URL (`MCP_SERVER_URL`)
    pub mcp_url: String,

    /// Model deployment name (`MODEL_DEPLOYMENT_NAME`), empty when unset
    pub model: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = std::env::var("AGENT_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let mcp_url = std::env::var("MCP_SERVER_URL").unwrap_or_else(|_| DEFAULT_MCP_URL.into());
        let model = std::env::var("MODEL_DEPLOYMENT_NAME").unwrap_or_default();

        Self {
            port,
            mcp_url,
            model,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig {
            port: DEFAULT_PORT,
            mcp_url: DEFAULT_MCP_URL.into(),
            model: String::new(),
        };
        assert_eq!(config.bind_addr(), "0.0.0.0:8001");
    }
}
