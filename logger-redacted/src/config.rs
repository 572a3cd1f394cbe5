// Logger configuration
use serde::{Deserialize, Serialize};

/// Output format for the process-wide subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, coloured output for local development
    Pretty,
    /// One JSON object per event for log shippers
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub format: LogFormat,
    /// Fallback filter directives used when `RUST_LOG` is not set
    pub default_directives: String,
    pub verbose: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            default_directives: "medgate_server=info,auth_identity=info,tower_http=info,sqlx=warn"
                .to_string(),
            verbose: false,
        }
    }
}

impl LoggerConfig {
    /// Directives with every `=info` bumped to `=debug` when verbose
    pub fn directives(&self) -> String {
        if self.verbose {
            self.default_directives.replace("=info", "=debug")
        } else {
            self.default_directives.clone()
        }
    }
}
