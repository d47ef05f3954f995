use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

fn default_base_path() -> String {
    "/scim/v2".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DirectoryConfig {
    #[serde(rename = "type")]
    pub directory_type: String,
    /// Base URL for `members@odata.bind` references
    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,
    /// JSON file preloading the in-memory directory
    #[serde(default)]
    pub seed: Option<String>,
}

fn default_graph_base_url() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from YAML file
    pub fn load_from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, String> {
        let path = config_path.as_ref();

        if !path.exists() {
            return Err(format!("Configuration file not found: {}", path.display()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        Self::from_yaml(&content)
            .map_err(|e| format!("Invalid config file {}: {}", path.display(), e))
    }

    /// Parse configuration from YAML text, expanding environment variables first
    pub fn from_yaml(content: &str) -> Result<Self, String> {
        let expanded_content = Self::expand_env_vars(content)?;

        let app_config: AppConfig = serde_yaml::from_str(&expanded_content)
            .map_err(|e| format!("Failed to parse YAML: {}", e))?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Default configuration: empty in-memory directory on localhost
    pub fn default_config() -> Self {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                base_path: default_base_path(),
            },
            directory: DirectoryConfig {
                directory_type: "memory".to_string(),
                graph_base_url: default_graph_base_url(),
                seed: None,
            },
            logging: LoggingConfig::default(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !self.server.base_path.starts_with('/') {
            return Err(format!(
                "server.base_path must start with '/': {}",
                self.server.base_path
            ));
        }
        url::Url::parse(&self.directory.graph_base_url).map_err(|e| {
            format!(
                "directory.graph_base_url is not a valid URL ({}): {}",
                self.directory.graph_base_url, e
            )
        })?;
        self.logging
            .level
            .parse::<tracing::Level>()
            .map_err(|_| format!("Unknown logging.level: {}", self.logging.level))?;
        Ok(())
    }

    /// Expand environment variables in format ${VAR_NAME} or ${VAR_NAME:-default}
    fn expand_env_vars(content: &str) -> Result<String, String> {
        let mut expanded = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(start) = rest.find("${") {
            expanded.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                // Unterminated expression is kept verbatim
                expanded.push_str(&rest[start..]);
                rest = "";
                break;
            };

            let var_expr = &after[..end];
            let (var_name, default_value) = match var_expr.find(":-") {
                Some(pos) => (&var_expr[..pos], Some(&var_expr[pos + 2..])),
                None => (var_expr, None),
            };

            let value = match (std::env::var(var_name), default_value) {
                (Ok(val), _) => val,
                (Err(_), Some(default)) => default.to_string(),
                (Err(_), None) => {
                    return Err(format!(
                        "Environment variable {} not found and no default provided",
                        var_name
                    ))
                }
            };
            expanded.push_str(&value);
            rest = &after[end + 1..];
        }
        expanded.push_str(rest);

        Ok(expanded)
    }

    /// Bind base for group membership references
    pub fn member_bind_base(&self) -> &str {
        self.directory.graph_base_url.trim_end_matches('/')
    }
}
