use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub session: SessionConfig,
    /// Fallback signing secret; the SIGNATURE_SECRET env var takes precedence.
    #[serde(default)]
    pub signing_secret: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionConfig {
    /// Payment window: a pending session expires this many minutes after creation.
    pub ttl_minutes: i64,
    /// Base URL for the hosted checkout page the sender is redirected to.
    pub checkout_base_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 15,
            checkout_base_url: "https://checkout.paystack.com".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }

    /// Resolve the metadata signing secret: env var first, then config file.
    ///
    /// Falls back to the well-known dev placeholder so local runs work out of
    /// the box; production configs leave `signing_secret` null and must set
    /// the env var.
    pub fn resolve_signing_secret(&self) -> String {
        if let Ok(secret) = std::env::var("SIGNATURE_SECRET")
            && !secret.is_empty()
        {
            return secret;
        }
        match &self.signing_secret {
            Some(s) if !s.is_empty() => s.clone(),
            _ => {
                tracing::warn!("No signing secret configured, using dev placeholder");
                "SECRET_KEY".to_string()
            }
        }
    }
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "anonsend.log".to_string(),
            use_json: false,
            rotation: "never".to_string(),
            enable_tracing: false,
            gateway: GatewayConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            session: SessionConfig::default(),
            signing_secret: Some("test-secret".to_string()),
        }
    }
}
