use std::time::Duration;

use anyhow::Context;

/// Fixed path of the chat-completion endpoint on the gateway.
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

const DEFAULT_PORT: &str = "18789";
const DEFAULT_USE_TLS: &str = "0";
const DEFAULT_MODEL: &str = "openclaw";
const DEFAULT_AGENT_ID: &str = "main";
const DEFAULT_TIMEOUT_MS: &str = "45000";
const DEFAULT_USER: &str = "esp32-speaker";
const DEFAULT_BUTTON_PROMPT: &str = "Give me a short status update.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
}

/// Everything needed to reach the OpenClaw gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    /// Bearer token; empty means no `Authorization` header is sent.
    pub token: String,
    pub model: String,
    pub agent_id: String,
    pub timeout_ms: u64,
    /// Opaque label sent as the `user` field of every request.
    pub user: String,
}

impl GatewayConfig {
    pub fn url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}:{}{}", scheme, self.host, self.port, CHAT_COMPLETIONS_PATH)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub wifi: WifiConfig,
    pub gateway: GatewayConfig,
    /// Prompt submitted when the BOOT button is pressed.
    pub button_prompt: String,
}

impl Config {
    /// Load the values baked in by `build.rs` from `secrets.local.rs`.
    pub fn from_build_env() -> anyhow::Result<Self> {
        let raw = RawConfig {
            ssid: env!("WIFI_SSID"),
            password: env!("WIFI_PASS"),
            host: env!("OPENCLAW_HOST"),
            port: option_env!("OPENCLAW_PORT").unwrap_or(DEFAULT_PORT),
            use_tls: option_env!("OPENCLAW_USE_TLS").unwrap_or(DEFAULT_USE_TLS),
            token: option_env!("OPENCLAW_TOKEN").unwrap_or(""),
            model: option_env!("OPENCLAW_MODEL").unwrap_or(DEFAULT_MODEL),
            agent_id: option_env!("OPENCLAW_AGENT_ID").unwrap_or(DEFAULT_AGENT_ID),
            timeout_ms: option_env!("OPENCLAW_HTTP_TIMEOUT_MS").unwrap_or(DEFAULT_TIMEOUT_MS),
            user: option_env!("OPENCLAW_USER").unwrap_or(DEFAULT_USER),
            button_prompt: option_env!("OPENCLAW_BUTTON_PROMPT").unwrap_or(DEFAULT_BUTTON_PROMPT),
        };
        raw.parse()
    }
}

/// String form of the configuration, exactly as it comes out of the build environment.
struct RawConfig<'a> {
    ssid: &'a str,
    password: &'a str,
    host: &'a str,
    port: &'a str,
    use_tls: &'a str,
    token: &'a str,
    model: &'a str,
    agent_id: &'a str,
    timeout_ms: &'a str,
    user: &'a str,
    button_prompt: &'a str,
}

impl RawConfig<'_> {
    fn parse(&self) -> anyhow::Result<Config> {
        if self.host.is_empty() {
            return Err(anyhow::anyhow!("OPENCLAW_HOST is empty"));
        }
        let port = self
            .port
            .parse::<u16>()
            .with_context(|| format!("OPENCLAW_PORT is not a valid port: {}", self.port))?;
        let use_tls = match self.use_tls {
            "0" => false,
            "1" => true,
            other => return Err(anyhow::anyhow!("OPENCLAW_USE_TLS must be 0 or 1, got {}", other)),
        };
        let timeout_ms = self.timeout_ms.parse::<u64>().with_context(|| {
            format!("OPENCLAW_HTTP_TIMEOUT_MS is not a number: {}", self.timeout_ms)
        })?;

        Ok(Config {
            wifi: WifiConfig {
                ssid: self.ssid.to_string(),
                password: self.password.to_string(),
            },
            gateway: GatewayConfig {
                host: self.host.to_string(),
                port,
                use_tls,
                token: self.token.to_string(),
                model: self.model.to_string(),
                agent_id: self.agent_id.to_string(),
                timeout_ms,
                user: self.user.to_string(),
            },
            button_prompt: self.button_prompt.to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) fn test_gateway() -> GatewayConfig {
    GatewayConfig {
        host: "192.168.1.50".to_string(),
        port: 18789,
        use_tls: false,
        token: "secret".to_string(),
        model: "openclaw".to_string(),
        agent_id: "main".to_string(),
        timeout_ms: 45000,
        user: "esp32-speaker".to_string(),
    }
}
