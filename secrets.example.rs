// Copy this file to secrets.local.rs and fill in your values.
// build.rs reads the string constants below; secrets.local.rs is never compiled or committed.

// Wi-Fi settings
pub const WIFI_SSID: &str = "your-wifi-name";
pub const WIFI_PASS: &str = "your-wifi-password";

// OpenClaw gateway HTTP endpoint
pub const OPENCLAW_HOST: &str = "192.168.1.50";
pub const OPENCLAW_PORT: &str = "18789";
// "1" switches to https. Certificates are NOT verified, see sdkconfig.defaults.
pub const OPENCLAW_USE_TLS: &str = "0";

// OpenClaw auth token (leave empty only if auth is disabled)
pub const OPENCLAW_TOKEN: &str = "secret";

// OpenClaw request tuning
pub const OPENCLAW_MODEL: &str = "openclaw";
pub const OPENCLAW_AGENT_ID: &str = "main";
pub const OPENCLAW_HTTP_TIMEOUT_MS: &str = "45000";
pub const OPENCLAW_USER: &str = "esp32-speaker";

// Hardware behavior
pub const OPENCLAW_BUTTON_PROMPT: &str = "Give me a short status update.";
