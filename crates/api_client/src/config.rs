use std::time::Duration;

use tracing::warn;

/// Client-side settings. CRUD calls get short timeouts; the AI assistant
/// endpoints get a longer read budget because model answers are slow.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub ai_connect_timeout_secs: u64,
    pub ai_read_timeout_secs: u64,
    pub ai_short_timeout_secs: u64,
    pub ai_health_timeout_secs: u64,
    pub ai_warmup_timeout_secs: u64,
    pub list_cache_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/v1".into(),
            connect_timeout_secs: 5,
            read_timeout_secs: 30,
            ai_connect_timeout_secs: 5,
            ai_read_timeout_secs: 90,
            ai_short_timeout_secs: 60,
            ai_health_timeout_secs: 15,
            ai_warmup_timeout_secs: 30,
            list_cache_ttl_secs: 30,
        }
    }
}

impl Settings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn list_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.list_cache_ttl_secs)
    }
}

/// Defaults, then `dashboard.toml` in the working directory, then
/// environment variables; last writer wins.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = std::fs::read_to_string("dashboard.toml") {
        match toml::from_str::<toml::Value>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, &file_cfg),
            Err(err) => warn!(%err, "ignoring malformed dashboard.toml"),
        }
    }

    if let Ok(v) = std::env::var("API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Ok(v) = std::env::var("DASHBOARD__API_BASE_URL") {
        settings.api_base_url = v;
    }

    apply_env_u64("DASHBOARD__CONNECT_TIMEOUT_SECS", &mut settings.connect_timeout_secs);
    apply_env_u64("DASHBOARD__READ_TIMEOUT_SECS", &mut settings.read_timeout_secs);
    apply_env_u64(
        "DASHBOARD__AI_CONNECT_TIMEOUT_SECS",
        &mut settings.ai_connect_timeout_secs,
    );
    apply_env_u64("DASHBOARD__AI_READ_TIMEOUT_SECS", &mut settings.ai_read_timeout_secs);
    apply_env_u64(
        "DASHBOARD__AI_SHORT_TIMEOUT_SECS",
        &mut settings.ai_short_timeout_secs,
    );
    apply_env_u64(
        "DASHBOARD__AI_HEALTH_TIMEOUT_SECS",
        &mut settings.ai_health_timeout_secs,
    );
    apply_env_u64(
        "DASHBOARD__AI_WARMUP_TIMEOUT_SECS",
        &mut settings.ai_warmup_timeout_secs,
    );
    apply_env_u64(
        "DASHBOARD__LIST_CACHE_TTL_SECS",
        &mut settings.list_cache_ttl_secs,
    );

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: &toml::Value) {
    if let Some(v) = file_cfg.get("api_base_url").and_then(toml::Value::as_str) {
        settings.api_base_url = v.to_string();
    }

    let mut apply_u64 = |key: &str, slot: &mut u64| {
        if let Some(v) = file_cfg.get(key).and_then(toml::Value::as_integer) {
            if v > 0 {
                *slot = v as u64;
            }
        }
    };
    apply_u64("connect_timeout_secs", &mut settings.connect_timeout_secs);
    apply_u64("read_timeout_secs", &mut settings.read_timeout_secs);
    apply_u64("ai_connect_timeout_secs", &mut settings.ai_connect_timeout_secs);
    apply_u64("ai_read_timeout_secs", &mut settings.ai_read_timeout_secs);
    apply_u64("ai_short_timeout_secs", &mut settings.ai_short_timeout_secs);
    apply_u64("ai_health_timeout_secs", &mut settings.ai_health_timeout_secs);
    apply_u64("ai_warmup_timeout_secs", &mut settings.ai_warmup_timeout_secs);
    apply_u64("list_cache_ttl_secs", &mut settings.list_cache_ttl_secs);
}

fn apply_env_u64(name: &str, slot: &mut u64) {
    if let Ok(raw) = std::env::var(name) {
        if let Ok(parsed) = raw.parse::<u64>() {
            *slot = parsed;
        }
    }
}
