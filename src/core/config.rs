use std::env;

/// VAPID public key shared with the backend's push-signing configuration.
pub const DEFAULT_VAPID_PUBLIC_KEY: &str =
    "BMtb7ZE8pjics63ZwaY_K7Uc3sEvbRJ4AOdDWmVoAeM-CRqfz6ZVNcsHVFmU5Z8gfWVyJ9_uKP99PGkG75pLS7w";

pub const DEFAULT_AGENT_SCRIPT: &str = "/sw.js";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub vapid_public_key: String,
    // Only needed when sending pushes, not for subscribing
    pub vapid_key_path: Option<String>,
    pub agent_script: String,
    pub agent: AgentConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api_base_url =
            env::var("HUB_API_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
        let vapid_public_key = env::var("HUB_VAPID_PUBLIC_KEY")
            .unwrap_or_else(|_| DEFAULT_VAPID_PUBLIC_KEY.to_string());
        let vapid_key_path = env::var("HUB_VAPID_KEY_PATH").ok();
        let agent_script =
            env::var("HUB_AGENT_SCRIPT").unwrap_or_else(|_| DEFAULT_AGENT_SCRIPT.to_string());

        let defaults = AgentConfig::default();
        let agent = AgentConfig {
            default_title: env::var("HUB_NOTIFICATION_TITLE").unwrap_or(defaults.default_title),
            default_body: env::var("HUB_NOTIFICATION_BODY").unwrap_or(defaults.default_body),
            icon: env::var("HUB_NOTIFICATION_ICON").unwrap_or(defaults.icon),
            badge: env::var("HUB_NOTIFICATION_BADGE").ok().or(defaults.badge),
            ..defaults
        };

        Self {
            api_base_url,
            vapid_public_key,
            vapid_key_path,
            agent_script,
            agent,
        }
    }
}

/// Presentation settings for the background delivery agent. One agent
/// implementation serves every deployment; only these values differ.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentConfig {
    pub default_title: String,
    pub default_body: String,
    pub default_url: String,
    pub icon: String,
    pub badge: Option<String>,
    pub vibrate: Vec<u32>,
    pub require_interaction: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            default_title: "VolunteerHub".to_string(),
            default_body: "You have a new notification".to_string(),
            default_url: "/".to_string(),
            icon: "/volunteer-hub-icon.png".to_string(),
            badge: Some("/volunteer-hub-badge.png".to_string()),
            vibrate: vec![200, 100, 200],
            require_interaction: true,
        }
    }
}
