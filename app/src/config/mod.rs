pub mod loader;
pub mod paths;

use seltext_core::{EngineConfig, PolicyConfig};

/// Engine and policy configuration for one process lifetime.
pub struct Configs {
    pub engine: EngineConfig,
    pub policy: PolicyConfig,
}

/// Load both configuration files (user override, else embedded).
pub fn load() -> Configs {
    let configs = Configs {
        engine: loader::load_config("engine"),
        policy: loader::load_config("policy"),
    };
    tracing::info!(
        apps = configs.policy.apps.len(),
        browsers = configs.policy.browsers.len(),
        "Configuration initialized"
    );
    configs
}
