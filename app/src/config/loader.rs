use include_dir::{include_dir, Dir};
use serde::de::DeserializeOwned;
use std::path::Path;

use super::paths::config_dir;

// Embed the entire configs directory at compile time
static CONFIGS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/resources/configs");

/// Load a YAML configuration file from disk
pub fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml(&content)
}

/// Parse YAML from string
pub fn parse_yaml<T: DeserializeOwned>(content: &str) -> anyhow::Result<T> {
    let config: T = serde_yaml::from_str(content)?;
    Ok(config)
}

/// Load embedded configuration by name from the configs directory
pub fn load_embedded_config<T: DeserializeOwned + Default>(name: &str) -> T {
    let file_name = format!("{}.yaml", name);

    let Some(file) = CONFIGS_DIR.get_file(&file_name) else {
        tracing::warn!("Embedded config {} not found, using defaults", name);
        return T::default();
    };
    let Some(content) = file.contents_utf8() else {
        tracing::error!("Embedded config {} is not valid UTF-8", name);
        return T::default();
    };

    match parse_yaml::<T>(content) {
        Ok(config) => {
            tracing::debug!("Loaded embedded config: {}", name);
            config
        }
        Err(e) => {
            tracing::error!("Failed to parse embedded config {}: {}", name, e);
            T::default()
        }
    }
}

/// Load `<name>.yaml` from the user config directory, falling back to the
/// embedded copy when the file is absent or invalid.
pub fn load_config<T: DeserializeOwned + Default>(name: &str) -> T {
    load_config_from(&config_dir(), name)
}

fn load_config_from<T: DeserializeOwned + Default>(dir: &Path, name: &str) -> T {
    let user_path = dir.join(format!("{}.yaml", name));

    if user_path.exists() {
        match load_yaml::<T>(&user_path) {
            Ok(config) => {
                tracing::info!("Loaded user config from {:?}", user_path);
                return config;
            }
            Err(e) => {
                tracing::warn!("Failed to parse {:?}: {}, using embedded config", user_path, e);
            }
        }
    } else {
        tracing::debug!("No user {}.yaml found, using embedded config", name);
    }

    load_embedded_config(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use seltext_core::{AppPolicyTable, EngineConfig, FailureCategory, PolicyConfig, TriggerKind};

    #[test]
    fn test_embedded_engine_config() {
        let config: EngineConfig = load_embedded_config("engine");
        assert_eq!(config.host_bundle_id.as_deref(), Some("com.seltext.app"));
        let hotkey = config.hotkey().unwrap().unwrap();
        assert!(hotkey.modifiers.alt);
        assert_eq!(hotkey.key, "d");
    }

    #[test]
    fn test_embedded_policy_config() {
        let config: PolicyConfig = load_embedded_config("policy");
        let table = AppPolicyTable::from_config(&config);
        assert!(table.browser("com.apple.Safari").is_some());
        assert!(table.browser("com.google.Chrome").is_some());
        assert!(table.allows_escalation("com.microsoft.VSCode", FailureCategory::EmptyResult));
        assert!(!table.allows_escalation("com.apple.TextEdit", FailureCategory::EmptyResult));
        assert!(!table.allows_trigger("com.apple.Terminal", TriggerKind::ShiftClick));
    }

    #[test]
    fn test_missing_embedded_config_uses_defaults() {
        let config: EngineConfig = load_embedded_config("does-not-exist");
        assert!(config.host_bundle_id.is_none());
    }

    #[test]
    fn test_user_override_falls_back_when_invalid() {
        let dir = std::env::temp_dir().join(format!("seltext-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        std::fs::write(dir.join("engine.yaml"), "copy_timeout_ms: 900\n").unwrap();
        let config: EngineConfig = load_config_from(&dir, "engine");
        assert_eq!(config.copy_timeout_ms, 900);

        std::fs::write(dir.join("engine.yaml"), "copy_timeout_ms: [not a number]\n").unwrap();
        let config: EngineConfig = load_config_from(&dir, "engine");
        assert_eq!(config.host_bundle_id.as_deref(), Some("com.seltext.app"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
