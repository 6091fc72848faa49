//! Automation-script port: runs AppleScript against a target app via `osascript`.

use async_trait::async_trait;
use seltext_core::{ScriptError, ScriptRunner};

/// Wrap a script body so it is addressed to one application by bundle id.
pub fn wrap_for_bundle(bundle_id: &str, script: &str) -> String {
    format!(
        "tell application id \"{}\"\n{}\nend tell",
        bundle_id.replace('"', ""),
        script
    )
}

/// Runs each script in its own `osascript` child, killed if the caller
/// stops waiting.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsaScriptRunner;

impl OsaScriptRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScriptRunner for OsaScriptRunner {
    #[cfg(target_os = "macos")]
    async fn run(&self, bundle_id: &str, script: &str) -> Result<String, ScriptError> {
        use tokio::process::Command;
        use tracing::debug;

        let output = Command::new("osascript")
            .arg("-e")
            .arg(wrap_for_bundle(bundle_id, script))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ScriptError::Launch(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(bundle_id, stderr = %stderr.trim(), "osascript failed");
            return Err(ScriptError::Failed(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        // osascript terminates its result with a newline.
        Ok(stdout.strip_suffix('\n').unwrap_or(&stdout).to_string())
    }

    #[cfg(not(target_os = "macos"))]
    async fn run(&self, _bundle_id: &str, _script: &str) -> Result<String, ScriptError> {
        Err(ScriptError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_for_bundle() {
        let wrapped = wrap_for_bundle("com.apple.Safari", "return 1");
        assert_eq!(wrapped, "tell application id \"com.apple.Safari\"\nreturn 1\nend tell");
    }

    #[test]
    fn test_wrap_strips_quotes_from_bundle_id() {
        let wrapped = wrap_for_bundle("evil\" to quit", "return 1");
        assert!(wrapped.starts_with("tell application id \"evil to quit\""));
    }

    #[cfg(not(target_os = "macos"))]
    #[tokio::test]
    async fn test_runner_unsupported_off_macos() {
        let result = OsaScriptRunner::new().run("com.apple.Safari", "return 1").await;
        assert_eq!(result, Err(ScriptError::Unsupported));
    }
}
