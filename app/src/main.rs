//! Seltext host: wires the selection engine to the OS input hook and
//! prints every extraction outcome as a JSON line on stdout.

mod config;
mod listener;
mod logging;

use anyhow::Context;
use listener::JsonLinesListener;
use seltext_core::{
    AffordanceHandle, AppPolicyTable, EventDispatcher, FrontmostApp, KeySynthesizer,
    PlatformPorts, SelectionEngine, SelectionListener, SelectionOrchestrator,
};
use seltext_platform::{
    is_accessibility_trusted, start_input_hook, system_accessibility, ArboardClipboard,
    EnigoInjector, NoopInjector, OsaScriptRunner, SystemFrontmostApp,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

fn main() -> anyhow::Result<()> {
    logging::setup(!cfg!(debug_assertions));
    let configs = config::load();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("seltext-worker")
        .build()
        .context("failed to build tokio runtime")?;

    if !is_accessibility_trusted() {
        warn!("Accessibility permission not granted; selections will mostly come back empty");
    }

    let policy = Arc::new(AppPolicyTable::from_config(&configs.policy));
    let frontmost: Arc<dyn FrontmostApp> = Arc::new(SystemFrontmostApp::new());
    let keys: Arc<dyn KeySynthesizer> = match EnigoInjector::new() {
        Ok(injector) => Arc::new(injector),
        Err(e) => {
            error!(error = %e, "Keystroke synthesis unavailable, copy shortcut disabled");
            Arc::new(NoopInjector)
        }
    };

    let ports = PlatformPorts {
        accessibility: system_accessibility(),
        scripts: Arc::new(OsaScriptRunner::new()),
        clipboard: Arc::new(ArboardClipboard::new()),
        keys,
        frontmost: frontmost.clone(),
    };

    let orchestrator = Arc::new(SelectionOrchestrator::new(
        configs.engine.clone(),
        policy.clone(),
        ports,
    ));
    let listener: Arc<dyn SelectionListener> = Arc::new(JsonLinesListener::stdout());
    let engine = SelectionEngine::new(orchestrator, listener.clone(), runtime.handle().clone());

    let mut dispatcher = EventDispatcher::new(
        &configs.engine,
        engine,
        policy,
        frontmost,
        listener,
        AffordanceHandle::default(),
    )
    .context("invalid engine configuration")?;

    let hook = start_input_hook();
    let events = hook.events();
    std::thread::Builder::new()
        .name("seltext-dispatcher".into())
        .spawn(move || dispatcher.run(events))
        .context("failed to spawn dispatcher thread")?;

    info!("Seltext running, press Ctrl+C to quit");
    runtime
        .block_on(tokio::signal::ctrl_c())
        .context("failed to wait for Ctrl+C")?;

    info!("Shutting down");
    hook.stop();
    // In-flight clipboard strategies restore the clipboard when dropped.
    runtime.shutdown_timeout(Duration::from_millis(500));
    Ok(())
}
