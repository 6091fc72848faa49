//! Keystroke synthesis implementations.

use crate::{PlatformError, PlatformResult};
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use seltext_core::{KeySynthesizer, SynthesisError};
use std::sync::Mutex;
use tracing::{debug, warn};

/// The platform's copy shortcut modifier.
#[cfg(target_os = "macos")]
const COPY_MODIFIER: Key = Key::Meta;
#[cfg(not(target_os = "macos"))]
const COPY_MODIFIER: Key = Key::Control;

/// Injector that only logs; used when synthesis is unavailable.
pub struct NoopInjector;

impl KeySynthesizer for NoopInjector {
    fn send_copy(&self) -> Result<(), SynthesisError> {
        debug!("NoopInjector: would send copy shortcut");
        Ok(())
    }
}

/// Real keystroke injector using `enigo` crate.
pub struct EnigoInjector {
    enigo: Mutex<Enigo>,
}

impl EnigoInjector {
    pub fn new() -> PlatformResult<Self> {
        let settings = Settings::default();
        let enigo = Enigo::new(&settings).map_err(|e| {
            PlatformError::InjectionFailed(format!("failed to create Enigo: {e}"))
        })?;
        Ok(Self {
            enigo: Mutex::new(enigo),
        })
    }
}

impl KeySynthesizer for EnigoInjector {
    fn send_copy(&self) -> Result<(), SynthesisError> {
        let mut enigo = self.enigo.lock().unwrap_or_else(|e| e.into_inner());
        debug!("injecting copy shortcut");

        enigo
            .key(COPY_MODIFIER, Direction::Press)
            .map_err(|e| SynthesisError(e.to_string()))?;
        let tap = enigo
            .key(Key::Unicode('c'), Direction::Click)
            .map_err(|e| SynthesisError(e.to_string()));
        // Never leave the modifier stuck, even if the tap failed.
        if let Err(e) = enigo.key(COPY_MODIFIER, Direction::Release) {
            warn!(error = %e, "failed to release copy modifier");
        }
        tap
    }
}
