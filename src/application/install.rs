//! One-shot "install this app" affordance.
//!
//! The host platform announces that installation is possible by handing over a
//! signal. The session keeps at most one; prompting consumes it whether or not
//! the prompt succeeds.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallChoice {
    Accepted,
    Dismissed,
}

#[derive(Debug, Error)]
#[error("install prompt failed: {0}")]
pub struct InstallError(pub String);

/// Platform-provided install signal.
#[async_trait]
pub trait InstallSignal: Send + Sync {
    /// Show the platform prompt and wait for the user's choice.
    async fn prompt(&self) -> Result<InstallChoice, InstallError>;
}

#[derive(Default)]
pub struct InstallPrompt {
    captured: Option<Box<dyn InstallSignal>>,
}

impl InstallPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the latest signal, replacing any earlier one.
    pub fn capture(&mut self, signal: Box<dyn InstallSignal>) {
        self.captured = Some(signal);
    }

    pub fn is_available(&self) -> bool {
        self.captured.is_some()
    }

    /// Returns `None` when nothing was captured or the prompt failed.
    pub async fn prompt_install(&mut self) -> Option<InstallChoice> {
        let signal = self.captured.take()?;
        match signal.prompt().await {
            Ok(choice) => {
                info!(target = "tryon::install", choice = ?choice, "install prompt answered");
                Some(choice)
            }
            Err(err) => {
                warn!(target = "tryon::install", error = %err, "install prompt failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for InstallPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallPrompt")
            .field("available", &self.is_available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct ScriptedSignal {
        answer: Result<InstallChoice, String>,
        prompts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl InstallSignal for ScriptedSignal {
        async fn prompt(&self) -> Result<InstallChoice, InstallError> {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            self.answer.clone().map_err(InstallError)
        }
    }

    fn signal(answer: Result<InstallChoice, String>, prompts: &Arc<AtomicUsize>) -> Box<dyn InstallSignal> {
        Box::new(ScriptedSignal {
            answer,
            prompts: Arc::clone(prompts),
        })
    }

    #[tokio::test]
    async fn prompt_without_capture_does_nothing() {
        let mut install = InstallPrompt::new();
        assert!(!install.is_available());
        assert_eq!(install.prompt_install().await, None);
    }

    #[tokio::test]
    async fn captured_signal_is_used_once() {
        let prompts = Arc::new(AtomicUsize::new(0));
        let mut install = InstallPrompt::new();
        install.capture(signal(Ok(InstallChoice::Accepted), &prompts));
        assert!(install.is_available());

        assert_eq!(install.prompt_install().await, Some(InstallChoice::Accepted));
        assert!(!install.is_available());
        assert_eq!(install.prompt_install().await, None);
        assert_eq!(prompts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_prompt_still_discards_capture() {
        let prompts = Arc::new(AtomicUsize::new(0));
        let mut install = InstallPrompt::new();
        install.capture(signal(Err("platform refused".into()), &prompts));

        assert_eq!(install.prompt_install().await, None);
        assert!(!install.is_available());
    }
}
