//! Motion permission negotiation
//!
//! Some platforms gate motion events behind an explicit user prompt; others
//! deliver them freely. The platform picks one of the two gate variants once
//! at startup.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::motion::types::PermissionStatus;

/// Platform prompt that asks the user for motion access.
///
/// Resolves with the platform's outcome string (`"granted"`, `"denied"`, ...)
/// or an error message if the prompt itself failed.
#[async_trait]
pub trait PermissionPrompt: Send + Sync {
    async fn prompt(&self) -> Result<String, String>;
}

/// Permission gate selected from platform capabilities
pub enum PermissionGate {
    /// No consent required; always granted
    Ungated,
    /// Consent obtained through an asynchronous prompt
    Gated(Box<dyn PermissionPrompt>),
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionGate::Ungated => f.write_str("Ungated"),
            PermissionGate::Gated(_) => f.write_str("Gated"),
        }
    }
}

impl PermissionGate {
    pub fn gated(prompt: impl PermissionPrompt + 'static) -> Self {
        PermissionGate::Gated(Box::new(prompt))
    }

    pub fn is_gated(&self) -> bool {
        matches!(self, PermissionGate::Gated(_))
    }

    /// Ask for motion access.
    ///
    /// Never returns `Prompt`. Anything other than an explicit `"granted"`
    /// outcome, including a failed prompt, is `Denied`.
    pub async fn request(&self) -> PermissionStatus {
        match self {
            PermissionGate::Ungated => {
                debug!("motion permission not gated; granted");
                PermissionStatus::Granted
            }
            PermissionGate::Gated(prompt) => match prompt.prompt().await {
                Ok(outcome) => {
                    let status = parse_outcome(&outcome);
                    debug!(outcome = %outcome, status = status.as_str(), "motion permission prompt settled");
                    status
                }
                Err(e) => {
                    warn!(error = %e, "motion permission prompt failed");
                    PermissionStatus::Denied
                }
            },
        }
    }
}

fn parse_outcome(outcome: &str) -> PermissionStatus {
    if outcome == "granted" {
        PermissionStatus::Granted
    } else {
        PermissionStatus::Denied
    }
}

/// Prompt that always answers with a fixed outcome
#[derive(Debug, Clone)]
pub struct FixedPrompt {
    outcome: Result<String, String>,
}

impl FixedPrompt {
    pub fn granting() -> Self {
        Self {
            outcome: Ok("granted".to_string()),
        }
    }

    pub fn denying() -> Self {
        Self {
            outcome: Ok("denied".to_string()),
        }
    }

    pub fn answering(outcome: impl Into<String>) -> Self {
        Self {
            outcome: Ok(outcome.into()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
        }
    }
}

#[async_trait]
impl PermissionPrompt for FixedPrompt {
    async fn prompt(&self) -> Result<String, String> {
        self.outcome.clone()
    }
}
