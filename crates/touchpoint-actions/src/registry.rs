use std::collections::BTreeMap;

use touchpoint_core::{ErrorCode, Outcome, Severity, TouchpointError};
use tracing::{info, warn};

use crate::{HostContext, MarkerFileAction, Parameters, ProvisioningAction, SetConfigValue};

/// Looks actions up by name and runs them.
#[derive(Default)]
pub struct ActionRegistry {
    actions: BTreeMap<&'static str, Box<dyn ProvisioningAction>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in action bound to `host`.
    pub fn with_defaults(host: HostContext) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SetConfigValue::new(host.clone())));
        registry.register(Box::new(MarkerFileAction::new(host)));
        registry
    }

    /// Adds `action`, replacing any action already registered under its name.
    pub fn register(&mut self, action: Box<dyn ProvisioningAction>) {
        self.actions.insert(action.name(), action);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.actions.keys().copied().collect()
    }

    pub fn execute(&self, name: &str, params: &mut Parameters<'_>) -> Outcome {
        match self.actions.get(name) {
            Some(action) => {
                info!(action = name, "executing action");
                log_outcome(name, action.execute(params))
            }
            None => unknown_action(name),
        }
    }

    pub fn undo(&self, name: &str, params: &mut Parameters<'_>) -> Outcome {
        match self.actions.get(name) {
            Some(action) => {
                info!(action = name, "undoing action");
                log_outcome(name, action.undo(params))
            }
            None => unknown_action(name),
        }
    }
}

fn log_outcome(name: &str, outcome: Outcome) -> Outcome {
    match outcome.severity {
        Severity::Ok => info!(action = name, "action completed"),
        Severity::Warning | Severity::Error => warn!(
            action = name,
            severity = ?outcome.severity,
            message = outcome.message.as_deref().unwrap_or_default(),
            "action did not complete cleanly"
        ),
    }
    outcome
}

fn unknown_action(name: &str) -> Outcome {
    warn!(action = name, "unknown action requested");
    TouchpointError {
        code: ErrorCode::UnknownAction,
        message: format!("no action named '{name}'"),
        detail: None,
    }
    .into()
}
