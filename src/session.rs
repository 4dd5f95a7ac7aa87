//! Operator identity for the active session.

use crate::error::LabelError;

/// Who is labeling. Unset until the login step runs; every commit reads it
/// to attribute the ledger update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionContext {
    current_user: Option<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the operator. Surrounding whitespace is dropped; a blank name is
    /// refused.
    pub fn login(&mut self, user_name: &str) -> Result<(), LabelError> {
        let user_name = user_name.trim();
        if user_name.is_empty() {
            return Err(LabelError::InvalidOperator(user_name.to_string()));
        }
        self.current_user = Some(user_name.to_string());
        Ok(())
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    /// The operator to credit, or `NoOperator` before login.
    pub fn require_user(&self) -> Result<&str, LabelError> {
        self.current_user().ok_or(LabelError::NoOperator)
    }
}
