use std::fmt;

/// States of a single checkout attempt. `Paid` and `Failed` are terminal;
/// an abandoned attempt simply never reaches either and leaves no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    AwaitingIntent,
    AwaitingPayment,
    Paid,
    Failed,
}

impl CheckoutState {
    fn name(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "idle",
            CheckoutState::AwaitingIntent => "awaiting-intent",
            CheckoutState::AwaitingPayment => "awaiting-payment",
            CheckoutState::Paid => "paid",
            CheckoutState::Failed => "failed",
        }
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("checkout event '{event}' is invalid in state '{state}'")]
pub struct InvalidTransition {
    pub state: &'static str,
    pub event: &'static str,
}

/// Single-pass checkout attempt:
/// Idle -> AwaitingIntent -> AwaitingPayment -> Paid | Failed.
/// Out-of-order events are rejected rather than ignored, so a caller bug
/// (double confirm, confirm before intent) surfaces immediately.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    state: CheckoutState,
    intent_id: Option<String>,
    failure: Option<String>,
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutFlow {
    pub fn new() -> Self {
        Self {
            state: CheckoutState::Idle,
            intent_id: None,
            failure: None,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn intent_id(&self) -> Option<&str> {
        self.intent_id.as_deref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, CheckoutState::Paid | CheckoutState::Failed)
    }

    fn reject(&self, event: &'static str) -> InvalidTransition {
        InvalidTransition {
            state: self.state.name(),
            event,
        }
    }

    /// User initiates checkout.
    pub fn begin(&mut self) -> Result<(), InvalidTransition> {
        match self.state {
            CheckoutState::Idle => {
                self.state = CheckoutState::AwaitingIntent;
                Ok(())
            }
            _ => Err(self.reject("begin")),
        }
    }

    /// Provider issued an authorization handle.
    pub fn intent_received(&mut self, intent_id: impl Into<String>) -> Result<(), InvalidTransition> {
        match self.state {
            CheckoutState::AwaitingIntent => {
                self.intent_id = Some(intent_id.into());
                self.state = CheckoutState::AwaitingPayment;
                Ok(())
            }
            _ => Err(self.reject("intent-received")),
        }
    }

    /// Provider confirmed the charge.
    pub fn confirm(&mut self) -> Result<(), InvalidTransition> {
        match self.state {
            CheckoutState::AwaitingPayment => {
                self.state = CheckoutState::Paid;
                Ok(())
            }
            _ => Err(self.reject("confirm")),
        }
    }

    /// Provider rejected the charge, or intent creation itself failed.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), InvalidTransition> {
        match self.state {
            CheckoutState::AwaitingIntent | CheckoutState::AwaitingPayment => {
                self.failure = Some(reason.into());
                self.state = CheckoutState::Failed;
                Ok(())
            }
            _ => Err(self.reject("fail")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_paid() {
        let mut flow = CheckoutFlow::new();
        assert_eq!(*flow.state(), CheckoutState::Idle);

        flow.begin().unwrap();
        assert_eq!(*flow.state(), CheckoutState::AwaitingIntent);

        flow.intent_received("pi_123").unwrap();
        assert_eq!(*flow.state(), CheckoutState::AwaitingPayment);
        assert_eq!(flow.intent_id(), Some("pi_123"));

        flow.confirm().unwrap();
        assert_eq!(*flow.state(), CheckoutState::Paid);
        assert!(flow.is_terminal());
    }

    #[test]
    fn provider_rejection_reaches_failed() {
        let mut flow = CheckoutFlow::new();
        flow.begin().unwrap();
        flow.intent_received("pi_123").unwrap();
        flow.fail("card declined").unwrap();
        assert_eq!(*flow.state(), CheckoutState::Failed);
        assert_eq!(flow.failure(), Some("card declined"));
        assert!(flow.is_terminal());
    }

    #[test]
    fn intent_creation_failure_reaches_failed() {
        let mut flow = CheckoutFlow::new();
        flow.begin().unwrap();
        flow.fail("payment initiation failed").unwrap();
        assert_eq!(*flow.state(), CheckoutState::Failed);
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        let mut flow = CheckoutFlow::new();
        assert!(flow.confirm().is_err());
        assert!(flow.intent_received("pi_1").is_err());
        assert!(flow.fail("too early").is_err());

        flow.begin().unwrap();
        assert!(flow.begin().is_err());
        assert!(flow.confirm().is_err());
    }

    #[test]
    fn terminal_states_absorb_nothing() {
        let mut flow = CheckoutFlow::new();
        flow.begin().unwrap();
        flow.intent_received("pi_1").unwrap();
        flow.confirm().unwrap();

        assert!(flow.begin().is_err());
        assert!(flow.confirm().is_err());
        assert!(flow.fail("late").is_err());

        let mut failed = CheckoutFlow::new();
        failed.begin().unwrap();
        failed.fail("declined").unwrap();
        assert!(failed.confirm().is_err());
        assert!(failed.begin().is_err());
    }

    #[test]
    fn transition_error_names_state_and_event() {
        let mut flow = CheckoutFlow::new();
        let err = flow.confirm().unwrap_err();
        assert_eq!(err.state, "idle");
        assert_eq!(err.event, "confirm");
        assert!(err.to_string().contains("idle"));
    }
}
