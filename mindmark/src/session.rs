//! PIN gate and inactivity timeout

use crate::config::SessionConfig;
use crate::schedule::Timer;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Number of digits in a PIN
pub const PIN_LENGTH: usize = 6;

/// Errors from the PIN gate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("PIN must be exactly 6 digits")]
    Malformed,

    #[error("Incorrect PIN")]
    Incorrect,
}

fn is_well_formed(code: &str) -> bool {
    code.len() == PIN_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// Checks entered codes against the fixed PIN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGate {
    pin: String,
}

impl AuthGate {
    /// Gate for a fixed PIN, which must itself be well formed
    pub fn new(pin: &str) -> Result<Self, AuthError> {
        if !is_well_formed(pin) {
            return Err(AuthError::Malformed);
        }
        Ok(Self {
            pin: pin.to_string(),
        })
    }

    /// Gate from configuration, `None` when no PIN is set
    pub fn from_config(config: &SessionConfig) -> Result<Option<Self>, AuthError> {
        config.pin.as_deref().map(Self::new).transpose()
    }

    /// Check an entered code
    ///
    /// # Returns
    /// * `Ok(())` - The code matches
    /// * `Err(AuthError::Malformed)` - Not six ASCII digits
    /// * `Err(AuthError::Incorrect)` - Well formed but wrong
    pub fn verify(&self, code: &str) -> Result<(), AuthError> {
        if !is_well_formed(code) {
            return Err(AuthError::Malformed);
        }
        if code != self.pin {
            log::warn!("Rejected incorrect PIN");
            return Err(AuthError::Incorrect);
        }
        Ok(())
    }

    /// Verify a code and open a session on success
    pub fn login(
        &self,
        code: &str,
        config: &SessionConfig,
        now: Instant,
    ) -> Result<Session, AuthError> {
        self.verify(code)?;
        log::info!("Session started");
        Ok(Session::start(config, now))
    }
}

/// Event raised by [`Session::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session ends in `remaining` unless there is activity
    Warning { remaining: Duration },
    LoggedOut,
}

/// Authenticated session with an inactivity timeout
///
/// Two timers run while the session is active: a warning shortly before
/// the timeout and the logout itself. Any activity re-arms both.
#[derive(Debug, Clone)]
pub struct Session {
    timeout: Duration,
    warning_lead: Duration,
    warning: Timer,
    logout: Timer,
    active: bool,
}

impl Session {
    pub fn new(timeout: Duration, warning_lead: Duration, now: Instant) -> Self {
        let mut session = Self {
            timeout,
            warning_lead: warning_lead.min(timeout),
            warning: Timer::new(),
            logout: Timer::new(),
            active: true,
        };
        session.arm(now);
        session
    }

    pub fn start(config: &SessionConfig, now: Instant) -> Self {
        Self::new(config.inactivity_timeout(), config.warning_lead(), now)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Time left before logout
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.logout.remaining(now)
    }

    /// Push the timeout back after user input
    pub fn record_activity(&mut self, now: Instant) {
        if self.active {
            self.arm(now);
        }
    }

    /// Fire due timers
    ///
    /// The warning is reported once per quiet period; logout ends the
    /// session and cancels everything still armed.
    pub fn poll(&mut self, now: Instant) -> Option<SessionEvent> {
        if !self.active {
            return None;
        }
        if self.logout.poll(now) {
            log::info!("Session ended after {:?} of inactivity", self.timeout);
            self.logout();
            return Some(SessionEvent::LoggedOut);
        }
        if self.warning.poll(now) {
            let remaining = self.logout.remaining(now).unwrap_or_default();
            return Some(SessionEvent::Warning { remaining });
        }
        None
    }

    /// End the session now
    pub fn logout(&mut self) {
        self.active = false;
        self.warning.cancel();
        self.logout.cancel();
    }

    fn arm(&mut self, now: Instant) {
        self.logout.arm(now, self.timeout);
        if self.warning_lead.is_zero() {
            self.warning.cancel();
        } else {
            self.warning.arm(now, self.timeout - self.warning_lead);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(n: u64) -> Duration {
        Duration::from_secs(n * 60)
    }

    #[test]
    fn test_verify() {
        let gate = AuthGate::new("111111").unwrap();
        assert_eq!(gate.verify("111111"), Ok(()));
        assert_eq!(gate.verify("123456"), Err(AuthError::Incorrect));
        assert_eq!(gate.verify("11111"), Err(AuthError::Malformed));
        assert_eq!(gate.verify("11111a"), Err(AuthError::Malformed));
        assert_eq!(gate.verify("١١١١١١"), Err(AuthError::Malformed));
    }

    #[test]
    fn test_gate_from_config() {
        let mut config = SessionConfig::default();
        assert_eq!(AuthGate::from_config(&config), Ok(None));

        config.pin = Some("12345".to_string());
        assert_eq!(AuthGate::from_config(&config), Err(AuthError::Malformed));

        config.pin = Some("654321".to_string());
        assert!(AuthGate::from_config(&config).unwrap().is_some());
    }

    #[test]
    fn test_login_rejects_wrong_code() {
        let gate = AuthGate::new("111111").unwrap();
        let config = SessionConfig::default();
        assert!(gate.login("000000", &config, Instant::now()).is_err());
        assert!(gate.login("111111", &config, Instant::now()).unwrap().is_active());
    }

    #[test]
    fn test_warning_then_logout() {
        let start = Instant::now();
        let mut session = Session::new(minutes(15), minutes(2), start);

        assert_eq!(session.poll(start + minutes(12)), None);
        assert_eq!(
            session.poll(start + minutes(13)),
            Some(SessionEvent::Warning {
                remaining: minutes(2)
            })
        );
        // The warning fires only once
        assert_eq!(session.poll(start + minutes(14)), None);
        assert_eq!(session.poll(start + minutes(15)), Some(SessionEvent::LoggedOut));
        assert!(!session.is_active());
        assert_eq!(session.poll(start + minutes(30)), None);
    }

    #[test]
    fn test_activity_rearms_timers() {
        let start = Instant::now();
        let mut session = Session::new(minutes(15), minutes(2), start);

        session.record_activity(start + minutes(10));
        assert_eq!(session.poll(start + minutes(15)), None);
        assert_eq!(session.remaining(start + minutes(15)), Some(minutes(10)));
        assert!(matches!(
            session.poll(start + minutes(23)),
            Some(SessionEvent::Warning { .. })
        ));
        assert_eq!(session.poll(start + minutes(25)), Some(SessionEvent::LoggedOut));
    }

    #[test]
    fn test_explicit_logout_cancels_timers() {
        let start = Instant::now();
        let mut session = Session::new(minutes(15), minutes(2), start);
        session.logout();
        assert_eq!(session.remaining(start), None);
        assert_eq!(session.poll(start + minutes(20)), None);

        // Activity after logout does not revive the session
        session.record_activity(start + minutes(21));
        assert!(!session.is_active());
    }

    #[test]
    fn test_zero_warning_lead() {
        let start = Instant::now();
        let mut session = Session::new(minutes(1), Duration::ZERO, start);
        assert_eq!(session.poll(start + minutes(1)), Some(SessionEvent::LoggedOut));
    }
}
