use std::time::{Duration, Instant};

use crate::patterns::PendingAction;
use crate::speech::Speech;

const SLEEP_NOTICE: &str = "Sleep mode activated, sir. Say Vesper to wake me.";

/// The single process-wide session: gating flags, the rolling awake window,
/// and the pending-clarification slot. All mutation is serialized behind the
/// resolver's lock; this struct itself carries no synchronization.
#[derive(Debug)]
pub struct SessionState {
    pub powered_on: bool,
    pub mic_on: bool,
    pub volume_on: bool,
    pub last_command: String,
    awake: bool,
    awake_until: Option<Instant>,
    awake_duration: Duration,
    pub pending: Option<PendingAction>,
}

impl SessionState {
    pub fn new(awake_duration: Duration) -> Self {
        Self {
            powered_on: true,
            mic_on: true,
            volume_on: true,
            last_command: String::new(),
            awake: false,
            awake_until: None,
            awake_duration,
            pending: None,
        }
    }

    /// Lazy awake check. When the deadline has passed, the session
    /// transitions to asleep before anything else is read in the same
    /// evaluation, and the going-to-sleep notice is spoken exactly once.
    ///
    /// Note this is a read that may mutate state and speak; there is no
    /// background timer driving the transition, so callers must tolerate
    /// the state changing under them during a status poll.
    pub fn is_awake(&mut self, now: Instant, speech: &dyn Speech) -> bool {
        if !self.awake {
            return false;
        }

        if let Some(until) = self.awake_until {
            if now > until {
                self.awake = false;
                self.awake_until = None;
                tracing::info!("session went back to sleep (timeout)");
                speech.say(SLEEP_NOTICE);
                return false;
            }
        }

        true
    }

    /// Wake the session and arm the timeout. Idempotent; re-waking simply
    /// re-arms the window.
    pub fn wake_up(&mut self, now: Instant) {
        self.awake = true;
        self.awake_until = Some(now + self.awake_duration);
        tracing::info!(secs = self.awake_duration.as_secs(), "session is awake");
    }

    /// Push the deadline forward after an executed command. Must not wake a
    /// sleeping session as a side effect.
    pub fn extend_awake(&mut self, now: Instant) {
        if self.awake {
            self.awake_until = Some(now + self.awake_duration);
        }
    }

    /// Drop back to sleep immediately.
    pub fn sleep_now(&mut self) {
        self.awake = false;
        self.awake_until = None;
        tracing::info!("session went to sleep");
    }

    /// Restore startup defaults, including the pending-clarification slot.
    pub fn reset(&mut self) {
        self.powered_on = true;
        self.mic_on = true;
        self.volume_on = true;
        self.last_command.clear();
        self.awake = false;
        self.awake_until = None;
        self.pending = None;
    }

    /// The moment the session will fall asleep, if it is awake.
    pub fn awake_until(&self) -> Option<Instant> {
        self.awake_until
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::RecordingSpeech;

    #[test]
    fn wake_then_check_is_awake() {
        let speech = RecordingSpeech::default();
        let mut session = SessionState::default();
        let t0 = Instant::now();

        session.wake_up(t0);
        assert!(session.is_awake(t0 + Duration::from_secs(1), &speech));
        assert!(speech.lines().is_empty());
    }

    #[test]
    fn timeout_sleeps_and_speaks_exactly_once() {
        let speech = RecordingSpeech::default();
        let mut session = SessionState::default();
        let t0 = Instant::now();

        session.wake_up(t0);
        let later = t0 + Duration::from_secs(31);
        assert!(!session.is_awake(later, &speech));
        assert!(!session.is_awake(later, &speech));
        assert_eq!(speech.lines().len(), 1, "sleep notice must not repeat");
        assert_eq!(session.awake_until(), None);
    }

    #[test]
    fn extend_pushes_deadline_forward() {
        let speech = RecordingSpeech::default();
        let mut session = SessionState::default();
        let t0 = Instant::now();

        session.wake_up(t0);
        session.extend_awake(t0 + Duration::from_secs(25));
        // Without the extension this check would be past the deadline.
        assert!(session.is_awake(t0 + Duration::from_secs(40), &speech));
    }

    #[test]
    fn extend_while_asleep_does_not_wake() {
        let speech = RecordingSpeech::default();
        let mut session = SessionState::default();
        let t0 = Instant::now();

        session.extend_awake(t0);
        assert!(!session.is_awake(t0, &speech));
        assert_eq!(session.awake_until(), None);
    }

    #[test]
    fn reset_clears_pending_and_flags() {
        let mut session = SessionState::default();
        session.pending = Some(crate::patterns::PendingAction::PlayMusic);
        session.powered_on = false;
        session.last_command = "open youtube".to_string();

        session.reset();
        assert!(session.powered_on);
        assert!(session.pending.is_none());
        assert!(session.last_command.is_empty());
    }
}
