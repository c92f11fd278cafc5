use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::automation::Automation;
use crate::classifier::IntentClassifier;
use crate::clock::Clock;
use crate::dedup::Deduplicator;
use crate::patterns::{self, Parsed};
use crate::registry::{ActionContext, ActionRegistry, Dispatch};
use crate::session::SessionState;
use crate::spawn::Spawner;
use crate::speech::{NullSpeech, Speech, SpeechGate};
use crate::stats::{StatsReport, SystemStats};

const APOLOGY: &str = "Sorry sir, I ran into an error executing that command.";
const GREETING: &str = "At your service, sir.";
const SLEEP_ACK: &str = "Going to sleep, sir. Say Vesper when you need me.";
const NOT_UNDERSTOOD: &str = "I didn't quite catch that, sir.";

/// Tunables for the resolution pipeline.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Single word that wakes the session wherever it appears in an utterance.
    pub wake_phrase: String,
    /// Phrases that put the session back to sleep. None of them may contain
    /// the wake phrase, or the wake check (which runs first) would eat them.
    pub sleep_phrases: Vec<String>,
    pub awake_duration: Duration,
    pub dedup_window: Duration,
    /// Pause between the halves of a compound search-and-play command.
    pub compound_delay: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            wake_phrase: "vesper".to_string(),
            sleep_phrases: vec![
                "go to sleep".to_string(),
                "good night".to_string(),
                "goodbye".to_string(),
            ],
            awake_duration: Duration::from_secs(30),
            dedup_window: Duration::from_secs(5),
            compound_delay: Duration::from_secs(2),
        }
    }
}

/// What happened to one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Identical utterance repeated inside the dedup window; dropped.
    Duplicate,
    /// Assistant is powered off; dropped.
    Offline,
    /// The wake phrase was heard; the session is (re-)armed.
    Wake { awake_until: Instant },
    /// A sleep phrase put the session to sleep.
    Sleep,
    /// Session is asleep and the utterance carried no wake phrase; dropped.
    Waiting,
    /// A bare query verb; the assistant asked for the missing argument.
    AwaitingClarification,
    Executed {
        matched: String,
        awake_until: Instant,
    },
    /// Heard and processed, but no action ran (chat reply, unknown text, or
    /// an action failure already spoken about).
    NotExecuted,
}

/// Point-in-time view of the session for status endpoints. Taking one runs
/// the lazy awake check, so a poll can itself put the session to sleep.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub powered_on: bool,
    pub mic_on: bool,
    pub volume_on: bool,
    pub awake: bool,
    pub awake_until: Option<Instant>,
    pub speaking: bool,
    pub last_command: String,
    pub command_count: usize,
    pub stats: StatsReport,
}

/// The collaborator bundle handed to the resolver at construction.
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub speech: Arc<dyn Speech>,
    pub automation: Arc<dyn Automation>,
    pub stats: Arc<dyn SystemStats>,
    pub spawner: Arc<dyn Spawner>,
    pub classifier: Option<Arc<dyn IntentClassifier>>,
}

/// The command resolution pipeline.
///
/// One utterance at a time: all session mutation happens under a single
/// async mutex, held across the classifier call so results apply in arrival
/// order. Stages, in order: normalize, dedup, power gate, wake phrase,
/// awake gate, sleep phrase, pending clarification, pattern parser, keyword
/// table, intent classifier.
pub struct CommandResolver {
    config: ResolverConfig,
    registry: ActionRegistry,
    session: Mutex<SessionState>,
    dedup: Mutex<Deduplicator>,
    clock: Arc<dyn Clock>,
    speech: Arc<dyn Speech>,
    automation: Arc<dyn Automation>,
    stats: Arc<dyn SystemStats>,
    spawner: Arc<dyn Spawner>,
    classifier: Option<Arc<dyn IntentClassifier>>,
    gate: Arc<SpeechGate>,
}

impl CommandResolver {
    pub fn new(config: ResolverConfig, collab: Collaborators, gate: Arc<SpeechGate>) -> Self {
        Self {
            session: Mutex::new(SessionState::new(config.awake_duration)),
            dedup: Mutex::new(Deduplicator::new(config.dedup_window)),
            registry: ActionRegistry::new(),
            clock: collab.clock,
            speech: collab.speech,
            automation: collab.automation,
            stats: collab.stats,
            spawner: collab.spawner,
            classifier: collab.classifier,
            gate,
            config,
        }
    }

    fn action_ctx(&self, speech: Arc<dyn Speech>) -> ActionContext {
        ActionContext {
            speech,
            automation: self.automation.clone(),
            stats: self.stats.clone(),
            spawner: self.spawner.clone(),
            command_count: self.registry.len(),
            compound_delay: self.config.compound_delay,
        }
    }

    /// Run one utterance through the pipeline.
    pub async fn resolve(&self, utterance: &str) -> CommandResult {
        let command = utterance.trim().to_lowercase();
        if command.is_empty() {
            return CommandResult::NotExecuted;
        }
        let now = self.clock.now();
        tracing::debug!(command = %command, "resolving utterance");

        let mut session = self.session.lock().await;

        // Dedup bookkeeping happens even while powered off.
        if self.dedup.lock().await.is_duplicate(&command, now) {
            return CommandResult::Duplicate;
        }

        if !session.powered_on {
            tracing::debug!("assistant powered off, dropping utterance");
            return CommandResult::Offline;
        }

        // Wake phrase check runs before the awake gate, so the wake word
        // works from sleep and re-arms the window when already awake.
        if command.contains(self.config.wake_phrase.as_str()) {
            session.wake_up(now);
            self.speech.say(GREETING);
            let awake_until = session.awake_until().unwrap_or(now);
            return CommandResult::Wake { awake_until };
        }

        if !session.is_awake(now, self.speech.as_ref()) {
            return CommandResult::Waiting;
        }

        if self
            .config
            .sleep_phrases
            .iter()
            .any(|p| command.contains(p.as_str()))
        {
            session.sleep_now();
            self.speech.say(SLEEP_ACK);
            return CommandResult::Sleep;
        }

        session.last_command = command.clone();
        let ctx = self.action_ctx(self.speech.clone());

        // A pending clarification consumes the whole utterance as its
        // argument, before any other interpretation gets a look.
        if let Some(action) = session.pending.take() {
            tracing::info!(action = action.label(), query = %command, "clarification received");
            return match action.run(&command, &ctx) {
                Ok(()) => {
                    session.extend_awake(now);
                    CommandResult::Executed {
                        matched: action.label().to_string(),
                        awake_until: session.awake_until().unwrap_or(now),
                    }
                }
                Err(e) => {
                    // Failures leave the awake window untouched.
                    tracing::error!(action = action.label(), error = %e, "clarified action failed");
                    self.speech.say(APOLOGY);
                    CommandResult::NotExecuted
                }
            };
        }

        match patterns::parse(&command) {
            Parsed::Resolved(cmd) => {
                return match cmd.run(&ctx) {
                    Ok(()) => {
                        session.extend_awake(now);
                        CommandResult::Executed {
                            matched: cmd.label().to_string(),
                            awake_until: session.awake_until().unwrap_or(now),
                        }
                    }
                    Err(e) => {
                        tracing::error!(action = cmd.label(), error = %e, "pattern action failed");
                        self.speech.say(APOLOGY);
                        CommandResult::NotExecuted
                    }
                };
            }
            Parsed::NeedsArgument(action) => {
                self.speech.say(action.prompt());
                session.pending = Some(action);
                session.extend_awake(now);
                return CommandResult::AwaitingClarification;
            }
            Parsed::NoMatch => {}
        }

        match self.registry.dispatch(&command, &ctx) {
            Dispatch::Executed { keyword } => {
                session.extend_awake(now);
                let awake_until = session.awake_until().unwrap_or(now);
                return CommandResult::Executed {
                    matched: keyword.to_string(),
                    awake_until,
                };
            }
            Dispatch::Failed { .. } => {
                // The registry already spoke the apology; the awake window
                // stays where it was.
                return CommandResult::NotExecuted;
            }
            Dispatch::NoMatch => {}
        }

        // Last resort: ask the classifier. The session lock is held across
        // the await on purpose, so a later utterance cannot overtake this one.
        if let Some(classifier) = &self.classifier {
            let intent = classifier.classify(&command).await;
            session.extend_awake(now);
            let awake_until = session.awake_until().unwrap_or(now);

            if let Some(mapped) = intent.command {
                // Silent execution: the classifier supplies the spoken reply,
                // so the mapped action runs with its confirmation suppressed.
                let silent = self.action_ctx(Arc::new(NullSpeech));
                return match self.registry.dispatch(&mapped, &silent) {
                    Dispatch::Executed { keyword } => {
                        self.speech.say(&intent.reply);
                        CommandResult::Executed {
                            matched: keyword.to_string(),
                            awake_until,
                        }
                    }
                    Dispatch::Failed { .. } => {
                        self.speech.say(APOLOGY);
                        CommandResult::NotExecuted
                    }
                    Dispatch::NoMatch => {
                        tracing::warn!(mapped = %mapped, "classifier mapped to an unknown trigger");
                        self.speech.say(&intent.reply);
                        CommandResult::NotExecuted
                    }
                };
            }

            self.speech.say(&intent.reply);
            return CommandResult::NotExecuted;
        }

        self.speech.say(NOT_UNDERSTOOD);
        CommandResult::NotExecuted
    }

    /// Current session view. Runs the lazy awake check first.
    pub async fn snapshot(&self) -> StatusSnapshot {
        // Probe telemetry before taking the session lock; the read can be
        // slow and must not hold up command resolution.
        let stats = self.stats.read();
        let now = self.clock.now();
        let mut session = self.session.lock().await;
        let awake = session.is_awake(now, self.speech.as_ref());
        StatusSnapshot {
            powered_on: session.powered_on,
            mic_on: session.mic_on,
            volume_on: session.volume_on,
            awake,
            awake_until: session.awake_until(),
            speaking: self.gate.speaking.load(Ordering::Relaxed),
            last_command: session.last_command.clone(),
            command_count: self.registry.len(),
            stats,
        }
    }

    /// Master power toggle. Turning off also puts the session to sleep and
    /// silences the speech gate; the farewell is spoken before the gate drops.
    pub async fn set_power(&self, on: bool) {
        let mut session = self.session.lock().await;
        if session.powered_on && !on {
            self.speech.say("Powering down, sir.");
            session.powered_on = false;
            session.sleep_now();
            session.pending = None;
            self.gate.powered.store(false, Ordering::Relaxed);
        } else if !session.powered_on && on {
            session.powered_on = true;
            self.gate.powered.store(true, Ordering::Relaxed);
            self.speech.say("Back online, sir.");
        }
    }

    pub async fn set_mic(&self, on: bool) {
        let mut session = self.session.lock().await;
        session.mic_on = on;
        tracing::info!(on, "microphone toggled");
    }

    pub async fn set_volume(&self, on: bool) {
        let mut session = self.session.lock().await;
        session.volume_on = on;
        self.gate.volume.store(on, Ordering::Relaxed);
        tracing::info!(on, "voice output toggled");
    }

    /// Restore startup defaults across session, dedup state, and the gate.
    pub async fn reset(&self) {
        self.session.lock().await.reset();
        *self.dedup.lock().await = Deduplicator::new(self.config.dedup_window);
        self.gate.powered.store(true, Ordering::Relaxed);
        self.gate.volume.store(true, Ordering::Relaxed);
        tracing::info!("session reset to defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::test_double::RecordingAutomation;
    use crate::classifier::{Intent, MockIntentClassifier};
    use crate::clock::ManualClock;
    use crate::spawn::InlineSpawner;
    use crate::speech::RecordingSpeech;
    use crate::stats::FixedStats;

    struct Harness {
        resolver: CommandResolver,
        clock: Arc<ManualClock>,
        speech: Arc<RecordingSpeech>,
        automation: Arc<RecordingAutomation>,
    }

    fn harness(classifier: Option<Arc<dyn IntentClassifier>>) -> Harness {
        let clock = Arc::new(ManualClock::new());
        let speech = Arc::new(RecordingSpeech::default());
        let automation = Arc::new(RecordingAutomation::default());
        let resolver = CommandResolver::new(
            ResolverConfig::default(),
            Collaborators {
                clock: clock.clone(),
                speech: speech.clone(),
                automation: automation.clone(),
                stats: Arc::new(FixedStats::default()),
                spawner: Arc::new(InlineSpawner),
                classifier,
            },
            Arc::new(SpeechGate::default()),
        );
        Harness {
            resolver,
            clock,
            speech,
            automation,
        }
    }

    #[tokio::test]
    async fn asleep_session_ignores_commands() {
        let h = harness(None);
        assert_eq!(h.resolver.resolve("open youtube").await, CommandResult::Waiting);
        assert!(h.automation.calls().is_empty());
        assert!(h.speech.lines().is_empty());
    }

    #[tokio::test]
    async fn wake_phrase_wakes_even_mid_sentence() {
        let h = harness(None);
        let result = h.resolver.resolve("hey vesper are you there").await;
        assert!(matches!(result, CommandResult::Wake { .. }));
        assert_eq!(h.speech.lines(), vec![GREETING]);

        let result = h.resolver.resolve("open youtube").await;
        assert!(matches!(result, CommandResult::Executed { ref matched, .. } if matched == "open youtube"));
        assert_eq!(
            h.automation.calls(),
            vec!["open_url:https://www.youtube.com".to_string()]
        );
    }

    #[tokio::test]
    async fn duplicate_within_window_is_dropped() {
        let h = harness(None);
        h.resolver.resolve("vesper").await;
        assert!(matches!(
            h.resolver.resolve("open google").await,
            CommandResult::Executed { .. }
        ));
        h.clock.advance(Duration::from_secs(2));
        assert_eq!(h.resolver.resolve("open google").await, CommandResult::Duplicate);
        // Only one browser launch happened.
        assert_eq!(h.automation.calls().len(), 1);
    }

    #[tokio::test]
    async fn awake_window_expires_lazily() {
        let h = harness(None);
        h.resolver.resolve("vesper").await;
        h.clock.advance(Duration::from_secs(31));
        assert_eq!(h.resolver.resolve("open google").await, CommandResult::Waiting);
        // Greeting, then the one-shot sleep notice.
        assert_eq!(h.speech.lines().len(), 2);
        assert!(h.automation.calls().is_empty());
    }

    #[tokio::test]
    async fn executed_command_extends_the_window() {
        let h = harness(None);
        h.resolver.resolve("vesper").await;
        h.clock.advance(Duration::from_secs(25));
        assert!(matches!(
            h.resolver.resolve("open google").await,
            CommandResult::Executed { .. }
        ));
        // 25 + 20 = 45s after wake, but only 20s after the last command.
        h.clock.advance(Duration::from_secs(20));
        assert!(matches!(
            h.resolver.resolve("open youtube").await,
            CommandResult::Executed { .. }
        ));
    }

    #[tokio::test]
    async fn sleep_phrase_puts_session_to_sleep() {
        let h = harness(None);
        h.resolver.resolve("vesper").await;
        assert_eq!(h.resolver.resolve("go to sleep").await, CommandResult::Sleep);
        assert_eq!(h.resolver.resolve("open google").await, CommandResult::Waiting);
    }

    #[tokio::test]
    async fn bare_search_asks_and_next_utterance_answers() {
        let h = harness(None);
        h.resolver.resolve("vesper").await;
        assert_eq!(
            h.resolver.resolve("search").await,
            CommandResult::AwaitingClarification
        );
        assert!(h.speech.lines().contains(&"What would you like me to search for, sir?".to_string()));

        let result = h.resolver.resolve("rust borrow checker").await;
        assert!(matches!(result, CommandResult::Executed { ref matched, .. } if matched == "search-google"));
        assert_eq!(
            h.automation.calls(),
            vec!["open_url:https://www.google.com/search?q=rust+borrow+checker".to_string()]
        );
    }

    #[tokio::test]
    async fn clarification_slot_is_consumed_once() {
        let h = harness(None);
        h.resolver.resolve("vesper").await;
        h.resolver.resolve("play").await;
        assert!(matches!(
            h.resolver.resolve("daft punk").await,
            CommandResult::Executed { .. }
        ));
        // The slot is empty again; unknown text is no longer an argument.
        assert_eq!(
            h.resolver.resolve("daft punk two").await,
            CommandResult::NotExecuted
        );
    }

    #[tokio::test]
    async fn powered_off_drops_everything_silently() {
        let h = harness(None);
        h.resolver.set_power(false).await;
        assert_eq!(h.resolver.resolve("vesper").await, CommandResult::Offline);
        assert_eq!(h.resolver.resolve("open google").await, CommandResult::Offline);
        // Only the farewell line was spoken.
        assert_eq!(h.speech.lines(), vec!["Powering down, sir."]);
    }

    #[tokio::test]
    async fn classifier_mapped_command_executes_silently() {
        let mut mock = MockIntentClassifier::new();
        mock.expect_classify().returning(|_| Intent {
            command: Some("open youtube".to_string()),
            reply: "Bringing up your videos, sir.".to_string(),
        });
        let h = harness(Some(Arc::new(mock)));

        h.resolver.resolve("vesper").await;
        let result = h.resolver.resolve("put some videos on the screen").await;
        assert!(matches!(result, CommandResult::Executed { ref matched, .. } if matched == "open youtube"));
        assert_eq!(
            h.automation.calls(),
            vec!["open_url:https://www.youtube.com".to_string()]
        );
        let lines = h.speech.lines();
        assert!(lines.contains(&"Bringing up your videos, sir.".to_string()));
        // The action's own confirmation was suppressed.
        assert!(!lines.iter().any(|l| l.contains("Opening YouTube")));
    }

    #[tokio::test]
    async fn classifier_chat_reply_is_spoken_without_action() {
        let mut mock = MockIntentClassifier::new();
        mock.expect_classify().returning(|_| Intent {
            command: None,
            reply: "I'd say about three hundred grams, sir.".to_string(),
        });
        let h = harness(Some(Arc::new(mock)));

        h.resolver.resolve("vesper").await;
        assert_eq!(
            h.resolver.resolve("how much flour for pancakes").await,
            CommandResult::NotExecuted
        );
        assert!(h.automation.calls().is_empty());
        assert!(h
            .speech
            .lines()
            .contains(&"I'd say about three hundred grams, sir.".to_string()));
    }

    #[tokio::test]
    async fn no_classifier_falls_back_to_not_understood() {
        let h = harness(None);
        h.resolver.resolve("vesper").await;
        assert_eq!(
            h.resolver.resolve("gibberish nonsense").await,
            CommandResult::NotExecuted
        );
        assert!(h.speech.lines().contains(&NOT_UNDERSTOOD.to_string()));
    }

    #[tokio::test]
    async fn snapshot_reflects_lazy_sleep() {
        let h = harness(None);
        h.resolver.resolve("vesper").await;
        assert!(h.resolver.snapshot().await.awake);

        h.clock.advance(Duration::from_secs(31));
        let snap = h.resolver.snapshot().await;
        assert!(!snap.awake);
        assert_eq!(snap.awake_until, None);
    }

    #[tokio::test]
    async fn volume_toggle_updates_gate_and_snapshot() {
        let h = harness(None);
        h.resolver.set_volume(false).await;
        let snap = h.resolver.snapshot().await;
        assert!(!snap.volume_on);
        // Telemetry rides along on every snapshot.
        assert_eq!(snap.stats.battery, 88.0);
    }
}
