use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(test)]
use std::sync::Mutex;

/// Text-to-speech capability as the core sees it.
///
/// Best effort and fire-and-forget: implementations must never return an
/// error to the caller. The production engine queues playback on a
/// background worker and logs (rather than propagates) any TTS failure.
pub trait Speech: Send + Sync {
    fn say(&self, text: &str);
}

/// Discards everything it is told to say.
///
/// This is how "silent execution" works: when the intent classifier supplies
/// its own natural-language reply, the mapped action is dispatched with a
/// `NullSpeech` in its context so the action's default confirmation line is
/// suppressed while its real side effect still runs. Passing the capability
/// explicitly replaces the reference implementation's runtime swap of a
/// global speak function.
#[derive(Debug, Default)]
pub struct NullSpeech;

impl Speech for NullSpeech {
    fn say(&self, _text: &str) {}
}

/// Flags shared between the resolver and the speech engine.
///
/// The TTS worker flips `speaking` around playback without taking the
/// resolver's session lock, and checks `powered`/`volume` before opening its
/// mouth. `speaking` is an observability flag, not a mutex: overlapping
/// speech requests may interleave and that is accepted.
#[derive(Debug)]
pub struct SpeechGate {
    pub powered: AtomicBool,
    pub volume: AtomicBool,
    pub speaking: AtomicBool,
}

impl Default for SpeechGate {
    fn default() -> Self {
        Self {
            powered: AtomicBool::new(true),
            volume: AtomicBool::new(true),
            speaking: AtomicBool::new(false),
        }
    }
}

impl SpeechGate {
    /// True when speech output is allowed at all.
    pub fn is_audible(&self) -> bool {
        self.powered.load(Ordering::Relaxed) && self.volume.load(Ordering::Relaxed)
    }
}

/// Records every spoken line, for assertions in tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSpeech {
    lines: Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingSpeech {
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Speech for RecordingSpeech {
    fn say(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }
}
