use anyhow::Result;

/// A media key press forwarded to the OS mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKey {
    VolumeUp,
    VolumeDown,
    Mute,
    Unmute,
}

/// A power-management operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerOp {
    Lock,
    Sleep,
    Restart,
    Shutdown,
    CancelShutdown,
}

/// The OS-automation collaborator.
///
/// Every named action in the registry performs exactly one externally
/// observable effect through this trait. The core treats each call as
/// opaque and only observes success or failure; a failure surfaces as a
/// spoken apology and a not-executed result, never a crash.
pub trait Automation: Send + Sync {
    /// Open a URL in the default browser.
    fn open_url(&self, url: &str) -> Result<()>;

    /// Launch a desktop application by its launcher name.
    fn launch(&self, app: &str) -> Result<()>;

    /// Send a key combination, e.g. `["super", "d"]` to show the desktop.
    fn hotkey(&self, keys: &[&str]) -> Result<()>;

    /// Press a media key.
    fn media_key(&self, key: MediaKey) -> Result<()>;

    /// Step screen brightness by `delta` percent (negative to dim).
    fn brightness(&self, delta: i32) -> Result<()>;

    /// Execute a power-management operation.
    fn power(&self, op: PowerOp) -> Result<()>;

    /// Capture a screenshot to the user's pictures directory.
    fn screenshot(&self) -> Result<()>;

    /// Empty the desktop trash/recycle bin.
    fn empty_trash(&self) -> Result<()>;

    /// Terminate the assistant process itself. The only deliberately
    /// process-ending operation in the system.
    fn shutdown_assistant(&self) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod test_double {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Records each automation call as a readable string, optionally failing
    /// every call to exercise the apology path.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingAutomation {
        calls: Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    impl RecordingAutomation {
        pub(crate) fn failing() -> Self {
            let auto = Self::default();
            auto.fail.store(true, Ordering::Relaxed);
            auto
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) -> Result<()> {
            if self.fail.load(Ordering::Relaxed) {
                anyhow::bail!("automation unavailable");
            }
            self.calls.lock().unwrap().push(call);
            Ok(())
        }
    }

    impl Automation for RecordingAutomation {
        fn open_url(&self, url: &str) -> Result<()> {
            self.record(format!("open_url:{url}"))
        }

        fn launch(&self, app: &str) -> Result<()> {
            self.record(format!("launch:{app}"))
        }

        fn hotkey(&self, keys: &[&str]) -> Result<()> {
            self.record(format!("hotkey:{}", keys.join("+")))
        }

        fn media_key(&self, key: MediaKey) -> Result<()> {
            self.record(format!("media_key:{key:?}"))
        }

        fn brightness(&self, delta: i32) -> Result<()> {
            self.record(format!("brightness:{delta}"))
        }

        fn power(&self, op: PowerOp) -> Result<()> {
            self.record(format!("power:{op:?}"))
        }

        fn screenshot(&self) -> Result<()> {
            self.record("screenshot".to_string())
        }

        fn empty_trash(&self) -> Result<()> {
            self.record("empty_trash".to_string())
        }

        fn shutdown_assistant(&self) -> Result<()> {
            self.record("shutdown_assistant".to_string())
        }
    }
}
