use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::automation::{Automation, MediaKey, PowerOp};
use crate::spawn::Spawner;
use crate::speech::Speech;
use crate::stats::SystemStats;

/// Everything an action may touch while it runs.
///
/// Actions receive their speech capability explicitly. Silent execution
/// (classifier-mapped commands) swaps in a `NullSpeech` here instead of
/// patching any global, so only the default confirmation line is
/// suppressed while the real side effect still fires.
#[derive(Clone)]
pub struct ActionContext {
    pub speech: Arc<dyn Speech>,
    pub automation: Arc<dyn Automation>,
    pub stats: Arc<dyn SystemStats>,
    pub spawner: Arc<dyn Spawner>,
    /// Number of registered trigger phrases, spoken by the list-commands action.
    pub command_count: usize,
    /// Pause between the search and play halves of a compound command.
    pub compound_delay: Duration,
}

type Handler = Box<dyn Fn(&ActionContext) -> Result<()> + Send + Sync>;

struct Entry {
    trigger: &'static str,
    name: &'static str,
    run: Handler,
}

/// Outcome of a registry dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A trigger matched and its action ran without error.
    Executed { keyword: &'static str },
    /// A trigger matched but the action failed; no shorter trigger is tried.
    Failed { keyword: &'static str },
    NoMatch,
}

/// The fixed phrase-to-action table.
///
/// Lookup is a linear scan over triggers pre-sorted by descending length,
/// matching the first trigger that appears as a substring of the utterance.
/// That makes "open google drive" win over "open google" whenever both are
/// present. It is a substring match, not a token match: a trigger embedded
/// inside an unrelated sentence will fire. Known imprecision, kept as-is.
pub struct ActionRegistry {
    entries: Vec<Entry>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        let mut entries = build_table();
        entries.sort_by(|a, b| b.trigger.len().cmp(&a.trigger.len()));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All trigger phrases, longest first. Fed to the intent classifier so
    /// its replies map back onto this vocabulary.
    pub fn trigger_phrases(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.trigger).collect()
    }

    /// Find the longest trigger contained in `command` and run its action.
    ///
    /// A failing action is terminal for this utterance: log, apologize
    /// through the context's speech capability, and report `Failed` without
    /// falling through to a shorter match.
    pub fn dispatch(&self, command: &str, ctx: &ActionContext) -> Dispatch {
        for entry in &self.entries {
            if command.contains(entry.trigger) {
                tracing::info!(keyword = entry.trigger, action = entry.name, "command matched");
                return match (entry.run)(ctx) {
                    Ok(()) => Dispatch::Executed {
                        keyword: entry.trigger,
                    },
                    Err(e) => {
                        tracing::error!(action = entry.name, error = %e, "action failed");
                        ctx.speech
                            .say("Sorry sir, I ran into an error executing that command.");
                        Dispatch::Failed {
                            keyword: entry.trigger,
                        }
                    }
                };
            }
        }
        Dispatch::NoMatch
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// --- handler constructors ------------------------------------------------

fn site(spoken: &'static str, url: &'static str) -> Handler {
    Box::new(move |ctx| {
        ctx.speech.say(&format!("Opening {spoken}, sir."));
        ctx.automation.open_url(url)
    })
}

fn app(spoken: &'static str, launcher: &'static str) -> Handler {
    Box::new(move |ctx| {
        ctx.speech.say(&format!("Opening {spoken}, sir."));
        ctx.automation.launch(launcher)
    })
}

fn keys(spoken: &'static str, combo: &'static [&'static str]) -> Handler {
    Box::new(move |ctx| {
        ctx.speech.say(spoken);
        ctx.automation.hotkey(combo)
    })
}

fn media(spoken: &'static str, key: MediaKey) -> Handler {
    Box::new(move |ctx| {
        ctx.automation.media_key(key)?;
        ctx.speech.say(spoken);
        Ok(())
    })
}

fn brightness(spoken: &'static str, delta: i32) -> Handler {
    Box::new(move |ctx| {
        ctx.automation.brightness(delta)?;
        ctx.speech.say(spoken);
        Ok(())
    })
}

fn power(spoken: &'static str, op: PowerOp) -> Handler {
    Box::new(move |ctx| {
        ctx.speech.say(spoken);
        ctx.automation.power(op)
    })
}

fn say(line: &'static str) -> Handler {
    Box::new(move |ctx| {
        ctx.speech.say(line);
        Ok(())
    })
}

fn tell_time(ctx: &ActionContext) -> Result<()> {
    let now = chrono::Local::now().format("%I:%M %p");
    ctx.speech.say(&format!("The time is {now}, sir."));
    Ok(())
}

fn tell_date(ctx: &ActionContext) -> Result<()> {
    let today = chrono::Local::now().format("%A, %B %d, %Y");
    ctx.speech.say(&format!("Today is {today}, sir."));
    Ok(())
}

fn tell_battery(ctx: &ActionContext) -> Result<()> {
    let stats = ctx.stats.read();
    let line = match stats.plugged {
        Some(true) => format!("Battery is at {:.0} percent and charging, sir.", stats.battery),
        Some(false) => format!(
            "Battery is at {:.0} percent, running on battery power, sir.",
            stats.battery
        ),
        None => "No battery detected, sir. Running on mains power.".to_string(),
    };
    ctx.speech.say(&line);
    Ok(())
}

fn tell_cpu(ctx: &ActionContext) -> Result<()> {
    let stats = ctx.stats.read();
    ctx.speech.say(&format!(
        "CPU usage is at {:.0} percent, sir.",
        stats.cpu_percent
    ));
    Ok(())
}

fn tell_ram(ctx: &ActionContext) -> Result<()> {
    let stats = ctx.stats.read();
    let line = match stats.ram_available_gb {
        Some(gb) => format!(
            "Memory usage is at {:.0} percent, with {gb:.1} gigabytes available, sir.",
            stats.ram_percent
        ),
        None => format!("Memory usage is at {:.0} percent, sir.", stats.ram_percent),
    };
    ctx.speech.say(&line);
    Ok(())
}

fn take_screenshot(ctx: &ActionContext) -> Result<()> {
    ctx.automation.screenshot()?;
    ctx.speech.say("Screenshot taken, sir.");
    Ok(())
}

fn empty_trash(ctx: &ActionContext) -> Result<()> {
    ctx.automation.empty_trash()?;
    ctx.speech.say("Recycle bin emptied, sir.");
    Ok(())
}

fn show_help(ctx: &ActionContext) -> Result<()> {
    ctx.speech.say(
        "I can open applications and websites, control volume and brightness, \
         manage windows, lock or shut down the system, take screenshots, and \
         tell you the time, date, and system status, sir.",
    );
    Ok(())
}

fn list_commands(ctx: &ActionContext) -> Result<()> {
    ctx.speech.say(&format!(
        "I currently answer to {} trigger phrases, sir. What would you like me to do?",
        ctx.command_count
    ));
    Ok(())
}

fn shutdown_assistant(ctx: &ActionContext) -> Result<()> {
    ctx.speech
        .say("Shutting down all Vesper systems, sir. Goodbye.");
    ctx.automation.shutdown_assistant()
}

// --- the table -----------------------------------------------------------

fn build_table() -> Vec<Entry> {
    let mut entries: Vec<Entry> = Vec::with_capacity(160);
    let mut add = |trigger: &'static str, name: &'static str, run: Handler| {
        entries.push(Entry { trigger, name, run });
    };

    // Browser & websites
    add("open browser", "open-browser", site("the browser", "https://www.google.com"));
    add("open google", "open-google", site("Google", "https://www.google.com"));
    add("open youtube", "open-youtube", site("YouTube", "https://www.youtube.com"));
    add("open chatgpt", "open-chatgpt", site("ChatGPT", "https://chat.openai.com"));
    add("chatgpt", "open-chatgpt", site("ChatGPT", "https://chat.openai.com"));
    add("open copilot", "open-copilot", site("Copilot", "https://copilot.microsoft.com"));
    add("copilot", "open-copilot", site("Copilot", "https://copilot.microsoft.com"));
    add("open gemini", "open-gemini", site("Gemini", "https://gemini.google.com"));
    add("gemini", "open-gemini", site("Gemini", "https://gemini.google.com"));
    add("open claude", "open-claude", site("Claude", "https://claude.ai"));
    add("open perplexity", "open-perplexity", site("Perplexity", "https://www.perplexity.ai"));
    add("open facebook", "open-facebook", site("Facebook", "https://www.facebook.com"));
    add("facebook", "open-facebook", site("Facebook", "https://www.facebook.com"));
    add("open instagram", "open-instagram", site("Instagram", "https://www.instagram.com"));
    add("instagram", "open-instagram", site("Instagram", "https://www.instagram.com"));
    add("open twitter", "open-twitter", site("X", "https://twitter.com"));
    add("open tiktok", "open-tiktok", site("TikTok", "https://www.tiktok.com"));
    add("tiktok", "open-tiktok", site("TikTok", "https://www.tiktok.com"));
    add("open reddit", "open-reddit", site("Reddit", "https://www.reddit.com"));
    add("open linkedin", "open-linkedin", site("LinkedIn", "https://www.linkedin.com"));
    add("open discord", "open-discord", site("Discord", "https://discord.com/app"));
    add("discord", "open-discord", site("Discord", "https://discord.com/app"));
    add("open telegram", "open-telegram", site("Telegram", "https://web.telegram.org"));
    add("open gmail", "open-gmail", site("Gmail", "https://mail.google.com"));
    add("gmail", "open-gmail", site("Gmail", "https://mail.google.com"));
    add("open google drive", "open-drive", site("Google Drive", "https://drive.google.com"));
    add("open drive", "open-drive", site("Google Drive", "https://drive.google.com"));
    add("open google docs", "open-docs", site("Google Docs", "https://docs.google.com"));
    add("open docs", "open-docs", site("Google Docs", "https://docs.google.com"));
    add("open google sheets", "open-sheets", site("Google Sheets", "https://sheets.google.com"));
    add("open google calendar", "open-calendar", site("Google Calendar", "https://calendar.google.com"));
    add("open notion", "open-notion", site("Notion", "https://www.notion.so"));
    add("open github", "open-github", site("GitHub", "https://github.com"));
    add("github", "open-github", site("GitHub", "https://github.com"));
    add("open netflix", "open-netflix", site("Netflix", "https://www.netflix.com"));
    add("netflix", "open-netflix", site("Netflix", "https://www.netflix.com"));
    add("open spotify", "open-spotify", site("Spotify", "https://open.spotify.com"));
    add("spotify", "open-spotify", site("Spotify", "https://open.spotify.com"));
    add("open news", "open-news", site("Google News", "https://news.google.com"));
    add("open shopee", "open-shopee", site("Shopee", "https://shopee.com"));
    add("shopee", "open-shopee", site("Shopee", "https://shopee.com"));
    add("open lazada", "open-lazada", site("Lazada", "https://www.lazada.com"));
    add("lazada", "open-lazada", site("Lazada", "https://www.lazada.com"));

    // Desktop applications
    add("open notepad", "open-notepad", app("Notepad", "notepad"));
    add("notepad", "open-notepad", app("Notepad", "notepad"));
    add("open calculator", "open-calculator", app("the calculator", "calculator"));
    add("calculator", "open-calculator", app("the calculator", "calculator"));
    add("open file explorer", "open-files", keys("Opening the file explorer, sir.", &["super", "e"]));
    add("file explorer", "open-files", keys("Opening the file explorer, sir.", &["super", "e"]));
    add("open paint", "open-paint", app("Paint", "paint"));
    add("open task manager", "open-task-manager", keys("Opening the task manager, sir.", &["ctrl", "shift", "escape"]));
    add("task manager", "open-task-manager", keys("Opening the task manager, sir.", &["ctrl", "shift", "escape"]));
    add("open control panel", "open-control-panel", app("the control panel", "control panel"));
    add("open settings", "open-settings", keys("Opening settings, sir.", &["super", "i"]));
    add("open terminal", "open-terminal", app("the terminal", "terminal"));
    add("open cmd", "open-terminal", app("the terminal", "terminal"));
    add("open command prompt", "open-terminal", app("the terminal", "terminal"));
    add("open vs code", "open-vscode", app("VS Code", "visual studio code"));
    add("open vscode", "open-vscode", app("VS Code", "visual studio code"));
    add("open powershell", "open-powershell", app("PowerShell", "powershell"));
    add("powershell", "open-powershell", app("PowerShell", "powershell"));
    add("open store", "open-store", app("the Microsoft Store", "microsoft store"));
    add("microsoft store", "open-store", app("the Microsoft Store", "microsoft store"));
    add("open snipping tool", "open-snipping-tool", keys("Opening the snipping tool, sir.", &["super", "shift", "s"]));
    add("snip", "open-snipping-tool", keys("Opening the snipping tool, sir.", &["super", "shift", "s"]));
    add("open word", "open-word", app("Microsoft Word", "word"));
    add("microsoft word", "open-word", app("Microsoft Word", "word"));
    add("open excel", "open-excel", app("Microsoft Excel", "excel"));
    add("microsoft excel", "open-excel", app("Microsoft Excel", "excel"));
    add("open powerpoint", "open-powerpoint", app("Microsoft PowerPoint", "powerpoint"));
    add("microsoft powerpoint", "open-powerpoint", app("Microsoft PowerPoint", "powerpoint"));
    add("open teams", "open-teams", app("Microsoft Teams", "microsoft teams"));
    add("microsoft teams", "open-teams", app("Microsoft Teams", "microsoft teams"));
    add("open outlook", "open-outlook", app("Outlook", "outlook"));
    add("outlook", "open-outlook", app("Outlook", "outlook"));
    add("open camera", "open-camera", app("the camera", "camera"));
    add("camera", "open-camera", app("the camera", "camera"));
    add("open clock", "open-clock", app("the clock", "clock"));
    add("open maps", "open-maps", app("Maps", "maps"));
    add("open photos", "open-photos", app("Photos", "photos"));
    add("photos", "open-photos", app("Photos", "photos"));
    add("open mail", "open-mail", app("Mail", "mail"));
    add("open onenote", "open-onenote", app("OneNote", "onenote"));
    add("onenote", "open-onenote", app("OneNote", "onenote"));

    // Window management
    add("minimize all", "show-desktop", keys("Minimizing all windows, sir.", &["super", "d"]));
    add("show desktop", "show-desktop", keys("Showing the desktop, sir.", &["super", "d"]));
    add("open action center", "action-center", keys("Opening the action center, sir.", &["super", "a"]));
    add("action center", "action-center", keys("Opening the action center, sir.", &["super", "a"]));
    add("open notifications", "notifications", keys("Opening notifications, sir.", &["super", "n"]));
    add("notifications", "notifications", keys("Opening notifications, sir.", &["super", "n"]));
    add("open task view", "task-view", keys("Opening task view, sir.", &["super", "tab"]));
    add("task view", "task-view", keys("Opening task view, sir.", &["super", "tab"]));
    add("new virtual desktop", "new-desktop", keys("Creating a new virtual desktop, sir.", &["super", "ctrl", "d"]));
    add("virtual desktop", "new-desktop", keys("Creating a new virtual desktop, sir.", &["super", "ctrl", "d"]));
    add("next desktop", "next-desktop", keys("Switching to the next desktop, sir.", &["super", "ctrl", "right"]));
    add("previous desktop", "previous-desktop", keys("Switching to the previous desktop, sir.", &["super", "ctrl", "left"]));
    add("snap left", "snap-left", keys("Snapping the window left, sir.", &["super", "left"]));
    add("snap right", "snap-right", keys("Snapping the window right, sir.", &["super", "right"]));
    add("maximize window", "maximize", keys("Maximizing the window, sir.", &["super", "up"]));
    add("maximize", "maximize", keys("Maximizing the window, sir.", &["super", "up"]));
    add("minimize window", "minimize", keys("Minimizing the window, sir.", &["super", "down"]));
    add("minimize", "minimize", keys("Minimizing the window, sir.", &["super", "down"]));
    add("close window", "close-window", keys("Closing the window, sir.", &["alt", "f4"]));
    add("close this", "close-window", keys("Closing the window, sir.", &["alt", "f4"]));
    add("switch window", "switch-window", keys("Switching windows, sir.", &["alt", "tab"]));
    add("alt tab", "switch-window", keys("Switching windows, sir.", &["alt", "tab"]));

    // Volume
    add("volume up", "volume-up", media("Increasing volume, sir.", MediaKey::VolumeUp));
    add("increase volume", "volume-up", media("Increasing volume, sir.", MediaKey::VolumeUp));
    add("louder", "volume-up", media("Increasing volume, sir.", MediaKey::VolumeUp));
    add("volume down", "volume-down", media("Decreasing volume, sir.", MediaKey::VolumeDown));
    add("decrease volume", "volume-down", media("Decreasing volume, sir.", MediaKey::VolumeDown));
    add("quieter", "volume-down", media("Decreasing volume, sir.", MediaKey::VolumeDown));
    add("unmute", "unmute", media("Unmuting audio, sir.", MediaKey::Unmute));
    add("mute", "mute", media("Muting audio, sir.", MediaKey::Mute));

    // Brightness
    add("brightness up", "brightness-up", brightness("Increasing brightness, sir.", 10));
    add("increase brightness", "brightness-up", brightness("Increasing brightness, sir.", 10));
    add("brighter", "brightness-up", brightness("Increasing brightness, sir.", 10));
    add("brightness down", "brightness-down", brightness("Decreasing brightness, sir.", -10));
    add("decrease brightness", "brightness-down", brightness("Decreasing brightness, sir.", -10));
    add("dimmer", "brightness-down", brightness("Decreasing brightness, sir.", -10));

    // System actions
    add("take screenshot", "screenshot", Box::new(take_screenshot));
    add("screenshot", "screenshot", Box::new(take_screenshot));
    add("lock screen", "lock", power("Locking the screen, sir.", PowerOp::Lock));
    add("lock pc", "lock", power("Locking the screen, sir.", PowerOp::Lock));
    add("shutdown", "system-shutdown", power("Shutting down the system shortly, sir.", PowerOp::Shutdown));
    add("turn off", "system-shutdown", power("Shutting down the system shortly, sir.", PowerOp::Shutdown));
    add("restart", "system-restart", power("Restarting the system shortly, sir.", PowerOp::Restart));
    add("reboot", "system-restart", power("Restarting the system shortly, sir.", PowerOp::Restart));
    add("cancel shutdown", "cancel-shutdown", power("Shutdown cancelled, sir.", PowerOp::CancelShutdown));
    add("sleep system", "system-sleep", power("Putting the system to sleep, sir.", PowerOp::Sleep));
    add("hibernate", "system-sleep", power("Putting the system to sleep, sir.", PowerOp::Sleep));
    add("empty recycle bin", "empty-trash", Box::new(empty_trash));
    add("clear recycle bin", "empty-trash", Box::new(empty_trash));

    // System information
    add("what time", "tell-time", Box::new(tell_time));
    add("time", "tell-time", Box::new(tell_time));
    add("what date", "tell-date", Box::new(tell_date));
    add("date", "tell-date", Box::new(tell_date));
    add("today", "tell-date", Box::new(tell_date));
    add("battery status", "tell-battery", Box::new(tell_battery));
    add("battery", "tell-battery", Box::new(tell_battery));
    add("cpu usage", "tell-cpu", Box::new(tell_cpu));
    add("ram usage", "tell-ram", Box::new(tell_ram));
    add("memory", "tell-ram", Box::new(tell_ram));

    // Help & info
    add("help me", "help", Box::new(show_help));
    add("help", "help", Box::new(show_help));
    add("what can you do", "help", Box::new(show_help));
    add("list commands", "list-commands", Box::new(list_commands));
    add("commands", "list-commands", Box::new(list_commands));

    // Greetings & courtesy
    add("good morning", "greet-morning", say("Good morning sir. How may I assist you today?"));
    add("good afternoon", "greet-afternoon", say("Good afternoon sir. How may I help you?"));
    add("good evening", "greet-evening", say("Good evening sir. What can I do for you?"));
    add("thank you", "you-are-welcome", say("You're welcome sir. Happy to help."));
    add("thanks", "you-are-welcome", say("You're welcome sir. Happy to help."));
    add("how are you", "how-are-you", say("Functioning at optimal capacity, sir. How may I assist you?"));

    // Assistant control. These must not contain the wake word, which the
    // resolver checks first and would swallow the whole utterance.
    add("shut yourself down", "shutdown-assistant", Box::new(shutdown_assistant));
    add("terminate assistant", "shutdown-assistant", Box::new(shutdown_assistant));
    add("kill server", "shutdown-assistant", Box::new(shutdown_assistant));

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::test_double::RecordingAutomation;
    use crate::spawn::InlineSpawner;
    use crate::speech::RecordingSpeech;
    use crate::stats::{FixedStats, StatsReport};

    fn ctx(
        speech: Arc<RecordingSpeech>,
        automation: Arc<RecordingAutomation>,
        count: usize,
    ) -> ActionContext {
        ActionContext {
            speech,
            automation,
            stats: Arc::new(FixedStats::default()),
            spawner: Arc::new(InlineSpawner),
            command_count: count,
            compound_delay: Duration::ZERO,
        }
    }

    #[test]
    fn longest_substring_trigger_wins() {
        let registry = ActionRegistry::new();
        let speech = Arc::new(RecordingSpeech::default());
        let automation = Arc::new(RecordingAutomation::default());
        let ctx = ctx(speech, automation.clone(), registry.len());

        let result = registry.dispatch("please open google drive now", &ctx);
        assert_eq!(
            result,
            Dispatch::Executed {
                keyword: "open google drive"
            }
        );
        assert_eq!(
            automation.calls(),
            vec!["open_url:https://drive.google.com".to_string()]
        );
    }

    #[test]
    fn embedded_trigger_matches_anywhere_in_the_utterance() {
        // Substring matching, not token matching. This is the documented
        // false-positive behavior, asserted so nobody "fixes" it silently.
        let registry = ActionRegistry::new();
        let speech = Arc::new(RecordingSpeech::default());
        let automation = Arc::new(RecordingAutomation::default());
        let ctx = ctx(speech, automation.clone(), registry.len());

        let result = registry.dispatch("could you open youtube for me", &ctx);
        assert_eq!(
            result,
            Dispatch::Executed {
                keyword: "open youtube"
            }
        );
    }

    #[test]
    fn unmute_wins_over_mute_for_unmute_utterances() {
        let registry = ActionRegistry::new();
        let speech = Arc::new(RecordingSpeech::default());
        let automation = Arc::new(RecordingAutomation::default());
        let ctx = ctx(speech, automation.clone(), registry.len());

        let result = registry.dispatch("unmute", &ctx);
        assert_eq!(result, Dispatch::Executed { keyword: "unmute" });
        assert_eq!(
            automation.calls(),
            vec!["media_key:Unmute".to_string()]
        );
    }

    #[test]
    fn failing_action_apologizes_and_does_not_fall_through() {
        let registry = ActionRegistry::new();
        let speech = Arc::new(RecordingSpeech::default());
        let automation = Arc::new(RecordingAutomation::failing());
        let ctx = ctx(speech.clone(), automation.clone(), registry.len());

        // "open google drive" and "open google" and "open drive" are all
        // substrings here; the failure on the longest must be terminal.
        let result = registry.dispatch("open google drive", &ctx);
        assert_eq!(
            result,
            Dispatch::Failed {
                keyword: "open google drive"
            }
        );
        assert!(automation.calls().is_empty());
        let lines = speech.lines();
        assert!(
            lines.last().unwrap().contains("error"),
            "expected an apology, got {lines:?}"
        );
    }

    #[test]
    fn shopping_and_shell_triggers_dispatch() {
        let registry = ActionRegistry::new();
        let speech = Arc::new(RecordingSpeech::default());
        let automation = Arc::new(RecordingAutomation::default());
        let ctx = ctx(speech, automation.clone(), registry.len());

        assert_eq!(
            registry.dispatch("open shopee", &ctx),
            Dispatch::Executed { keyword: "open shopee" }
        );
        assert_eq!(
            registry.dispatch("open lazada", &ctx),
            Dispatch::Executed { keyword: "open lazada" }
        );
        assert_eq!(
            registry.dispatch("open powershell", &ctx),
            Dispatch::Executed { keyword: "open powershell" }
        );
        assert_eq!(
            registry.dispatch("snip", &ctx),
            Dispatch::Executed { keyword: "snip" }
        );
        assert_eq!(
            automation.calls(),
            vec![
                "open_url:https://shopee.com".to_string(),
                "open_url:https://www.lazada.com".to_string(),
                "launch:powershell".to_string(),
                "hotkey:super+shift+s".to_string(),
            ]
        );
    }

    #[test]
    fn battery_reply_reports_charging_state() {
        let registry = ActionRegistry::new();
        let automation = Arc::new(RecordingAutomation::default());

        let speech = Arc::new(RecordingSpeech::default());
        let ctx = ctx(speech.clone(), automation.clone(), registry.len());
        registry.dispatch("battery status", &ctx);
        assert_eq!(
            speech.lines(),
            vec!["Battery is at 88 percent, running on battery power, sir."]
        );

        // A probe with no battery reading gets the desktop wording.
        let speech = Arc::new(RecordingSpeech::default());
        let mut report = StatsReport::unknown();
        report.plugged = None;
        let ctx = ActionContext {
            speech: speech.clone(),
            automation,
            stats: Arc::new(FixedStats(report)),
            spawner: Arc::new(InlineSpawner),
            command_count: registry.len(),
            compound_delay: Duration::ZERO,
        };
        registry.dispatch("battery status", &ctx);
        assert_eq!(
            speech.lines(),
            vec!["No battery detected, sir. Running on mains power."]
        );
    }

    #[test]
    fn ram_reply_includes_available_gigabytes() {
        let registry = ActionRegistry::new();
        let speech = Arc::new(RecordingSpeech::default());
        let automation = Arc::new(RecordingAutomation::default());
        let ctx = ctx(speech.clone(), automation, registry.len());

        registry.dispatch("ram usage", &ctx);
        assert_eq!(
            speech.lines(),
            vec!["Memory usage is at 40 percent, with 9.6 gigabytes available, sir."]
        );
    }

    #[test]
    fn no_trigger_means_no_match() {
        let registry = ActionRegistry::new();
        let speech = Arc::new(RecordingSpeech::default());
        let automation = Arc::new(RecordingAutomation::default());
        let ctx = ctx(speech, automation, registry.len());

        assert_eq!(registry.dispatch("tell me a story", &ctx), Dispatch::NoMatch);
    }

    #[test]
    fn list_commands_speaks_the_table_size() {
        let registry = ActionRegistry::new();
        let speech = Arc::new(RecordingSpeech::default());
        let automation = Arc::new(RecordingAutomation::default());
        let ctx = ctx(speech.clone(), automation, registry.len());

        registry.dispatch("list commands", &ctx);
        let lines = speech.lines();
        assert!(lines[0].contains(&registry.len().to_string()));
    }
}
