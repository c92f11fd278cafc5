use anyhow::{Context, Result};
use vesper_core::{Automation, MediaKey, PowerOp};

/// Desktop automation backed by the host OS's own tooling. URLs go through
/// the system handler; everything else shells out to the platform utility.
pub struct DesktopAutomation;

impl Automation for DesktopAutomation {
    fn open_url(&self, url: &str) -> Result<()> {
        open::that_detached(url).with_context(|| format!("failed to open {url}"))
    }

    fn launch(&self, app: &str) -> Result<()> {
        platform::launch(app)
    }

    fn hotkey(&self, keys: &[&str]) -> Result<()> {
        platform::hotkey(keys)
    }

    fn media_key(&self, key: MediaKey) -> Result<()> {
        platform::media_key(key)
    }

    fn brightness(&self, delta: i32) -> Result<()> {
        platform::brightness(delta)
    }

    fn power(&self, op: PowerOp) -> Result<()> {
        platform::power(op)
    }

    fn screenshot(&self) -> Result<()> {
        platform::screenshot()
    }

    fn empty_trash(&self) -> Result<()> {
        platform::empty_trash()
    }

    fn shutdown_assistant(&self) -> Result<()> {
        // Give the farewell line a moment to leave the speech queue, then
        // end the process.
        std::thread::spawn(|| {
            std::thread::sleep(std::time::Duration::from_secs(2));
            tracing::info!("assistant shutting down by voice command");
            std::process::exit(0);
        });
        Ok(())
    }
}

/// Launch and forget; used for apps and long-running tools.
fn spawn_detached(program: &str, args: &[&str]) -> Result<()> {
    std::process::Command::new(program)
        .args(args)
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;
    Ok(())
}

/// Run to completion and require a zero exit; used for short utilities
/// whose failure the user should hear about.
fn run_checked(program: &str, args: &[&str]) -> Result<()> {
    let status = std::process::Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("failed to run {program}"))?;
    if !status.success() {
        anyhow::bail!("{program} exited with {status}");
    }
    Ok(())
}

#[cfg(target_os = "linux")]
mod platform {
    use super::{run_checked, spawn_detached};
    use anyhow::Result;
    use vesper_core::{MediaKey, PowerOp};

    pub fn launch(app: &str) -> Result<()> {
        spawn_detached("gtk-launch", &[app])
    }

    pub fn hotkey(keys: &[&str]) -> Result<()> {
        let combo = keys.iter().map(|k| xdotool_key(k)).collect::<Vec<_>>().join("+");
        run_checked("xdotool", &["key", &combo])
    }

    // xdotool wants X keysym names for the non-modifier keys.
    fn xdotool_key(key: &str) -> &str {
        match key {
            "tab" => "Tab",
            "escape" => "Escape",
            "left" => "Left",
            "right" => "Right",
            "up" => "Up",
            "down" => "Down",
            "f4" => "F4",
            other => other,
        }
    }

    pub fn media_key(key: MediaKey) -> Result<()> {
        let args: [&str; 3] = match key {
            MediaKey::VolumeUp => ["set-sink-volume", "@DEFAULT_SINK@", "+5%"],
            MediaKey::VolumeDown => ["set-sink-volume", "@DEFAULT_SINK@", "-5%"],
            MediaKey::Mute => ["set-sink-mute", "@DEFAULT_SINK@", "1"],
            MediaKey::Unmute => ["set-sink-mute", "@DEFAULT_SINK@", "0"],
        };
        run_checked("pactl", &args)
    }

    pub fn brightness(delta: i32) -> Result<()> {
        let step = if delta >= 0 {
            format!("{}%+", delta)
        } else {
            format!("{}%-", -delta)
        };
        run_checked("brightnessctl", &["set", &step])
    }

    pub fn power(op: PowerOp) -> Result<()> {
        match op {
            PowerOp::Lock => run_checked("loginctl", &["lock-session"]),
            PowerOp::Sleep => run_checked("systemctl", &["suspend"]),
            PowerOp::Restart => run_checked("shutdown", &["-r", "+1"]),
            PowerOp::Shutdown => run_checked("shutdown", &["-h", "+1"]),
            PowerOp::CancelShutdown => run_checked("shutdown", &["-c"]),
        }
    }

    pub fn screenshot() -> Result<()> {
        run_checked("gnome-screenshot", &[])
    }

    pub fn empty_trash() -> Result<()> {
        run_checked("gio", &["trash", "--empty"])
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use super::{run_checked, spawn_detached};
    use anyhow::Result;
    use vesper_core::{MediaKey, PowerOp};

    pub fn launch(app: &str) -> Result<()> {
        spawn_detached("open", &["-a", app])
    }

    pub fn hotkey(keys: &[&str]) -> Result<()> {
        let (modifiers, key) = keys.split_at(keys.len().saturating_sub(1));
        let using = modifiers
            .iter()
            .map(|m| match *m {
                "super" => "command down",
                "ctrl" => "control down",
                "alt" => "option down",
                "shift" => "shift down",
                other => other,
            })
            .collect::<Vec<_>>()
            .join(", ");
        let script = if using.is_empty() {
            format!("tell application \"System Events\" to keystroke \"{}\"", key.join(""))
        } else {
            format!(
                "tell application \"System Events\" to keystroke \"{}\" using {{{}}}",
                key.join(""),
                using
            )
        };
        run_checked("osascript", &["-e", &script])
    }

    pub fn media_key(key: MediaKey) -> Result<()> {
        let script = match key {
            MediaKey::VolumeUp => "set volume output volume ((output volume of (get volume settings)) + 10)",
            MediaKey::VolumeDown => "set volume output volume ((output volume of (get volume settings)) - 10)",
            MediaKey::Mute => "set volume output muted true",
            MediaKey::Unmute => "set volume output muted false",
        };
        run_checked("osascript", &["-e", script])
    }

    pub fn brightness(delta: i32) -> Result<()> {
        // Key codes 144/145 step display brightness.
        let code = if delta >= 0 { "144" } else { "145" };
        let script = format!("tell application \"System Events\" to key code {code}");
        run_checked("osascript", &["-e", &script])
    }

    pub fn power(op: PowerOp) -> Result<()> {
        match op {
            PowerOp::Lock => run_checked("pmset", &["displaysleepnow"]),
            PowerOp::Sleep => run_checked("pmset", &["sleepnow"]),
            PowerOp::Restart => run_checked("osascript", &["-e", "tell app \"System Events\" to restart"]),
            PowerOp::Shutdown => run_checked("osascript", &["-e", "tell app \"System Events\" to shut down"]),
            PowerOp::CancelShutdown => anyhow::bail!("cancel shutdown is not supported on macOS"),
        }
    }

    pub fn screenshot() -> Result<()> {
        let path = format!(
            "{}/Desktop/vesper-{}.png",
            std::env::var("HOME").unwrap_or_else(|_| ".".to_string()),
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        );
        run_checked("screencapture", &[&path])
    }

    pub fn empty_trash() -> Result<()> {
        run_checked("osascript", &["-e", "tell application \"Finder\" to empty trash"])
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use super::{run_checked, spawn_detached};
    use anyhow::Result;
    use vesper_core::{MediaKey, PowerOp};

    pub fn launch(app: &str) -> Result<()> {
        spawn_detached("cmd", &["/C", "start", "", app])
    }

    pub fn hotkey(keys: &[&str]) -> Result<()> {
        let mut sequence = String::new();
        let (modifiers, key) = keys.split_at(keys.len().saturating_sub(1));
        for m in modifiers {
            sequence.push_str(match *m {
                "ctrl" => "^",
                "alt" => "%",
                "shift" => "+",
                // SendKeys has no Windows-key modifier; those combos are
                // best effort only.
                _ => "",
            });
        }
        sequence.push_str(&match key.first().copied().unwrap_or_default() {
            "tab" => "{TAB}".to_string(),
            "escape" => "{ESC}".to_string(),
            "left" => "{LEFT}".to_string(),
            "right" => "{RIGHT}".to_string(),
            "up" => "{UP}".to_string(),
            "down" => "{DOWN}".to_string(),
            "f4" => "{F4}".to_string(),
            other => other.to_string(),
        });
        let script = format!(
            "Add-Type -AssemblyName System.Windows.Forms; \
             [System.Windows.Forms.SendKeys]::SendWait('{sequence}')"
        );
        run_checked("powershell", &["-NoProfile", "-Command", &script])
    }

    pub fn media_key(key: MediaKey) -> Result<()> {
        let code = match key {
            MediaKey::VolumeUp => 175,
            MediaKey::VolumeDown => 174,
            MediaKey::Mute | MediaKey::Unmute => 173,
        };
        let script = format!(
            "(New-Object -ComObject WScript.Shell).SendKeys([char]{code})"
        );
        run_checked("powershell", &["-NoProfile", "-Command", &script])
    }

    pub fn brightness(delta: i32) -> Result<()> {
        let script = format!(
            "$b = (Get-WmiObject -Namespace root/wmi -Class WmiMonitorBrightness).CurrentBrightness; \
             $m = Get-WmiObject -Namespace root/wmi -Class WmiMonitorBrightnessMethods; \
             $m.WmiSetBrightness(1, [math]::Max(0, [math]::Min(100, $b + ({delta}))))"
        );
        run_checked("powershell", &["-NoProfile", "-Command", &script])
    }

    pub fn power(op: PowerOp) -> Result<()> {
        match op {
            PowerOp::Lock => run_checked("rundll32", &["user32.dll,LockWorkStation"]),
            PowerOp::Sleep => run_checked(
                "rundll32",
                &["powrprof.dll,SetSuspendState", "0,1,0"],
            ),
            PowerOp::Restart => run_checked("shutdown", &["/r", "/t", "60"]),
            PowerOp::Shutdown => run_checked("shutdown", &["/s", "/t", "60"]),
            PowerOp::CancelShutdown => run_checked("shutdown", &["/a"]),
        }
    }

    pub fn screenshot() -> Result<()> {
        let script = "Add-Type -AssemblyName System.Windows.Forms; \
                      [System.Windows.Forms.SendKeys]::SendWait('{PRTSC}')";
        run_checked("powershell", &["-NoProfile", "-Command", script])
    }

    pub fn empty_trash() -> Result<()> {
        run_checked(
            "powershell",
            &["-NoProfile", "-Command", "Clear-RecycleBin -Force -ErrorAction SilentlyContinue"],
        )
    }
}
