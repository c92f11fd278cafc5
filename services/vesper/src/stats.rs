use std::net::{SocketAddr, TcpStream};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use vesper_core::{StatsReport, SystemStats};

/// Telemetry probe backed by sysinfo, plus a cheap TCP reachability check
/// for the connectivity field.
pub struct SysinfoStats {
    system: Mutex<System>,
    started: Instant,
    connectivity: Mutex<Option<(Instant, String)>>,
}

const CONNECTIVITY_TTL: Duration = Duration::from_secs(30);

impl SysinfoStats {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        Self {
            system: Mutex::new(system),
            started: Instant::now(),
            connectivity: Mutex::new(None),
        }
    }

    /// Connectivity is sampled at most once per TTL; the probe runs on every
    /// status tick and must not dial out each second.
    fn connectivity(&self) -> String {
        let Ok(mut cached) = self.connectivity.lock() else {
            return "Unknown".to_string();
        };
        if let Some((at, word)) = cached.as_ref() {
            if at.elapsed() < CONNECTIVITY_TTL {
                return word.clone();
            }
        }
        let word = probe_connectivity();
        *cached = Some((Instant::now(), word.clone()));
        word
    }

    fn uptime(&self) -> String {
        let elapsed = self.started.elapsed().as_secs();
        format!("{}h {}m", elapsed / 3600, (elapsed % 3600) / 60)
    }
}

impl Default for SysinfoStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemStats for SysinfoStats {
    fn read(&self) -> StatsReport {
        let Ok(mut sys) = self.system.lock() else {
            return StatsReport::unknown();
        };
        sys.refresh_cpu_all();
        sys.refresh_memory();

        let memory_total = sys.total_memory();
        let ram_percent = if memory_total > 0 {
            (sys.used_memory() as f32 / memory_total as f32) * 100.0
        } else {
            0.0
        };

        let ram_available_gb = Some(sys.available_memory() as f32 / 1_073_741_824.0);

        let (battery, plugged) = read_battery();
        StatsReport {
            battery,
            plugged,
            cpu_percent: sys.global_cpu_usage(),
            ram_percent,
            ram_available_gb,
            uptime: self.uptime(),
            connectivity: self.connectivity(),
        }
    }
}

/// Battery charge and charging state from the kernel's power-supply
/// interface. Desktops without a battery report full with no plugged state.
#[cfg(target_os = "linux")]
fn read_battery() -> (f32, Option<bool>) {
    for bat in ["BAT0", "BAT1"] {
        let capacity = format!("/sys/class/power_supply/{bat}/capacity");
        if let Ok(raw) = std::fs::read_to_string(&capacity) {
            if let Ok(value) = raw.trim().parse::<f32>() {
                let status = format!("/sys/class/power_supply/{bat}/status");
                let plugged = std::fs::read_to_string(&status)
                    .map(|s| s.trim() != "Discharging")
                    .unwrap_or(true);
                return (value, Some(plugged));
            }
        }
    }
    (100.0, None)
}

#[cfg(not(target_os = "linux"))]
fn read_battery() -> (f32, Option<bool>) {
    (100.0, None)
}

/// A quick TCP dial to a public resolver. Coarse on purpose: the frontend
/// only shows a word, not a latency figure.
fn probe_connectivity() -> String {
    let target: SocketAddr = ([1, 1, 1, 1], 53).into();
    match TcpStream::connect_timeout(&target, Duration::from_millis(300)) {
        Ok(_) => "Strong".to_string(),
        Err(_) => "Offline".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_formats_hours_and_minutes() {
        let stats = SysinfoStats::new();
        // A fresh probe has been up for less than a minute.
        assert_eq!(stats.uptime(), "0h 0m");
    }

    #[test]
    fn report_percentages_are_in_range() {
        let stats = SysinfoStats::new();
        let report = stats.read();
        assert!((0.0..=100.0).contains(&report.ram_percent));
        assert!(report.cpu_percent >= 0.0);
    }
}
