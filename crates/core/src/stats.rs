use serde::Serialize;

/// Point-in-time system statistics, spoken by the info actions and included
/// in every status snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub battery: f32,
    /// Charging state; `None` when no battery is present (or unreadable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugged: Option<bool>,
    pub cpu_percent: f32,
    pub ram_percent: f32,
    /// Free memory in gigabytes; `None` when the probe could not read it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_available_gb: Option<f32>,
    pub uptime: String,
    pub connectivity: String,
}

impl StatsReport {
    /// The safe fallback used when the probe fails for any reason.
    pub fn unknown() -> Self {
        Self {
            battery: 0.0,
            plugged: None,
            cpu_percent: 0.0,
            ram_percent: 0.0,
            ram_available_gb: None,
            uptime: "0h 0m".to_string(),
            connectivity: "Unknown".to_string(),
        }
    }
}

/// Telemetry probe. Synchronous, best effort: implementations return the
/// zeroed/"Unknown" report rather than raising.
pub trait SystemStats: Send + Sync {
    fn read(&self) -> StatsReport;
}

/// Returns a canned report; stands in for the probe in tests.
#[cfg(test)]
pub(crate) struct FixedStats(pub(crate) StatsReport);

#[cfg(test)]
impl Default for FixedStats {
    fn default() -> Self {
        Self(StatsReport {
            battery: 88.0,
            plugged: Some(false),
            cpu_percent: 12.5,
            ram_percent: 40.0,
            ram_available_gb: Some(9.6),
            uptime: "1h 5m".to_string(),
            connectivity: "Strong".to_string(),
        })
    }
}

#[cfg(test)]
impl SystemStats for FixedStats {
    fn read(&self) -> StatsReport {
        self.0.clone()
    }
}
