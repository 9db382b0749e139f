use chrono::{DateTime, Local};

/// Daemon state for one filesystem, as reported by the control CLI.
///
/// `Deduplicating` optionally carries the free-space figures the daemon
/// records when it starts, so the UI can show progress without knowing
/// anything about the dedup algorithm itself.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DedupStatus {
    Deduplicating {
        started_free: Option<String>,
        current_free: Option<String>,
    },
    NotRunning,
    FailedToRun,
    NotConfigured,
}

impl DedupStatus {
    /// Parses the porcelain status token from `beekeeperman status`:
    /// `running`, `running:<started>:<current>`, `stopped`, `failed`,
    /// `unconfigured`. Unknown tokens degrade to `FailedToRun` so a
    /// newer daemon never crashes an older frontend.
    pub fn from_token(token: &str) -> Self {
        let mut parts = token.split(':');
        match parts.next().unwrap_or_default() {
            "running" => {
                let started = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
                let current = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
                Self::Deduplicating {
                    started_free: started,
                    current_free: current,
                }
            }
            "stopped" => Self::NotRunning,
            "unconfigured" => Self::NotConfigured,
            _ => Self::FailedToRun,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Deduplicating { .. })
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, Self::NotConfigured)
    }

    pub fn text(&self) -> String {
        match self {
            Self::Deduplicating {
                started_free: Some(started),
                current_free: Some(current),
            } => {
                format!(
                    "Deduplicating files. Started with {started} free, now you have {current} free."
                )
            }
            Self::Deduplicating {
                started_free: None,
                current_free: Some(current),
            } => format!("Deduplicating files. You have {current} free right now."),
            Self::Deduplicating { .. } => "Deduplicating files".to_string(),
            Self::NotRunning => "Not running".to_string(),
            Self::FailedToRun => "Failed to run".to_string(),
            Self::NotConfigured => "Not configured".to_string(),
        }
    }

    pub fn short_text(&self) -> &'static str {
        match self {
            Self::Deduplicating { .. } => "Deduplicating",
            Self::NotRunning => "Not running",
            Self::FailedToRun => "Failed",
            Self::NotConfigured => "Not configured",
        }
    }
}

/// One row of the filesystem table. Rows are replaced wholesale on each
/// refresh; the navigation core never mutates them in place.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Filesystem {
    pub uuid: String,
    pub label: String,
    pub status: DedupStatus,
}

#[derive(Debug, Clone, Default)]
pub struct FsTable {
    pub rows: Vec<Filesystem>,
    pub last_refreshed: Option<DateTime<Local>>,
    pub error: Option<String>,
}

impl FsTable {
    pub fn set_rows(&mut self, rows: Vec<Filesystem>, refreshed_at: DateTime<Local>) {
        self.rows = rows;
        self.last_refreshed = Some(refreshed_at);
        self.error = None;
    }

    pub fn set_error(&mut self, error: impl Into<String>, refreshed_at: DateTime<Local>) {
        self.rows.clear();
        self.error = Some(error.into());
        self.last_refreshed = Some(refreshed_at);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn uuid_at(&self, index: usize) -> Option<&str> {
        self.rows.get(index).map(|fs| fs.uuid.as_str())
    }
}

/// Tag for a toolbar button, matched by the action dispatcher. The
/// navigation core carries these around without knowing daemon semantics.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ToolbarAction {
    Refresh,
    Start,
    Stop,
    Setup,
    ShowLogs,
    RemoveConfig,
}

impl ToolbarAction {
    pub const ALL: [Self; 6] = [
        Self::Refresh,
        Self::Start,
        Self::Stop,
        Self::Setup,
        Self::ShowLogs,
        Self::RemoveConfig,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Refresh => "Refresh",
            Self::Start => "Start",
            Self::Stop => "Stop",
            Self::Setup => "Setup",
            Self::ShowLogs => "Logs",
            Self::RemoveConfig => "Remove config",
        }
    }
}

/// Read-only toolbar snapshot entry. Enablement is computed outside the
/// navigation core, once per navigation step.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ToolbarButton {
    pub action: ToolbarAction,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::DedupStatus;

    #[test]
    fn status_tokens_parse() {
        assert_eq!(DedupStatus::from_token("stopped"), DedupStatus::NotRunning);
        assert_eq!(
            DedupStatus::from_token("unconfigured"),
            DedupStatus::NotConfigured
        );
        assert_eq!(DedupStatus::from_token("failed"), DedupStatus::FailedToRun);
        assert_eq!(
            DedupStatus::from_token("running"),
            DedupStatus::Deduplicating {
                started_free: None,
                current_free: None
            }
        );
        assert_eq!(
            DedupStatus::from_token("running:12.4G:13.1G"),
            DedupStatus::Deduplicating {
                started_free: Some("12.4G".to_string()),
                current_free: Some("13.1G".to_string())
            }
        );
    }

    #[test]
    fn unknown_status_token_degrades_to_failed() {
        assert_eq!(
            DedupStatus::from_token("hibernating"),
            DedupStatus::FailedToRun
        );
    }

    #[test]
    fn running_status_text_mentions_free_space() {
        let status = DedupStatus::from_token("running:10G:12G");
        assert_eq!(
            status.text(),
            "Deduplicating files. Started with 10G free, now you have 12G free."
        );
    }
}
