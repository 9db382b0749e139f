use crate::input::{Action, Bindings};
use crate::model::{Filesystem, FsTable, ToolbarAction, ToolbarButton};
use crate::nav::{EXIT_PROMPT, FocusDomain, NavEffect, Navigator};
use chrono::Local;
use std::time::{Duration, Instant};

pub const STARTUP_HINT: &str =
    "To access the toolbar with the keyboard, select a filesystem and press Enter or Space. Press ? for help.";
pub const COPY_CONFIRMATION: &str = "UUID(s) copied to clipboard.";

/// How long a transient hint stays on the status bar before the previous
/// text comes back.
pub const STATUS_RESTORE_WINDOW: Duration = Duration::from_secs(2);

/// Work the event loop performs on behalf of the app after a key event.
/// The app itself never touches the daemon, the clipboard or the
/// terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    Refresh,
    Daemon {
        action: ToolbarAction,
        uuids: Vec<String>,
    },
    CopyToClipboard(String),
}

#[derive(Debug, Clone)]
pub struct LogsOverlay {
    pub title: String,
    pub content: String,
    pub scroll: usize,
}

/// Status bar text displaced by a transient hint, together with the
/// instant at which it comes back.
#[derive(Debug, Clone)]
struct StatusRestore {
    previous: String,
    deadline: Instant,
}

pub struct App {
    table: FsTable,
    nav: Navigator,
    buttons: Vec<ToolbarButton>,
    bindings: Bindings,
    status: String,
    status_restore: Option<StatusRestore>,
    running: bool,
    show_help: bool,
    logs_overlay: Option<LogsOverlay>,
}

impl App {
    pub fn new(bindings: Bindings) -> Self {
        Self {
            table: FsTable::default(),
            nav: Navigator::default(),
            buttons: Vec::new(),
            bindings,
            status: STARTUP_HINT.to_string(),
            status_restore: None,
            running: true,
            show_help: false,
            logs_overlay: None,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// A durable status replaces any pending transient-hint restore.
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.status_restore = None;
    }

    /// Shows `message` on the status bar and brings the current text back
    /// once the restore window elapses. Re-triggering while a hint is
    /// already up keeps the original text as the restore target.
    fn set_transient_status(&mut self, message: String, now: Instant) {
        let previous = match self.status_restore.take() {
            Some(pending) => pending.previous,
            None => self.status.clone(),
        };
        self.status_restore = Some(StatusRestore {
            previous,
            deadline: now + STATUS_RESTORE_WINDOW,
        });
        self.status = message;
    }

    pub fn table(&self) -> &FsTable {
        &self.table
    }

    pub fn nav(&self) -> &Navigator {
        &self.nav
    }

    pub fn buttons(&self) -> &[ToolbarButton] {
        &self.buttons
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn set_bindings(&mut self, bindings: Bindings) {
        self.bindings = bindings;
    }

    pub fn focus_domain(&self) -> FocusDomain {
        self.nav.focus()
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn logs_overlay(&self) -> Option<&LogsOverlay> {
        self.logs_overlay.as_ref()
    }

    pub fn set_logs_overlay(&mut self, title: impl Into<String>, content: impl Into<String>) {
        self.logs_overlay = Some(LogsOverlay {
            title: title.into(),
            content: content.into(),
            scroll: 0,
        });
    }

    /// Replaces the table snapshot from a refresh cycle. Applied between
    /// key events only; highlight and selection are re-validated before
    /// the next key is handled.
    pub fn set_filesystems(&mut self, rows: Vec<Filesystem>) {
        self.table.set_rows(rows, Local::now());
        self.refresh_toolbar();
    }

    pub fn set_refresh_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.set_status(format!("Refresh failed: {error}"));
        self.table.set_error(error, Local::now());
        self.refresh_toolbar();
    }

    /// Recomputes button enablement from the current selection and row
    /// statuses, then re-validates the navigator against the new
    /// snapshot.
    fn refresh_toolbar(&mut self) {
        let targets: Vec<&Filesystem> = self
            .nav
            .store()
            .target_rows()
            .into_iter()
            .filter_map(|index| self.table.rows.get(index))
            .collect();
        let any_running = targets.iter().any(|fs| fs.status.is_running());
        let any_configured = targets.iter().any(|fs| fs.status.is_configured());
        let any_startable = targets
            .iter()
            .any(|fs| fs.status.is_configured() && !fs.status.is_running());
        let has_targets = !targets.is_empty();

        self.buttons = ToolbarAction::ALL
            .into_iter()
            .map(|action| ToolbarButton {
                action,
                enabled: match action {
                    ToolbarAction::Refresh => true,
                    ToolbarAction::Start => any_startable,
                    ToolbarAction::Stop => any_running,
                    ToolbarAction::Setup => has_targets,
                    ToolbarAction::ShowLogs => has_targets && any_configured,
                    ToolbarAction::RemoveConfig => any_configured,
                },
            })
            .collect();
        self.nav.revalidate(self.table.len(), &self.buttons);
    }

    /// Earliest of the exit-confirmation and transient-hint deadlines.
    pub fn next_deadline(&self) -> Option<Instant> {
        let restore = self.status_restore.as_ref().map(|pending| pending.deadline);
        match (self.nav.next_deadline(), restore) {
            (Some(nav), Some(restore)) => Some(nav.min(restore)),
            (nav, restore) => nav.or(restore),
        }
    }

    /// Fires whichever armed deadlines have elapsed. Returns true when
    /// the UI should re-render.
    pub fn handle_deadline(&mut self, now: Instant) -> bool {
        let mut changed = false;
        if let Some(pending) = self.status_restore.take() {
            if now >= pending.deadline {
                self.status = pending.previous;
                changed = true;
            } else {
                self.status_restore = Some(pending);
            }
        }
        if self.nav.handle_deadline(now) {
            if self.status == EXIT_PROMPT {
                self.status = STARTUP_HINT.to_string();
            }
            changed = true;
        }
        changed
    }

    pub fn apply_action(&mut self, action: Action, now: Instant) -> AppCommand {
        if self.show_help {
            // Any key dismisses the help overlay.
            self.show_help = false;
            return AppCommand::None;
        }

        if self.logs_overlay.is_some() {
            return self.apply_logs_overlay_action(action);
        }

        if action == Action::ToggleHelp {
            self.show_help = true;
            return AppCommand::None;
        }

        // Enablement is a read-only snapshot per navigation step.
        self.refresh_toolbar();
        let buttons = self.buttons.clone();
        let effects = self.nav.handle(action, self.table.len(), &buttons, now);

        let mut command = AppCommand::None;
        for effect in effects {
            match effect {
                NavEffect::Status(message) => self.set_status(message),
                NavEffect::TransientStatus(message) => self.set_transient_status(message, now),
                NavEffect::CopyRows(rows) => {
                    let text = rows
                        .into_iter()
                        .filter_map(|index| self.table.uuid_at(index))
                        .collect::<Vec<_>>()
                        .join("\n");
                    if !text.is_empty() {
                        command = AppCommand::CopyToClipboard(text);
                    }
                }
                NavEffect::Dispatch { action, rows } => {
                    let uuids = rows
                        .into_iter()
                        .filter_map(|index| self.table.uuid_at(index).map(str::to_string))
                        .collect::<Vec<_>>();
                    command = if action == ToolbarAction::Refresh {
                        AppCommand::Refresh
                    } else {
                        AppCommand::Daemon { action, uuids }
                    };
                }
                NavEffect::RequestExit => {
                    self.running = false;
                    self.set_status("Exiting.");
                }
            }
        }
        command
    }

    fn apply_logs_overlay_action(&mut self, action: Action) -> AppCommand {
        let Some(overlay) = self.logs_overlay.as_mut() else {
            return AppCommand::None;
        };
        match action {
            Action::Up => overlay.scroll = overlay.scroll.saturating_sub(1),
            Action::Down => overlay.scroll = overlay.scroll.saturating_add(1),
            Action::Escape => self.logs_overlay = None,
            _ => {}
        }
        AppCommand::None
    }
}
