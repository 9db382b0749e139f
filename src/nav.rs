use crate::input::Action;
use crate::model::{ToolbarAction, ToolbarButton};
use crate::selection::SelectionStore;
use std::time::{Duration, Instant};
use tracing::debug;

/// How long the first Esc keeps the exit confirmation armed.
pub const ESC_CONFIRM_WINDOW: Duration = Duration::from_secs(2);

pub const TOOLBAR_PROMPT: &str = "Do you want to access the toolbar? Press Enter or Space.";
pub const EXIT_PROMPT: &str = "Press Esc again to exit.";

/// Which logical region currently receives key events. A single flat
/// switch; there is no nested focus model.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FocusDomain {
    Table,
    Toolbar,
}

/// Side effects the navigation core asks its collaborators to perform.
/// The core itself mutates only highlight/selection/focus state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEffect {
    Status(String),
    /// A hint that should revert to the previous status bar text after a
    /// short window.
    TransientStatus(String),
    /// Copy the UUIDs of these row indices (ascending table order).
    CopyRows(Vec<usize>),
    Dispatch {
        action: ToolbarAction,
        rows: Vec<usize>,
    },
    RequestExit,
}

/// Focus coordinator plus the table and toolbar controllers.
///
/// Owns the highlight/selection store and the two pieces of transient
/// sub-state the key model needs: the toolbar-entry confirmation (armed
/// by a selecting keypress, consumed by the next Enter/Space) and the
/// double-Esc exit window (armed by Esc on an empty selection, expiring
/// on a deadline delivered by the event loop).
#[derive(Debug)]
pub struct Navigator {
    store: SelectionStore,
    focus: FocusDomain,
    toolbar_index: Option<usize>,
    awaiting_toolbar: bool,
    esc_armed_until: Option<Instant>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            store: SelectionStore::default(),
            focus: FocusDomain::Table,
            toolbar_index: None,
            awaiting_toolbar: false,
            esc_armed_until: None,
        }
    }
}

impl Navigator {
    pub fn focus(&self) -> FocusDomain {
        self.focus
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub fn highlighted_button(&self) -> Option<usize> {
        self.toolbar_index
    }

    pub fn awaiting_toolbar_confirmation(&self) -> bool {
        self.awaiting_toolbar
    }

    pub fn exit_confirmation_armed(&self) -> bool {
        self.esc_armed_until.is_some()
    }

    /// Deadline the event loop should wake us at, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.esc_armed_until
    }

    /// Expires the exit confirmation window. Returns true if state changed.
    pub fn handle_deadline(&mut self, now: Instant) -> bool {
        match self.esc_armed_until {
            Some(deadline) if now >= deadline => {
                self.esc_armed_until = None;
                true
            }
            _ => false,
        }
    }

    /// Re-validates against a fresh row/button snapshot. Called between
    /// key events whenever a refresh replaced the table or the button
    /// enablement changed.
    pub fn revalidate(&mut self, row_count: usize, buttons: &[ToolbarButton]) {
        self.store.revalidate(row_count);
        if !self.store.has_selection() {
            self.awaiting_toolbar = false;
        }

        if self.focus == FocusDomain::Toolbar {
            let still_valid = self
                .toolbar_index
                .and_then(|index| buttons.get(index))
                .is_some_and(|button| button.enabled);
            if !still_valid {
                match first_enabled(buttons) {
                    Some(index) => self.toolbar_index = Some(index),
                    None => self.return_to_table(),
                }
            }
        }
    }

    /// Handles one key action to completion. `now` is the event arrival
    /// time, used only for the double-Esc window.
    pub fn handle(
        &mut self,
        action: Action,
        row_count: usize,
        buttons: &[ToolbarButton],
        now: Instant,
    ) -> Vec<NavEffect> {
        // Any key other than Esc disarms the pending exit confirmation.
        if action != Action::Escape {
            self.esc_armed_until = None;
        }

        let effects = match self.focus {
            FocusDomain::Table => self.handle_table(action, row_count, buttons, now),
            FocusDomain::Toolbar => self.handle_toolbar(action, buttons),
        };
        debug!(?action, focus = ?self.focus, "nav handled");
        effects
    }

    fn handle_table(
        &mut self,
        action: Action,
        row_count: usize,
        buttons: &[ToolbarButton],
        now: Instant,
    ) -> Vec<NavEffect> {
        match action {
            Action::Up | Action::Down => {
                self.awaiting_toolbar = false;
                let delta = if action == Action::Up { -1 } else { 1 };
                let wrapped = self.store.move_highlight(delta, row_count);
                if wrapped && row_count > 1 {
                    vec![NavEffect::TransientStatus(TOOLBAR_PROMPT.to_string())]
                } else {
                    Vec::new()
                }
            }
            Action::Select => {
                if self.awaiting_toolbar && self.store.has_selection() {
                    self.awaiting_toolbar = false;
                    return self.enter_toolbar(buttons);
                }
                if self.store.extend_with_highlight() {
                    self.awaiting_toolbar = true;
                    vec![NavEffect::TransientStatus(TOOLBAR_PROMPT.to_string())]
                } else {
                    Vec::new()
                }
            }
            Action::RangeSelect => {
                if self.store.range_select() {
                    self.awaiting_toolbar = true;
                    vec![NavEffect::TransientStatus(TOOLBAR_PROMPT.to_string())]
                } else {
                    Vec::new()
                }
            }
            Action::SelectAll => {
                self.awaiting_toolbar = false;
                if row_count == 0 {
                    return Vec::new();
                }
                self.store.select_all(row_count);
                self.awaiting_toolbar = true;
                vec![NavEffect::TransientStatus(TOOLBAR_PROMPT.to_string())]
            }
            Action::CopyUuids => {
                self.awaiting_toolbar = false;
                let rows = self.store.target_rows();
                if rows.is_empty() {
                    Vec::new()
                } else {
                    vec![NavEffect::CopyRows(rows)]
                }
            }
            Action::Escape => {
                self.awaiting_toolbar = false;
                if self.store.has_selection() {
                    self.store.clear_selection();
                    vec![NavEffect::Status("Selection cleared.".to_string())]
                } else if self.esc_armed_until.is_some_and(|deadline| now < deadline) {
                    self.esc_armed_until = None;
                    vec![NavEffect::RequestExit]
                } else {
                    self.esc_armed_until = Some(now + ESC_CONFIRM_WINDOW);
                    vec![NavEffect::Status(EXIT_PROMPT.to_string())]
                }
            }
            // Toolbar-only and app-level actions are no-ops here.
            _ => Vec::new(),
        }
    }

    fn handle_toolbar(&mut self, action: Action, buttons: &[ToolbarButton]) -> Vec<NavEffect> {
        match action {
            Action::CycleNext => {
                self.cycle(buttons, 1);
                Vec::new()
            }
            Action::CyclePrev => {
                self.cycle(buttons, -1);
                Vec::new()
            }
            // Up has no effect in the toolbar.
            Action::Up => Vec::new(),
            Action::Down | Action::Escape => {
                self.return_to_table();
                Vec::new()
            }
            Action::Activate | Action::Select => self.activate(buttons),
            _ => Vec::new(),
        }
    }

    /// Reached only through a confirming keypress, so the caller has
    /// already checked the selection is non-empty.
    fn enter_toolbar(&mut self, buttons: &[ToolbarButton]) -> Vec<NavEffect> {
        let Some(index) = first_enabled(buttons) else {
            return vec![NavEffect::Status(
                "No toolbar actions are available right now.".to_string(),
            )];
        };
        self.focus = FocusDomain::Toolbar;
        self.toolbar_index = Some(index);
        Vec::new()
    }

    /// Toolbar highlight is transient: discarded on exit, first enabled
    /// button re-highlighted on the next entry. The table highlight is
    /// restored untouched.
    fn return_to_table(&mut self) {
        self.focus = FocusDomain::Table;
        self.toolbar_index = None;
    }

    fn cycle(&mut self, buttons: &[ToolbarButton], step: isize) {
        if buttons.iter().all(|button| !button.enabled) {
            self.return_to_table();
            return;
        }
        let len = buttons.len() as isize;
        let mut index = self.toolbar_index.unwrap_or(0) as isize;
        loop {
            index = (index + step).rem_euclid(len);
            if buttons[index as usize].enabled {
                break;
            }
        }
        self.toolbar_index = Some(index as usize);
    }

    fn activate(&mut self, buttons: &[ToolbarButton]) -> Vec<NavEffect> {
        let Some(button) = self.toolbar_index.and_then(|index| buttons.get(index)) else {
            return Vec::new();
        };
        if !button.enabled {
            return Vec::new();
        }
        let rows = self.store.target_rows();
        let action = button.action;
        // Removing the configuration removes the acted-upon rows from
        // existence, so focus falls back to the table.
        if action == ToolbarAction::RemoveConfig {
            self.return_to_table();
        }
        vec![NavEffect::Dispatch { action, rows }]
    }
}

fn first_enabled(buttons: &[ToolbarButton]) -> Option<usize> {
    buttons.iter().position(|button| button.enabled)
}

#[cfg(test)]
mod tests {
    use super::{EXIT_PROMPT, FocusDomain, NavEffect, Navigator, TOOLBAR_PROMPT};
    use crate::input::Action;
    use crate::model::{ToolbarAction, ToolbarButton};
    use std::time::{Duration, Instant};

    fn buttons(enabled: &[bool]) -> Vec<ToolbarButton> {
        let tags = [
            ToolbarAction::Refresh,
            ToolbarAction::Start,
            ToolbarAction::Stop,
            ToolbarAction::Setup,
            ToolbarAction::ShowLogs,
            ToolbarAction::RemoveConfig,
        ];
        enabled
            .iter()
            .zip(tags)
            .map(|(&enabled, action)| ToolbarButton { action, enabled })
            .collect()
    }

    fn nav_with_selection(row: usize, row_count: usize) -> Navigator {
        let mut nav = Navigator::default();
        let now = Instant::now();
        nav.handle(Action::Down, row_count, &[], now);
        while nav.store().highlight() != Some(row) {
            nav.handle(Action::Down, row_count, &[], now);
        }
        nav.handle(Action::Select, row_count, &[], now);
        nav
    }

    #[test]
    fn first_select_arms_confirmation_and_prompts() {
        let mut nav = Navigator::default();
        let now = Instant::now();
        nav.handle(Action::Down, 3, &[], now);
        let effects = nav.handle(Action::Select, 3, &[], now);
        assert!(nav.store().is_selected(0));
        assert!(nav.awaiting_toolbar_confirmation());
        assert_eq!(
            effects,
            vec![NavEffect::TransientStatus(TOOLBAR_PROMPT.to_string())]
        );
        assert_eq!(nav.focus(), FocusDomain::Table);
    }

    #[test]
    fn wrap_around_emits_transient_hint() {
        let mut nav = Navigator::default();
        let now = Instant::now();
        nav.handle(Action::Down, 3, &[], now);
        let effects = nav.handle(Action::Up, 3, &[], now);
        assert_eq!(
            effects,
            vec![NavEffect::TransientStatus(TOOLBAR_PROMPT.to_string())]
        );
    }

    #[test]
    fn second_select_enters_toolbar_on_first_enabled_button() {
        let mut nav = nav_with_selection(0, 3);
        let buttons = buttons(&[false, true, true, false, false, false]);
        nav.handle(Action::Select, 3, &buttons, Instant::now());
        assert_eq!(nav.focus(), FocusDomain::Toolbar);
        assert_eq!(nav.highlighted_button(), Some(1));
        assert!(!nav.awaiting_toolbar_confirmation());
    }

    #[test]
    fn toolbar_entry_refused_with_zero_enabled_buttons() {
        let mut nav = nav_with_selection(0, 3);
        let buttons = buttons(&[false; 6]);
        let effects = nav.handle(Action::Select, 3, &buttons, Instant::now());
        assert_eq!(nav.focus(), FocusDomain::Table);
        assert_eq!(
            effects,
            vec![NavEffect::Status(
                "No toolbar actions are available right now.".to_string()
            )]
        );
    }

    #[test]
    fn moving_highlight_disarms_confirmation() {
        let mut nav = nav_with_selection(0, 3);
        let now = Instant::now();
        nav.handle(Action::Down, 3, &[], now);
        assert!(!nav.awaiting_toolbar_confirmation());
        // Enter now selects again instead of jumping to the toolbar.
        nav.handle(Action::Select, 3, &buttons(&[true; 6]), now);
        assert_eq!(nav.focus(), FocusDomain::Table);
        assert!(nav.store().is_selected(1));
    }

    #[test]
    fn toolbar_cycle_skips_disabled_and_wraps() {
        let mut nav = nav_with_selection(0, 3);
        let buttons = buttons(&[true, false, true, false, false, false]);
        let now = Instant::now();
        nav.handle(Action::Select, 3, &buttons, now);
        assert_eq!(nav.highlighted_button(), Some(0));

        nav.handle(Action::CycleNext, 3, &buttons, now);
        assert_eq!(nav.highlighted_button(), Some(2));

        nav.handle(Action::CycleNext, 3, &buttons, now);
        assert_eq!(nav.highlighted_button(), Some(0));

        nav.handle(Action::CyclePrev, 3, &buttons, now);
        assert_eq!(nav.highlighted_button(), Some(2));
    }

    #[test]
    fn up_is_noop_in_toolbar() {
        let mut nav = nav_with_selection(0, 3);
        let buttons = buttons(&[true; 6]);
        let now = Instant::now();
        nav.handle(Action::Select, 3, &buttons, now);
        nav.handle(Action::Up, 3, &buttons, now);
        assert_eq!(nav.focus(), FocusDomain::Toolbar);
        assert_eq!(nav.highlighted_button(), Some(0));
    }

    #[test]
    fn down_and_escape_return_to_table_keeping_highlight() {
        for leave in [Action::Down, Action::Escape] {
            let mut nav = nav_with_selection(1, 3);
            let buttons = buttons(&[true; 6]);
            let now = Instant::now();
            nav.handle(Action::Select, 3, &buttons, now);
            assert_eq!(nav.focus(), FocusDomain::Toolbar);

            nav.handle(leave, 3, &buttons, now);
            assert_eq!(nav.focus(), FocusDomain::Table);
            assert_eq!(nav.store().highlight(), Some(1));
            assert_eq!(nav.highlighted_button(), None);
            // Selection survives leaving the toolbar.
            assert!(nav.store().is_selected(1));
        }
    }

    #[test]
    fn toolbar_highlight_resets_to_first_enabled_on_reentry() {
        let mut nav = nav_with_selection(0, 3);
        let buttons = buttons(&[true, true, true, false, false, false]);
        let now = Instant::now();
        nav.handle(Action::Select, 3, &buttons, now);
        nav.handle(Action::CycleNext, 3, &buttons, now);
        assert_eq!(nav.highlighted_button(), Some(1));

        nav.handle(Action::Escape, 3, &buttons, now);
        nav.handle(Action::Select, 3, &buttons, now); // arm again
        nav.handle(Action::Select, 3, &buttons, now); // re-enter
        assert_eq!(nav.highlighted_button(), Some(0));
    }

    #[test]
    fn activation_dispatches_selection_in_table_order() {
        let mut nav = nav_with_selection(2, 5);
        let now = Instant::now();
        nav.handle(Action::Up, 5, &[], now);
        nav.handle(Action::Up, 5, &[], now);
        nav.handle(Action::Select, 5, &[], now); // selects row 0, re-arms
        let buttons = buttons(&[true; 6]);
        nav.handle(Action::Select, 5, &buttons, now);
        let effects = nav.handle(Action::Activate, 5, &buttons, now);
        assert_eq!(
            effects,
            vec![NavEffect::Dispatch {
                action: ToolbarAction::Refresh,
                rows: vec![0, 2],
            }]
        );
        // Non-destructive action keeps focus in the toolbar.
        assert_eq!(nav.focus(), FocusDomain::Toolbar);
    }

    #[test]
    fn remove_config_activation_returns_focus_to_table() {
        let mut nav = nav_with_selection(0, 3);
        let buttons = buttons(&[true; 6]);
        let now = Instant::now();
        nav.handle(Action::Select, 3, &buttons, now);
        for _ in 0..5 {
            nav.handle(Action::CycleNext, 3, &buttons, now);
        }
        let effects = nav.handle(Action::Activate, 3, &buttons, now);
        assert_eq!(
            effects,
            vec![NavEffect::Dispatch {
                action: ToolbarAction::RemoveConfig,
                rows: vec![0],
            }]
        );
        assert_eq!(nav.focus(), FocusDomain::Table);
    }

    #[test]
    fn escape_clears_selection_before_arming_exit() {
        let mut nav = nav_with_selection(1, 3);
        let now = Instant::now();
        let effects = nav.handle(Action::Escape, 3, &[], now);
        assert_eq!(
            effects,
            vec![NavEffect::Status("Selection cleared.".to_string())]
        );
        assert!(!nav.store().has_selection());
        assert_eq!(nav.store().highlight(), Some(1));
        assert_eq!(nav.focus(), FocusDomain::Table);
    }

    #[test]
    fn double_escape_requests_exit_within_window() {
        let mut nav = Navigator::default();
        let now = Instant::now();
        let effects = nav.handle(Action::Escape, 3, &[], now);
        assert_eq!(effects, vec![NavEffect::Status(EXIT_PROMPT.to_string())]);
        assert!(nav.exit_confirmation_armed());

        let effects = nav.handle(Action::Escape, 3, &[], now + Duration::from_millis(500));
        assert_eq!(effects, vec![NavEffect::RequestExit]);
    }

    #[test]
    fn expired_escape_rearms_instead_of_exiting() {
        let mut nav = Navigator::default();
        let now = Instant::now();
        nav.handle(Action::Escape, 3, &[], now);

        let late = now + Duration::from_secs(3);
        assert!(nav.handle_deadline(late));
        assert!(!nav.exit_confirmation_armed());

        let effects = nav.handle(Action::Escape, 3, &[], late);
        assert_eq!(effects, vec![NavEffect::Status(EXIT_PROMPT.to_string())]);
    }

    #[test]
    fn any_other_key_disarms_exit_confirmation() {
        let mut nav = Navigator::default();
        let now = Instant::now();
        nav.handle(Action::Escape, 3, &[], now);
        nav.handle(Action::Down, 3, &[], now);
        assert!(!nav.exit_confirmation_armed());
    }

    #[test]
    fn copy_falls_back_to_highlight_when_nothing_selected() {
        let mut nav = Navigator::default();
        let now = Instant::now();
        nav.handle(Action::Down, 4, &[], now);
        nav.handle(Action::Down, 4, &[], now);
        let effects = nav.handle(Action::CopyUuids, 4, &[], now);
        assert_eq!(effects, vec![NavEffect::CopyRows(vec![1])]);
    }

    #[test]
    fn copy_with_selection_uses_ascending_table_order() {
        let mut nav = nav_with_selection(2, 4);
        let now = Instant::now();
        nav.handle(Action::Up, 4, &[], now);
        nav.handle(Action::Up, 4, &[], now);
        nav.handle(Action::Select, 4, &[], now);
        let effects = nav.handle(Action::CopyUuids, 4, &[], now);
        assert_eq!(effects, vec![NavEffect::CopyRows(vec![0, 2])]);
    }

    #[test]
    fn refresh_revalidation_clamps_highlight_and_selection() {
        let mut nav = nav_with_selection(3, 4);
        nav.revalidate(2, &[]);
        assert_eq!(nav.store().highlight(), Some(1));
        assert!(!nav.store().has_selection());
        assert!(!nav.awaiting_toolbar_confirmation());
    }

    #[test]
    fn toolbar_falls_back_to_table_when_all_buttons_disable() {
        let mut nav = nav_with_selection(0, 3);
        let enabled = buttons(&[true; 6]);
        let now = Instant::now();
        nav.handle(Action::Select, 3, &enabled, now);
        assert_eq!(nav.focus(), FocusDomain::Toolbar);

        nav.revalidate(3, &buttons(&[false; 6]));
        assert_eq!(nav.focus(), FocusDomain::Table);
    }

    #[test]
    fn empty_table_select_and_move_are_noops() {
        let mut nav = Navigator::default();
        let now = Instant::now();
        assert!(nav.handle(Action::Down, 0, &[], now).is_empty());
        assert!(nav.handle(Action::Select, 0, &[], now).is_empty());
        assert_eq!(nav.store().highlight(), None);
    }
}
