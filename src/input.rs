use crate::nav::FocusDomain;
use anyhow::{Result, anyhow};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Select,
    RangeSelect,
    SelectAll,
    CopyUuids,
    Escape,
    CycleNext,
    CyclePrev,
    Activate,
    ToggleHelp,
}

/// Table-domain key bindings, keyed by normalized hotkey signature.
/// Movement, Esc and toolbar keys are fixed; the selection-flavored
/// bindings are configurable because the right chord is a matter of
/// taste (and terminal) more than of design.
#[derive(Debug, Clone)]
pub struct Bindings {
    map: HashMap<String, Action>,
}

impl Default for Bindings {
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert("enter".to_string(), Action::Select);
        map.insert("space".to_string(), Action::Select);
        map.insert("shift+enter".to_string(), Action::RangeSelect);
        map.insert("shift+space".to_string(), Action::RangeSelect);
        map.insert("ctrl+a".to_string(), Action::SelectAll);
        map.insert("ctrl+c".to_string(), Action::CopyUuids);
        Self { map }
    }
}

impl Bindings {
    /// Applies `action name -> hotkey spec` overrides from the runtime
    /// config. An override rebinds the action exclusively: its default
    /// chords are dropped.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Result<()> {
        for (name, spec) in overrides {
            let action = match name.as_str() {
                "select" => Action::Select,
                "range_select" => Action::RangeSelect,
                "select_all" => Action::SelectAll,
                "copy" => Action::CopyUuids,
                other => return Err(anyhow!("unknown binding '{other}'")),
            };
            let signature = normalize_hotkey_spec(spec)
                .ok_or_else(|| anyhow!("invalid hotkey spec '{spec}' for binding '{name}'"))?;
            self.map.retain(|_, bound| *bound != action);
            self.map.insert(signature, action);
        }
        Ok(())
    }

    fn lookup(&self, key: KeyEvent) -> Option<Action> {
        let signature = key_event_signature(key)?;
        self.map.get(&signature).copied()
    }
}

pub fn map_key(domain: FocusDomain, bindings: &Bindings, key: KeyEvent) -> Option<Action> {
    match domain {
        FocusDomain::Table => map_table_key(bindings, key),
        FocusDomain::Toolbar => map_toolbar_key(key),
    }
}

fn map_table_key(bindings: &Bindings, key: KeyEvent) -> Option<Action> {
    if let Some(action) = bindings.lookup(key) {
        return Some(action);
    }
    match key.code {
        KeyCode::Up => Some(Action::Up),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Esc => Some(Action::Escape),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::F(1) => Some(Action::ToggleHelp),
        // Tab is reserved for toolbar cycling; Left/Right are swallowed
        // so the table never scrolls sideways into a selection change.
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => None,
        _ => None,
    }
}

fn map_toolbar_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Right | KeyCode::Tab => Some(Action::CycleNext),
        KeyCode::Left | KeyCode::BackTab => Some(Action::CyclePrev),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Esc => Some(Action::Escape),
        KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Activate),
        _ => None,
    }
}

pub fn key_event_signature(key: KeyEvent) -> Option<String> {
    let key_name = match key.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_ascii_lowercase().to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::BackTab => "backtab".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Insert => "insert".to_string(),
        KeyCode::F(n) => format!("f{n}"),
        _ => return None,
    };

    let mut parts = Vec::new();
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        parts.push("ctrl".to_string());
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        parts.push("alt".to_string());
    }
    if key.modifiers.contains(KeyModifiers::SHIFT) {
        parts.push("shift".to_string());
    }
    parts.push(key_name);
    Some(parts.join("+"))
}

pub fn normalize_hotkey_spec(spec: &str) -> Option<String> {
    let mut ctrl = false;
    let mut alt = false;
    let mut shift = false;
    let mut key: Option<String> = None;

    for token in spec
        .split('+')
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
    {
        match token.as_str() {
            "ctrl" | "control" => ctrl = true,
            "alt" => alt = true,
            "shift" => shift = true,
            _ => {
                key = normalize_hotkey_key_token(&token);
            }
        }
    }

    let key = key?;
    let mut parts = Vec::new();
    if ctrl {
        parts.push("ctrl".to_string());
    }
    if alt {
        parts.push("alt".to_string());
    }
    if shift {
        parts.push("shift".to_string());
    }
    parts.push(key);
    Some(parts.join("+"))
}

fn normalize_hotkey_key_token(token: &str) -> Option<String> {
    match token {
        "esc" | "escape" => Some("esc".to_string()),
        "return" => Some("enter".to_string()),
        "del" => Some("delete".to_string()),
        "ins" => Some("insert".to_string()),
        "space" | "tab" | "backtab" | "enter" | "delete" | "insert" | "left" | "right" | "up"
        | "down" | "home" | "end" => Some(token.to_string()),
        _ if token.len() == 1 => Some(token.to_string()),
        _ if token.starts_with('f') => {
            let number = token.trim_start_matches('f').parse::<u8>().ok()?;
            if (1..=24).contains(&number) {
                Some(format!("f{number}"))
            } else {
                None
            }
        }
        _ => None,
    }
}
