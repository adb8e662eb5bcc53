use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::dashboard::Focus;
use crate::viewport::Motion;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    AdvanceFocus,
    ToggleLeftPane,
    PrevTab,
    NextTab,
    /// Move the selection (entry list) or the scroll position (detail pane)
    /// of whichever pane the focus routes to.
    Navigate(Motion),
    Deselect,
    Copy,
}

/// Map a key press to a command. Left/Right switch tabs only while the tab
/// bar has focus; vertical motion keys always reach a pane.
pub fn command_for(key: &KeyEvent, focus: Focus) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let command = match key.code {
        KeyCode::Char('c') if ctrl => Command::Quit,
        KeyCode::Char('u') if ctrl => Command::Navigate(Motion::HalfPageUp),
        KeyCode::Char('d') if ctrl => Command::Navigate(Motion::HalfPageDown),
        _ if ctrl => return None,
        KeyCode::Char('q') => Command::Quit,
        KeyCode::Tab => Command::AdvanceFocus,
        KeyCode::Char('l') => Command::ToggleLeftPane,
        KeyCode::Esc => Command::Deselect,
        KeyCode::Char('y') | KeyCode::Char('c') => Command::Copy,
        KeyCode::Left if focus == Focus::Tabs => Command::PrevTab,
        KeyCode::Right if focus == Focus::Tabs => Command::NextTab,
        KeyCode::Up | KeyCode::Char('k') => Command::Navigate(Motion::Up),
        KeyCode::Down | KeyCode::Char('j') => Command::Navigate(Motion::Down),
        KeyCode::PageUp => Command::Navigate(Motion::PageUp),
        KeyCode::PageDown => Command::Navigate(Motion::PageDown),
        KeyCode::Home | KeyCode::Char('g') => Command::Navigate(Motion::Top),
        KeyCode::End | KeyCode::Char('G') => Command::Navigate(Motion::Bottom),
        _ => return None,
    };
    Some(command)
}

/// Human readable name of a key, shown in the status line.
pub fn describe_key(key: &KeyEvent) -> String {
    let name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(ch) => ch.to_string(),
        KeyCode::F(n) => format!("F{n}"),
        KeyCode::BackTab => "Shift-Tab".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        other => format!("{other:?}"),
    };
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        format!("Ctrl-{name}")
    } else {
        name
    }
}

pub const HINTS: &str = "q quit · Tab focus · ←/→ tabs · ↑/↓ j/k move · PgUp/PgDn · ^u/^d half page · g/G top/bottom · Esc deselect · l list · y copy";
