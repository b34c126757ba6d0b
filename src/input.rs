//! Key bindings: arrows (plus vim hjkl) for the piece, letters for the buttons.

use crate::game::Move;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(Move),
    /// Pause / Resume button.
    TogglePause,
    /// New Game button.
    NewGame,
    /// Start Audio button (only while playback is blocked).
    StartAudio,
    Quit,
    None,
}

/// Map key event to game action. Releases and OS repeats map to `None`.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = key;
    if kind != KeyEventKind::Press {
        return Action::None;
    }
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Left | KeyCode::Char('h') => Action::Move(Move::Left),
        KeyCode::Right | KeyCode::Char('l') => Action::Move(Move::Right),
        KeyCode::Down | KeyCode::Char('j') => Action::Move(Move::Down),
        KeyCode::Up | KeyCode::Char('k') => Action::Move(Move::Rotate),
        KeyCode::Char('p' | 'P' | ' ') => Action::TogglePause,
        KeyCode::Char('n' | 'N') => Action::NewGame,
        KeyCode::Char('a' | 'A') => Action::StartAudio,
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_move_piece() {
        assert_eq!(key_to_action(press(KeyCode::Left)), Action::Move(Move::Left));
        assert_eq!(key_to_action(press(KeyCode::Right)), Action::Move(Move::Right));
        assert_eq!(key_to_action(press(KeyCode::Down)), Action::Move(Move::Down));
        assert_eq!(key_to_action(press(KeyCode::Up)), Action::Move(Move::Rotate));
        assert_eq!(key_to_action(press(KeyCode::Char('k'))), Action::Move(Move::Rotate));
    }

    #[test]
    fn buttons() {
        assert_eq!(key_to_action(press(KeyCode::Char('p'))), Action::TogglePause);
        assert_eq!(key_to_action(press(KeyCode::Char(' '))), Action::TogglePause);
        assert_eq!(key_to_action(press(KeyCode::Char('n'))), Action::NewGame);
        assert_eq!(key_to_action(press(KeyCode::Char('a'))), Action::StartAudio);
        assert_eq!(key_to_action(press(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
    }

    #[test]
    fn other_keys_ignored() {
        assert_eq!(key_to_action(press(KeyCode::Char('z'))), Action::None);
        assert_eq!(key_to_action(press(KeyCode::Enter)), Action::None);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Left, KeyModifiers::ALT)),
            Action::None
        );
    }

    #[test]
    fn release_ignored() {
        let mut ev = press(KeyCode::Left);
        ev.kind = KeyEventKind::Release;
        assert_eq!(key_to_action(ev), Action::None);
    }
}
