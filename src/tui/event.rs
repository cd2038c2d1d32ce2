//! Keyboard event handling for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus};

/// Dispatches a key event to the appropriate handler based on focus.
///
/// Ctrl+C quits from anywhere; everything else depends on which panel is
/// focused, since the two input bars consume plain character keys.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit();
        return;
    }

    match key.code {
        KeyCode::Tab => {
            app.next_focus();
            return;
        }
        KeyCode::BackTab => {
            app.prev_focus();
            return;
        }
        KeyCode::Esc => {
            app.reset_focus();
            return;
        }
        _ => {}
    }

    match app.focus() {
        Focus::QueryInput | Focus::AskInput => handle_input_key(app, key),
        Focus::History => handle_history_key(app, key),
        Focus::Detail => handle_detail_key(app, key),
    }
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => match app.focus() {
            Focus::QueryInput => app.submit_query(),
            Focus::AskInput => app.submit_ask(),
            _ => {}
        },
        KeyCode::Backspace => app.pop_input_char(),
        KeyCode::Char(c) => app.push_input_char(c),
        _ => {}
    }
}

fn handle_history_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        _ => {}
    }
}

fn handle_detail_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_detail_down(1),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_detail_up(1),
        KeyCode::PageDown => app.scroll_detail_down(10),
        KeyCode::PageUp => app.scroll_detail_up(10),
        _ => {}
    }
}
