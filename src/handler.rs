use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::nav::state::{Action, Effect};

/// What a key press asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quit,
    Navigate(Action),
}

/// Map a key to a command. `search` is the live query while the search
/// bar has focus.
pub fn map_key(key: KeyEvent, search: Option<&str>) -> Option<Command> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Command::Quit);
    }
    if let Some(query) = search {
        return map_search_key(key, query).map(Command::Navigate);
    }
    let action = match key.code {
        KeyCode::Char('q') => return Some(Command::Quit),
        KeyCode::Char('j') | KeyCode::Down => Action::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => Action::MoveUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::PageDown,
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::PageUp,
        KeyCode::Char('g') | KeyCode::Home => Action::JumpFirst,
        KeyCode::Char('G') | KeyCode::End => Action::JumpLast,
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => Action::Enter,
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => Action::Back,
        KeyCode::Char('/') => Action::StartSearch,
        KeyCode::Char('f') => Action::ToggleFilterFlag,
        KeyCode::Char('a') => Action::ShowAllApps,
        KeyCode::Char('b') => Action::BootDevice,
        KeyCode::Char('r') => Action::Refresh,
        _ => return None,
    };
    Some(Command::Navigate(action))
}

fn map_search_key(key: KeyEvent, query: &str) -> Option<Action> {
    let action = match key.code {
        KeyCode::Esc => Action::CancelSearch,
        KeyCode::Enter => Action::Enter,
        KeyCode::Down => Action::MoveDown,
        KeyCode::Up => Action::MoveUp,
        KeyCode::Backspace => {
            let mut query = query.to_string();
            query.pop();
            Action::UpdateSearchQuery(query)
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let mut query = query.to_string();
            query.push(c);
            Action::UpdateSearchQuery(query)
        }
        _ => return None,
    };
    Some(action)
}

/// Handle a key event. Returns the collaborator calls to run.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Vec<Effect> {
    let search = app
        .navigator
        .search_active()
        .then(|| app.navigator.filter().query.clone());
    match map_key(key, search.as_deref()) {
        Some(Command::Quit) => {
            app.quit();
            Vec::new()
        }
        Some(Command::Navigate(action)) => app.dispatch(action),
        None => Vec::new(),
    }
}
