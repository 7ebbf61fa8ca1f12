//! Key and mouse bindings per view.
//!
//! `map_key` is the only place raw input becomes an [`Action`]; the match
//! over [`ViewMode`] is exhaustive so a new view cannot go unbound.

use super::events::Action;
use crate::backend::Polarity;
use crate::interactive::constants::{PAGE_SIZE, WHEEL_STEP};
use crate::interactive::domain::models::ViewMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

pub fn map_key(mode: ViewMode, key: KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }

    match mode {
        ViewMode::EntryList => list_key(key).or_else(|| screen_key(key)),
        ViewMode::TransactionNames | ViewMode::MetricsDashboard | ViewMode::MetricDetail => {
            list_key(key).or_else(|| screen_key(key))
        }
        ViewMode::Detail | ViewMode::DetailRaw => detail_key(key),
        ViewMode::SearchInput => input_key(key),
        ViewMode::Chat => chat_key(key),
        ViewMode::Credentials => match key.code {
            KeyCode::Tab | KeyCode::BackTab => Some(Action::SwitchCredentialField),
            _ => input_key(key),
        },
        ViewMode::IndexPicker | ViewMode::FieldPicker => {
            list_key(key).or_else(|| picker_key(key))
        }
        ViewMode::PerspectiveList => list_key(key).or_else(|| perspective_key(key)),
        ViewMode::QueryOverlay
        | ViewMode::ErrorModal
        | ViewMode::Help
        | ViewMode::CollectorConfig(_) => modal_key(key),
        ViewMode::QuitConfirm => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(Action::ConfirmQuit),
            _ => Some(Action::Back),
        },
    }
}

pub fn map_mouse(mode: ViewMode, mouse: MouseEvent) -> Option<Action> {
    let step = match mouse.kind {
        MouseEventKind::ScrollUp => -WHEEL_STEP,
        MouseEventKind::ScrollDown => WHEEL_STEP,
        _ => return None,
    };
    match mode {
        ViewMode::EntryList
        | ViewMode::TransactionNames
        | ViewMode::MetricsDashboard
        | ViewMode::MetricDetail
        | ViewMode::IndexPicker
        | ViewMode::FieldPicker
        | ViewMode::PerspectiveList => Some(Action::MoveSelection(step)),
        ViewMode::Detail
        | ViewMode::DetailRaw
        | ViewMode::QueryOverlay
        | ViewMode::ErrorModal
        | ViewMode::Help
        | ViewMode::Chat
        | ViewMode::CollectorConfig(_) => Some(Action::ScrollContent(step)),
        ViewMode::SearchInput | ViewMode::Credentials | ViewMode::QuitConfirm => None,
    }
}

fn list_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(Action::MoveSelection(-1)),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::MoveSelection(1)),
        KeyCode::PageUp => Some(Action::MoveSelection(-PAGE_SIZE)),
        KeyCode::PageDown => Some(Action::MoveSelection(PAGE_SIZE)),
        KeyCode::Home | KeyCode::Char('g') => Some(Action::SelectFirst),
        KeyCode::End | KeyCode::Char('G') => Some(Action::SelectLast),
        KeyCode::Enter => Some(Action::Activate),
        _ => None,
    }
}

/// Keys shared by the full-screen views.
fn screen_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::Back),
        KeyCode::Char('/') => Some(Action::OpenSearch),
        KeyCode::Char('l') => Some(Action::CycleLevel),
        KeyCode::Char('t') => Some(Action::CycleLookback),
        KeyCode::Char('s') => Some(Action::ToggleSort),
        KeyCode::Char('a') => Some(Action::ToggleAutoRefresh),
        KeyCode::Char('r') => Some(Action::Refresh),
        KeyCode::Tab => Some(Action::NextSignal),
        KeyCode::Char('i') => Some(Action::OpenIndexPicker),
        KeyCode::Char('f') => Some(Action::OpenFieldPicker),
        KeyCode::Char('Q') => Some(Action::OpenQueryOverlay),
        KeyCode::Char('p') => Some(Action::OpenPerspectives),
        KeyCode::Char('K') => Some(Action::OpenCredentials),
        KeyCode::Char('O') => Some(Action::OpenCollectorConfig),
        KeyCode::Char('c') => Some(Action::OpenChat),
        KeyCode::Char('x') => Some(Action::ClearFieldFilters),
        KeyCode::Char('y') => Some(Action::CopySelection),
        KeyCode::Char('o') => Some(Action::OpenInBrowser),
        KeyCode::Char('?') => Some(Action::ShowHelp),
        KeyCode::Char('q') => Some(Action::AskQuit),
        _ => None,
    }
}

fn detail_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(Action::ScrollContent(-1)),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::ScrollContent(1)),
        KeyCode::PageUp => Some(Action::ScrollContent(-PAGE_SIZE)),
        KeyCode::PageDown => Some(Action::ScrollContent(PAGE_SIZE)),
        KeyCode::Char('n') => Some(Action::MoveSelection(1)),
        KeyCode::Char('N') => Some(Action::MoveSelection(-1)),
        KeyCode::Char('v') => Some(Action::ToggleRaw),
        KeyCode::Char('y') => Some(Action::CopySelection),
        KeyCode::Char('o') => Some(Action::OpenInBrowser),
        KeyCode::Char('?') => Some(Action::ShowHelp),
        KeyCode::Char('q') => Some(Action::AskQuit),
        KeyCode::Esc | KeyCode::Backspace => Some(Action::Back),
        _ => None,
    }
}

fn input_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Esc => Some(Action::Back),
        _ => Some(Action::EditInput(key)),
    }
}

fn chat_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::PageUp => Some(Action::ScrollContent(-PAGE_SIZE)),
        KeyCode::PageDown => Some(Action::ScrollContent(PAGE_SIZE)),
        _ => input_key(key),
    }
}

fn picker_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char(' ') => Some(Action::Activate),
        KeyCode::Esc | KeyCode::Char('q') => Some(Action::Back),
        _ => None,
    }
}

fn perspective_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::ApplyPerspective(Polarity::Include)),
        KeyCode::Char('-') | KeyCode::Char('x') => Some(Action::ApplyPerspective(Polarity::Exclude)),
        KeyCode::Tab => Some(Action::TogglePerspectiveKind),
        KeyCode::Esc | KeyCode::Char('q') => Some(Action::Back),
        _ => None,
    }
}

fn modal_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(Action::ScrollContent(-1)),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::ScrollContent(1)),
        KeyCode::PageUp => Some(Action::ScrollContent(-PAGE_SIZE)),
        KeyCode::PageDown => Some(Action::ScrollContent(PAGE_SIZE)),
        KeyCode::Char('y') => Some(Action::CopySelection),
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?') => {
            Some(Action::Back)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_ctrl_c_quits_everywhere() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for mode in ViewMode::ALL {
            assert_eq!(map_key(mode, ctrl_c), Some(Action::Quit), "{mode:?}");
        }
    }

    #[test]
    fn test_text_modes_capture_letters() {
        for mode in [ViewMode::SearchInput, ViewMode::Chat, ViewMode::Credentials] {
            let q = key(KeyCode::Char('q'));
            assert_eq!(map_key(mode, q), Some(Action::EditInput(q)), "{mode:?}");
        }
    }

    #[test]
    fn test_escape_goes_back_from_nested_views() {
        for mode in ViewMode::ALL {
            if mode == ViewMode::QuitConfirm {
                continue;
            }
            assert_eq!(map_key(mode, key(KeyCode::Esc)), Some(Action::Back), "{mode:?}");
        }
    }

    #[test]
    fn test_list_navigation() {
        assert_eq!(
            map_key(ViewMode::EntryList, key(KeyCode::Char('j'))),
            Some(Action::MoveSelection(1))
        );
        assert_eq!(
            map_key(ViewMode::TransactionNames, key(KeyCode::PageUp)),
            Some(Action::MoveSelection(-PAGE_SIZE))
        );
        assert_eq!(
            map_key(ViewMode::MetricsDashboard, key(KeyCode::Char('G'))),
            Some(Action::SelectLast)
        );
    }

    #[test]
    fn test_detail_keys() {
        assert_eq!(
            map_key(ViewMode::Detail, key(KeyCode::Char('v'))),
            Some(Action::ToggleRaw)
        );
        assert_eq!(
            map_key(ViewMode::DetailRaw, key(KeyCode::Char('n'))),
            Some(Action::MoveSelection(1))
        );
        assert_eq!(
            map_key(ViewMode::Detail, key(KeyCode::Down)),
            Some(Action::ScrollContent(1))
        );
    }

    #[test]
    fn test_quit_confirm() {
        assert_eq!(
            map_key(ViewMode::QuitConfirm, key(KeyCode::Char('y'))),
            Some(Action::ConfirmQuit)
        );
        assert_eq!(
            map_key(ViewMode::QuitConfirm, key(KeyCode::Char('n'))),
            Some(Action::Back)
        );
        assert_eq!(
            map_key(ViewMode::EntryList, key(KeyCode::Char('q'))),
            Some(Action::AskQuit)
        );
    }

    #[test]
    fn test_perspective_polarity_keys() {
        assert_eq!(
            map_key(ViewMode::PerspectiveList, key(KeyCode::Char('-'))),
            Some(Action::ApplyPerspective(Polarity::Exclude))
        );
        assert_eq!(
            map_key(ViewMode::PerspectiveList, key(KeyCode::Enter)),
            Some(Action::Activate)
        );
    }

    #[test]
    fn test_mouse_wheel() {
        let wheel = |kind| MouseEvent {
            kind,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(
            map_mouse(ViewMode::EntryList, wheel(MouseEventKind::ScrollDown)),
            Some(Action::MoveSelection(WHEEL_STEP))
        );
        assert_eq!(
            map_mouse(ViewMode::ErrorModal, wheel(MouseEventKind::ScrollUp)),
            Some(Action::ScrollContent(-WHEEL_STEP))
        );
        assert_eq!(map_mouse(ViewMode::SearchInput, wheel(MouseEventKind::ScrollUp)), None);
        assert_eq!(map_mouse(ViewMode::EntryList, wheel(MouseEventKind::Moved)), None);
    }

    #[test]
    fn test_release_events_are_still_mapped_by_code() {
        let mut release = key(KeyCode::Char('j'));
        release.kind = KeyEventKind::Release;
        // Filtering by kind happens in the input reader.
        assert_eq!(map_key(ViewMode::EntryList, release), Some(Action::MoveSelection(1)));
    }
}
