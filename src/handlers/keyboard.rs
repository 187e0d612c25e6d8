use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::App;
use crate::input::InputMode;
use crate::transport::Socket;

/// Ctrl+\ (reported as Ctrl+4 by some terminals) toggles command mode.
pub(crate) fn is_command_toggle(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('\\' | '4'))
}

pub fn handle_key_event<S: Socket>(app: &mut App<S>, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }

    if !app.host.is_open() {
        handle_launcher_key(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Terminal => {
            if is_command_toggle(key) {
                app.enter_command_mode();
            } else if let Some(bridge) = app.host.bridge_mut() {
                bridge.surface_mut().key(key);
            }
        }
        InputMode::Command => handle_command_key(app, key),
    }
}

fn handle_launcher_key<S: Socket>(app: &mut App<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('t' | 'o') => app.open_terminal(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        _ => {}
    }
}

fn handle_command_key<S: Socket>(app: &mut App<S>, key: KeyEvent) {
    // A second toggle sends the key itself to the shell
    if is_command_toggle(key) {
        app.enter_terminal_mode();
        if let Some(bridge) = app.host.bridge_mut() {
            bridge.surface_mut().key(key);
        }
        return;
    }

    match key.code {
        KeyCode::Char('p') => app.pop_out(),
        KeyCode::Char('r') => {
            app.reconnect();
            app.enter_terminal_mode();
        }
        KeyCode::Char('y') => {
            app.copy_screen();
            app.enter_terminal_mode();
        }
        KeyCode::Char('?') => app.toggle_instructions(),
        KeyCode::Char('q' | 'x') => app.close_terminal(),
        KeyCode::Char('Q') => app.should_quit = true,
        KeyCode::Char('i') | KeyCode::Enter | KeyCode::Esc => app.enter_terminal_mode(),
        KeyCode::PageUp => app.scroll_up(app.page_lines()),
        KeyCode::PageDown => app.scroll_down(app.page_lines()),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),
        _ => {}
    }
}

/// Bracketed paste goes to the shell as one chunk.
pub fn handle_paste<S: Socket>(app: &mut App<S>, text: &str) {
    if app.input_mode != InputMode::Terminal {
        return;
    }
    if let Some(bridge) = app.host.bridge_mut() {
        bridge.surface_mut().paste(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{settle, test_app};
    use crate::session::SocketEvent;
    use crate::surface::ContextKind;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn launcher_keys_open_and_quit() {
        let (mut app, _sockets) = test_app();
        handle_key_event(&mut app, press(KeyCode::Enter));
        assert!(app.host.is_open());

        let (mut app, _sockets) = test_app();
        handle_key_event(&mut app, press(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn typed_keys_reach_the_socket_in_order() {
        let (mut app, sockets) = test_app();
        app.open_terminal();
        settle(&mut app);
        sockets.borrow()[0].deliver(SocketEvent::Opened);
        app.tick();

        for code in [KeyCode::Char('l'), KeyCode::Char('s'), KeyCode::Enter] {
            handle_key_event(&mut app, press(code));
        }
        handle_paste(&mut app, "echo hi");
        app.tick();

        assert_eq!(
            sockets.borrow()[0].sent(),
            vec![
                r#"{"input":"l"}"#.to_string(),
                r#"{"input":"s"}"#.to_string(),
                r#"{"input":"\r"}"#.to_string(),
                r#"{"input":"echo hi"}"#.to_string(),
            ]
        );
    }

    #[test]
    fn command_mode_swallows_keys_and_runs_actions() {
        let (mut app, sockets) = test_app();
        app.open_terminal();
        settle(&mut app);
        sockets.borrow()[0].deliver(SocketEvent::Opened);
        app.tick();

        handle_key_event(&mut app, ctrl('\\'));
        assert_eq!(app.input_mode, InputMode::Command);
        handle_key_event(&mut app, press(KeyCode::Char('?')));
        app.tick();
        assert!(sockets.borrow()[0].sent().is_empty());
        assert!(app.host.show_instructions());

        handle_key_event(&mut app, press(KeyCode::Char('p')));
        assert_eq!(app.host.context(), Some(ContextKind::Window));
        assert_eq!(app.input_mode, InputMode::Terminal);
    }

    #[test]
    fn double_toggle_sends_the_control_key() {
        let (mut app, sockets) = test_app();
        app.open_terminal();
        settle(&mut app);
        sockets.borrow()[0].deliver(SocketEvent::Opened);
        app.tick();

        handle_key_event(&mut app, ctrl('\\'));
        handle_key_event(&mut app, ctrl('\\'));
        app.tick();
        assert_eq!(app.input_mode, InputMode::Terminal);
        assert_eq!(
            sockets.borrow()[0].sent(),
            vec![r#"{"input":"\u001c"}"#.to_string()]
        );
    }

    #[test]
    fn close_from_command_mode_returns_to_launcher() {
        let (mut app, _sockets) = test_app();
        app.open_terminal();
        handle_key_event(&mut app, ctrl('4'));
        handle_key_event(&mut app, press(KeyCode::Char('q')));
        assert!(!app.host.is_open());
        assert!(!app.should_quit);
    }
}
