use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{poll, read, Event};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};

use crate::app::App;
use crate::handlers::{handle_key_event, handle_mouse_event, handle_paste};
use crate::surface::ContextKind;
use crate::ui::{Launcher, TerminalDialog, ToastWidget};

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Layout before polling so a pending attach finds its area
        app.sync_layout();

        // Drain session events and expire toasts
        app.tick();

        terminal.draw(|f| draw_ui(f, app))?;

        // Handle events with timeout for socket updates
        if poll(Duration::from_millis(50))? {
            match read()? {
                Event::Key(key) => handle_key_event(app, key),
                Event::Mouse(mouse) => handle_mouse_event(app, mouse),
                Event::Paste(text) => handle_paste(app, &text),
                Event::Resize(w, h) => app.resize(w, h),
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn draw_ui(f: &mut Frame, app: &App) {
    let area = f.area();
    let context = app.host.context();

    // A detached window covers the launcher entirely
    if context != Some(ContextKind::Window) {
        f.render_widget(
            Launcher::new(&app.config.server.host)
                .last_status(app.last_session_status.as_deref()),
            area,
        );
    }

    if let Some(layout) = app.session_layout() {
        let status = app.host.status();
        let screen = app
            .host
            .bridge()
            .filter(|b| b.is_attached())
            .map(|b| b.surface().screen_state());
        f.render_widget(
            TerminalDialog::new(&status, screen.as_ref(), &layout)
                .command_mode(app.input_mode.is_command()),
            area,
        );
    }

    let toasts = app.toast_manager.visible_toasts();
    ToastWidget::new(&toasts).render(f, area);
}
