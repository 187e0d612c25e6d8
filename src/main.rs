use std::io;
use std::io::IsTerminal;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use shellbridge::app::{App, ScreenContexts};
use shellbridge::cli::Cli;
use shellbridge::config::{Config, FixedProvider, HttpConfigProvider, WorkingDirectoryProvider};
use shellbridge::event_loop::run_app;
use shellbridge::logging;
use shellbridge::session::SessionHost;
use shellbridge::surface::VtSurface;
use shellbridge::transport::WsSocket;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    cli.apply(&mut config);

    let log_path = match &cli.log_file {
        Some(path) => path.clone(),
        None => logging::default_log_path()?,
    };
    logging::init_global(&log_path)?;
    info!(server = %config.server.host, "starting shellbridge");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let handle = runtime.handle().clone();

    let endpoint = config.endpoint();
    let provider: Box<dyn WorkingDirectoryProvider> = match &cli.working_dir {
        Some(dir) => Box::new(FixedProvider(dir.clone())),
        None => Box::new(HttpConfigProvider::new(
            &endpoint,
            &config.server.config_path,
            &config.server.working_directory_key,
            &config.server.default_working_directory,
        )),
    };
    let scrollback = config.terminal.scrollback_lines;
    let host = SessionHost::new(
        config.bridge_options(),
        provider,
        Box::new(ScreenContexts),
        Box::new(move || VtSurface::new(scrollback)),
        Box::new(move || WsSocket::new(handle.clone())),
    )
    .with_instructions(config.dialog.show_instructions);

    // Check if we're in a proper terminal
    if !std::io::stdin().is_terminal() {
        anyhow::bail!("shellbridge must be run in an interactive terminal");
    }

    enable_raw_mode().context("Failed to enable raw mode - are you in a terminal?")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )
    .context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = App::new(config, host);
    let size = terminal.size().context("Failed to get terminal size")?;
    app.resize(size.width, size.height);
    if cli.open {
        app.open_terminal();
    }

    let result = run_app(&mut terminal, &mut app);

    // Close any session while the runtime is still up
    drop(app);

    // Restore terminal (always try to restore even on error)
    let _ = disable_raw_mode();
    let _ = execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    );
    let _ = terminal.show_cursor();

    info!("shellbridge exiting");
    result
}
