mod app;
mod cli;
mod config;
mod daemon;
mod input;
mod model;
mod nav;
mod selection;
mod ui;

use anyhow::{Context, Result};
use app::{App, AppCommand, COPY_CONFIRMATION};
use clap::Parser;
use cli::CliArgs;
use config::RuntimeConfigWatcher;
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use daemon::{CtlGateway, DEFAULT_CTL};
use futures::StreamExt;
use model::ToolbarAction;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::time::Instant;
use tokio::time::{Duration, MissedTickBehavior, interval, sleep_until};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter)?;

    let mut watcher = match &args.config {
        Some(path) => RuntimeConfigWatcher::at(path.clone()),
        None => RuntimeConfigWatcher::discover(),
    };
    let snapshot = watcher.load_current().unwrap_or_else(|error| {
        warn!("runtime config ignored: {error:#}");
        config::RuntimeConfigSnapshot::default()
    });

    let ctl = args
        .ctl
        .clone()
        .or(snapshot.ctl.clone())
        .unwrap_or_else(|| DEFAULT_CTL.to_string());
    let mut gateway = CtlGateway::new(ctl);
    let mut app = App::new(snapshot.bindings);

    run(&mut app, &mut gateway, &mut watcher, &args).await
}

fn init_tracing(level_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::sink)
        .try_init();

    Ok(())
}

async fn run(
    app: &mut App,
    gateway: &mut CtlGateway,
    watcher: &mut RuntimeConfigWatcher,
    args: &CliArgs,
) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, gateway, watcher, args).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    // Enhancement flags disambiguate Shift+Enter and Shift+Space, which
    // the range-select binding depends on where the terminal supports it.
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    gateway: &mut CtlGateway,
    watcher: &mut RuntimeConfigWatcher,
    args: &CliArgs,
) -> Result<()> {
    refresh_filesystems(app, gateway).await;

    let mut reader = EventStream::new();
    let mut ticker = interval(Duration::from_millis(args.refresh_ms.max(500)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        let deadline = app.next_deadline();
        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.focus_domain(), app.bindings(), key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action, Instant::now());
                            execute_app_command(app, gateway, command).await;
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => {}
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        app.set_status(format!("terminal event error: {error}"));
                    }
                    None => {
                        app.set_status("terminal event stream closed");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                reload_runtime_config(app, gateway, watcher, args);
                refresh_filesystems(app, gateway).await;
            }
            // Wakes exactly when the double-Esc confirmation window expires.
            _ = sleep_until(tokio::time::Instant::from_std(
                deadline.unwrap_or_else(Instant::now)
            )), if deadline.is_some() => {
                app.handle_deadline(Instant::now());
            }
        }
    }

    Ok(())
}

async fn execute_app_command(app: &mut App, gateway: &mut CtlGateway, command: AppCommand) {
    match command {
        AppCommand::None => {}
        AppCommand::Refresh => {
            refresh_filesystems(app, gateway).await;
            app.set_status("Filesystem list refreshed.");
        }
        AppCommand::CopyToClipboard(text) => {
            match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
                Ok(()) => app.set_status(COPY_CONFIRMATION),
                Err(error) => app.set_status(format!("Clipboard copy failed: {error}")),
            }
        }
        AppCommand::Daemon { action, uuids } => {
            execute_daemon_action(app, gateway, action, uuids).await;
        }
    }
}

async fn execute_daemon_action(
    app: &mut App,
    gateway: &mut CtlGateway,
    action: ToolbarAction,
    uuids: Vec<String>,
) {
    if action == ToolbarAction::ShowLogs {
        let Some(uuid) = uuids.first() else {
            return;
        };
        match gateway.logs(uuid).await {
            Ok(content) => app.set_logs_overlay(format!("Logs {uuid}"), content),
            Err(error) => app.set_status(format!("Loading logs failed: {}", compact_error(&error))),
        }
        return;
    }

    let count = uuids.len();
    let result = match action {
        ToolbarAction::Start => gateway.start(&uuids).await,
        ToolbarAction::Stop => gateway.stop(&uuids).await,
        ToolbarAction::Setup => gateway.setup(&uuids).await,
        ToolbarAction::RemoveConfig => gateway.remove_config(&uuids).await,
        ToolbarAction::Refresh | ToolbarAction::ShowLogs => Ok(String::new()),
    };

    match result {
        Ok(output) => {
            let summary = if output.trim().is_empty() {
                format!("{} completed for {count} filesystem(s).", action.title())
            } else {
                output.lines().next().unwrap_or_default().to_string()
            };
            app.set_status(summary);
            refresh_filesystems(app, gateway).await;
        }
        Err(error) => {
            app.set_status(format!(
                "{} failed: {}",
                action.title(),
                compact_error(&error)
            ));
        }
    }
}

async fn refresh_filesystems(app: &mut App, gateway: &CtlGateway) {
    match gateway.list().await {
        Ok(rows) => app.set_filesystems(rows),
        Err(error) => app.set_refresh_error(compact_error(&error)),
    }
}

fn reload_runtime_config(
    app: &mut App,
    gateway: &mut CtlGateway,
    watcher: &mut RuntimeConfigWatcher,
    args: &CliArgs,
) {
    match watcher.reload_if_changed() {
        Ok(Some(snapshot)) => {
            app.set_bindings(snapshot.bindings);
            if args.ctl.is_none()
                && let Some(ctl) = snapshot.ctl
                && ctl != gateway.program()
            {
                *gateway = CtlGateway::new(ctl);
            }
            if let Some(source) = snapshot.source {
                debug!("runtime config reloaded from {source}");
            }
        }
        Ok(None) => {}
        Err(error) => {
            warn!("runtime config reload failed: {error:#}");
        }
    }
}

fn compact_error(error: &anyhow::Error) -> String {
    let mut out = Vec::new();
    for (index, cause) in error.chain().enumerate() {
        if index == 0 {
            out.push(cause.to_string());
        } else if index <= 2 {
            out.push(format!("caused by: {cause}"));
        } else {
            break;
        }
    }

    out.join("\n")
}
