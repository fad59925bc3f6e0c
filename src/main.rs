//! lasso-tui — terminal client for the Lasso multiplayer game.
//!
//! This is the crate root. It declares the module tree, defines the CLI, and
//! runs the event loop that ties the entry screen, the server connection, and
//! the game view together.
//!
//! ## Module structure
//!
//! - `net`   — Wire protocol and the WebSocket channel to the server
//! - `page`  — Element construction, mounting, and rendering
//! - `keys`  — The single-slot key-press subscription registry
//! - `login` — Entry screen and registration handshake
//! - `game`  — Game session state (`GameApp`) and rendering (`ui()`)
//! - `theme` — Color palette

mod game;
mod keys;
mod login;
mod net;
mod page;
mod theme;

use std::io::Stdout;

use anyhow::{bail, Result};
use clap::Parser;
use crossterm::{
    event::{Event as TermEvent, EventStream, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc::Receiver;
use tokio::time::{interval, Duration, Interval};

use game::GameApp;
use keys::KeyRouter;
use login::{Handshake, LoginView};
use net::{Channel, ClientCommand, ServerMessage, WsChannel};
use page::{Element, Page, StyleClass, TerminalPage};
use theme::Theme;

type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "lasso-tui", about = "Terminal client for the Lasso multiplayer game")]
struct Cli {
    /// WebSocket endpoint of the game server
    #[arg(long, default_value = "ws://127.0.0.1:5050/stream")]
    server: String,
    #[command(subcommand)]
    command: Option<Command>,
}

/// Subcommands skip the entry screen and register directly; with no
/// subcommand the interactive entry screen runs first.
#[derive(clap::Subcommand)]
enum Command {
    /// Register as a player under the given display name
    Play {
        /// Your display name
        #[arg(short, long)]
        name: String,
    },
    /// Register as a passive watcher
    Watch,
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Connect before touching the terminal so connection errors print
    // normally instead of vanishing into the alternate screen.
    let (mut channel, mut messages) = net::connect(&cli.server).await?;

    enable_raw_mode()?;
    execute!(std::io::stdout(), EnterAlternateScreen)?;
    let mut terminal = ratatui::Terminal::new(CrosstermBackend::new(std::io::stdout()))?;

    let result = run(&mut terminal, &mut channel, &mut messages, cli.command).await;

    // Restore the terminal on every exit path before surfacing any error.
    disable_raw_mode()?;
    execute!(std::io::stdout(), LeaveAlternateScreen)?;

    result
}

/// Session loop: entry screen, then the game view. A recoverable rejection
/// from the server (name already taken) loops back to a fresh entry screen
/// with the server's message shown.
async fn run(
    terminal: &mut Terminal,
    channel: &mut WsChannel,
    messages: &mut Receiver<ServerMessage>,
    command: Option<Command>,
) -> Result<()> {
    let theme = Theme::default();
    let mut events = EventStream::new();
    let mut tick = interval(Duration::from_millis(50));

    // A subcommand plays the role of the entry screen for the first session:
    // send the handshake directly.
    let mut pending = match command {
        Some(Command::Play { name }) => {
            channel.send(ClientCommand::RegisterPlayer { name: name.clone() })?;
            Some(Handshake::Player { name })
        }
        Some(Command::Watch) => {
            channel.send(ClientCommand::RegisterWatcher)?;
            Some(Handshake::Watcher)
        }
        None => None,
    };
    let mut notice: Option<String> = None;

    loop {
        let handshake = match pending.take() {
            Some(handshake) => handshake,
            None => {
                match login_phase(terminal, &theme, &mut events, &mut tick, channel, notice.take())
                    .await?
                {
                    Some(handshake) => handshake,
                    // User backed out of the entry screen.
                    None => return Ok(()),
                }
            }
        };

        match game_phase(terminal, &theme, &mut events, &mut tick, channel, messages, handshake)
            .await?
        {
            SessionEnd::Quit => return Ok(()),
            SessionEnd::Rejected(message) => notice = Some(message),
        }
    }
}

// ── Entry screen phase ───────────────────────────────────────────────────────

/// Run the entry screen until a handshake is sent (`Some`) or the user backs
/// out with Esc (`None`).
async fn login_phase(
    terminal: &mut Terminal,
    theme: &Theme,
    events: &mut EventStream,
    tick: &mut Interval,
    channel: &mut WsChannel,
    notice: Option<String>,
) -> Result<Option<Handshake>> {
    let mut page = TerminalPage::new();
    let mut router = KeyRouter::new();

    // Placeholder for the game viewport. The entry screen hides it on create
    // and restores it on teardown, mirroring the container handoff contract.
    let container = page.mount(Element::panel(StyleClass::Viewport, vec![]));
    if let Some(message) = notice {
        page.mount(Element::panel(
            StyleClass::ErrorText,
            vec![page::span(StyleClass::ErrorText, message)],
        ));
    }
    let mut view = LoginView::create(&mut page, &mut router, container)?;

    loop {
        terminal.draw(|f| page.render(f, theme))?;

        tokio::select! {
            ev = events.next() => {
                if let Some(Ok(TermEvent::Key(key))) = ev {
                    if key.kind != KeyEventKind::Press { continue; }

                    if key.code == KeyCode::Esc {
                        view.destroy(&mut page, &mut router);
                        return Ok(None);
                    }
                    // The login view holds the key subscription; it either
                    // consumes the key (Enter) or leaves it for field editing.
                    if router.is_claimed() {
                        if let Some(handshake) =
                            view.on_key(key, &mut page, channel, &mut router)?
                        {
                            return Ok(Some(handshake));
                        }
                    }
                    page.edit(key);
                }
            }
            _ = tick.tick() => {}
        }
    }
}

// ── Game phase ───────────────────────────────────────────────────────────────

enum SessionEnd {
    /// The user quit; the client is done.
    Quit,
    /// The server rejected our registration but the session can restart
    /// (another player already holds the name).
    Rejected(String),
}

async fn game_phase(
    terminal: &mut Terminal,
    theme: &Theme,
    events: &mut EventStream,
    tick: &mut Interval,
    channel: &mut WsChannel,
    messages: &mut Receiver<ServerMessage>,
    handshake: Handshake,
) -> Result<SessionEnd> {
    let mut app = GameApp::new(handshake);
    if app.player_name().is_some() {
        app.system("make loops to capture; don't touch anything");
    } else {
        app.system("watching the table");
    }

    loop {
        terminal.draw(|f| game::ui(f, &app, theme))?;

        tokio::select! {
            ev = events.next() => {
                if let Some(Ok(TermEvent::Key(key))) = ev {
                    if key.kind != KeyEventKind::Press { continue; }

                    let step = match key.code {
                        KeyCode::Esc => return Ok(SessionEnd::Quit),
                        KeyCode::Up | KeyCode::Char('k') => Some((0.0, -1.0)),
                        KeyCode::Down | KeyCode::Char('j') => Some((0.0, 1.0)),
                        KeyCode::Left | KeyCode::Char('h') => Some((-1.0, 0.0)),
                        KeyCode::Right | KeyCode::Char('l') => Some((1.0, 0.0)),
                        _ => None,
                    };
                    if let Some((dx, dy)) = step {
                        if let Some(command) = app.step(dx, dy) {
                            channel.send(command)?;
                        }
                    }
                }
            }
            message = messages.recv() => {
                match message {
                    Some(ServerMessage::UpdateTableState { state }) => app.apply(state),
                    Some(ServerMessage::Error { message, recoverable }) => {
                        if recoverable {
                            return Ok(SessionEnd::Rejected(message));
                        }
                        app.system(format!("server error: {message}"));
                    }
                    None => bail!("connection to server closed"),
                }
            }
            _ = tick.tick() => {}
        }
    }
}
