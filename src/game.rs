//! Game session state and rendering.
//!
//! This module owns [`GameApp`], the model for the post-handshake phase, and
//! the [`ui`] function that renders it. The event loop in `main.rs` feeds
//! server updates and key presses into `GameApp`, then redraws every tick.
//!
//! The server is authoritative: the board is drawn entirely from the latest
//! [`TableState`] broadcast. For a playing client the only local state is the
//! cursor position we report back with `player_move`.

use ratatui::{
    layout::{Constraint, Layout},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Context, Line as CanvasLine, Points},
        Block, Borders, Paragraph,
    },
};

use crate::login::Handshake;
use crate::net::{ClientCommand, TableState};
use crate::theme::Theme;

/// How far one key press moves the player. Well under the server's speed
/// limit, which clears the tail on moves longer than 0.1 units.
const MOVE_STEP: f64 = 0.02;

/// Rolling system-log length.
const LOG_CAP: usize = 50;

/// State for one registered session, player or watcher.
pub struct GameApp {
    role: Handshake,
    /// Latest table snapshot from the server; `None` until the first update.
    pub state: Option<TableState>,
    /// Our reported position (players only).
    pub pos: (f64, f64),
    log: Vec<String>,
}

impl GameApp {
    pub fn new(role: Handshake) -> Self {
        Self {
            role,
            state: None,
            pos: (0.5, 0.5),
            log: Vec::new(),
        }
    }

    /// The display name we registered under, if playing.
    pub fn player_name(&self) -> Option<&str> {
        match &self.role {
            Handshake::Player { name } => Some(name),
            Handshake::Watcher => None,
        }
    }

    /// Append a line to the system log.
    pub fn system(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
        if self.log.len() > LOG_CAP {
            self.log.remove(0);
        }
    }

    /// Absorb a table update, folding its score events into the log.
    pub fn apply(&mut self, state: TableState) {
        for event in &state.events {
            self.system(format!("{} {:+}", event.player_name, event.score));
        }
        self.state = Some(state);
    }

    /// Move the local cursor by one step in the given direction, clamped to
    /// the unit square. Returns the command to send, or `None` for watchers.
    pub fn step(&mut self, dx: f64, dy: f64) -> Option<ClientCommand> {
        if self.player_name().is_none() {
            return None;
        }
        self.pos.0 = (self.pos.0 + dx * MOVE_STEP).clamp(0.0, 1.0);
        self.pos.1 = (self.pos.1 + dy * MOVE_STEP).clamp(0.0, 1.0);
        Some(ClientCommand::PlayerMove {
            x: self.pos.0,
            y: self.pos.1,
        })
    }

    fn recent_log(&self, n: usize) -> &[String] {
        &self.log[self.log.len().saturating_sub(n)..]
    }
}

// ── Rendering ────────────────────────────────────────────────────────────────

/// Render the game screen: board on the left, scoreboard on the right, the
/// system log and a key hint along the bottom.
pub fn ui(f: &mut ratatui::Frame, app: &GameApp, theme: &Theme) {
    let [top, log_area, hint_area] = Layout::vertical([
        Constraint::Min(10),
        Constraint::Length(5),
        Constraint::Length(1),
    ])
    .areas(f.area());
    let [board_area, side_area] =
        Layout::horizontal([Constraint::Min(30), Constraint::Length(26)]).areas(top);

    // ── Board ────────────────────────────────────────────────────────────
    let board = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Lasso ")
                .border_style(Style::default().fg(theme.board_border)),
        )
        .marker(symbols::Marker::Braille)
        .x_bounds([0.0, 1.0])
        .y_bounds([0.0, 1.0])
        .paint(|ctx| paint_board(ctx, app, theme));
    f.render_widget(board, board_area);

    // ── Scoreboard ───────────────────────────────────────────────────────
    let mut lines: Vec<Line> = Vec::new();
    if let Some(state) = &app.state {
        let mut players: Vec<_> = state.players.iter().collect();
        players.sort_by(|a, b| b.1.score.cmp(&a.1.score).then(a.0.cmp(b.0)));
        for (name, player) in players {
            let mut style = Style::default().fg(Theme::rgb(player.color));
            if player.invincible {
                style = style.add_modifier(Modifier::DIM);
            }
            let label = if app.player_name() == Some(name.as_str()) {
                format!("{name} (you)")
            } else {
                name.clone()
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{label:<18}"), style),
                Span::styled(
                    format!("{:>5}", player.score),
                    Style::default().fg(theme.text),
                ),
            ]));
        }
    } else {
        lines.push(Line::from(Span::styled(
            "waiting for server...",
            Style::default().fg(theme.text_dim),
        )));
    }
    let scoreboard = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Scores ")
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(scoreboard, side_area);

    // ── System log ───────────────────────────────────────────────────────
    let log_lines: Vec<Line> = app
        .recent_log(3)
        .iter()
        .map(|l| Line::from(Span::styled(l.clone(), Style::default().fg(theme.text_dim))))
        .collect();
    let log = Paragraph::new(log_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Events ")
            .border_style(Style::default().fg(theme.board_border)),
    );
    f.render_widget(log, log_area);

    // ── Hint line ────────────────────────────────────────────────────────
    let hint = if app.player_name().is_some() {
        "arrows/hjkl move | Esc quit"
    } else {
        "watching | Esc quit"
    };
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(theme.text_dim),
        ))),
        hint_area,
    );
}

/// Draw foods, tails, and players onto the unit-square canvas. The server's
/// y axis grows downward; the canvas y axis grows upward, so y is flipped.
fn paint_board(ctx: &mut Context, app: &GameApp, theme: &Theme) {
    let Some(state) = &app.state else {
        return;
    };

    for food in state.foods.values() {
        ctx.draw(&Points {
            coords: &[(food.x, 1.0 - food.y)],
            color: theme.food,
        });
    }

    for player in state.players.values() {
        let color = Theme::rgb(player.color);

        // Tail segments, newest first: head to first point, then point to point.
        let mut from = (player.x, player.y);
        for point in &player.tail_points {
            let to = (point.x(), point.y());
            ctx.draw(&CanvasLine {
                x1: from.0,
                y1: 1.0 - from.1,
                x2: to.0,
                y2: 1.0 - to.1,
                color,
            });
            from = to;
        }

        ctx.draw(&Circle {
            x: player.x,
            y: 1.0 - player.y,
            radius: player.r,
            color,
        });
    }
}
