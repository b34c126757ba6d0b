//! Layout and drawing: board, sidebar (score, controls, instructions), pause and game over.

use crate::game::{GRID_HEIGHT, GRID_WIDTH, GameState, Status, speed_level, tick_interval};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Each grid cell is two terminal columns wide so blocks look square.
const CELL_WIDTH: u16 = 2;
const BOARD_OUTER_WIDTH: u16 = GRID_WIDTH as u16 * CELL_WIDTH + 2;
const BOARD_OUTER_HEIGHT: u16 = GRID_HEIGHT as u16 + 2;
const SIDEBAR_WIDTH: u16 = 30;

/// Duration of the game-over fade to grey.
const GAME_OVER_FADE_MS: u32 = 800;

/// Draw the game. Once the game is over the board fades to grey (TachyonFX) unless
/// `animation` is off; `fade` / `fade_time` hold that effect between frames.
pub fn draw(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    audio_blocked: bool,
    animation: bool,
    fade: &mut Option<Effect>,
    fade_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = frame.area();
    let (board_area, sidebar_area) = layout(area);

    let over = state.status() == Status::GameOver;
    let dimmed = over && (!animation || fade.as_ref().is_some_and(Effect::done));
    let board = draw_board(frame, state, theme, board_area, dimmed);
    if over && !dimmed {
        apply_game_over_fade(frame, theme, board, fade, fade_time, now);
    }

    draw_sidebar(frame, state, theme, sidebar_area, audio_blocked);

    match state.status() {
        Status::Paused => draw_pause_overlay(frame, theme, board),
        Status::GameOver => draw_game_over(frame, state, theme, board),
        Status::Running => {}
    }
}

/// Board and sidebar rects, centred in `area`.
fn layout(area: Rect) -> (Rect, Rect) {
    let total_w = BOARD_OUTER_WIDTH + SIDEBAR_WIDTH;
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BOARD_OUTER_HEIGHT),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_OUTER_WIDTH),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .split(vert[1]);
    (inner[0], inner[1])
}

/// Draws border + cells; returns the inner board rect.
fn draw_board(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect, dimmed: bool) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Blockfall ", Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let grid = state.display_grid();
    let buf = frame.buffer_mut();
    for (y, row) in grid.rows().enumerate() {
        let ry = inner.y + y as u16;
        if ry >= inner.bottom() {
            break;
        }
        for (x, &id) in row.iter().enumerate() {
            let rx = inner.x + x as u16 * CELL_WIDTH;
            if rx >= inner.right() {
                break;
            }
            let (symbol, fg) = match id {
                0 => (" ·", theme.div_line),
                _ if dimmed => ("██", theme.inactive_fg),
                _ => ("██", theme.cell_color(id)),
            };
            buf.set_string(rx, ry, symbol, Style::default().fg(fg).bg(theme.bg));
        }
    }
    inner
}

fn apply_game_over_fade(
    frame: &mut Frame,
    theme: &Theme,
    board: Rect,
    fade: &mut Option<Effect>,
    fade_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = fade_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    *fade_time = Some(now);

    let effect = fade.get_or_insert_with(|| {
        fx::fade_to(
            theme.inactive_fg,
            theme.bg,
            (GAME_OVER_FADE_MS, Interpolation::QuadOut),
        )
    });
    frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect, audio_blocked: bool) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Stats
            Constraint::Length(6), // Controls
            Constraint::Fill(1),   // Instructions
        ])
        .split(area);

    let score = state.score();
    let stats = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Lines: ", title_style),
            Span::styled(state.lines_cleared().to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Level: ", title_style),
            Span::styled(speed_level(score).to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Tick:  ", title_style),
            Span::styled(format!("{} ms", tick_interval(score).as_millis()), fg_style),
        ]),
    ];
    Paragraph::new(Text::from(stats))
        .block(Block::default().borders(Borders::ALL).border_style(border_style))
        .render(chunks[0], frame.buffer_mut());

    let key_style = Style::default().fg(theme.blocks[2]).add_modifier(Modifier::BOLD);
    let pause_label = if state.status() == Status::Paused {
        "Resume"
    } else {
        "Pause"
    };
    let mut controls = vec![
        Line::from(vec![Span::styled("[P] ", key_style), Span::styled(pause_label, fg_style)]),
        Line::from(vec![Span::styled("[N] ", key_style), Span::styled("New Game", fg_style)]),
    ];
    if audio_blocked {
        controls.push(Line::from(vec![
            Span::styled("[A] ", key_style),
            Span::styled(
                "Start Audio",
                Style::default()
                    .fg(Color::Black)
                    .bg(theme.title)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
    }
    Paragraph::new(Text::from(controls))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(" Controls ", title_style)),
        )
        .render(chunks[1], frame.buffer_mut());

    let dim = Style::default().fg(theme.inactive_fg);
    let instructions = [
        ("←", "Move left"),
        ("→", "Move right"),
        ("↓", "Move down faster"),
        ("↑", "Rotate piece"),
        ("P", "Pause or resume"),
        ("N", "Start a new game"),
        ("Q", "Quit"),
    ]
    .into_iter()
    .map(|(key, what)| {
        Line::from(vec![
            Span::styled(format!(" {key:<2}"), key_style),
            Span::styled(what, dim),
        ])
    })
    .collect::<Vec<_>>();
    Paragraph::new(Text::from(instructions))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(" Instructions ", title_style)),
        )
        .render(chunks[2], frame.buffer_mut());
}

/// Popup rect of `w` x `h` centred on `area`, clipped to it.
fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, board: Rect) {
    let popup = centered(board, 18, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(Span::styled("P — Resume", Style::default().fg(theme.main_fg))),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, state: &GameState, theme: &Theme, board: Rect) {
    let popup = centered(board, 20, 7);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over! ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(Span::styled(
            format!("Score: {}", state.score()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled("N — New game", Style::default().fg(theme.main_fg))),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}
