use std::io::{self, Stdout};

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::card::{Card, PAIR_COUNT};

/// Grid shape for the sixteen-card layout.
pub const GRID_COLS: usize = 4;
pub const GRID_ROWS: usize = 4;

/// Everything the game screen needs to draw one frame.
pub struct GameView<'a> {
    pub cards: &'a [Card],
    pub cursor: usize,
    pub attempts: u32,
    pub matches: u32,
    pub best: Option<u32>,
    pub has_won: bool,
    pub new_record: bool,
    pub confirm_exit: bool,
}

pub enum View<'a> {
    Menu { best: Option<u32> },
    Game(GameView<'a>),
}

/// Trait that abstracts the rendering layer, so the game loop can be driven
/// in tests without a terminal.
pub trait Renderer {
    /// Draw one full frame of the current view.
    fn draw(&mut self, view: &View) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// TUI Renderer
// ---------------------------------------------------------------------------

/// Full-screen ratatui renderer.  Owns the terminal: raw mode and the
/// alternate screen are entered on construction and restored on drop.
pub struct TuiRenderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TuiRenderer {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(TuiRenderer { terminal })
    }
}

impl Drop for TuiRenderer {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

impl Renderer for TuiRenderer {
    fn draw(&mut self, view: &View) -> io::Result<()> {
        self.terminal.draw(|frame| match view {
            View::Menu { best } => draw_menu(frame, *best),
            View::Game(game) => draw_game(frame, game),
        })?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Screens
// ---------------------------------------------------------------------------

fn draw_menu(frame: &mut ratatui::Frame, best: Option<u32>) {
    let mut lines = vec![
        Line::styled(
            "P A I R S",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Line::from("Test your memory skills!"),
        Line::from(""),
    ];
    if let Some(best) = best {
        lines.push(Line::from(format!("Best score: {best} attempts")));
        lines.push(Line::from(""));
    }
    lines.push(Line::from("Enter  start game"));
    lines.push(Line::from("q      exit"));

    let area = centered_rect(frame.area(), 36, lines.len() as u16 + 2);
    let menu = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(menu, area);
}

fn draw_game(frame: &mut ratatui::Frame, game: &GameView) {
    let [header, grid, footer] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(GRID_ROWS as u16 * 3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_stats(frame, header, game);
    draw_grid(frame, grid, game);

    let hints = Paragraph::new("arrows move · enter flip · r restart · q main menu")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(hints, footer);

    if game.has_won {
        draw_victory(frame, game);
    }
    if game.confirm_exit {
        draw_exit_dialog(frame);
    }
}

fn draw_stats(frame: &mut ratatui::Frame, area: Rect, game: &GameView) {
    let mut stats = format!(
        "Attempts: {}    Matches: {}/{}",
        game.attempts, game.matches, PAIR_COUNT
    );
    if let Some(best) = game.best {
        stats.push_str(&format!("    Best: {best}"));
    }
    let header = Paragraph::new(vec![
        Line::styled(
            "P A I R S",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Line::from(stats),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(header, area);
}

fn draw_grid(frame: &mut ratatui::Frame, area: Rect, game: &GameView) {
    let rows = Layout::vertical([Constraint::Length(3); GRID_ROWS])
        .flex(Flex::Center)
        .split(area);

    for (row_idx, row) in rows.iter().enumerate() {
        let cells = Layout::horizontal([Constraint::Length(7); GRID_COLS])
            .flex(Flex::Center)
            .split(*row);

        for (col_idx, cell) in cells.iter().enumerate() {
            let id = row_idx * GRID_COLS + col_idx;
            if let Some(card) = game.cards.get(id) {
                frame.render_widget(card_widget(card, id == game.cursor), *cell);
            }
        }
    }
}

fn card_widget(card: &Card, selected: bool) -> Paragraph<'static> {
    let (label, style) = if card.matched {
        (
            card.symbol.letter().to_string(),
            Style::default().fg(Color::Green).add_modifier(Modifier::DIM),
        )
    } else if card.face_up {
        (
            card.symbol.letter().to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )
    } else {
        ("?".to_string(), Style::default().fg(Color::DarkGray))
    };

    let border = if selected {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    Paragraph::new(Line::styled(label, style))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(border))
}

fn draw_victory(frame: &mut ratatui::Frame, game: &GameView) {
    let mut lines = vec![
        Line::styled(
            "Congratulations!",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Line::from(format!("Finished in {} attempts", game.attempts)),
    ];
    if game.new_record {
        lines.push(Line::styled(
            "New high score!",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("r play again · q main menu"));

    let area = centered_rect(frame.area(), 34, lines.len() as u16 + 2);
    frame.render_widget(Clear, area);
    let banner = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Green)));
    frame.render_widget(banner, area);
}

fn draw_exit_dialog(frame: &mut ratatui::Frame) {
    let lines = vec![
        Line::styled("Leave game?", Style::default().add_modifier(Modifier::BOLD)),
        Line::from("Progress will be lost."),
        Line::from(""),
        Line::from("enter/y leave · esc/n stay"),
    ];

    let area = centered_rect(frame.area(), 32, lines.len() as u16 + 2);
    frame.render_widget(Clear, area);
    let dialog = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Red)));
    frame.render_widget(dialog, area);
}

/// A fixed-size rect centered in `area`, clamped to fit.
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let [horizontal] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(horizontal);
    rect
}
