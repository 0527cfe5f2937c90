use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// All intents the player can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a game from the main menu.
    Start,
    /// Re-deal the current game.
    Restart,
    /// Move the selection cursor over the grid.
    Move(Direction),
    /// Flip the card under the cursor.
    Flip,
    /// Ask to leave the game (opens the confirmation dialog).
    RequestExit,
    /// Confirm leaving: back to the main menu.
    ConfirmExit,
    /// Stay in the game, close the dialog.
    CancelExit,
    /// Quit the program.
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Which screen the key arrived on.  The same key means different things in
/// the menu, in play, and inside the leave-game dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Menu,
    Game,
    ExitDialog,
}

/// Translate a key press into a command, if it means anything here.
pub fn map_key(context: Context, key: KeyEvent) -> Option<Command> {
    // Hard quit from anywhere.
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Command::Quit);
    }

    match context {
        Context::Menu => match key.code {
            KeyCode::Enter | KeyCode::Char('s') => Some(Command::Start),
            KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
            _ => None,
        },
        Context::ExitDialog => match key.code {
            KeyCode::Enter | KeyCode::Char('y') => Some(Command::ConfirmExit),
            KeyCode::Esc | KeyCode::Char('n') => Some(Command::CancelExit),
            _ => None,
        },
        Context::Game => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Command::Move(Direction::Up)),
            KeyCode::Down | KeyCode::Char('j') => Some(Command::Move(Direction::Down)),
            KeyCode::Left | KeyCode::Char('h') => Some(Command::Move(Direction::Left)),
            KeyCode::Right | KeyCode::Char('l') => Some(Command::Move(Direction::Right)),
            KeyCode::Enter | KeyCode::Char(' ') => Some(Command::Flip),
            KeyCode::Char('r') => Some(Command::Restart),
            KeyCode::Char('q') | KeyCode::Esc => Some(Command::RequestExit),
            _ => None,
        },
    }
}
