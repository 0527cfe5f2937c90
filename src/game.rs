use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};

use crate::command::{Command, Context, Direction, map_key};
use crate::renderer::{GRID_COLS, GRID_ROWS, GameView, Renderer, View};
use crate::score::ScoreStore;
use crate::session::{FLIP_BACK_DELAY, SelectOutcome, Session};

/// Poll granularity while nothing is scheduled.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// The flip-back scheduled for a mismatched pair.  Carries the generation of
/// the session it was scheduled under; if the session has been replaced by
/// the time the timer fires, the generations differ and the reversal is
/// dropped instead of touching the newer deal.
#[derive(Debug, Clone, Copy)]
struct PendingReversal {
    due: Instant,
    generation: u64,
}

enum Screen {
    Menu,
    Game {
        session: Session,
        cursor: usize,
        /// Set by the winning transition when this session beat the stored
        /// best, never derived afterwards.
        new_record: bool,
        confirm_exit: bool,
    },
}

/// The main application.  `renderer` and `store` are injected so the loop
/// stays terminal-agnostic and the best score can live in memory for tests.
pub struct App<R: Renderer, S: ScoreStore> {
    screen: Screen,
    best: Option<u32>,
    reversal: Option<PendingReversal>,
    next_generation: u64,
    seed: Option<u64>,
    renderer: R,
    store: S,
}

impl<R: Renderer, S: ScoreStore> App<R, S> {
    pub fn new(seed: Option<u64>, renderer: R, store: S) -> Self {
        let best = store.load();
        App {
            screen: Screen::Menu,
            best,
            reversal: None,
            next_generation: 0,
            seed,
            renderer,
            store,
        }
    }

    /// Run the event loop until the player quits.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            let view = Self::view(&self.screen, self.best);
            self.renderer.draw(&view)?;

            // The poll timeout doubles as the flip-back timer.
            let timeout = match &self.reversal {
                Some(r) => r.due.saturating_duration_since(Instant::now()).min(IDLE_POLL),
                None => IDLE_POLL,
            };
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if let Some(cmd) = map_key(self.context(), key) {
                            if self.handle(cmd) {
                                break;
                            }
                        }
                    }
                    // Resize and the rest just trigger the redraw above.
                    _ => {}
                }
            }

            self.fire_due_reversal(Instant::now());
        }
        Ok(())
    }

    fn context(&self) -> Context {
        match &self.screen {
            Screen::Menu => Context::Menu,
            Screen::Game { confirm_exit: true, .. } => Context::ExitDialog,
            Screen::Game { .. } => Context::Game,
        }
    }

    /// Dispatch a command.  Returns `true` if the program should exit.
    fn handle(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Quit => return true,
            Command::Start | Command::Restart => self.start_session(),
            Command::Move(dir) => self.move_cursor(dir),
            Command::Flip => self.flip_at_cursor(),
            Command::RequestExit => {
                if let Screen::Game { confirm_exit, .. } = &mut self.screen {
                    *confirm_exit = true;
                }
            }
            Command::CancelExit => {
                if let Screen::Game { confirm_exit, .. } = &mut self.screen {
                    *confirm_exit = false;
                }
            }
            Command::ConfirmExit => {
                // Back to the menu: the session is discarded and any
                // scheduled flip-back dies with it.
                self.reversal = None;
                self.screen = Screen::Menu;
            }
        }
        false
    }

    /// Deal a fresh session, replacing whatever was on the table.  Bumping
    /// the generation invalidates any in-flight reversal.
    fn start_session(&mut self) {
        self.reversal = None;
        let generation = self.next_generation;
        self.next_generation += 1;

        let session = match self.seed {
            // Offset by generation so restarts re-deal, runs stay reproducible.
            Some(seed) => Session::deal_seeded(seed.wrapping_add(generation), generation),
            None => Session::deal(generation),
        };
        self.screen = Screen::Game {
            session,
            cursor: 0,
            new_record: false,
            confirm_exit: false,
        };
    }

    fn move_cursor(&mut self, dir: Direction) {
        let Screen::Game { cursor, .. } = &mut self.screen else { return };
        let (col, row) = (*cursor % GRID_COLS, *cursor / GRID_COLS);
        let (col, row) = match dir {
            Direction::Up => (col, row.saturating_sub(1)),
            Direction::Down => (col, (row + 1).min(GRID_ROWS - 1)),
            Direction::Left => (col.saturating_sub(1), row),
            Direction::Right => ((col + 1).min(GRID_COLS - 1), row),
        };
        *cursor = row * GRID_COLS + col;
    }

    fn flip_at_cursor(&mut self) {
        if let Screen::Game { cursor, .. } = &self.screen {
            self.flip(*cursor);
        }
    }

    /// Flip one card and run whatever transition it triggers.
    fn flip(&mut self, id: usize) {
        let Screen::Game { session, new_record, .. } = &mut self.screen else { return };
        match session.select(id) {
            SelectOutcome::Mismatched { .. } => {
                self.reversal = Some(PendingReversal {
                    due: Instant::now() + FLIP_BACK_DELAY,
                    generation: session.generation(),
                });
            }
            SelectOutcome::Matched { won: true } => {
                // The winning transition is the only place the best score is
                // compared and written, so it runs exactly once per session.
                let attempts = session.attempts();
                let record = self.best.is_none_or(|best| attempts < best);
                if record {
                    self.best = Some(attempts);
                    self.store.save(attempts);
                }
                *new_record = record;
            }
            SelectOutcome::Ignored
            | SelectOutcome::Flipped
            | SelectOutcome::Matched { won: false } => {}
        }
    }

    /// Apply a due flip-back, unless it belongs to a session that is gone.
    fn fire_due_reversal(&mut self, now: Instant) {
        let Some(reversal) = self.reversal else { return };
        if now < reversal.due {
            return;
        }
        self.reversal = None;
        if let Screen::Game { session, .. } = &mut self.screen {
            if session.generation() == reversal.generation {
                session.revert_pending();
            }
        }
    }

    fn view(screen: &Screen, best: Option<u32>) -> View<'_> {
        match screen {
            Screen::Menu => View::Menu { best },
            Screen::Game { session, cursor, new_record, confirm_exit } => View::Game(GameView {
                cards: session.cards(),
                cursor: *cursor,
                attempts: session.attempts(),
                matches: session.matches(),
                best,
                has_won: session.has_won(),
                new_record: *new_record,
                confirm_exit: *confirm_exit,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Symbol;
    use crate::score::MemoryScoreStore;

    struct NullRenderer;

    impl Renderer for NullRenderer {
        fn draw(&mut self, _view: &View) -> io::Result<()> {
            Ok(())
        }
    }

    type TestApp = App<NullRenderer, MemoryScoreStore>;

    fn app_with_store(store: MemoryScoreStore) -> TestApp {
        let mut app = App::new(Some(7), NullRenderer, store);
        app.handle(Command::Start);
        app
    }

    fn session_of(app: &TestApp) -> &Session {
        match &app.screen {
            Screen::Game { session, .. } => session,
            Screen::Menu => panic!("no session on the menu screen"),
        }
    }

    fn new_record_of(app: &TestApp) -> bool {
        match &app.screen {
            Screen::Game { new_record, .. } => *new_record,
            Screen::Menu => panic!("no session on the menu screen"),
        }
    }

    /// Flip two unmatched cards of different symbols and let the flip-back
    /// timer fire.  Costs exactly one attempt.
    fn miss_once(app: &mut TestApp) {
        let (a, b) = {
            let cards = session_of(app).cards();
            let a = cards.iter().position(|c| !c.matched).unwrap();
            let b = cards
                .iter()
                .position(|c| !c.matched && c.symbol != cards[a].symbol)
                .unwrap();
            (a, b)
        };
        app.flip(a);
        app.flip(b);
        let due = app.reversal.expect("mismatch schedules a reversal").due;
        app.fire_due_reversal(due);
    }

    /// Play the current session to the win: `misses` wasted attempts, then
    /// all eight pairs in order.  Total attempts = misses + 8.
    fn finish_game(app: &mut TestApp, misses: u32) {
        for _ in 0..misses {
            miss_once(app);
        }
        for symbol in Symbol::ALL {
            let ids: Vec<usize> = session_of(app)
                .cards()
                .iter()
                .filter(|c| c.symbol == symbol)
                .map(|c| c.id)
                .collect();
            app.flip(ids[0]);
            app.flip(ids[1]);
        }
        assert!(session_of(app).has_won());
    }

    #[test]
    fn best_score_only_improves() {
        let mut app = app_with_store(MemoryScoreStore::empty());

        finish_game(&mut app, 4); // 12 attempts
        assert_eq!(session_of(&app).attempts(), 12);
        assert_eq!(app.best, Some(12));
        assert!(new_record_of(&app));

        app.handle(Command::Restart);
        finish_game(&mut app, 7); // 15 attempts, worse
        assert_eq!(app.best, Some(12));
        assert!(!new_record_of(&app));

        app.handle(Command::Restart);
        finish_game(&mut app, 1); // 9 attempts, better
        assert_eq!(app.best, Some(9));
        assert!(new_record_of(&app));
    }

    #[test]
    fn win_writes_the_store_exactly_once() {
        let store = MemoryScoreStore::empty();
        let mut app = app_with_store(store);
        finish_game(&mut app, 0);
        assert_eq!(app.store.load(), Some(8));
        assert_eq!(app.store.saves(), 1);

        // Flips after the win are no-ops and must not re-run the transition.
        app.flip(0);
        app.flip(1);
        assert_eq!(app.store.saves(), 1);
    }

    #[test]
    fn tying_the_best_is_not_a_new_record() {
        let mut app = app_with_store(MemoryScoreStore::with(8));
        finish_game(&mut app, 0); // perfect game, ties the stored 8
        assert_eq!(app.best, Some(8));
        assert!(!new_record_of(&app));
        assert_eq!(app.store.saves(), 0);
    }

    #[test]
    fn restart_cancels_the_scheduled_reversal() {
        let mut app = app_with_store(MemoryScoreStore::empty());
        miss_is_pending(&mut app);
        let due = app.reversal.unwrap().due;

        app.handle(Command::Restart);
        assert!(app.reversal.is_none());
        assert!(session_of(&app).cards().iter().all(|c| !c.face_up));

        // Firing at the old deadline must leave the new deal untouched.
        app.fire_due_reversal(due);
        assert!(session_of(&app).cards().iter().all(|c| !c.face_up));
    }

    #[test]
    fn stale_generation_reversal_is_dropped() {
        let mut app = app_with_store(MemoryScoreStore::empty());
        miss_is_pending(&mut app);
        let stale = app.reversal.take().unwrap();

        app.handle(Command::Restart);
        let first = session_of(&app)
            .cards()
            .iter()
            .position(|c| !c.face_up)
            .unwrap();
        app.flip(first);

        // Re-arm the stale timer and let it fire against the new session.
        app.reversal = Some(stale);
        app.fire_due_reversal(stale.due);
        assert!(session_of(&app).cards()[first].face_up);
        assert_eq!(session_of(&app).pending(), &[first]);
    }

    #[test]
    fn exit_requires_confirmation_and_tears_down() {
        let mut app = app_with_store(MemoryScoreStore::empty());
        miss_is_pending(&mut app);
        assert_eq!(app.context(), Context::Game);

        app.handle(Command::RequestExit);
        assert_eq!(app.context(), Context::ExitDialog);
        app.handle(Command::CancelExit);
        assert_eq!(app.context(), Context::Game);

        app.handle(Command::RequestExit);
        app.handle(Command::ConfirmExit);
        assert_eq!(app.context(), Context::Menu);
        assert!(app.reversal.is_none());
    }

    #[test]
    fn quit_exits_the_loop() {
        let mut app = App::new(Some(7), NullRenderer, MemoryScoreStore::empty());
        assert!(app.handle(Command::Quit));
    }

    /// Put the current session into the "two mismatched cards pending" state.
    fn miss_is_pending(app: &mut TestApp) {
        let (a, b) = {
            let cards = session_of(app).cards();
            let a = cards.iter().position(|c| !c.matched).unwrap();
            let b = cards
                .iter()
                .position(|c| !c.matched && c.symbol != cards[a].symbol)
                .unwrap();
            (a, b)
        };
        app.flip(a);
        app.flip(b);
        assert!(app.reversal.is_some());
    }
}
