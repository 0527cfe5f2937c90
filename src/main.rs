mod card;
mod command;
mod game;
mod renderer;
mod score;
mod session;

use std::io;

use game::App;
use renderer::TuiRenderer;
use score::FileScoreStore;

fn main() -> io::Result<()> {
    // Parse optional seed from command-line arguments for reproducible deals.
    let seed: Option<u64> = std::env::args().nth(1).and_then(|s| s.parse().ok());

    let store = FileScoreStore::new();
    let renderer = TuiRenderer::new()?;
    App::new(seed, renderer, store).run()
}
