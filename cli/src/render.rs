use sapper_core as game;
use game::{Board, Content, Coord2, Finished, Game, MineLayout, Tile};
use std::fmt;

fn tile_char(tile: Tile) -> char {
    use Tile::*;
    match tile {
        Closed => '.',
        Open(0) => ' ',
        Open(n) => char::from(b'0' + n),
        Flag => 'F',
        Question => '?',
        Exploded => 'X',
        Mine => '*',
        IncorrectFlag => 'x',
    }
}

fn content_char(content: Content) -> char {
    match content {
        Content::Mine => '*',
        Content::Number(n) => tile_char(Tile::Open(n)),
    }
}

pub fn format_for_counter(num: isize) -> String {
    match num {
        ..-99 => "-99".to_string(),
        -99..0 => format!("-{:02}", -num),
        0..1000 => format!("{:03}", num),
        1000.. => "999".to_string(),
    }
}

fn status(finished: Finished) -> &'static str {
    match finished {
        Finished::Ongoing => "playing",
        Finished::Won => "won",
        Finished::Lost => "lost",
    }
}

/// Column labels, a border, and one row per `y` with `cell_char` for every `x`.
fn write_grid(
    f: &mut fmt::Formatter<'_>,
    (width, height): Coord2,
    cell_char: impl Fn(Coord2) -> char,
) -> fmt::Result {
    let labels = |digit: fn(u8) -> char| -> String { (0..width).map(digit).collect() };
    if width > 10 {
        let tens = labels(|x| match x / 10 {
            0 => ' ',
            n => char::from(b'0' + n),
        });
        writeln!(f, "    {}", tens.trim_end())?;
    }
    writeln!(f, "    {}", labels(|x| char::from(b'0' + x % 10)))?;

    let border = "-".repeat(width.into());
    writeln!(f, "   +{border}+")?;
    for y in 0..height {
        let row: String = (0..width).map(|x| cell_char((x, y))).collect();
        writeln!(f, "{y:>2} |{row}|")?;
    }
    writeln!(f, "   +{border}+")
}

/// The player's view: mine counter, clock, state, then the board.
pub struct GameView<'a>(pub &'a Game);

impl fmt::Display for GameView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let game = self.0;
        writeln!(
            f,
            "mines {}  time {}  {} ({})",
            format_for_counter(game.remaining_mines()),
            format_for_counter(game.elapsed_secs() as isize),
            status(game.finished()),
            game.difficulty().name(),
        )?;
        let board = game.board();
        write_grid(f, game.size(), |coords| tile_char(board[coords].tile()))
    }
}

/// Every cell opened, mines included.
pub struct SolutionView(Board);

impl SolutionView {
    pub fn new(layout: &MineLayout) -> Self {
        Self(Board::new(layout))
    }
}

impl fmt::Display for SolutionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let board = &self.0;
        let (width, height) = board.size();
        writeln!(f, "{width}x{height}, {} mines", board.mine_count())?;
        write_grid(f, board.size(), |coords| content_char(board[coords].content()))
    }
}
