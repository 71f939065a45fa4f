use crate::records::Records;
use crate::render;
use game::{Coord, Coord2, Difficulty, Game, GameEvent, MarkOutcome, MineLayout, RevealOutcome};
use sapper_core as game;
use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;
use thiserror::Error;
use web_time::Instant;

const HELP: &str = "\
commands:
  r X Y   reveal a cell
  f X Y   cycle flag / question mark on a cell
  c X Y   chord: reveal the neighbors of a satisfied number
  m       toggle question marks
  n       new game
  h       this help
  q       quit";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Reveal(Coord2),
    Flag(Coord2),
    Chord(Coord2),
    ToggleMarks,
    New,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0}, try h")]
    Unknown(String),
    #[error("{0} needs X and Y")]
    MissingCoords(&'static str),
    #[error("not a coordinate: {0}")]
    BadCoord(String),
    #[error("unexpected argument {0}")]
    Extra(String),
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut tokens = line.split_whitespace();
    let name = tokens.next().ok_or(CommandError::Empty)?;

    let mut coords = |name: &'static str| -> Result<Coord2, CommandError> {
        let mut coord = || -> Result<Coord, CommandError> {
            let token = tokens.next().ok_or(CommandError::MissingCoords(name))?;
            token
                .parse()
                .map_err(|_| CommandError::BadCoord(token.to_string()))
        };
        Ok((coord()?, coord()?))
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "r" | "reveal" => Command::Reveal(coords("reveal")?),
        "f" | "flag" => Command::Flag(coords("flag")?),
        "c" | "chord" => Command::Chord(coords("chord")?),
        "m" | "marks" => Command::ToggleMarks,
        "n" | "new" => Command::New,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        _ => return Err(CommandError::Unknown(name.to_string())),
    };

    match tokens.next() {
        Some(extra) => Err(CommandError::Extra(extra.to_string())),
        None => Ok(command),
    }
}

/// How to set up each game of a session.
#[derive(Clone, Debug)]
pub struct PlayOptions {
    pub difficulty: Difficulty,
    pub config: game::BoardConfig,
    /// Seed of the first game, later games pick their own.
    pub seed: Option<u64>,
    /// Fixed layout replayed by every game instead of a random one.
    pub level: Option<MineLayout>,
}

impl PlayOptions {
    fn new_game(&self, seed: Option<u64>) -> Game {
        match &self.level {
            Some(layout) => Game::from_layout(self.difficulty, layout),
            None => {
                let seed = seed.unwrap_or_else(rand::random);
                log::info!("Seed: {}", seed);
                let game::BoardConfig { size, mines } = self.config;
                Game::new(self.difficulty, size, mines, seed)
            }
        }
    }
}

/// Wall clock driving [`Game::tick`], one tick per whole second since the first reveal.
#[derive(Default)]
struct Clock {
    started_at: Option<Instant>,
    ticks: u64,
}

impl Clock {
    fn sync(&mut self, game: &mut Game) {
        if !game.is_started() || game.is_finished() {
            return;
        }
        let started_at = *self.started_at.get_or_insert_with(Instant::now);
        let due = started_at.elapsed().as_secs();
        while self.ticks < due && game.tick() {
            self.ticks += 1;
        }
    }
}

struct Session {
    game: Game,
    clock: Clock,
    events: Rc<RefCell<Vec<GameEvent>>>,
}

impl Session {
    fn new(mut game: Game, marks: bool) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        game.set_marking(marks);
        game.subscribe(move |event: &GameEvent| sink.borrow_mut().push(*event));
        Self {
            game,
            clock: Clock::default(),
            events,
        }
    }

    fn drain_events(&self) -> Vec<GameEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

/// Runs commands from `input` until `q` or end of input.
///
/// Best times and the question mark setting are written back into `records`.
pub fn run<R: BufRead, W: Write>(
    input: R,
    out: &mut W,
    options: &PlayOptions,
    records: &mut Records,
) -> anyhow::Result<()> {
    let mut lines = input.lines();
    let mut session = Session::new(options.new_game(options.seed), records.settings.marks);
    write!(out, "{}", render::GameView(&session.game))?;

    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                writeln!(out, "{err}")?;
                continue;
            }
        };
        log::debug!("Command: {:?}", command);

        session.clock.sync(&mut session.game);
        let applied = match command {
            Command::Quit => break,
            Command::Help => {
                writeln!(out, "{HELP}")?;
                continue;
            }
            Command::New => {
                session = Session::new(options.new_game(None), records.settings.marks);
                Ok(true)
            }
            Command::ToggleMarks => {
                let marks = !session.game.marking();
                session.game.set_marking(marks);
                records.settings.marks = marks;
                writeln!(out, "question marks {}", if marks { "on" } else { "off" })?;
                continue;
            }
            Command::Reveal(coords) => session.game.reveal(coords).map(RevealOutcome::has_update),
            Command::Flag(coords) => session.game.toggle_flag(coords).map(MarkOutcome::has_update),
            Command::Chord(coords) => session.game.chord(coords).map(RevealOutcome::has_update),
        };
        let updated = match applied {
            Ok(updated) => updated,
            Err(err) => {
                writeln!(out, "{err}")?;
                continue;
            }
        };
        session.clock.sync(&mut session.game);

        if updated {
            write!(out, "{}", render::GameView(&session.game))?;
        } else {
            writeln!(out, "nothing changed")?;
        }
        for event in session.drain_events() {
            match event {
                GameEvent::Lost => writeln!(out, "Boom! You hit a mine. n starts a new game.")?,
                GameEvent::Won => {
                    let seconds = session.game.elapsed_secs();
                    writeln!(out, "Board cleared in {seconds} seconds!")?;
                    let difficulty = session.game.difficulty();
                    if records.is_record(difficulty, seconds) {
                        write!(out, "New best time for {}! Name: ", difficulty.name())?;
                        out.flush()?;
                        let name = lines.next().transpose()?.unwrap_or_default();
                        records.set_best_time(difficulty, seconds, &name);
                    }
                }
                event => log::trace!("{:?}", event),
            }
        }
    }

    writeln!(out)?;
    Ok(())
}
