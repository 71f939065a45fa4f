use alloc::boxed::Box;
use serde::{Deserialize, Serialize};

use crate::*;

/// Outcome of a game so far. Once it leaves `Ongoing` it stays put.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Finished {
    #[default]
    Ongoing,
    Won,
    Lost,
}

impl Finished {
    /// `0` ongoing, `1` won, `2` lost.
    pub const fn code(self) -> u8 {
        match self {
            Self::Ongoing => 0,
            Self::Won => 1,
            Self::Lost => 2,
        }
    }

    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

/// One game from the first click to a win or loss.
///
/// Difficulty and board dimensions are fixed for the lifetime of a game, a new game
/// replaces the old one.
#[derive(Debug)]
pub struct Game {
    difficulty: Difficulty,
    board: Board,
    elapsed_secs: u16,
    started: bool,
    finished: Finished,
    marking: bool,
    listeners: Listeners,
}

impl Game {
    /// Starts a game on a random board. `size` and `mines` only apply to
    /// [`Difficulty::Custom`], where they are clamped.
    pub fn new(difficulty: Difficulty, size: Coord2, mines: CellCount, seed: u64) -> Self {
        let config = difficulty.config(size, mines);
        let layout = RandomLayoutGenerator::new(seed).generate(config);
        Self::from_layout(difficulty, &layout)
    }

    pub fn from_layout(difficulty: Difficulty, layout: &MineLayout) -> Self {
        log::debug!(
            "New {} game, {:?} with {} mines",
            difficulty.name(),
            layout.size(),
            layout.mine_count()
        );
        Self {
            difficulty,
            board: Board::new(layout),
            elapsed_secs: 0,
            started: false,
            finished: Finished::Ongoing,
            marking: true,
            listeners: Listeners::default(),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> BoardConfig {
        BoardConfig::new_unchecked(self.board.size(), self.board.mine_count())
    }

    pub fn size(&self) -> Coord2 {
        self.board.size()
    }

    pub fn total_mines(&self) -> CellCount {
        self.board.mine_count()
    }

    pub fn remaining_mines(&self) -> isize {
        self.board.remaining_mines()
    }

    pub fn elapsed_secs(&self) -> u16 {
        self.elapsed_secs
    }

    pub fn finished(&self) -> Finished {
        self.finished
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_finished()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn tile_at(&self, coords: Coord2) -> Result<Tile> {
        self.board.tile_at(coords)
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.board.triggered_mine()
    }

    pub fn marking(&self) -> bool {
        self.marking
    }

    /// Enables the `?` step in the flag cycle.
    pub fn set_marking(&mut self, marking: bool) {
        self.marking = marking;
    }

    pub fn subscribe(&mut self, listener: impl GameListener + 'static) -> ListenerId {
        self.listeners.subscribe(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Player opens a cell. The very first reveal never hits a mine: the mine is moved
    /// away before opening.
    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.board.validate_coords(coords)?;
        if self.is_finished() {
            return Ok(RevealOutcome::NoChange);
        }

        let cell = self.board[coords];
        if cell.is_open() || cell.is_flagged() {
            return Ok(RevealOutcome::NoChange);
        }

        if !self.started {
            if cell.is_mine() {
                self.board.relocate_mine(coords)?;
            }
            self.started = true;
            log::debug!("Game started at {:?}", coords);
        }

        let remaining = self.remaining_mines();
        let outcome = self.board.open(coords, OpenKind::Direct)?;
        Ok(self.settle(outcome, remaining))
    }

    /// Player cycles the flag on a closed cell.
    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let coords = self.board.validate_coords(coords)?;
        if self.is_finished() {
            return Ok(MarkOutcome::NoChange);
        }

        let remaining = self.remaining_mines();
        let outcome = self.board.cycle_mark(coords, self.marking)?;
        self.settle(RevealOutcome::NoChange, remaining);
        Ok(outcome)
    }

    /// Player chords on an open number.
    pub fn chord(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.board.validate_coords(coords)?;
        if self.is_finished() || !self.started {
            return Ok(RevealOutcome::NoChange);
        }

        let remaining = self.remaining_mines();
        let outcome = self.board.chord(coords)?;
        Ok(self.settle(outcome, remaining))
    }

    /// Advances the clock by a second while the game runs, up to [`MAX_SECONDS`].
    ///
    /// Returns whether the clock moved.
    pub fn tick(&mut self) -> bool {
        if !self.started || self.is_finished() || self.elapsed_secs >= MAX_SECONDS {
            return false;
        }

        self.elapsed_secs += 1;
        self.listeners.emit(GameEvent::Ticked {
            elapsed: self.elapsed_secs,
        });
        true
    }

    /// Recomputes the finished state after a mutation and tells the listeners what changed.
    fn settle(&mut self, outcome: RevealOutcome, remaining_before: isize) -> RevealOutcome {
        let newly_finished = if self.finished.is_finished() {
            None
        } else {
            let finished = self.board.finished_state();
            if finished == Finished::Won {
                self.board.flag_all_mines();
            }
            self.finished = finished;
            finished.is_finished().then_some(finished)
        };

        for coords in self.board.take_changes() {
            let tile = self.board[coords].tile();
            self.listeners.emit(GameEvent::CellChanged { coords, tile });
        }

        let remaining = self.remaining_mines();
        if remaining != remaining_before {
            self.listeners.emit(GameEvent::FlagsChanged { remaining });
        }

        match newly_finished {
            Some(Finished::Won) => {
                log::debug!("Game won in {} seconds", self.elapsed_secs);
                self.listeners.emit(GameEvent::Won);
                outcome | RevealOutcome::Won
            }
            Some(Finished::Lost) => {
                log::debug!("Game lost at {:?}", self.board.triggered_mine());
                self.listeners.emit(GameEvent::Lost);
                outcome
            }
            _ => outcome,
        }
    }
}
