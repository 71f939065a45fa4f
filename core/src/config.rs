use serde::{Deserialize, Serialize};

use crate::*;

pub const MIN_WIDTH: Coord = 9;
pub const MAX_WIDTH: Coord = 30;
pub const MIN_HEIGHT: Coord = 9;
pub const MAX_HEIGHT: Coord = 24;
pub const MIN_MINES: CellCount = 10;

/// Largest value the game clock will reach, three digits of display.
pub const MAX_SECONDS: u16 = 999;

/// Clamps a `(width, height)` pair into the playable range, each axis on its own bounds.
pub fn clamp_size((width, height): Coord2) -> Coord2 {
    (
        width.clamp(MIN_WIDTH, MAX_WIDTH),
        height.clamp(MIN_HEIGHT, MAX_HEIGHT),
    )
}

/// Upper mine bound for a board of the given (already clamped) size.
pub const fn max_mines((width, height): Coord2) -> CellCount {
    area((width.saturating_sub(1), height.saturating_sub(1)))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl BoardConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Builds a config, clamping width to [9, 30], height to [9, 24] and mines to
    /// [10, (width - 1) * (height - 1)].
    pub fn new(size: Coord2, mines: CellCount) -> Self {
        let clamped_size = clamp_size(size);
        let clamped_mines = mines.clamp(MIN_MINES, max_mines(clamped_size));
        if clamped_size != size || clamped_mines != mines {
            log::warn!(
                "Clamped board config {:?}/{} to {:?}/{}",
                size,
                mines,
                clamped_size,
                clamped_mines
            );
        }
        Self::new_unchecked(clamped_size, clamped_mines)
    }

    pub const fn total_cells(&self) -> CellCount {
        area(self.size)
    }

    pub const fn safe_cells(&self) -> CellCount {
        self.total_cells() - self.mines
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Difficulty::Beginner.preset().unwrap_or(Self::new_unchecked(
            (MIN_WIDTH, MIN_HEIGHT),
            MIN_MINES,
        ))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
    Custom,
}

impl Difficulty {
    pub const PRESETS: [Difficulty; 3] = [Self::Beginner, Self::Intermediate, Self::Expert];

    /// Fixed board for the preset difficulties, `None` for `Custom`.
    pub const fn preset(self) -> Option<BoardConfig> {
        use Difficulty::*;
        match self {
            Beginner => Some(BoardConfig::new_unchecked((9, 9), 10)),
            Intermediate => Some(BoardConfig::new_unchecked((16, 16), 40)),
            Expert => Some(BoardConfig::new_unchecked((30, 16), 99)),
            Custom => None,
        }
    }

    /// Resolves the board for this difficulty, only `Custom` looks at `size` and `mines`.
    pub fn config(self, size: Coord2, mines: CellCount) -> BoardConfig {
        match self.preset() {
            Some(config) => config,
            None => BoardConfig::new(size, mines),
        }
    }

    pub const fn name(self) -> &'static str {
        use Difficulty::*;
        match self {
            Beginner => "beginner",
            Intermediate => "intermediate",
            Expert => "expert",
            Custom => "custom",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Beginner
    }
}
