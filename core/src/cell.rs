use serde::{Deserialize, Serialize};

/// What a cell holds, independent of what the player sees.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Content {
    Mine,
    /// Count of mines among the up to 8 neighbors.
    Number(u8),
}

impl Default for Content {
    fn default() -> Self {
        Self::Number(0)
    }
}

/// Marker on a closed cell, cycled by the player.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mark {
    #[default]
    None,
    Flagged,
    Marked,
}

/// How an open cell ended up being shown.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reveal {
    Number(u8),
    /// The mine the player opened.
    Exploded,
    /// A mine opened by a cascade or the end-of-game reveal.
    Mine,
    /// A flag that turned out not to cover a mine.
    IncorrectFlag,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Closed(Mark),
    Open(Reveal),
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Closed(Mark::None)
    }
}

/// Who asked for a cell to be opened.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpenKind {
    /// The player clicked this exact cell, flags block it.
    Direct,
    /// Flood fill or chord, flagged cells are skipped.
    Cascade,
    /// End-of-game reveal, flags are checked against the mines.
    Forced,
}

/// Flat player-visible state, what renderers and listeners get.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Closed,
    Open(u8),
    Flag,
    Question,
    Exploded,
    Mine,
    IncorrectFlag,
}

impl Default for Tile {
    fn default() -> Self {
        Self::Closed
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    content: Content,
    visibility: Visibility,
}

impl Cell {
    pub const fn new(content: Content) -> Self {
        Self {
            content,
            visibility: Visibility::Closed(Mark::None),
        }
    }

    pub const fn content(&self) -> Content {
        self.content
    }

    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub const fn is_mine(&self) -> bool {
        matches!(self.content, Content::Mine)
    }

    /// `-1` for a mine, otherwise the neighbor mine count.
    pub const fn number(&self) -> i8 {
        match self.content {
            Content::Mine => -1,
            Content::Number(n) => n as i8,
        }
    }

    pub const fn is_open(&self) -> bool {
        matches!(self.visibility, Visibility::Open(_))
    }

    pub const fn mark(&self) -> Option<Mark> {
        match self.visibility {
            Visibility::Closed(mark) => Some(mark),
            Visibility::Open(_) => None,
        }
    }

    pub const fn is_flagged(&self) -> bool {
        matches!(self.visibility, Visibility::Closed(Mark::Flagged))
    }

    pub(crate) fn set_content(&mut self, content: Content) {
        self.content = content;
    }

    /// Advances the closed-cell marker: none, flag, mark (when enabled), none.
    ///
    /// Returns the new mark, `None` when the cell is open and nothing changed.
    pub(crate) fn cycle_mark(&mut self, marking: bool) -> Option<Mark> {
        let Visibility::Closed(mark) = self.visibility else {
            return None;
        };
        let next = match mark {
            Mark::None => Mark::Flagged,
            Mark::Flagged if marking => Mark::Marked,
            Mark::Flagged => Mark::None,
            Mark::Marked => Mark::None,
        };
        self.visibility = Visibility::Closed(next);
        Some(next)
    }

    /// Puts a flag on a closed, unflagged cell, used when a won game flags its mines.
    pub(crate) fn auto_flag(&mut self) -> bool {
        match self.visibility {
            Visibility::Closed(Mark::None | Mark::Marked) => {
                self.visibility = Visibility::Closed(Mark::Flagged);
                true
            }
            _ => false,
        }
    }

    /// Opens the cell once; further calls return `None`.
    ///
    /// A flagged cell only opens when forced and only if it hides no mine, and then shows
    /// as an incorrect flag. A flagged mine keeps its flag.
    pub(crate) fn open(&mut self, kind: OpenKind) -> Option<Reveal> {
        let reveal = match (self.visibility, self.content) {
            (Visibility::Open(_), _) => return None,
            (Visibility::Closed(Mark::Flagged), Content::Number(_)) if kind == OpenKind::Forced => {
                Reveal::IncorrectFlag
            }
            (Visibility::Closed(Mark::Flagged), _) => return None,
            (Visibility::Closed(_), Content::Mine) if kind == OpenKind::Direct => Reveal::Exploded,
            (Visibility::Closed(_), Content::Mine) => Reveal::Mine,
            (Visibility::Closed(_), Content::Number(count)) => Reveal::Number(count),
        };
        self.visibility = Visibility::Open(reveal);
        Some(reveal)
    }

    pub fn tile(&self) -> Tile {
        match self.visibility {
            Visibility::Closed(Mark::None) => Tile::Closed,
            Visibility::Closed(Mark::Flagged) => Tile::Flag,
            Visibility::Closed(Mark::Marked) => Tile::Question,
            Visibility::Open(Reveal::Number(count)) => Tile::Open(count),
            Visibility::Open(Reveal::Exploded) => Tile::Exploded,
            Visibility::Open(Reveal::Mine) => Tile::Mine,
            Visibility::Open(Reveal::IncorrectFlag) => Tile::IncorrectFlag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_only_once() {
        let mut cell = Cell::new(Content::Number(2));

        assert_eq!(cell.open(OpenKind::Direct), Some(Reveal::Number(2)));
        assert_eq!(cell.open(OpenKind::Direct), None);
        assert_eq!(cell.open(OpenKind::Forced), None);
        assert_eq!(cell.tile(), Tile::Open(2));
    }

    #[test]
    fn mark_cycle_with_and_without_marking() {
        let mut cell = Cell::default();
        assert_eq!(cell.cycle_mark(true), Some(Mark::Flagged));
        assert_eq!(cell.cycle_mark(true), Some(Mark::Marked));
        assert_eq!(cell.tile(), Tile::Question);
        assert_eq!(cell.cycle_mark(true), Some(Mark::None));

        assert_eq!(cell.cycle_mark(false), Some(Mark::Flagged));
        assert_eq!(cell.cycle_mark(false), Some(Mark::None));
    }

    #[test]
    fn open_cell_cannot_be_marked() {
        let mut cell = Cell::default();
        cell.open(OpenKind::Direct);
        assert_eq!(cell.cycle_mark(true), None);
        assert_eq!(cell.mark(), None);
    }

    #[test]
    fn flag_blocks_direct_and_cascade_open() {
        let mut cell = Cell::new(Content::Number(1));
        cell.cycle_mark(true);

        assert_eq!(cell.open(OpenKind::Direct), None);
        assert_eq!(cell.open(OpenKind::Cascade), None);
        assert!(cell.is_flagged());
    }

    #[test]
    fn forced_open_exposes_wrong_flag_only() {
        let mut safe = Cell::new(Content::Number(0));
        safe.cycle_mark(true);
        assert_eq!(safe.open(OpenKind::Forced), Some(Reveal::IncorrectFlag));
        assert_eq!(safe.tile(), Tile::IncorrectFlag);

        let mut mine = Cell::new(Content::Mine);
        mine.cycle_mark(true);
        assert_eq!(mine.open(OpenKind::Forced), None);
        assert_eq!(mine.tile(), Tile::Flag);
    }

    #[test]
    fn mine_reveal_depends_on_kind() {
        let mut clicked = Cell::new(Content::Mine);
        assert_eq!(clicked.open(OpenKind::Direct), Some(Reveal::Exploded));

        let mut cascaded = Cell::new(Content::Mine);
        assert_eq!(cascaded.open(OpenKind::Cascade), Some(Reveal::Mine));
    }

    #[test]
    fn marked_cell_still_opens() {
        let mut cell = Cell::new(Content::Number(3));
        cell.cycle_mark(true);
        cell.cycle_mark(true);
        assert_eq!(cell.open(OpenKind::Direct), Some(Reveal::Number(3)));
    }

    #[test]
    fn number_encodes_mine_as_negative() {
        assert_eq!(Cell::new(Content::Mine).number(), -1);
        assert_eq!(Cell::new(Content::Number(4)).number(), 4);
    }
}
