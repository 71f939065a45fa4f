use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// The grid of cells for one game.
///
/// Every non-mine cell's number equals the count of mines around it, mine placement only
/// changes through [`Board::relocate_mine`] which keeps that true.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
    mine_count: CellCount,
    triggered_mine: Option<Coord2>,
    /// Cells touched since the last [`Board::take_changes`], in mutation order.
    #[serde(skip)]
    changes: Vec<Coord2>,
}

impl Board {
    pub fn new(layout: &MineLayout) -> Self {
        let cells = Array2::from_shape_fn(layout.size().to_nd_index(), |(x, y)| {
            let coords = (x as Coord, y as Coord);
            if layout.contains_mine(coords) {
                Cell::new(Content::Mine)
            } else {
                Cell::new(Content::Number(layout.adjacent_mine_count(coords)))
            }
        });
        Self {
            cells,
            mine_count: layout.mine_count(),
            triggered_mine: None,
            changes: Vec::new(),
        }
    }

    pub fn size(&self) -> Coord2 {
        array_size(&self.cells)
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn total_cells(&self) -> CellCount {
        area(self.size())
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn cells(&self) -> &Array2<Cell> {
        &self.cells
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn cell(&self, coords: Coord2) -> Result<Cell> {
        let coords = self.validate_coords(coords)?;
        Ok(self[coords])
    }

    pub fn tile_at(&self, coords: Coord2) -> Result<Tile> {
        Ok(self.cell(coords)?.tile())
    }

    pub fn neighbors_of(&self, coords: Coord2) -> Result<NeighborIter> {
        let coords = self.validate_coords(coords)?;
        Ok(self.iter_neighbors(coords))
    }

    /// Number of cells currently carrying a flag.
    pub fn flagged_count(&self) -> CellCount {
        self.cells.iter().filter(|cell| cell.is_flagged()).count() as CellCount
    }

    /// Mines minus flags, negative when over-flagged.
    pub fn remaining_mines(&self) -> isize {
        (self.mine_count as isize) - (self.flagged_count() as isize)
    }

    /// Current mine placement, e.g. for exporting a level.
    pub fn mine_layout(&self) -> MineLayout {
        MineLayout::from_mine_mask_unchecked(self.cells.map(Cell::is_mine))
    }

    /// Drains the coordinates of cells that changed, oldest first.
    pub fn take_changes(&mut self) -> Vec<Coord2> {
        core::mem::take(&mut self.changes)
    }

    /// Cycles the mark of a closed cell. Open cells are left alone.
    pub fn cycle_mark(&mut self, coords: Coord2, marking: bool) -> Result<MarkOutcome> {
        let coords = self.validate_coords(coords)?;
        Ok(match self.cells[coords.to_nd_index()].cycle_mark(marking) {
            Some(mark) => {
                log::trace!("Marked cell at {:?} as {:?}", coords, mark);
                self.changes.push(coords);
                MarkOutcome::Changed
            }
            None => MarkOutcome::NoChange,
        })
    }

    /// Opens a cell, flood-filling from zeros. Opening a mine force-reveals every other
    /// mine and every marked cell.
    pub fn open(&mut self, coords: Coord2, kind: OpenKind) -> Result<RevealOutcome> {
        let coords = self.validate_coords(coords)?;
        Ok(self.open_all(VecDeque::from([(coords, kind)])))
    }

    /// Opens every neighbor that is not open yet when the flags around an open number
    /// account for all of its mines. Flagged neighbors stay as they are.
    pub fn chord(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.validate_coords(coords)?;

        let Visibility::Open(Reveal::Number(count)) = self[coords].visibility() else {
            return Ok(RevealOutcome::NoChange);
        };
        if count != self.count_flagged_neighbors(coords) {
            return Ok(RevealOutcome::NoChange);
        }

        log::debug!("Chord at {:?} on {}", coords, count);
        let to_visit = self
            .iter_neighbors(coords)
            .filter(|&pos| !self[pos].is_open())
            .map(|pos| (pos, OpenKind::Cascade))
            .collect();
        Ok(self.open_all(to_visit))
    }

    fn open_all(&mut self, mut to_visit: VecDeque<(Coord2, OpenKind)>) -> RevealOutcome {
        let mut outcome = RevealOutcome::NoChange;

        // every cell opens at most once, so this drains after at most one pass per cell
        while let Some((visit_coords, kind)) = to_visit.pop_front() {
            let Some(reveal) = self.cells[visit_coords.to_nd_index()].open(kind) else {
                continue;
            };
            self.changes.push(visit_coords);

            match reveal {
                Reveal::Exploded | Reveal::Mine => {
                    log::debug!("Mine opened at {:?} ({:?})", visit_coords, kind);
                    self.triggered_mine.get_or_insert(visit_coords);
                    outcome = outcome | RevealOutcome::HitMine;
                }
                Reveal::Number(count) => {
                    log::trace!("Opened cell at {:?}, mine count: {}", visit_coords, count);
                    outcome = outcome | RevealOutcome::Revealed;
                    if count == 0 {
                        to_visit.extend(
                            self.iter_neighbors(visit_coords)
                                .filter(|&pos| {
                                    let cell = self[pos];
                                    !cell.is_open() && !cell.is_flagged()
                                })
                                .map(|pos| (pos, OpenKind::Cascade)),
                        );
                    }
                }
                Reveal::IncorrectFlag => {}
            }
        }

        if outcome == RevealOutcome::HitMine {
            self.reveal_mines();
        }
        outcome
    }

    /// End-of-game pass: opens every closed mine and every marked cell.
    ///
    /// Wrong flags turn into [`Tile::IncorrectFlag`], `?` cells show their number.
    fn reveal_mines(&mut self) {
        for coords in iter_row_major(self.size()) {
            let cell = &mut self.cells[coords.to_nd_index()];
            let marked = matches!(cell.mark(), Some(Mark::Flagged | Mark::Marked));
            let wanted = (cell.is_mine() && !cell.is_open()) || marked;
            if wanted && cell.open(OpenKind::Forced).is_some() {
                self.changes.push(coords);
            }
        }
    }

    /// Flags every mine that is not flagged yet, used once a game is won.
    pub fn flag_all_mines(&mut self) {
        for coords in iter_row_major(self.size()) {
            let cell = &mut self.cells[coords.to_nd_index()];
            if cell.is_mine() && cell.auto_flag() {
                self.changes.push(coords);
            }
        }
    }

    /// Moves the mine at `coords` to the first cell without a mine in row-major order and
    /// patches the numbers around both cells.
    ///
    /// Returns where the mine went, `None` if `coords` had no mine or no free cell exists.
    pub fn relocate_mine(&mut self, coords: Coord2) -> Result<Option<Coord2>> {
        let coords = self.validate_coords(coords)?;
        if !self[coords].is_mine() {
            return Ok(None);
        }

        let Some(target) = iter_row_major(self.size()).find(|&pos| !self[pos].is_mine()) else {
            log::warn!("No free cell to relocate the mine at {:?} to", coords);
            return Ok(None);
        };

        self.cells[target.to_nd_index()].set_content(Content::Mine);
        for pos in self.iter_neighbors(target) {
            let cell = &mut self.cells[pos.to_nd_index()];
            if let Content::Number(count) = cell.content() {
                cell.set_content(Content::Number(count + 1));
            }
        }

        let count = self.count_mine_neighbors(coords);
        self.cells[coords.to_nd_index()].set_content(Content::Number(count));
        for pos in self.iter_neighbors(coords) {
            let cell = &mut self.cells[pos.to_nd_index()];
            if let Content::Number(count) = cell.content() {
                cell.set_content(Content::Number(count.saturating_sub(1)));
            }
        }

        log::debug!("Relocated mine from {:?} to {:?}", coords, target);
        self.changes.push(coords);
        self.changes.push(target);
        Ok(Some(target))
    }

    /// Classifies the board: any open mine loses, all safe cells open wins.
    pub fn finished_state(&self) -> Finished {
        let mut opened: CellCount = 0;
        for cell in self.cells.iter() {
            match cell.visibility() {
                Visibility::Open(Reveal::Exploded | Reveal::Mine) => return Finished::Lost,
                Visibility::Open(Reveal::Number(_)) => opened += 1,
                _ => {}
            }
        }

        if opened == self.safe_cell_count() {
            Finished::Won
        } else {
            Finished::Ongoing
        }
    }

    fn count_flagged_neighbors(&self, coords: Coord2) -> u8 {
        self.iter_neighbors(coords)
            .filter(|&pos| self[pos].is_flagged())
            .count() as u8
    }

    fn count_mine_neighbors(&self, coords: Coord2) -> u8 {
        self.iter_neighbors(coords)
            .filter(|&pos| self[pos].is_mine())
            .count() as u8
    }

    fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }
}

impl Index<Coord2> for Board {
    type Output = Cell;

    fn index(&self, (x, y): Coord2) -> &Self::Output {
        &self.cells[(x as usize, y as usize)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(mines: &[Coord2]) -> Board {
        Board::new(&MineLayout::with_mines((9, 9), mines))
    }

    /// Brute-force check of the mine count and every number.
    fn assert_numbers_consistent(board: &Board) {
        let mut mines = 0;
        for coords in iter_row_major(board.size()) {
            match board[coords].content() {
                Content::Mine => mines += 1,
                Content::Number(count) => {
                    let actual = NeighborIter::new(coords, board.size())
                        .filter(|&pos| board[pos].is_mine())
                        .count();
                    assert_eq!(count as usize, actual, "number at {:?}", coords);
                }
            }
        }
        assert_eq!(mines, board.mine_count());
    }

    fn open_set(board: &Board) -> Vec<Coord2> {
        iter_row_major(board.size())
            .filter(|&pos| board[pos].is_open())
            .collect()
    }

    #[test]
    fn random_boards_have_consistent_numbers() {
        for seed in 0..10 {
            for &(size, mines) in &[((9, 9), 10), ((16, 16), 40), ((30, 16), 99), ((30, 24), 667)] {
                let config = BoardConfig::new(size, mines);
                let layout = RandomLayoutGenerator::new(seed).generate(config);
                let board = Board::new(&layout);
                assert_eq!(board.mine_count(), config.mines);
                assert_numbers_consistent(&board);
            }
        }
    }

    #[test]
    fn neighbors_of_rejects_out_of_bounds() {
        let board = board(&[(0, 0)]);
        assert_eq!(board.neighbors_of((0, 0)).unwrap().count(), 3);
        assert_eq!(board.neighbors_of((4, 0)).unwrap().count(), 5);
        assert_eq!(board.neighbors_of((4, 4)).unwrap().count(), 8);
        assert_eq!(
            board.neighbors_of((9, 0)).map(|_| ()),
            Err(GameError::InvalidCoords)
        );
        assert_eq!(board.cell((0, 9)), Err(GameError::InvalidCoords));
    }

    #[test]
    fn flood_fill_stops_at_numbers() {
        let mut board = board(&[(0, 0)]);

        let outcome = board.open((8, 8), OpenKind::Direct).unwrap();

        assert_eq!(outcome, RevealOutcome::Revealed);
        assert!(!board[(0, 0)].is_open());
        assert_eq!(board[(1, 1)].tile(), Tile::Open(1));
        assert_eq!(board[(8, 8)].tile(), Tile::Open(0));
        assert_eq!(open_set(&board).len(), 80);
        assert_eq!(board.finished_state(), Finished::Won);
    }

    #[test]
    fn flood_fill_is_idempotent() {
        let mines = [(4, 0), (4, 1), (4, 2), (4, 3), (4, 4), (4, 5), (4, 6), (4, 7), (4, 8), (8, 8)];
        let mut once = board(&mines);
        once.open((0, 4), OpenKind::Direct).unwrap();

        let mut twice = once.clone();
        assert_eq!(
            twice.open((0, 4), OpenKind::Direct).unwrap(),
            RevealOutcome::NoChange
        );

        assert_eq!(open_set(&once), open_set(&twice));
        assert_eq!(open_set(&once).len(), 4 * 9);
        assert!(!once[(5, 4)].is_open());
    }

    #[test]
    fn flood_fill_skips_flags() {
        let mut board = board(&[(8, 8)]);
        board.cycle_mark((3, 3), true).unwrap();

        board.open((0, 0), OpenKind::Direct).unwrap();

        assert_eq!(board[(3, 3)].tile(), Tile::Flag);
        assert_eq!(board.finished_state(), Finished::Ongoing);
    }

    #[test]
    fn flagged_cell_rejects_direct_open() {
        let mut board = board(&[(8, 8)]);
        board.cycle_mark((0, 0), true).unwrap();

        let outcome = board.open((0, 0), OpenKind::Direct).unwrap();

        assert_eq!(outcome, RevealOutcome::NoChange);
        assert!(board.take_changes().iter().all(|&pos| pos == (0, 0)));
        assert!(open_set(&board).is_empty());
    }

    #[test]
    fn opening_mine_reveals_all_mines_and_wrong_flags() {
        let mut board = board(&[(0, 0), (8, 8), (4, 4)]);
        board.cycle_mark((8, 8), true).unwrap();
        board.cycle_mark((2, 2), true).unwrap();

        let outcome = board.open((0, 0), OpenKind::Direct).unwrap();

        assert_eq!(outcome, RevealOutcome::HitMine);
        assert_eq!(board.triggered_mine(), Some((0, 0)));
        assert_eq!(board[(0, 0)].tile(), Tile::Exploded);
        assert_eq!(board[(4, 4)].tile(), Tile::Mine);
        assert_eq!(board[(8, 8)].tile(), Tile::Flag);
        assert_eq!(board[(2, 2)].tile(), Tile::IncorrectFlag);
        assert_eq!(board[(1, 1)].tile(), Tile::Closed);
        assert_eq!(board.finished_state(), Finished::Lost);
    }

    #[test]
    fn question_marked_cells_open_after_a_loss() {
        let mut board = board(&[(0, 0), (4, 4)]);
        board.cycle_mark((4, 4), true).unwrap();
        board.cycle_mark((4, 4), true).unwrap();
        board.cycle_mark((3, 3), true).unwrap();
        board.cycle_mark((3, 3), true).unwrap();
        assert_eq!(board[(3, 3)].tile(), Tile::Question);
        board.take_changes();

        board.open((0, 0), OpenKind::Direct).unwrap();

        assert_eq!(board[(3, 3)].tile(), Tile::Open(1));
        assert_eq!(board[(4, 4)].tile(), Tile::Mine);
        assert_eq!(board[(5, 5)].tile(), Tile::Closed);
        let changes = board.take_changes();
        assert!(changes.contains(&(3, 3)));
        assert_eq!(changes.len(), 3);
    }

    #[test]
    fn chord_opens_unflagged_neighbors_only() {
        let mut board = board(&[(0, 1), (2, 1), (8, 8)]);
        board.open((1, 1), OpenKind::Direct).unwrap();
        board.cycle_mark((0, 1), true).unwrap();
        board.cycle_mark((2, 1), true).unwrap();

        let outcome = board.chord((1, 1)).unwrap();

        assert_eq!(outcome, RevealOutcome::Revealed);
        assert_eq!(board[(0, 1)].tile(), Tile::Flag);
        assert_eq!(board[(2, 1)].tile(), Tile::Flag);
        for pos in [(0, 0), (1, 0), (2, 0), (0, 2), (1, 2), (2, 2)] {
            assert!(board[pos].is_open(), "{:?} should be open", pos);
        }
    }

    #[test]
    fn chord_needs_matching_flag_count() {
        let mut board = board(&[(0, 1), (2, 1), (8, 8)]);
        board.open((1, 1), OpenKind::Direct).unwrap();
        board.cycle_mark((0, 1), true).unwrap();

        assert_eq!(board.chord((1, 1)).unwrap(), RevealOutcome::NoChange);
        assert!(!board[(1, 0)].is_open());
        assert_eq!(board.chord((5, 5)).unwrap(), RevealOutcome::NoChange);
    }

    #[test]
    fn chord_with_wrong_flag_hits_mine() {
        let mut board = board(&[(0, 1), (8, 8), (7, 8)]);
        board.open((1, 1), OpenKind::Direct).unwrap();
        board.cycle_mark((2, 2), true).unwrap();

        let outcome = board.chord((1, 1)).unwrap();

        assert_eq!(outcome, RevealOutcome::HitMine);
        assert_eq!(board[(0, 1)].tile(), Tile::Mine);
        assert_eq!(board[(2, 2)].tile(), Tile::IncorrectFlag);
        assert_eq!(board.triggered_mine(), Some((0, 1)));
        assert_eq!(board.finished_state(), Finished::Lost);
    }

    #[test]
    fn relocation_keeps_numbers_consistent() {
        let mut board = board(&[(0, 0), (1, 0), (3, 3), (4, 4)]);

        let target = board.relocate_mine((3, 3)).unwrap();

        assert_eq!(target, Some((2, 0)));
        assert!(!board[(3, 3)].is_mine());
        assert!(board[(2, 0)].is_mine());
        assert_eq!(board[(3, 3)].content(), Content::Number(1));
        assert_numbers_consistent(&board);
    }

    #[test]
    fn relocation_next_to_origin_stays_consistent() {
        let mut board = board(&[(0, 0)]);

        assert_eq!(board.relocate_mine((0, 0)).unwrap(), Some((1, 0)));
        assert_eq!(board[(0, 0)].content(), Content::Number(1));
        assert_numbers_consistent(&board);
    }

    #[test]
    fn relocation_ignores_safe_cells() {
        let mut board = board(&[(0, 0)]);
        assert_eq!(board.relocate_mine((5, 5)).unwrap(), None);
        assert_numbers_consistent(&board);
    }

    #[test]
    fn relocation_without_free_cell_is_noop() {
        let mask = Array2::from_elem([9, 9], true);
        let mut board = Board::new(&MineLayout::from_mine_mask_unchecked(mask));
        assert_eq!(board.relocate_mine((4, 4)).unwrap(), None);
        assert!(board[(4, 4)].is_mine());
    }

    #[test]
    fn remaining_mines_follow_flags() {
        let mut board = board(&[(0, 0)]);
        assert_eq!(board.remaining_mines(), 1);
        board.cycle_mark((0, 0), false).unwrap();
        board.cycle_mark((1, 1), false).unwrap();
        assert_eq!(board.remaining_mines(), -1);
        board.cycle_mark((1, 1), false).unwrap();
        assert_eq!(board.remaining_mines(), 0);
    }

    #[test]
    fn flag_all_mines_leaves_open_cells() {
        let mut board = board(&[(0, 0), (8, 8)]);
        board.cycle_mark((8, 8), true).unwrap();
        board.take_changes();

        board.flag_all_mines();

        assert_eq!(board[(0, 0)].tile(), Tile::Flag);
        assert_eq!(board.take_changes(), vec![(0, 0)]);
        assert_eq!(board.remaining_mines(), 0);
    }

    #[test]
    fn exported_layout_matches_board() {
        let layout = MineLayout::with_mines((12, 10), &[(0, 0), (11, 9), (5, 3)]);
        let board = Board::new(&layout);
        assert_eq!(board.mine_layout(), layout);
    }

    #[test]
    fn board_serializes_without_pending_changes() {
        let mut board = board(&[(0, 0)]);
        board.open((8, 8), OpenKind::Direct).unwrap();

        let json = serde_json::to_string(&board).unwrap();
        let restored: Board = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.cells(), board.cells());
        assert_eq!(restored.finished_state(), Finished::Won);
    }
}
