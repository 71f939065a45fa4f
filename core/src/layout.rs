use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Where the mines are, as a `width x height` boolean matrix indexed by `(x, y)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

impl MineLayout {
    /// Takes a mask as is, without clamping its size.
    pub(crate) fn from_mine_mask_unchecked(mine_mask: Array2<bool>) -> Self {
        let mine_count = mine_mask
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX);
        Self {
            mine_mask,
            mine_count,
        }
    }

    /// Builds a layout from an explicit mask, clamping its size to the playable range.
    ///
    /// Rows or columns cut by the clamp lose their mines, added ones are empty. The mines
    /// left over must fall in `[MIN_MINES, max_mines(size)]`.
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Result<Self> {
        let size = array_size(&mine_mask);
        let clamped = clamp_size(size);
        let layout = if clamped == size {
            Self::from_mine_mask_unchecked(mine_mask)
        } else {
            log::warn!("Clamped mine layout size from {:?} to {:?}", size, clamped);
            let mut resized: Array2<bool> = Array2::default(clamped.to_nd_index());
            for (coords, &is_mine) in mine_mask.indexed_iter() {
                if let Some(slot) = resized.get_mut(coords) {
                    *slot = is_mine;
                }
            }
            Self::from_mine_mask_unchecked(resized)
        };

        if layout.mine_count < MIN_MINES {
            Err(GameError::TooFewMines)
        } else if layout.mine_count > max_mines(clamped) {
            Err(GameError::TooManyMines)
        } else {
            Ok(layout)
        }
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Self::from_mine_mask(mine_mask)
    }

    /// Any mine count, for boards that exercise a handful of mines.
    #[cfg(test)]
    pub(crate) fn with_mines(size: Coord2, mine_coords: &[Coord2]) -> Self {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());
        for &coords in mine_coords {
            mine_mask[coords.to_nd_index()] = true;
        }
        Self::from_mine_mask_unchecked(mine_mask)
    }

    pub fn config(&self) -> BoardConfig {
        BoardConfig::new_unchecked(self.size(), self.mine_count)
    }

    pub fn size(&self) -> Coord2 {
        array_size(&self.mine_mask)
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn total_cells(&self) -> CellCount {
        self.mine_mask.len().try_into().unwrap_or(CellCount::MAX)
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        self.iter_neighbors(coords).filter(|&pos| self[pos]).count() as u8
    }

    /// Mine positions in row-major order.
    pub fn iter_mines(&self) -> impl Iterator<Item = Coord2> + '_ {
        iter_row_major(self.size()).filter(|&pos| self[pos])
    }

    pub(crate) fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.mine_mask.iter_neighbors(coords)
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, (x, y): Coord2) -> &Self::Output {
        &self.mine_mask[(x as usize, y as usize)]
    }
}
