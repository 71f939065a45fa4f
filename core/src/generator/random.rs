use super::*;

/// Uniformly random mine placement by rejection sampling: pick any cell, retry when it
/// already holds a mine.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomLayoutGenerator {
    seed: u64,
}

impl RandomLayoutGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl LayoutGenerator for RandomLayoutGenerator {
    fn generate(self, config: BoardConfig) -> MineLayout {
        use ndarray::Array2;
        use rand::prelude::*;

        let (width, height) = config.size;
        let mut mines: Array2<bool> = Array2::default(config.size.to_nd_index());

        // bounded config always leaves a free cell, guard against unchecked ones
        let mines_wanted = config.mines.min(config.total_cells());
        if mines_wanted != config.mines {
            log::warn!(
                "Minefield cannot fit {} mines, placing {} instead",
                config.mines,
                mines_wanted
            );
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut mines_placed: CellCount = 0;
        while mines_placed < mines_wanted {
            let coords: Coord2 = (rng.random_range(0..width), rng.random_range(0..height));
            let slot = &mut mines[coords.to_nd_index()];
            if !*slot {
                *slot = true;
                mines_placed += 1;
            }
        }

        log::debug!(
            "Generated {}x{} layout with {} mines (seed {})",
            width,
            height,
            mines_placed,
            self.seed
        );
        MineLayout::from_mine_mask_unchecked(mines)
    }
}
