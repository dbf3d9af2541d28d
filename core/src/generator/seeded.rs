use ndarray::Array2;

use super::*;
use crate::rules::SPAWN_CLEARANCE;

/// Places mines one at a time from a [`Mulberry32`] stream, never within
/// [`SPAWN_CLEARANCE`] of either spawn. Two peers with the same seed and
/// config get the same board.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SeededGenerator {
    seed: u32,
}

impl SeededGenerator {
    pub const fn new(seed: u32) -> Self {
        Self { seed }
    }
}

impl MinefieldGenerator for SeededGenerator {
    fn generate(self, config: &GameConfig) -> MineLayout {
        let size = config.size;
        let spawns = PlayerId::ALL.map(|player| config.spawn(player));
        let near_spawn =
            |coords: Coord2| spawns.iter().any(|&spawn| chebyshev(coords, spawn) <= SPAWN_CLEARANCE);

        let free_tiles = iter_coords(size).filter(|&coords| !near_spawn(coords)).count();
        let requested = config.mine_count();
        let mine_count = if usize::from(requested) > free_tiles {
            log::warn!(
                "Minefield too small, requested {} mines but only {} tiles are away from the spawns",
                requested,
                free_tiles
            );
            free_tiles
        } else {
            usize::from(requested)
        };

        let mut rng = Mulberry32::new(self.seed);
        let mut mines: Array2<bool> = Array2::default(size.to_nd_index());
        let mut placed = 0;
        while placed < mine_count {
            let x = rng.next_below(size.0);
            let y = rng.next_below(size.1);
            if near_spawn((x, y)) || mines[(x, y).to_nd_index()] {
                continue;
            }
            mines[(x, y).to_nd_index()] = true;
            placed += 1;
        }

        log::debug!("Generated {}x{} board with {} mines from seed {}", size.0, size.1, placed, self.seed);
        MineLayout::from_mine_mask(mines)
    }
}
