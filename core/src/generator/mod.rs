use crate::*;
pub use mulberry::*;
pub use seeded::*;

mod mulberry;
mod seeded;

pub trait MinefieldGenerator {
    fn generate(self, config: &GameConfig) -> MineLayout;
}
