use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::*;
use crate::*;

/// One revealed clue: `remaining_mines` of `unknowns` are mines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueEquation {
    pub clue: Coord2,
    pub unknowns: SmallVec<[Coord2; 8]>,
    pub remaining_mines: i16,
}

impl ClueEquation {
    /// The clue's count exceeds its hidden neighbors, or known mines exceed
    /// the count. Only reachable through an inconsistent observation.
    pub fn is_contradiction(&self) -> bool {
        self.remaining_mines < 0 || self.remaining_mines as usize > self.unknowns.len()
    }
}

/// Equations for every non-zero clue, row-major. Known mines around a clue are
/// subtracted from its count; known-safe tiles are left out.
pub fn build_constraints(obs: &Observation) -> Vec<ClueEquation> {
    let mut equations = Vec::new();

    for clue in iter_coords(obs.size) {
        let ObservedCell::Clue(count) = obs.cell(clue) else {
            continue;
        };
        if count == 0 {
            continue;
        }

        let mut remaining_mines = i16::from(count);
        let mut unknowns: SmallVec<[Coord2; 8]> = SmallVec::new();
        for neighbor in obs.cells.iter_neighbors(clue) {
            match obs.cell(neighbor) {
                ObservedCell::KnownMine => remaining_mines -= 1,
                ObservedCell::Unknown => unknowns.push(neighbor),
                ObservedCell::Clue(_) | ObservedCell::KnownSafe => {}
            }
        }

        if unknowns.is_empty() {
            continue;
        }
        equations.push(ClueEquation {
            clue,
            unknowns,
            remaining_mines,
        });
    }

    equations
}

/// Tiles proven to be mines or safe by single clues.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deductions {
    pub mines: BTreeSet<Coord2>,
    pub safe: BTreeSet<Coord2>,
}

impl Deductions {
    pub fn is_empty(&self) -> bool {
        self.mines.is_empty() && self.safe.is_empty()
    }
}

/// Single-point deduction: a clue whose remaining count equals its unknown
/// neighbors makes them all mines; a clue with nothing remaining makes them
/// all safe.
pub fn deduce(obs: &Observation) -> Deductions {
    let mut deductions = Deductions::default();

    for equation in build_constraints(obs) {
        if equation.is_contradiction() {
            log::trace!("Skipping inconsistent clue at {:?}", equation.clue);
            continue;
        }
        let remaining = equation.remaining_mines as usize;
        if remaining == equation.unknowns.len() {
            deductions.mines.extend(equation.unknowns);
        } else if remaining == 0 {
            deductions.safe.extend(equation.unknowns);
        }
    }

    deductions
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn observation(size: Coord2, cells: &[(Coord2, ObservedCell)]) -> Observation {
        let mut grid = Array2::from_elem(size.to_nd_index(), ObservedCell::Unknown);
        for &(coords, cell) in cells {
            grid[coords.to_nd_index()] = cell;
        }
        Observation { size, cells: grid }
    }

    #[test]
    fn builds_equation_from_clue() {
        let obs = observation((2, 2), &[((1, 1), ObservedCell::Clue(1))]);

        let equations = build_constraints(&obs);

        assert_eq!(equations.len(), 1);
        assert_eq!(equations[0].clue, (1, 1));
        assert_eq!(equations[0].unknowns.as_slice(), [(0, 0), (1, 0), (0, 1)]);
        assert_eq!(equations[0].remaining_mines, 1);
    }

    #[test]
    fn saturated_clue_marks_all_unknowns_as_mines() {
        // row: ? 2 ?  with nothing else around
        let obs = observation((3, 1), &[((1, 0), ObservedCell::Clue(2))]);

        let deductions = deduce(&obs);

        assert_eq!(deductions.mines, BTreeSet::from([(0, 0), (2, 0)]));
        assert!(deductions.safe.is_empty());
    }

    #[test]
    fn satisfied_clue_marks_unknowns_safe() {
        // row: F 1 ?
        let obs = observation(
            (3, 1),
            &[((0, 0), ObservedCell::KnownMine), ((1, 0), ObservedCell::Clue(1))],
        );

        let deductions = deduce(&obs);

        assert_eq!(deductions.safe, BTreeSet::from([(2, 0)]));
        assert!(deductions.mines.is_empty());
    }

    #[test]
    fn undecided_clue_deduces_nothing() {
        let obs = observation((3, 1), &[((1, 0), ObservedCell::Clue(1))]);
        assert!(deduce(&obs).is_empty());
    }

    #[test]
    fn contradictions_are_skipped() {
        // a 1 next to two known mines
        let obs = observation(
            (3, 2),
            &[
                ((0, 0), ObservedCell::KnownMine),
                ((2, 0), ObservedCell::KnownMine),
                ((1, 0), ObservedCell::Clue(1)),
            ],
        );

        let equations = build_constraints(&obs);
        assert!(equations[0].is_contradiction());
        assert!(deduce(&obs).is_empty());
    }

    #[test]
    fn scorched_safe_tiles_are_not_unknowns() {
        let obs = observation(
            (3, 1),
            &[((0, 0), ObservedCell::KnownSafe), ((1, 0), ObservedCell::Clue(1))],
        );
        assert_eq!(deduce(&obs).mines, BTreeSet::from([(2, 0)]));
    }
}
