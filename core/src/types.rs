use ndarray::Array2;

/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-tile counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(x, y)`.
pub type Coord2 = (Coord, Coord);

/// Milliseconds on the host clock. Every timed effect is a deadline in this unit.
pub type Millis = u64;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

pub const fn chebyshev(a: Coord2, b: Coord2) -> Coord {
    let dx = a.0.abs_diff(b.0);
    let dy = a.1.abs_diff(b.1);
    if dx > dy { dx } else { dy }
}

pub const fn manhattan(a: Coord2, b: Coord2) -> u16 {
    a.0.abs_diff(b.0) as u16 + a.1.abs_diff(b.1) as u16
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter {
        NeighborIter::new(index, dim_to_size(self.dim()))
    }
}

pub(crate) fn dim_to_size((x, y): (usize, usize)) -> Coord2 {
    (
        x.try_into().unwrap_or(Coord::MAX),
        y.try_into().unwrap_or(Coord::MAX),
    )
}

/// Neighbor offsets in row-major order, so every expansion visits the top row
/// first and the bottom row last.
const DISPLACEMENTS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
pub(crate) fn apply_delta(coords: Coord2, delta: (isize, isize), bounds: Coord2) -> Option<Coord2> {
    let (x, y) = coords;
    let (dx, dy) = delta;
    let (max_x, max_y) = bounds;

    let next_x = x.checked_add_signed(dx.try_into().ok()?)?;
    if next_x >= max_x {
        return None;
    }

    let next_y = y.checked_add_signed(dy.try_into().ok()?)?;
    if next_y >= max_y {
        return None;
    }

    Some((next_x, next_y))
}

#[derive(Debug)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    index: u8,
}

impl NeighborIter {
    pub fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            index: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if usize::from(self.index) >= DISPLACEMENTS.len() {
                return None;
            }

            let next_item =
                apply_delta(self.center, DISPLACEMENTS[self.index as usize], self.bounds);
            self.index += 1;

            if next_item.is_some() {
                return next_item;
            }
        }
    }
}

/// Tiles around `center` (itself included) with `dx² + dy² <= radius² + 1`,
/// clipped to `bounds`, in row-major order.
///
/// The `+ 1` makes the circle slightly generous: radius 1 covers the full 3×3
/// square and radius 2 adds the knight-move tiles.
pub fn iter_disc(center: Coord2, radius: u8, bounds: Coord2) -> impl Iterator<Item = Coord2> {
    let r = isize::from(radius);
    let limit = r * r + 1;
    (-r..=r).flat_map(move |dy| {
        (-r..=r).filter_map(move |dx| {
            if dx * dx + dy * dy > limit {
                return None;
            }
            apply_delta(center, (dx, dy), bounds)
        })
    })
}

/// Every coordinate of a `size` board in row-major order.
pub fn iter_coords(size: Coord2) -> impl Iterator<Item = Coord2> {
    let (x_end, y_end) = size;
    (0..y_end).flat_map(move |y| (0..x_end).map(move |x| (x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn neighbors_are_clipped_at_corners() {
        let corner: Vec<_> = NeighborIter::new((0, 0), (3, 3)).collect();
        assert_eq!(corner, [(1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn disc_of_radius_one_is_full_square() {
        assert_eq!(iter_disc((5, 5), 1, (10, 10)).count(), 9);
    }

    #[test]
    fn disc_of_radius_two_skips_far_corners() {
        let tiles: Vec<_> = iter_disc((5, 5), 2, (10, 10)).collect();
        assert_eq!(tiles.len(), 21);
        assert!(!tiles.contains(&(3, 3)));
        assert!(tiles.contains(&(4, 3)));
        assert_eq!(tiles.first(), Some(&(4, 3)));
    }

    #[test]
    fn disc_of_radius_three_counts() {
        assert_eq!(iter_disc((10, 10), 3, (24, 24)).count(), 37);
    }

    #[test]
    fn coords_are_row_major() {
        let coords: Vec<_> = iter_coords((2, 2)).collect();
        assert_eq!(coords, [(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn distances() {
        assert_eq!(chebyshev((0, 0), (2, 1)), 2);
        assert_eq!(manhattan((0, 0), (2, 1)), 3);
    }
}
