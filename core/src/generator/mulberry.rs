/// Mulberry32, a 32-bit multiply-xorshift generator.
///
/// Board generation must agree bit for bit with browser peers, which use the
/// same algorithm, so this is kept separate from the `rand` generators used
/// for local choices.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let s = self.state;
        let mut t = (s ^ (s >> 15)).wrapping_mul(s | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// `floor(unit * bound)`, always below `bound` for a non-zero bound.
    pub fn next_below(&mut self, bound: u8) -> u8 {
        (self.next_unit() * f64::from(bound)) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_sequence() {
        // first outputs of mulberry32(0) and mulberry32(42)
        let mut rng = Mulberry32::new(0);
        assert_eq!(rng.next_u32(), 1_144_304_738);
        assert_eq!(rng.next_u32(), 1_416_247);
        let mut rng = Mulberry32::new(42);
        assert_eq!(rng.next_u32(), 2_581_720_956);
        assert_eq!(rng.next_u32(), 1_925_393_290);
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = Mulberry32::new(0xDEAD_BEEF);
        let mut b = Mulberry32::new(0xDEAD_BEEF);
        for _ in 0..64 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn bounded_draws_stay_in_range() {
        let mut rng = Mulberry32::new(7);
        for _ in 0..1000 {
            assert!(rng.next_below(24) < 24);
            let unit = rng.next_unit();
            assert!((0.0..1.0).contains(&unit));
        }
    }
}
