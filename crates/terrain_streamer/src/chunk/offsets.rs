//! Radius-sorted chunk offset tables.
//!
//! Built once per radius and re-centred on the reference chunk each cycle, so
//! the circular footprint is never recomputed per tick.

use super::coord::ChunkCoord;

/// Every integer offset `(dx, dz)` with `dx² + dz² <= radius²`, sorted by
/// squared distance from the origin.
#[derive(Clone, Debug)]
pub struct OffsetTable {
    radius: u32,
    offsets: Vec<(i32, i32)>,
}

impl OffsetTable {
    pub fn new(radius: u32) -> Self {
        let r = radius as i32;
        let limit = radius as i64 * radius as i64;
        let mut offsets = Vec::with_capacity(Self::count_within(radius));
        for dz in -r..=r {
            for dx in -r..=r {
                if squared(dx, dz) <= limit {
                    offsets.push((dx, dz));
                }
            }
        }
        // Stable, so equal distances keep scan order
        offsets.sort_by_key(|&(dx, dz)| squared(dx, dz));
        Self { radius, offsets }
    }

    /// Number of integer points inside a disc of `radius`.
    pub fn count_within(radius: u32) -> usize {
        let r = radius as i64;
        (-r..=r)
            .map(|dz| {
                let remaining = r * r - dz * dz;
                // Largest dx with dx² <= remaining
                let mut half = (remaining as f64).sqrt() as i64;
                while half * half > remaining {
                    half -= 1;
                }
                while (half + 1) * (half + 1) <= remaining {
                    half += 1;
                }
                (2 * half + 1) as usize
            })
            .sum()
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn offsets(&self) -> &[(i32, i32)] {
        &self.offsets
    }

    /// Absolute coordinates around `center`, nearest first.
    pub fn around(&self, center: ChunkCoord) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.offsets
            .iter()
            .map(move |&(dx, dz)| center.offset(dx, dz))
    }
}

#[inline]
fn squared(dx: i32, dz: i32) -> i64 {
    dx as i64 * dx as i64 + dz as i64 * dz as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn radius_zero_is_origin_only() {
        let table = OffsetTable::new(0);
        assert_eq!(table.offsets(), &[(0, 0)]);
        assert_eq!(OffsetTable::count_within(0), 1);
    }

    #[test]
    fn radius_one_is_a_plus() {
        let table = OffsetTable::new(1);
        assert_eq!(table.len(), 5);
        assert_eq!(table.offsets()[0], (0, 0));
        let rest: HashSet<_> = table.offsets()[1..].iter().copied().collect();
        assert_eq!(rest, HashSet::from([(1, 0), (-1, 0), (0, 1), (0, -1)]));
    }

    #[test]
    fn contains_exactly_the_disc_in_order() {
        for radius in [2u32, 5, 8, 12] {
            let table = OffsetTable::new(radius);
            let r = radius as i32;
            let limit = (radius * radius) as i64;

            let expected: HashSet<(i32, i32)> = (-r..=r)
                .flat_map(|dx| (-r..=r).map(move |dz| (dx, dz)))
                .filter(|&(dx, dz)| squared(dx, dz) <= limit)
                .collect();
            let actual: HashSet<(i32, i32)> = table.offsets().iter().copied().collect();

            assert_eq!(actual, expected, "radius {radius}");
            assert_eq!(table.len(), expected.len(), "duplicates at radius {radius}");
            assert_eq!(table.len(), OffsetTable::count_within(radius));

            for pair in table.offsets().windows(2) {
                assert!(squared(pair[0].0, pair[0].1) <= squared(pair[1].0, pair[1].1));
            }
        }
    }

    #[test]
    fn around_recentres() {
        let table = OffsetTable::new(1);
        let center = ChunkCoord::new(10, -4);
        let coords: Vec<ChunkCoord> = table.around(center).collect();
        assert_eq!(coords[0], center);
        assert!(coords.contains(&ChunkCoord::new(11, -4)));
        assert!(coords.contains(&ChunkCoord::new(10, -5)));
    }
}
