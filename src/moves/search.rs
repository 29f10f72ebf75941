//! Distance-limited Dijkstra over the 8-neighbor grid.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::board::GridSize;

/// Distance reported for tiles the search never reached.
pub const UNREACHABLE: u32 = u32::MAX;

/// Answers whether a tile may be entered during a search.
pub trait Passability {
    /// True if the search may step onto `index`.
    fn is_stepable(&self, index: usize) -> bool;
}

impl<F> Passability for F
where
    F: Fn(usize) -> bool,
{
    fn is_stepable(&self, index: usize) -> bool {
        self(index)
    }
}

/// Minimum step count from `source` to every tile.
///
/// A tile belongs to the search graph if it is stepable or is the source itself, so a blocking
/// occupant on the source never stops the search from leaving it. Nodes whose distance is not
/// below `cutoff` are reported but not expanded. Pass `u32::MAX` for an unbounded search.
#[must_use]
pub fn distances<P: Passability + ?Sized>(
    source: usize,
    cutoff: u32,
    size: GridSize,
    stepable: &P,
) -> Vec<u32> {
    let mut dist = vec![UNREACHABLE; size.len()];
    if source >= size.len() {
        return dist;
    }
    // Membership is decided lazily and at most once per tile
    let mut included: Vec<Option<bool>> = vec![None; size.len()];
    included[source] = Some(true);

    dist[source] = 0;
    let mut heap = BinaryHeap::new();
    heap.push(Reverse((0u32, source)));

    while let Some(Reverse((d, index))) = heap.pop() {
        if d != dist[index] || d >= cutoff {
            continue;
        }
        for neighbor in size.neighbors(index).into_iter().flatten() {
            let member = *included[neighbor].get_or_insert_with(|| stepable.is_stepable(neighbor));
            if !member {
                continue;
            }
            let next = d + 1;
            if next < dist[neighbor] {
                dist[neighbor] = next;
                heap.push(Reverse((next, neighbor)));
            }
        }
    }

    dist
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_grid_is_chebyshev() {
        let size = GridSize::new(7, 7);
        let source = size.index(3, 3);
        let dist = distances(source, u32::MAX, size, &|_: usize| true);
        for index in 0..size.len() {
            assert_eq!(dist[index] as usize, size.chebyshev(source, index));
        }
    }

    #[test]
    fn test_cutoff_freezes_frontier() {
        let size = GridSize::new(7, 1);
        let dist = distances(0, 2, size, &|_: usize| true);
        assert_eq!(&dist[..4], &[0, 1, 2, UNREACHABLE]);
    }

    #[test]
    fn test_blocked_source_still_expands() {
        let size = GridSize::new(3, 1);
        // Source tile itself is not stepable
        let dist = distances(0, u32::MAX, size, &|i: usize| i != 0);
        assert_eq!(dist, vec![0, 1, 2]);
    }

    #[test]
    fn test_wall_forces_detour() {
        // . # .
        // . # .
        // . . .
        let size = GridSize::new(3, 3);
        let wall = [1, 4];
        let dist = distances(0, u32::MAX, size, &|i: usize| !wall.contains(&i));
        assert_eq!(dist[2], 4);
        assert_eq!(dist[1], UNREACHABLE);
    }

    #[test]
    fn test_isolated_source() {
        let size = GridSize::new(4, 4);
        let dist = distances(5, u32::MAX, size, &|_: usize| false);
        assert_eq!(dist[5], 0);
        assert!(dist.iter().enumerate().all(|(i, &d)| i == 5 || d == UNREACHABLE));
    }
}
