/*
Copyright 2024 tmaskgen developers

This file is part of tmaskgen.

tmaskgen is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

tmaskgen is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with tmaskgen. If not, see https://www.gnu.org/licenses/.
*/

//! Module containing the flood fill used for selecting connected
//! regions of the grid.

use crate::Float;
use ndarray::{Array2, ArrayView2};

/// Fills the 4-connected region around the seed with `fill_value`.
///
/// `boundary_value` identifies the cells delimiting the region and is
/// never overwritten. A cell already at `fill_value` stops the
/// flooding as well, so the fill cannot run in circles. All other
/// cells reachable from the seed without crossing the boundary are set
/// to `fill_value`.
///
/// The fill is iterative with an explicit work stack, as production
/// grids are far too large for a recursive version. Neighbours
/// outside the grid (and a seed outside the grid) are discarded.
///
/// The input is copied on entry, the filled copy is returned.
pub fn flood_fill(
    field: ArrayView2<Float>,
    seed: (usize, usize),
    boundary_value: Float,
    fill_value: Float,
) -> Array2<Float> {
    let mut filled = field.to_owned();
    let (nj, ni) = filled.dim();

    if seed.0 >= nj || seed.1 >= ni {
        return filled;
    }

    let mut stack = vec![seed];

    while let Some((j, i)) = stack.pop() {
        if filled[[j, i]] == boundary_value {
            continue;
        }
        if filled[[j, i]] == fill_value {
            continue;
        }

        filled[[j, i]] = fill_value;

        if i + 1 < ni {
            stack.push((j, i + 1)); // right
        }
        if i > 0 {
            stack.push((j, i - 1)); // left
        }
        if j + 1 < nj {
            stack.push((j + 1, i)); // down
        }
        if j > 0 {
            stack.push((j - 1, i)); // up
        }
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn fills_region_up_to_boundary() {
        let field = array![
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 3.0, 2.0, 1.0, 5.0, 6.0, 9.0, 0.0],
            [0.0, 0.0, 8.0, 9.0, 0.0, 0.0, 0.0, 4.0, 0.0],
            [0.0, 0.0, 8.0, 9.0, 7.0, 2.0, 3.0, 0.0, 0.0],
            [0.0, 0.0, 4.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];

        let expected = array![
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 2.0, 2.0, 1.0, 5.0, 6.0, 9.0, 0.0],
            [0.0, 0.0, 2.0, 2.0, 0.0, 0.0, 0.0, 4.0, 0.0],
            [0.0, 0.0, 2.0, 2.0, 2.0, 2.0, 3.0, 0.0, 0.0],
            [0.0, 0.0, 2.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];

        let filled = flood_fill(field.view(), (3, 4), 0.0, 2.0);

        assert_eq!(filled, expected);
    }

    #[test]
    fn refilling_a_filled_region_changes_nothing() {
        let field = array![
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 2.0, 2.0, 0.0],
            [0.0, 2.0, 2.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
        ];

        let filled = flood_fill(field.view(), (1, 1), 0.0, 2.0);

        assert_eq!(filled, field);
    }

    #[test]
    fn fill_never_escapes_a_closed_spiral() {
        // a closed ring of 1.0 walls spiralling inwards, the seed deep
        // inside and a band of untouched cells outside the ring
        let field = array![
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];

        let filled = flood_fill(field.view(), (4, 4), 1.0, 5.0);

        // everything reachable inside the ring is filled
        assert_eq!(filled[[4, 4]], 5.0);
        assert_eq!(filled[[4, 3]], 5.0);
        assert_eq!(filled[[2, 2]], 5.0);
        assert_eq!(filled[[6, 6]], 5.0);
        // the band outside the ring is never reached
        assert_eq!(filled[[0, 0]], 0.0);
        assert_eq!(filled[[4, 0]], 0.0);
        assert_eq!(filled[[8, 4]], 0.0);
        // walls are untouched
        assert_eq!(filled[[3, 3]], 1.0);
        assert_eq!(filled[[1, 1]], 1.0);
    }

    #[test]
    fn seed_outside_the_grid_is_a_no_op() {
        let field = array![[0.0, 0.0], [0.0, 0.0]];

        let filled = flood_fill(field.view(), (5, 0), 1.0, 2.0);

        assert_eq!(filled, field);
    }

    #[test]
    fn fill_stops_at_the_grid_edge() {
        let field = array![[0.0, 0.0], [0.0, 0.0]];

        let filled = flood_fill(field.view(), (0, 0), 1.0, 7.0);

        assert_eq!(filled, array![[7.0, 7.0], [7.0, 7.0]]);
    }
}
