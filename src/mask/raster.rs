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

//! Module with methods for rasterising index-space lines and
//! polygons on the model grid.
//!
//! Sections (closing a strait, cutting a basin) are defined by a few
//! grid points and have to be turned into the full set of cells they
//! cross before they can be burned into a mask.

use crate::errors::RegionError;
use crate::mask::floodfill::flood_fill;
use crate::Float;
use ndarray::Array2;

/// Cells forming an 8-connected approximation of the straight
/// segment between two (j, i) grid points, both endpoints included.
///
/// Implements the classic error-accumulation algorithm
/// (<https://en.wikipedia.org/wiki/Bresenham%27s_line_algorithm>):
/// for steep segments the axis roles are swapped, endpoints are then
/// normalised by column, and the row is stepped by one whenever the
/// accumulated fractional error crosses one half.
///
/// Note that because of the normalisation the returned cells may run
/// from `end` to `start`; [`polyline_cells`] reorients them.
pub fn segment_cells(start: (i64, i64), end: (i64, i64)) -> Vec<(i64, i64)> {
    let (mut x0, mut y0) = (start.1, start.0);
    let (mut x1, mut y1) = (end.1, end.0);

    let steep = (y1 - y0).abs() > (x1 - x0).abs();

    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }

    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }

    let deltax = (x1 - x0) as Float;
    let deltay = ((y1 - y0).abs()) as Float;
    let deltaerr = deltay / deltax;
    let ystep = if y0 < y1 { 1 } else { -1 };

    let mut error = 0.0;
    let mut y = y0;
    let mut cells = Vec::with_capacity((x1 - x0 + 1) as usize);

    for x in x0..=x1 {
        if steep {
            cells.push((x, y));
        } else {
            cells.push((y, x));
        }

        error += deltaerr;
        if error >= 0.5 {
            y += ystep;
            error -= 1.0;
        }
    }

    cells
}

/// Cells of the rasterised polyline joining the given (j, i)
/// vertices in order.
///
/// Each segment is reoriented to continue from the end of the
/// previous one and the repeated junction cell is dropped, so the
/// output walks the polyline without jumping back. A single vertex is
/// returned unchanged.
pub fn polyline_cells(vertices: &[(i64, i64)]) -> Vec<(i64, i64)> {
    if vertices.len() <= 1 {
        return vertices.to_vec();
    }

    let mut line: Vec<(i64, i64)> = Vec::new();

    for pair in vertices.windows(2) {
        let mut segment = segment_cells(pair[0], pair[1]);

        if segment.first() != Some(&pair[0]) {
            segment.reverse();
        }

        for cell in segment {
            if line.last() != Some(&cell) {
                line.push(cell);
            }
        }
    }

    line
}

/// Grid cells strictly inside the polygon defined by the given
/// (j, i) vertices, on a grid of the given (nj, ni) shape.
///
/// The polygon is closed if it is not already, its boundary is
/// rasterised with [`polyline_cells`] and the exterior is flooded
/// from the first array corner not lying on the boundary. Whatever
/// the flood did not reach, minus the boundary itself, is the
/// interior.
///
/// Vertices outside the grid are rejected, as is a polygon touching
/// all four corners (no exterior seed is left to flood from).
pub fn polygon_interior(
    vertices: &[(i64, i64)],
    shape: (usize, usize),
) -> Result<Vec<(usize, usize)>, RegionError> {
    if vertices.is_empty() {
        return Ok(vec![]);
    }

    let (nj, ni) = shape;

    for &(j, i) in vertices {
        if j < 0 || i < 0 || j >= nj as i64 || i >= ni as i64 {
            return Err(RegionError::VertexOutsideGrid(j, i));
        }
    }

    let mut closed = vertices.to_vec();
    if closed.first() != closed.last() {
        closed.push(closed[0]);
    }

    let boundary = polyline_cells(&closed);

    let mut map = Array2::<Float>::zeros((nj, ni));
    for &(j, i) in &boundary {
        map[[j as usize, i as usize]] = 1.0;
    }

    let corners = [(0, 0), (0, ni - 1), (nj - 1, 0), (nj - 1, ni - 1)];
    let seed = corners
        .into_iter()
        .find(|&(j, i)| map[[j, i]] == 0.0)
        .ok_or(RegionError::NoExteriorCorner)?;

    let exterior = flood_fill(map.view(), seed, 1.0, 1.0);

    let interior = exterior
        .indexed_iter()
        .filter(|&(_, &value)| value == 0.0)
        .map(|(index, _)| index)
        .collect();

    Ok(interior)
}
