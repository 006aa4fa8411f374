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

//! Module with methods for locating positions on the curvilinear
//! model grid.
//!
//! NEMO grids are not rectilinear, so a position cannot be found by
//! bisecting the coordinate axes. Instead the great-circle distance
//! from the requested position to every grid cell is computed and the
//! cell with the smallest distance wins.

use crate::constants::EARTH_RADIUS;
use crate::errors::RegionError;
use crate::Float;
use ndarray::{Array2, ArrayView2, Zip};

/// Great-circle distance (in meters) between two points given
/// in decimal degrees.
///
/// Uses the haversine formula on a sphere of radius 6372.8 km
/// (see <http://www.movable-type.co.uk/scripts/latlong.html>).
pub fn haversine_distance(lon1: Float, lat1: Float, lon2: Float, lat2: Float) -> Float {
    let dlon = (lon2 - lon1).to_radians();
    let dlat = (lat2 - lat1).to_radians();

    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();

    // square of half the chord length between the points
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    // angular distance in radians between the points
    let angle = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS * angle
}

/// Great-circle distances from one point to every cell of the grid.
pub fn distance_field(
    lon: Float,
    lat: Float,
    lons: ArrayView2<Float>,
    lats: ArrayView2<Float>,
) -> Array2<Float> {
    Zip::from(lons)
        .and(lats)
        .map_collect(|&grid_lon, &grid_lat| haversine_distance(lon, lat, grid_lon, grid_lat))
}

/// Finds the grid cell closest to the given position and returns
/// its (j, i) index.
///
/// When several cells are equally close (which happens on periodic
/// grids near the seam) the one with the smallest column index `i`
/// is returned, so repeated runs always pick the same cell.
///
/// Cells with non-finite coordinates are skipped; a grid with no
/// finite cell at all is an error.
pub fn locate_nearest(
    lon: Float,
    lat: Float,
    lons: ArrayView2<Float>,
    lats: ArrayView2<Float>,
) -> Result<(usize, usize), RegionError> {
    let dist = distance_field(lon, lat, lons, lats);

    let mut min_dist = Float::INFINITY;
    for &d in dist.iter() {
        if d.is_finite() && d < min_dist {
            min_dist = d;
        }
    }

    if !min_dist.is_finite() {
        return Err(RegionError::EmptyGrid);
    }

    let mut nearest: Option<(usize, usize)> = None;
    for ((j, i), &d) in dist.indexed_iter() {
        if d == min_dist {
            nearest = match nearest {
                Some((bj, bi)) if (bi, bj) <= (i, j) => Some((bj, bi)),
                _ => Some((j, i)),
            };
        }
    }

    nearest.ok_or(RegionError::EmptyGrid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Float;
    use float_cmp::approx_eq;
    use ndarray::array;

    #[test]
    fn distance_is_symmetric_and_nonnegative() {
        let (lon1, lat1) = (-5.3, 48.7);
        let (lon2, lat2) = (12.1, -33.2);

        let there = haversine_distance(lon1, lat1, lon2, lat2);
        let back = haversine_distance(lon2, lat2, lon1, lat1);

        assert!(there >= 0.0);
        assert!(approx_eq!(Float, there, back, epsilon = 1e-6));
        assert_eq!(haversine_distance(lon1, lat1, lon1, lat1), 0.0);
    }

    #[test]
    fn distance_matches_quarter_meridian() {
        // pole to equator along a meridian is a quarter of the great circle
        let expected = std::f64::consts::FRAC_PI_2 * crate::constants::EARTH_RADIUS;
        let computed = haversine_distance(0.0, 0.0, 0.0, 90.0);

        assert!(approx_eq!(Float, computed, expected, epsilon = 1e-3));
    }

    #[test]
    fn locates_exact_grid_point() {
        let lons = array![[-10.0, -5.0, 0.0], [-10.0, -5.0, 0.0], [-10.0, -5.0, 0.0]];
        let lats = array![[40.0, 40.0, 40.0], [45.0, 45.0, 45.0], [50.0, 50.0, 50.0]];

        let (j, i) = locate_nearest(-5.0, 45.0, lons.view(), lats.view()).unwrap();

        assert_eq!((j, i), (1, 1));
        assert_eq!(
            haversine_distance(-5.0, 45.0, lons[[j, i]], lats[[j, i]]),
            0.0
        );
    }

    #[test]
    fn tie_break_prefers_smaller_column() {
        // columns 0 and 2 are equally far from the target at lon 0
        let lons = array![[-1.0, 5.0, 1.0]];
        let lats = array![[0.0, 0.0, 0.0]];

        let (j, i) = locate_nearest(0.0, 0.0, lons.view(), lats.view()).unwrap();

        assert_eq!((j, i), (0, 0));
    }

    #[test]
    fn nan_cells_are_skipped() {
        let lons = array![[Float::NAN, -5.0], [Float::NAN, -5.0]];
        let lats = array![[Float::NAN, 40.0], [Float::NAN, 45.0]];

        let (j, i) = locate_nearest(-5.0, 44.0, lons.view(), lats.view()).unwrap();

        assert_eq!((j, i), (1, 1));
    }

    #[test]
    fn all_nan_grid_is_an_error() {
        let lons = array![[Float::NAN, Float::NAN]];
        let lats = array![[Float::NAN, Float::NAN]];

        assert!(locate_nearest(0.0, 0.0, lons.view(), lats.view()).is_err());
    }
}
