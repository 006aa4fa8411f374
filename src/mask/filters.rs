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

//! Module with the region filters applied to the land-sea mask.
//!
//! All filters take the field by view and return a freshly masked
//! copy, so a failed stage never leaves a half-modified mask behind.
//! Fields can carry any number of leading axes (time, depth levels)
//! as long as the trailing two axes match the coordinate grid.

use crate::constants::LAND;
use crate::errors::RegionError;
use crate::mask::geolocation;
use crate::Float;
use log::warn;
use ndarray::{Array2, ArrayD, ArrayView2, ArrayViewD, ArrayViewMut3, Zip};

/// Geographic bounding box in decimal degrees, bounds inclusive.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub struct BoundingBox {
    pub west: Float,
    pub east: Float,
    pub south: Float,
    pub north: Float,
}

impl BoundingBox {
    /// Checks the limits follow conventions before constructing
    /// the box.
    pub fn new(west: Float, east: Float, south: Float, north: Float) -> Result<Self, RegionError> {
        if west >= east {
            return Err(RegionError::OutOfBounds(
                "western limit must be less than eastern limit",
            ));
        }

        if south >= north {
            return Err(RegionError::OutOfBounds(
                "southern limit must be less than northern limit",
            ));
        }

        if !(-90.0..=90.0).contains(&south) || !(-90.0..=90.0).contains(&north) {
            return Err(RegionError::OutOfBounds(
                "latitude limits must be between -90 and 90",
            ));
        }

        if !(-180.0..=180.0).contains(&west) || !(-180.0..=180.0).contains(&east) {
            return Err(RegionError::OutOfBounds(
                "longitude limits must be between -180 and 180",
            ));
        }

        Ok(BoundingBox {
            west,
            east,
            south,
            north,
        })
    }

    /// Checks if the given position falls inside the box,
    /// bounds included.
    pub fn contains(&self, lon: Float, lat: Float) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }
}

/// Depth band in meters, either bound optional.
///
/// A missing minimum defaults to the surface, a missing maximum
/// leaves the band open towards the bottom.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct DepthBand {
    pub min: Option<Float>,
    pub max: Option<Float>,
}

impl DepthBand {
    /// Checks the band against the deepest value present in the
    /// depth field.
    pub fn check_bounds(&self, deepest: Float) -> Result<(), RegionError> {
        let min = self.min.unwrap_or(0.0);

        if !(0.0..=deepest).contains(&min) {
            return Err(RegionError::OutOfBounds(
                "minimum depth must be between 0 and the deepest cell",
            ));
        }

        if let Some(max) = self.max {
            if !(0.0..=deepest).contains(&max) {
                return Err(RegionError::OutOfBounds(
                    "maximum depth must be between 0 and the deepest cell",
                ));
            }

            if max <= min {
                return Err(RegionError::OutOfBounds(
                    "maximum depth must be greater than minimum depth",
                ));
            }
        }

        Ok(())
    }

    /// Checks if the given depth falls inside the band.
    pub fn contains(&self, depth: Float) -> bool {
        depth >= self.min.unwrap_or(0.0) && self.max.map_or(true, |max| depth <= max)
    }
}

/// Replaces every element of the field whose grid cell falls outside
/// the bounding box with `fill_value`.
///
/// The trailing two axes of the field must match the coordinate
/// grid; any leading axes are masked slice by slice with the same
/// 2D domain mask.
pub fn filter_lat_lon(
    field: ArrayViewD<Float>,
    lats: ArrayView2<Float>,
    lons: ArrayView2<Float>,
    bbox: &BoundingBox,
    fill_value: Float,
) -> Result<ArrayD<Float>, RegionError> {
    if lats.dim() != lons.dim() {
        return Err(RegionError::ShapeMismatch(
            "latitude and longitude grids differ in shape",
        ));
    }

    let domain_mask = Zip::from(lats)
        .and(lons)
        .map_collect(|&lat, &lon| bbox.contains(lon, lat));

    let mut masked = field.to_owned();

    let mut slices = as_slice_stack(&mut masked, lats.dim())?;
    for mut slice in slices.outer_iter_mut() {
        Zip::from(&mut slice)
            .and(&domain_mask)
            .for_each(|value, &keep| {
                if !keep {
                    *value = fill_value;
                }
            });
    }

    Ok(masked)
}

/// Replaces every element of the field whose depth falls outside the
/// band with `fill_value`.
///
/// The depth field is matched against the trailing axes of the
/// field: a 2D bathymetry applies the same mask to every slice, a 3D
/// array of model depth levels masks each level with its own slice.
/// Cells with NaN depth are always outside the band.
pub fn filter_depth(
    field: ArrayViewD<Float>,
    depth: ArrayViewD<Float>,
    band: &DepthBand,
    fill_value: Float,
) -> Result<ArrayD<Float>, RegionError> {
    if depth.ndim() > field.ndim() || field.shape()[field.ndim() - depth.ndim()..] != *depth.shape()
    {
        return Err(RegionError::ShapeMismatch(
            "depth field does not match the trailing axes of the field",
        ));
    }

    let deepest = depth
        .iter()
        .filter(|d| d.is_finite())
        .fold(Float::NEG_INFINITY, |a, &b| a.max(b));

    if !deepest.is_finite() {
        return Err(RegionError::EmptyGrid);
    }

    band.check_bounds(deepest)?;

    let depth_mask = depth.mapv(|d| band.contains(d));

    let mut masked = field.to_owned();

    let tail: usize = depth.shape().iter().product();
    let lead: usize = field.shape()[..field.ndim() - depth.ndim()].iter().product();

    let mut flat = masked
        .view_mut()
        .into_shape((lead, tail))
        .map_err(|_| RegionError::ShapeMismatch("field is not contiguous"))?;
    let keep = depth_mask
        .into_shape(tail)
        .map_err(|_| RegionError::ShapeMismatch("depth field is not contiguous"))?;

    for mut row in flat.outer_iter_mut() {
        Zip::from(&mut row).and(&keep).for_each(|value, &keep| {
            if !keep {
                *value = fill_value;
            }
        });
    }

    Ok(masked)
}

/// Zeroes every cell of the slice outside its largest 4-connected
/// patch of nonzero cells.
///
/// Patch size is the sum of the cell values, not the cell count, so
/// for weighted masks a small patch of heavy cells can win over a
/// large patch of light ones. Ties keep the first patch found in row
/// order. A slice with no nonzero cell is returned unchanged.
///
/// The returned flag tells whether the designated target cell fell
/// outside the retained patch.
pub fn largest_component_slice(
    slice: ArrayView2<Float>,
    target: Option<(usize, usize)>,
) -> (Array2<Float>, bool) {
    let (labels, count) = label_components(slice);

    if count == 0 {
        return (slice.to_owned(), false);
    }

    let mut sums = vec![0.0; count as usize];
    for ((j, i), &label) in labels.indexed_iter() {
        if label > 0 {
            sums[(label - 1) as usize] += slice[[j, i]];
        }
    }

    let mut largest = 0;
    for (index, &sum) in sums.iter().enumerate() {
        if sum > sums[largest] {
            largest = index;
        }
    }
    let kept_label = (largest + 1) as u32;

    let retained = Zip::from(slice)
        .and(&labels)
        .map_collect(|&value, &label| if label == kept_label { value } else { 0.0 });

    let target_outside = match target {
        Some((j, i)) => labels[[j, i]] != kept_label,
        None => false,
    };

    (retained, target_outside)
}

/// Labels 4-connected patches of nonzero cells.
///
/// Returns the label map (0 for background, 1..=count for patches)
/// and the patch count.
fn label_components(slice: ArrayView2<Float>) -> (Array2<u32>, u32) {
    let (nj, ni) = slice.dim();
    let mut labels = Array2::<u32>::zeros((nj, ni));
    let mut count = 0;
    let mut stack = vec![];

    for j in 0..nj {
        for i in 0..ni {
            if slice[[j, i]] == 0.0 || labels[[j, i]] != 0 {
                continue;
            }

            count += 1;
            labels[[j, i]] = count;
            stack.push((j, i));

            while let Some((j, i)) = stack.pop() {
                if i + 1 < ni && slice[[j, i + 1]] != 0.0 && labels[[j, i + 1]] == 0 {
                    labels[[j, i + 1]] = count;
                    stack.push((j, i + 1));
                }
                if i > 0 && slice[[j, i - 1]] != 0.0 && labels[[j, i - 1]] == 0 {
                    labels[[j, i - 1]] = count;
                    stack.push((j, i - 1));
                }
                if j + 1 < nj && slice[[j + 1, i]] != 0.0 && labels[[j + 1, i]] == 0 {
                    labels[[j + 1, i]] = count;
                    stack.push((j + 1, i));
                }
                if j > 0 && slice[[j - 1, i]] != 0.0 && labels[[j - 1, i]] == 0 {
                    labels[[j - 1, i]] = count;
                    stack.push((j - 1, i));
                }
            }
        }
    }

    (labels, count)
}

/// Applies [`largest_component_slice`] to every trailing 2D slice of
/// the field in turn.
///
/// A slice whose target cell falls outside the retained patch only
/// logs a warning; the result is not altered.
pub fn filter_largest_component(
    field: ArrayViewD<Float>,
    target: Option<(usize, usize)>,
) -> Result<ArrayD<Float>, RegionError> {
    let shape = field.shape().to_vec();

    let mut masked = field.to_owned();

    let mut slices = as_slice_stack(&mut masked, trailing_dim(&shape)?)?;
    for (index, mut slice) in slices.outer_iter_mut().enumerate() {
        let (retained, target_outside) = largest_component_slice(slice.view(), target);

        if target_outside {
            if let Some((j, i)) = target {
                warn!(
                    "Target grid point (J={}, I={}) is outside the largest cluster in slice {}",
                    j, i, index
                );
            }
        }

        slice.assign(&retained);
    }

    Ok(masked)
}

/// Applies the whole filter chain to one field: bounding box, then
/// optionally a depth band, then optionally the largest-component
/// selection around a target position.
///
/// This is the library entry point mirroring what the `zoom`
/// subcommand does from the command line.
#[allow(clippy::too_many_arguments)]
pub fn mask_region(
    field: ArrayViewD<Float>,
    lats: ArrayView2<Float>,
    lons: ArrayView2<Float>,
    bbox: &BoundingBox,
    depth_field: Option<ArrayViewD<Float>>,
    depth_band: Option<&DepthBand>,
    largest_component: bool,
    target: Option<(Float, Float)>,
) -> Result<ArrayD<Float>, RegionError> {
    let mut masked = filter_lat_lon(field, lats, lons, bbox, LAND)?;

    if let Some(band) = depth_band {
        let depth = depth_field.ok_or(RegionError::DepthBandWithoutField)?;
        masked = filter_depth(masked.view(), depth, band, LAND)?;
    }

    if largest_component {
        let target = match target {
            Some((lon, lat)) => Some(geolocation::locate_nearest(lon, lat, lons, lats)?),
            None => None,
        };
        masked = filter_largest_component(masked.view(), target)?;
    }

    Ok(masked)
}

/// Reshapes the field into a stack of its trailing 2D slices.
pub(super) fn as_slice_stack<'a>(
    field: &'a mut ArrayD<Float>,
    grid_shape: (usize, usize),
) -> Result<ArrayViewMut3<'a, Float>, RegionError> {
    let (nj, ni) = grid_shape;

    if field.ndim() < 2 || field.shape()[field.ndim() - 2..] != [nj, ni] {
        return Err(RegionError::ShapeMismatch(
            "trailing axes of the field do not match the grid",
        ));
    }

    let lead: usize = field.shape()[..field.ndim() - 2].iter().product();

    field
        .view_mut()
        .into_shape((lead, nj, ni))
        .map_err(|_| RegionError::ShapeMismatch("field is not contiguous"))
}

/// Last two axes of a shape as a (nj, ni) pair.
pub(super) fn trailing_dim(shape: &[usize]) -> Result<(usize, usize), RegionError> {
    if shape.len() < 2 {
        return Err(RegionError::ShapeMismatch(
            "field must have at least two axes",
        ));
    }

    Ok((shape[shape.len() - 2], shape[shape.len() - 1]))
}
