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

//! Module building the sub-basin masks consumed by the validation
//! suite.
//!
//! The Atlantic mask is the only one carrying structure: the Strait
//! of Gibraltar is closed with a rasterised section so the
//! Mediterranean drops out, everything south of 34S is cut away and
//! the cells connected to a mid-Atlantic seed are kept. The Indian,
//! Pacific and Southern Ocean masks are not used downstream and are
//! written as all-zero placeholders.

use crate::constants::LAND;
use crate::errors::RegionError;
use crate::mask::floodfill::flood_fill;
use crate::mask::geolocation::locate_nearest;
use crate::mask::raster::polyline_cells;
use crate::Float;
use ndarray::{Array2, ArrayView2, ArrayViewD, Zip};

/// Endpoints of the section closing the Strait of Gibraltar,
/// (lon, lat) in degrees.
const GIBRALTAR_SECTION: [(Float, Float); 2] = [(-6.1536, 37.6231), (-6.2156, 33.8010)];

/// Mid-Atlantic position seeding the basin selection.
const ATLANTIC_SEED: (Float, Float) = (-38.2784, 36.3402);

/// Southern limit of the Atlantic basin (degrees north).
const ATLANTIC_SOUTH_LIMIT: Float = -34.0;

/// Marker distinguishing flooded cells from the 0/1 mask values.
const FLOODED: Float = 2.0;

/// The set of basin masks written to the output file.
pub struct BasinMasks {
    pub global: Array2<Float>,
    pub atlantic: Array2<Float>,
    pub indian: Array2<Float>,
    pub pacific: Array2<Float>,
    pub southern: Array2<Float>,
}

impl BasinMasks {
    /// The masks with their output variable names, in writing order.
    pub fn named(&self) -> [(&'static str, ArrayViewD<Float>); 5] {
        [
            ("glomsk", self.global.view().into_dyn()),
            ("atlmsk", self.atlantic.view().into_dyn()),
            ("indmsk", self.indian.view().into_dyn()),
            ("pacmsk", self.pacific.view().into_dyn()),
            ("somsk", self.southern.view().into_dyn()),
        ]
    }
}

/// Builds all basin masks from the surface level of the land-sea
/// mask.
pub fn build(
    surface: ArrayView2<Float>,
    lons: ArrayView2<Float>,
    lats: ArrayView2<Float>,
) -> Result<BasinMasks, RegionError> {
    let global = surface.to_owned();
    let atlantic = atlantic_mask(surface, lons, lats)?;

    let placeholder = Array2::zeros(surface.dim());

    Ok(BasinMasks {
        global,
        atlantic,
        indian: placeholder.clone(),
        pacific: placeholder.clone(),
        southern: placeholder,
    })
}

/// Cuts the Atlantic out of the surface mask.
///
/// Closing the Gibraltar section first makes the Mediterranean a
/// separate region, so the flood fill from the mid-Atlantic seed
/// cannot reach it and it is dropped together with every other
/// unconnected sea.
fn atlantic_mask(
    surface: ArrayView2<Float>,
    lons: ArrayView2<Float>,
    lats: ArrayView2<Float>,
) -> Result<Array2<Float>, RegionError> {
    let mut atlantic = surface.to_owned();

    let section: Vec<(i64, i64)> = GIBRALTAR_SECTION
        .iter()
        .map(|&(lon, lat)| locate_nearest(lon, lat, lons, lats))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|(j, i)| (j as i64, i as i64))
        .collect();

    for (j, i) in polyline_cells(&section) {
        atlantic[[j as usize, i as usize]] = LAND;
    }

    Zip::from(&mut atlantic).and(lats).for_each(|cell, &lat| {
        if lat < ATLANTIC_SOUTH_LIMIT {
            *cell = LAND;
        }
    });

    let seed = locate_nearest(ATLANTIC_SEED.0, ATLANTIC_SEED.1, lons, lats)?;
    let flooded = flood_fill(atlantic.view(), seed, LAND, FLOODED);

    Zip::from(&mut atlantic)
        .and(&flooded)
        .for_each(|cell, &mark| {
            if mark != FLOODED {
                *cell = LAND;
            }
        });

    Ok(atlantic)
}
