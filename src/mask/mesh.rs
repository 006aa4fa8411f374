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

//! Module responsible for reading mesh files and writing mask files.
//!
//! To limit IO operations the coordinate grids are buffered into
//! memory as 2D arrays when the mesh is opened; mask and depth
//! variables are only read when the pipeline asks for them.
//!
//! Mesh files come in two flavours: extracted meshes carry
//! `nav_lon`/`nav_lat` coordinates while raw NEMO `mesh_mask` files
//! carry `glamt`/`gphit` at the T-points, usually with singleton time
//! and level axes on top. Both are resolved to plain 2D arrays here so
//! the filters never see the difference.

use crate::errors::MeshError;
use crate::Float;
use log::debug;
use ndarray::{Array2, ArrayD, ArrayView2, ArrayViewD, Axis, IxDyn};
use std::path::Path;

/// Coordinate variable names tried in order when opening a mesh.
const COORDINATE_CANDIDATES: [(&str, &str); 2] = [("nav_lon", "nav_lat"), ("glamt", "gphit")];

/// Dimension names used in the output file, matched to the trailing
/// axes of the written variables.
const DIMENSION_NAMES: [&str; 4] = ["t", "z", "y", "x"];

/// An opened mesh file with its coordinate grids resolved.
pub struct Mesh {
    file: netcdf::File,
    pub lons: Array2<Float>,
    pub lats: Array2<Float>,
}

impl Mesh {
    /// Opens the mesh file and resolves the 2D coordinate grids.
    pub fn open(path: &Path) -> Result<Self, MeshError> {
        debug!("Opening mesh file {}", path.display());

        let file = netcdf::open(path)?;
        let (lons, lats) = resolve_coordinates(&file)?;

        Ok(Mesh { file, lons, lats })
    }

    /// The land-sea mask with all its axes, usually
    /// (time, level, y, x).
    pub fn tmask(&self) -> Result<ArrayD<Float>, MeshError> {
        read_variable(&self.file, "tmask")
    }

    /// The surface level of the land-sea mask.
    pub fn surface_tmask(&self) -> Result<Array2<Float>, MeshError> {
        let mut tmask = self.tmask()?;

        while tmask.ndim() > 2 {
            tmask = tmask.index_axis_move(Axis(0), 0);
        }

        tmask
            .into_dimensionality()
            .map_err(|_| MeshError::UnexpectedShape("tmask"))
    }

    /// Model depth levels (`gdept_0`) with the leading time record
    /// dropped, so (level, y, x).
    pub fn depth_levels(&self) -> Result<ArrayD<Float>, MeshError> {
        let mut depth = read_variable(&self.file, "gdept_0")?;

        while depth.ndim() > 3 {
            depth = depth.index_axis_move(Axis(0), 0);
        }

        if depth.ndim() < 3 {
            return Err(MeshError::UnexpectedShape("gdept_0"));
        }

        Ok(depth)
    }

    /// Sea-floor depth (`bathy_metry`) with the leading time record
    /// dropped, so (y, x).
    pub fn bathymetry(&self) -> Result<ArrayD<Float>, MeshError> {
        let mut bathymetry = read_variable(&self.file, "bathy_metry")?;

        while bathymetry.ndim() > 2 {
            bathymetry = bathymetry.index_axis_move(Axis(0), 0);
        }

        if bathymetry.ndim() < 2 {
            return Err(MeshError::UnexpectedShape("bathy_metry"));
        }

        Ok(bathymetry)
    }
}

/// Finds the first coordinate variable pair present in the file and
/// reads it into 2D arrays.
fn resolve_coordinates(file: &netcdf::File) -> Result<(Array2<Float>, Array2<Float>), MeshError> {
    for (lon_name, lat_name) in COORDINATE_CANDIDATES {
        if file.variable(lon_name).is_none() || file.variable(lat_name).is_none() {
            continue;
        }

        debug!("Using {}/{} as the coordinate grids", lon_name, lat_name);

        let lons = to_grid(read_variable(file, lon_name)?, "longitude grid")?;
        let lats = to_grid(read_variable(file, lat_name)?, "latitude grid")?;

        return Ok((lons, lats));
    }

    Err(MeshError::MissingCoordinates(
        "nav_lon/nav_lat, glamt/gphit",
    ))
}

/// Reads a whole variable into an array of matching shape.
fn read_variable(file: &netcdf::File, name: &'static str) -> Result<ArrayD<Float>, MeshError> {
    let variable = file
        .variable(name)
        .ok_or(MeshError::MissingVariable(name))?;

    let shape: Vec<usize> = variable.dimensions().iter().map(|dim| dim.len()).collect();
    let values = variable.get_values::<Float, _>(..)?;

    ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|_| MeshError::UnexpectedShape(name))
}

/// Squeezes singleton axes out of a coordinate variable until a 2D
/// grid remains.
fn to_grid(mut array: ArrayD<Float>, name: &'static str) -> Result<Array2<Float>, MeshError> {
    while array.ndim() > 2 {
        if array.shape()[0] != 1 {
            return Err(MeshError::UnexpectedShape(name));
        }
        array = array.index_axis_move(Axis(0), 0);
    }

    array
        .into_dimensionality()
        .map_err(|_| MeshError::UnexpectedShape(name))
}

/// Writes the coordinate grids and the given mask variables into a
/// new file, overwriting any previous one.
///
/// Dimensions are named by rank from the back: the trailing two axes
/// become (`y`, `x`) and must match the coordinate grids, a third
/// axis becomes `z` and a fourth `t`. Variables sharing a dimension
/// must agree on its length.
pub fn write_masks(
    path: &Path,
    lons: ArrayView2<Float>,
    lats: ArrayView2<Float>,
    masks: &[(&'static str, ArrayViewD<Float>)],
) -> Result<(), MeshError> {
    let (nj, ni) = lats.dim();

    let mut file = netcdf::create(path)?;

    file.add_dimension("y", nj)?;
    file.add_dimension("x", ni)?;

    for &(name, ref mask) in masks {
        if mask.ndim() < 2 || mask.ndim() > 4 || mask.shape()[mask.ndim() - 2..] != [nj, ni] {
            return Err(MeshError::UnexpectedShape(name));
        }

        let leading_names = &DIMENSION_NAMES[4 - mask.ndim()..2];
        for (dimension, &length) in leading_names.iter().zip(mask.shape()) {
            match file.dimension(dimension).map(|dim| dim.len()) {
                Some(existing) if existing != length => {
                    return Err(MeshError::UnexpectedShape(name));
                }
                Some(_) => {}
                None => {
                    file.add_dimension(dimension, length)?;
                }
            }
        }
    }

    {
        let mut lat_variable = file.add_variable::<Float>("nav_lat", &["y", "x"])?;
        lat_variable.put_attribute("units", "degrees_north")?;
        lat_variable.put_attribute("long_name", "latitude")?;

        let data = lats.to_owned().into_raw_vec();
        lat_variable.put_values(&data, ..)?;
    }

    {
        let mut lon_variable = file.add_variable::<Float>("nav_lon", &["y", "x"])?;
        lon_variable.put_attribute("units", "degrees_east")?;
        lon_variable.put_attribute("long_name", "longitude")?;

        let data = lons.to_owned().into_raw_vec();
        lon_variable.put_values(&data, ..)?;
    }

    for &(name, ref mask) in masks {
        let dimensions = &DIMENSION_NAMES[4 - mask.ndim()..];

        let mut variable = file.add_variable::<Float>(name, dimensions)?;

        let data = mask.to_owned().into_raw_vec();
        variable.put_values(&data, ..)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array3};
    use std::path::PathBuf;

    fn test_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("tmaskgen-{}-{}.nc", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn create_mesh_mask_file(path: &Path) {
        let mut file = netcdf::create(path).unwrap();

        file.add_dimension("t", 1).unwrap();
        file.add_dimension("z", 2).unwrap();
        file.add_dimension("y", 3).unwrap();
        file.add_dimension("x", 4).unwrap();

        let lons: Vec<Float> = (0..12).map(|n| (n % 4) as Float).collect();
        let lats: Vec<Float> = (0..12).map(|n| (n / 4) as Float * 10.0).collect();

        let mut glamt = file.add_variable::<Float>("glamt", &["t", "y", "x"]).unwrap();
        glamt.put_values(&lons, ..).unwrap();

        let mut gphit = file.add_variable::<Float>("gphit", &["t", "y", "x"]).unwrap();
        gphit.put_values(&lats, ..).unwrap();

        // level 0 all ocean, level 1 all land
        let mut tmask_data = vec![1.0; 12];
        tmask_data.extend(vec![0.0; 12]);
        let mut tmask = file
            .add_variable::<Float>("tmask", &["t", "z", "y", "x"])
            .unwrap();
        tmask.put_values(&tmask_data, ..).unwrap();

        let mut gdept_data = vec![5.0; 12];
        gdept_data.extend(vec![100.0; 12]);
        let mut gdept = file
            .add_variable::<Float>("gdept_0", &["t", "z", "y", "x"])
            .unwrap();
        gdept.put_values(&gdept_data, ..).unwrap();

        let bathy_data = vec![250.0; 12];
        let mut bathy = file
            .add_variable::<Float>("bathy_metry", &["t", "y", "x"])
            .unwrap();
        bathy.put_values(&bathy_data, ..).unwrap();
    }

    #[test]
    fn mesh_mask_coordinates_are_squeezed() {
        let path = test_file("meshmask");
        create_mesh_mask_file(&path);

        let mesh = Mesh::open(&path).unwrap();

        assert_eq!(mesh.lons.dim(), (3, 4));
        assert_eq!(mesh.lons[[1, 2]], 2.0);
        assert_eq!(mesh.lats[[2, 0]], 20.0);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn mesh_variables_drop_the_time_record() {
        let path = test_file("variables");
        create_mesh_mask_file(&path);

        let mesh = Mesh::open(&path).unwrap();

        let tmask = mesh.tmask().unwrap();
        assert_eq!(tmask.shape(), &[1, 2, 3, 4]);

        let surface = mesh.surface_tmask().unwrap();
        assert_eq!(surface.dim(), (3, 4));
        assert_eq!(surface[[0, 0]], 1.0);

        let depth = mesh.depth_levels().unwrap();
        assert_eq!(depth.shape(), &[2, 3, 4]);
        assert_eq!(depth[[1, 0, 0]], 100.0);

        let bathymetry = mesh.bathymetry().unwrap();
        assert_eq!(bathymetry.shape(), &[3, 4]);
        assert_eq!(bathymetry[[0, 0]], 250.0);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_coordinates_are_an_error() {
        let path = test_file("nocoords");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("y", 2).unwrap();
            file.add_dimension("x", 2).unwrap();
            let mut tmask = file.add_variable::<Float>("tmask", &["y", "x"]).unwrap();
            tmask.put_values(&[1.0, 1.0, 1.0, 1.0], ..).unwrap();
        }

        let result = Mesh::open(&path);

        assert!(matches!(result, Err(MeshError::MissingCoordinates(_))));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn written_masks_read_back_unchanged() {
        let path = test_file("roundtrip");

        let lons = Array::from_shape_fn((2, 3), |(_, i)| i as Float);
        let lats = Array::from_shape_fn((2, 3), |(j, _)| j as Float * 5.0);
        let mask = Array3::<Float>::ones((4, 2, 3));

        write_masks(
            &path,
            lons.view(),
            lats.view(),
            &[("tmask", mask.view().into_dyn())],
        )
        .unwrap();

        let file = netcdf::open(&path).unwrap();

        assert_eq!(file.dimension("z").unwrap().len(), 4);
        assert_eq!(file.dimension("y").unwrap().len(), 2);
        assert_eq!(file.dimension("x").unwrap().len(), 3);

        let written = file.variable("tmask").unwrap();
        assert_eq!(written.get_values::<Float, _>(..).unwrap(), vec![1.0; 24]);

        let written_lats = file.variable("nav_lat").unwrap();
        assert_eq!(
            written_lats.get_values::<Float, _>(..).unwrap(),
            vec![0.0, 0.0, 0.0, 5.0, 5.0, 5.0]
        );

        drop(file);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn conflicting_leading_dimensions_are_rejected() {
        let path = test_file("conflict");

        let lons = Array2::<Float>::zeros((2, 2));
        let lats = Array2::<Float>::zeros((2, 2));
        let shallow = Array3::<Float>::ones((3, 2, 2));
        let deep = Array3::<Float>::ones((5, 2, 2));

        let result = write_masks(
            &path,
            lons.view(),
            lats.view(),
            &[
                ("first", shallow.view().into_dyn()),
                ("second", deep.view().into_dyn()),
            ],
        );

        assert!(matches!(result, Err(MeshError::UnexpectedShape("second"))));

        let _ = std::fs::remove_file(&path);
    }
}
