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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaskError {
    #[error("Error while checking arguments: {0}")]
    Argument(#[from] ArgumentError),

    #[error("Error while reading resources config: {0}")]
    Config(#[from] ConfigError),

    #[error("Error while accessing the mesh file: {0}")]
    Mesh(#[from] MeshError),

    #[error("Error while masking the region: {0}")]
    Region(#[from] RegionError),

    #[error("Error while creating ThreadPool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Error, Debug)]
pub enum ArgumentError {
    #[error("Conflicting arguments: {0}")]
    Conflicting(&'static str),

    #[error("Missing argument: {0}")]
    Missing(&'static str),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open resources file: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize resources file: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds {0}")]
    OutOfBounds(&'static str),
}

#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Cannot access the mesh file: {0}")]
    CantAccessFile(#[from] netcdf::Error),

    #[error("Variable {0} not found in the mesh file")]
    MissingVariable(&'static str),

    #[error("No coordinate variables found in the mesh file, tried: {0}")]
    MissingCoordinates(&'static str),

    #[error("Variable {0} has an unexpected shape")]
    UnexpectedShape(&'static str),
}

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("Region constraint is out of bounds: {0}")]
    OutOfBounds(&'static str),

    #[error("Array shapes do not match: {0}")]
    ShapeMismatch(&'static str),

    #[error("Grid has no finite coordinates")]
    EmptyGrid,

    #[error("Polygon vertex (j={0}, i={1}) is outside the grid")]
    VertexOutsideGrid(i64, i64),

    #[error("All four grid corners lie on the polygon boundary")]
    NoExteriorCorner,

    #[error("A depth band was requested without a depth field")]
    DepthBandWithoutField,
}
