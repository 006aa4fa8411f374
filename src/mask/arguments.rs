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

//! Module responsible for parsing and checking the command line.
//!
//! Syntactic parsing is left to `clap`; the semantic checks that
//! depend on combinations of flags live in [`ZoomArgs::validate`] and
//! run before any file is opened, so a bad invocation fails
//! immediately.

use crate::errors::ArgumentError;
use crate::mask::filters::DepthBand;
use crate::Float;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tmaskgen", version, about = "Regional ocean mask generation for NEMO meshes")]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Cut a regional tmask out of a mesh file
    Zoom(ZoomArgs),

    /// Build the sub-basin masks used by the validation suite
    Basins(BasinsArgs),
}

#[derive(Args, Debug)]
pub struct ZoomArgs {
    /// Western limit of the domain (degrees east)
    #[arg(short = 'W', long, allow_hyphen_values = true)]
    pub west: Float,

    /// Eastern limit of the domain (degrees east)
    #[arg(short = 'E', long, allow_hyphen_values = true)]
    pub east: Float,

    /// Southern limit of the domain (degrees north)
    #[arg(short = 'S', long, allow_hyphen_values = true)]
    pub south: Float,

    /// Northern limit of the domain (degrees north)
    #[arg(short = 'N', long, allow_hyphen_values = true)]
    pub north: Float,

    /// The mesh file to work from
    #[arg(short, long)]
    pub mesh: PathBuf,

    /// Minimum model depth (meters) kept in the mask
    #[arg(long)]
    pub min_depth: Option<Float>,

    /// Maximum model depth (meters) kept in the mask
    #[arg(long)]
    pub max_depth: Option<Float>,

    /// Minimum sea-floor depth (meters) kept in the mask
    #[arg(long)]
    pub min_isobath: Option<Float>,

    /// Maximum sea-floor depth (meters) kept in the mask
    #[arg(long)]
    pub max_isobath: Option<Float>,

    /// Do not look for the largest cluster
    #[arg(long)]
    pub no_cluster: bool,

    /// Longitude which should be present in the largest cluster
    #[arg(long, allow_hyphen_values = true)]
    pub target_lon: Option<Float>,

    /// Latitude which should be present in the largest cluster
    #[arg(long, allow_hyphen_values = true)]
    pub target_lat: Option<Float>,

    /// Name of the output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Optional YAML file with machine resources
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BasinsArgs {
    /// The mesh file to work from
    #[arg(short, long)]
    pub mesh: PathBuf,

    /// Name of the output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Optional YAML file with machine resources
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Which mesh variable a depth constraint applies to.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DepthSource {
    /// Model depth levels (`gdept_0`)
    Levels,

    /// Sea-floor depth (`bathy_metry`)
    Bathymetry,
}

impl ZoomArgs {
    /// Checks flag combinations that `clap` cannot express.
    ///
    /// Called before the mesh file is opened so that a conflicting
    /// invocation never reaches the filters.
    pub fn validate(&self) -> Result<(), ArgumentError> {
        let depth = self.min_depth.is_some() || self.max_depth.is_some();
        let isobath = self.min_isobath.is_some() || self.max_isobath.is_some();

        if depth && isobath {
            return Err(ArgumentError::Conflicting(
                "specify either depth constraints (--min-depth/--max-depth) or isobath constraints (--min-isobath/--max-isobath), not both",
            ));
        }

        self.target()?;

        Ok(())
    }

    /// Target position for the largest-cluster selection, `None`
    /// when clustering is switched off.
    pub fn target(&self) -> Result<Option<(Float, Float)>, ArgumentError> {
        if self.no_cluster {
            return Ok(None);
        }

        match (self.target_lon, self.target_lat) {
            (Some(lon), Some(lat)) => Ok(Some((lon, lat))),
            _ => Err(ArgumentError::Missing(
                "target longitude and latitude are required when clustering",
            )),
        }
    }

    /// The requested depth constraint, if any, together with the
    /// mesh variable it applies to.
    pub fn depth_constraint(&self) -> Option<(DepthSource, DepthBand)> {
        if self.min_depth.is_some() || self.max_depth.is_some() {
            Some((
                DepthSource::Levels,
                DepthBand {
                    min: self.min_depth,
                    max: self.max_depth,
                },
            ))
        } else if self.min_isobath.is_some() || self.max_isobath.is_some() {
            Some((
                DepthSource::Bathymetry,
                DepthBand {
                    min: self.min_isobath,
                    max: self.max_isobath,
                },
            ))
        } else {
            None
        }
    }
}
