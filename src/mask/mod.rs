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

//! Module containing the actual mask generation code.
//!
//! The `zoom` pipeline runs strictly in sequence: read the mesh,
//! locate the target, apply the bounding box, apply the optional
//! depth or isobath band and keep the largest connected cluster.
//! A failed stage aborts the run before anything is written, so a
//! partial mask never reaches the output file.

mod arguments;
mod basins;
mod configuration;
pub mod filters;
pub mod floodfill;
pub mod geolocation;
mod mesh;
pub mod raster;

#[cfg(test)]
mod super_tests;

use crate::errors::{MaskError, RegionError};
use crate::{Float, ALLOCATOR};
use arguments::{Arguments, BasinsArgs, Command, DepthSource, ZoomArgs};
use clap::Parser;
use configuration::Config;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use mesh::Mesh;
use ndarray::{ArrayD, ArrayViewD, Axis};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{path::Path, sync::mpsc};

/// Main function of the tool, responsible for dispatching into the
/// requested subcommand.
pub fn main() -> Result<(), MaskError> {
    let arguments = Arguments::parse();

    match arguments.command {
        Command::Zoom(args) => zoom(&args),
        Command::Basins(args) => build_basins(&args),
    }
}

/// Structure containing the runtime pieces shared by the
/// subcommands.
///
/// Before any mask work can start the resources configuration has to
/// be loaded and checked, the memory limit and threadpool set up from
/// it, and the mesh coordinates buffered.
pub struct Core {
    pub config: Config,
    pub threadpool: ThreadPool,
    pub mesh: Mesh,
}

impl Core {
    /// [`Core`] constructor.
    pub fn new(config_file: Option<&Path>, mesh_file: &Path) -> Result<Self, MaskError> {
        let config = match config_file {
            Some(path) => {
                debug!("Reading resources configuration from {}", path.display());
                Config::new_from_file(path)?
            }
            None => Config::default(),
        };

        debug!("Setting memory limit");
        ALLOCATOR
            .set_limit(config.resources.memory * 1024 * 1024)
            .unwrap();

        debug!("Setting up ThreadPool");
        let threadpool = ThreadPoolBuilder::new()
            .num_threads(config.resources.threads as usize)
            .stack_size(2 * 1024 * 1024)
            .build()?;

        debug!("Reading coordinates from the mesh file");
        let mesh = Mesh::open(mesh_file)?;

        Ok(Core {
            config,
            threadpool,
            mesh,
        })
    }
}

/// The `zoom` subcommand: cuts a regional mask out of the mesh file.
fn zoom(args: &ZoomArgs) -> Result<(), MaskError> {
    info!("Checking the requested region");

    args.validate()?;
    let bbox = filters::BoundingBox::new(args.west, args.east, args.south, args.north)?;

    let core = Core::new(args.config.as_deref(), &args.mesh)?;

    let target = match args.target()? {
        Some((lon, lat)) => {
            let (j, i) =
                geolocation::locate_nearest(lon, lat, core.mesh.lons.view(), core.mesh.lats.view())?;
            debug!("Target ({}E, {}N) is at grid point (J={}, I={})", lon, lat, j, i);
            Some((j, i))
        }
        None => None,
    };

    let tmask = core.mesh.tmask()?;

    let depth_constraint = args.depth_constraint();
    let depth_field = match depth_constraint {
        Some((DepthSource::Levels, _)) => Some(core.mesh.depth_levels()?),
        Some((DepthSource::Bathymetry, _)) => Some(core.mesh.bathymetry()?),
        None => None,
    };

    info!("Filtering the mask");

    let mut masked = filters::mask_region(
        tmask.view(),
        core.mesh.lats.view(),
        core.mesh.lons.view(),
        &bbox,
        depth_field.as_ref().map(|depth| depth.view()),
        depth_constraint.as_ref().map(|(_, band)| band),
        false,
        None,
    )?;

    if target.is_some() {
        info!("Selecting the largest cluster");
        masked = filter_largest_cluster(&core.threadpool, masked.view(), target)?;
    }

    let masked = squeeze_leading(masked);

    info!("Writing the mask to {}", args.output.display());
    mesh::write_masks(
        &args.output,
        core.mesh.lons.view(),
        core.mesh.lats.view(),
        &[("tmask", masked.view())],
    )?;

    Ok(())
}

/// The `basins` subcommand: builds the sub-basin masks from the
/// surface level of the mesh mask.
fn build_basins(args: &BasinsArgs) -> Result<(), MaskError> {
    let core = Core::new(args.config.as_deref(), &args.mesh)?;

    info!("Building the sub-basin masks");

    let surface = core.mesh.surface_tmask()?;
    let masks = basins::build(
        surface.view(),
        core.mesh.lons.view(),
        core.mesh.lats.view(),
    )?;

    info!("Writing the basin masks to {}", args.output.display());
    mesh::write_masks(
        &args.output,
        core.mesh.lons.view(),
        core.mesh.lats.view(),
        &masks.named(),
    )?;

    Ok(())
}

/// Runs the largest-cluster selection over every trailing 2D slice
/// of the field on the threadpool.
///
/// Slices are independent of each other so they are deployed as
/// separate tasks and collected over a channel in whatever order
/// they finish. A slice whose target cell falls outside the retained
/// cluster only logs a warning, as a marginal sea sharing the box
/// with the target basin is expected to drop out this way.
fn filter_largest_cluster(
    threadpool: &ThreadPool,
    field: ArrayViewD<Float>,
    target: Option<(usize, usize)>,
) -> Result<ArrayD<Float>, RegionError> {
    let shape = field.shape().to_vec();
    let (nj, ni) = filters::trailing_dim(&shape)?;
    let levels: usize = shape[..shape.len() - 2].iter().product();

    let mut masked = field.to_owned();

    // set progress bar for filtered levels
    let levels_bar = ProgressBar::new(levels as u64);
    levels_bar.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .progress_chars("#>-"),
    );
    levels_bar.set_prefix("Filtered levels");

    let (tx, rx) = mpsc::channel();

    {
        let stack = filters::as_slice_stack(&mut masked, (nj, ni))?;

        for (index, slice) in stack.outer_iter().enumerate() {
            let tx = tx.clone();
            let slice = slice.to_owned();

            threadpool.spawn(move || {
                tx.send((index, filters::largest_component_slice(slice.view(), target)))
                    .unwrap();
            });
        }
    }

    let mut stack = filters::as_slice_stack(&mut masked, (nj, ni))?;

    for _ in 0..levels {
        let (index, (retained, target_outside)) =
            rx.recv().expect("Receiving filtered slice failed");

        if target_outside {
            if let Some((j, i)) = target {
                warn!(
                    "Target grid point (J={}, I={}) is outside the largest cluster in slice {}",
                    j, i, index
                );
                // this is neccessary to make sure that the warning is
                // fully written to stdout before the progress bar updates
                println!();
            }
        }

        stack.index_axis_mut(Axis(0), index).assign(&retained);
        levels_bar.inc(1);
    }

    levels_bar.finish_with_message("All levels filtered");

    Ok(masked)
}

/// Drops leading singleton axes, so a (1, level, y, x) mask is
/// written as (level, y, x).
fn squeeze_leading(mut masked: ArrayD<Float>) -> ArrayD<Float> {
    while masked.ndim() > 2 && masked.shape()[0] == 1 {
        masked = masked.index_axis_move(Axis(0), 0);
    }

    masked
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    #[test]
    fn leading_singleton_axes_are_squeezed() {
        let field = Array::<Float, _>::ones(IxDyn(&[1, 3, 4, 5]));

        let squeezed = squeeze_leading(field);

        assert_eq!(squeezed.shape(), &[3, 4, 5]);
    }

    #[test]
    fn trailing_grid_axes_are_never_squeezed() {
        let field = Array::<Float, _>::ones(IxDyn(&[1, 1, 4]));

        let squeezed = squeeze_leading(field);

        assert_eq!(squeezed.shape(), &[1, 4]);
    }

    #[test]
    fn parallel_cluster_filter_matches_the_sequential_one() {
        let threadpool = ThreadPoolBuilder::new().num_threads(2).build().unwrap();

        // two levels with differently placed blobs
        let field = Array::from_shape_vec(
            IxDyn(&[2, 3, 4]),
            vec![
                1.0, 1.0, 0.0, 1.0, //
                1.0, 0.0, 0.0, 1.0, //
                0.0, 0.0, 0.0, 1.0, //
                0.0, 0.0, 1.0, 1.0, //
                1.0, 0.0, 1.0, 1.0, //
                1.0, 0.0, 0.0, 0.0, //
            ],
        )
        .unwrap();

        let parallel = filter_largest_cluster(&threadpool, field.view(), None).unwrap();
        let sequential = filters::filter_largest_component(field.view(), None).unwrap();

        assert_eq!(parallel, sequential);
        assert_eq!(parallel[[0, 0, 0]], 1.0);
        assert_eq!(parallel[[0, 0, 3]], 0.0);
    }
}
