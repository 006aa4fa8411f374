//! This is a module for integration tests of the mask pipeline,
//! but with access to private fields and methods.
//!
//! The filter stages are unit-tested in their own modules; the tests
//! here chain them the way the subcommands do, on synthetic grids
//! small enough to verify every cell by hand.

use crate::constants::LAND;
use crate::mask::filters::{mask_region, BoundingBox, DepthBand};
use crate::Float;
use ndarray::{Array, Array2, IxDyn};

/// A 5x5 rectilinear grid: lon -10..10 replicated across rows,
/// lat 40..50 replicated down columns.
fn five_by_five_grid() -> (Array2<Float>, Array2<Float>) {
    let mut lons = Array2::zeros((5, 5));
    let mut lats = Array2::zeros((5, 5));
    for j in 0..5 {
        for i in 0..5 {
            lons[[j, i]] = -10.0 + 5.0 * i as Float;
            lats[[j, i]] = 40.0 + 2.5 * j as Float;
        }
    }
    (lons, lats)
}

#[test]
fn box_filter_keeps_the_interior_of_a_5x5_grid() {
    let (lons, lats) = five_by_five_grid();
    let tmask = Array::<Float, _>::ones(IxDyn(&[5, 5]));

    let bbox = BoundingBox::new(-5.0, 5.0, 42.0, 48.0).unwrap();
    let masked = mask_region(
        tmask.view(),
        lats.view(),
        lons.view(),
        &bbox,
        None,
        None,
        false,
        None,
    )
    .unwrap();

    // the border ring is zeroed, the interior 3x3 kept
    for j in 0..5 {
        for i in 0..5 {
            let expected = if (1..=3).contains(&j) && (1..=3).contains(&i) {
                1.0
            } else {
                LAND
            };
            assert_eq!(masked[[j, i]], expected, "cell (j={}, i={})", j, i);
        }
    }
}

#[test]
fn full_pipeline_with_depth_band_and_clustering() {
    let (lons, lats) = five_by_five_grid();

    // three levels of ocean with a land column splitting level 1
    let mut tmask = Array::<Float, _>::ones(IxDyn(&[3, 5, 5]));
    for j in 0..5 {
        tmask[[1, j, 2]] = 0.0;
    }

    // one constant depth per level
    let mut depth = Array::<Float, _>::zeros(IxDyn(&[3, 5, 5]));
    for (level, value) in [10.0, 100.0, 900.0].into_iter().enumerate() {
        depth.index_axis_mut(ndarray::Axis(0), level).fill(value);
    }

    let bbox = BoundingBox::new(-5.0, 5.0, 42.0, 48.0).unwrap();
    let band = DepthBand {
        min: Some(50.0),
        max: Some(500.0),
    };

    // target sits in the right-hand patch of level 1, which loses
    // the tie against the left-hand patch found first
    let masked = mask_region(
        tmask.view(),
        lats.view(),
        lons.view(),
        &bbox,
        Some(depth.view()),
        Some(&band),
        true,
        Some((5.0, 45.0)),
    )
    .unwrap();

    // levels 0 and 2 are outside the depth band
    assert_eq!(masked.index_axis(ndarray::Axis(0), 0).sum(), 0.0);
    assert_eq!(masked.index_axis(ndarray::Axis(0), 2).sum(), 0.0);

    // level 1 retains only the patch left of the land column
    for j in 1..=3 {
        assert_eq!(masked[[1, j, 1]], 1.0);
        assert_eq!(masked[[1, j, 3]], 0.0);
    }
    assert_eq!(masked.index_axis(ndarray::Axis(0), 1).sum(), 3.0);
}

#[test]
fn depth_band_without_a_depth_field_is_rejected() {
    let (lons, lats) = five_by_five_grid();
    let tmask = Array::<Float, _>::ones(IxDyn(&[5, 5]));

    let bbox = BoundingBox::new(-5.0, 5.0, 42.0, 48.0).unwrap();
    let band = DepthBand {
        min: Some(50.0),
        max: None,
    };

    let result = mask_region(
        tmask.view(),
        lats.view(),
        lons.view(),
        &bbox,
        None,
        Some(&band),
        false,
        None,
    );

    assert!(result.is_err());
}
