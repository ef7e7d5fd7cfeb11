//! Helpers to build readable snapshots for [`expect_test`].

pub mod debug;
pub mod raster;
