/*
 * wepx_common - shared filesystem, datetime and geo utilities used by all other wepx crates.
 * Mirrors the role of odin_common in the teacher workspace, trimmed to what a backend raster
 * streaming pipeline actually needs (no uom/nav_types geo stack, no S3/Slack admin integrations).
 */
#![allow(unused)]

pub mod macros;
pub mod fs;
pub mod datetime;
pub mod geo;

pub use geo::{abs, BoundingBox};
