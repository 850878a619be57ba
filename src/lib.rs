//! Saving face.
//!
//! A real-time face-morphing engine: given a source image, a target image,
//! and facial landmark sets for both, [`morph::Morpher`] warps the target's
//! features onto the source's geometry and blends them in under a feathered
//! face mask. [`overlay::place_overlay`] draws rigid 2-D addons (glasses,
//! hats, moustaches) at a landmark-derived pose, and [`interp`] expands the
//! editor's 8 manual key points into a full 478-point landmark set.
//!
//! The engine works on caller-provided RGBA pixel buffers and performs no
//! I/O of its own.

pub mod asset;
pub mod color;
pub mod delaunay;
pub mod error;
pub mod geom;
pub mod image;
pub mod interp;
pub mod landmark;
pub mod mask;
pub mod morph;
pub mod mouth;
pub mod overlay;
pub mod resolution;
pub mod warp;


pub use error::{Error, Result};
