//! Planar Sketch Face Topology
//!
//! This crate provides:
//! - Curve fragments: trimmed, directed views over shared parametric curves
//! - Chain assembly: tolerance-based coalescing of fragments into closed loops
//! - Nesting resolution: containment forest and even-odd solid/hole classification
//! - Face building through an abstract geometry kernel
//!
//! Input fragments are expected to be pre-split at their mutual
//! intersections by an external intersector.

pub mod chain;
pub mod curve;
pub mod face;
pub mod kernel;
pub mod nearmap;
pub mod nesting;

// Re-exports for convenience
pub use chain::assembler::{
    AssemblyError, AssemblyOutcome, ChainAssembler, DEFAULT_TOLERANCE,
};
pub use chain::{Chain, ChainError, FreeEnd, WhichPoint};
pub use curve::{CircularArc, Curve, CurveFragment, Line, Polyline};
pub use face::{FaceBatch, FaceBuilder, build_faces, build_faces_for_sketches};
pub use kernel::{
    Edge, Face, GeometryKernel, KernelError, KernelResult, NullKernel, PolylineKernel, Wire,
    default_kernel,
};
pub use nearmap::NearMap;
pub use nesting::{FaceDescriptor, NestingError, NestingNode, NestingOutcome, NestingResolver};

use thiserror::Error;

/// Top-level error covering every pipeline stage.
///
/// Errors are scoped to a single loop or sketch; the batch result
/// carries them next to the faces that did build.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TopoError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Nesting(#[from] NestingError),

    #[error(transparent)]
    Kernel(#[from] KernelError),
}
