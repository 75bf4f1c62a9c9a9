//! Face materialization and the whole-pipeline entry point.
//!
//! Takes face descriptors from the nesting resolver and turns each one
//! into a concrete kernel face. Failures are scoped to the offending
//! loop; the batch keeps going.

use crate::TopoError;
use crate::chain::assembler::ChainAssembler;
use crate::curve::CurveFragment;
use crate::kernel::{Face, GeometryKernel};
use crate::nesting::{FaceDescriptor, NestingResolver};

/// Materializes face descriptors through a geometry kernel.
pub struct FaceBuilder<'a> {
    kernel: &'a dyn GeometryKernel,
}

impl<'a> FaceBuilder<'a> {
    /// Create a builder over the given kernel
    pub fn new(kernel: &'a dyn GeometryKernel) -> Self {
        Self { kernel }
    }

    /// Build one face: the outer loop becomes the outer boundary, each
    /// hole loop an inner boundary subtracted from the face.
    pub fn build(&self, descriptor: FaceDescriptor) -> Result<Face, TopoError> {
        let outer = descriptor.outer.materialize_wire(self.kernel)?;
        let holes = descriptor
            .holes
            .iter()
            .map(|hole| hole.materialize_wire(self.kernel))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.kernel.make_face(outer, holes)?)
    }
}

/// Result of a whole pipeline run.
///
/// Faces that could be built and per-loop errors are returned side by
/// side; an error in one loop never discards the others.
#[derive(Debug)]
pub struct FaceBatch {
    /// Successfully built faces
    pub faces: Vec<Face>,
    /// Per-loop errors from every stage
    pub errors: Vec<TopoError>,
    /// Fragments dropped before assembly
    pub degenerate_fragments: usize,
}

/// Run the full pipeline over one sketch group's fragments:
/// assembly, nesting resolution, face building.
pub fn build_faces(
    fragments: Vec<CurveFragment>,
    kernel: &dyn GeometryKernel,
    assembler: &ChainAssembler,
) -> FaceBatch {
    let assembly = assembler.assemble(fragments);
    let mut errors: Vec<TopoError> = assembly.errors.into_iter().map(Into::into).collect();

    let resolver = NestingResolver::new().with_tolerance(assembler.tolerance());
    let nesting = resolver.resolve(assembly.closed);
    errors.extend(nesting.errors.into_iter().map(Into::into));

    let builder = FaceBuilder::new(kernel);
    let mut faces = Vec::new();
    for descriptor in nesting.faces {
        match builder.build(descriptor) {
            Ok(face) => faces.push(face),
            Err(err) => {
                tracing::warn!(%err, "face construction failed");
                errors.push(err);
            }
        }
    }

    FaceBatch {
        faces,
        errors,
        degenerate_fragments: assembly.degenerate_fragments,
    }
}

/// Flatten several sketches' fragments into one batch and build faces.
///
/// Fragments are expected to be pre-split at their mutual intersections
/// across all sketches in the group.
pub fn build_faces_for_sketches(
    sketches: impl IntoIterator<Item = Vec<CurveFragment>>,
    kernel: &dyn GeometryKernel,
    assembler: &ChainAssembler,
) -> FaceBatch {
    let fragments: Vec<CurveFragment> = sketches.into_iter().flatten().collect();
    build_faces(fragments, kernel, assembler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::PolylineKernel;
    use glam::DVec2;

    fn square(x: f64, y: f64, size: f64) -> Vec<CurveFragment> {
        let a = DVec2::new(x, y);
        let b = DVec2::new(x + size, y);
        let c = DVec2::new(x + size, y + size);
        let d = DVec2::new(x, y + size);
        vec![
            CurveFragment::segment(a, b),
            CurveFragment::segment(b, c),
            CurveFragment::segment(c, d),
            CurveFragment::segment(d, a),
        ]
    }

    #[test]
    fn test_scenario_nested_squares() {
        // Outer square, middle hole, inner island: exactly 2 faces
        let mut fragments = square(0.0, 0.0, 30.0);
        fragments.extend(square(5.0, 5.0, 20.0));
        fragments.extend(square(10.0, 10.0, 10.0));

        let kernel = PolylineKernel::new();
        let batch = build_faces(fragments, &kernel, &ChainAssembler::new());

        assert!(batch.errors.is_empty(), "errors: {:?}", batch.errors);
        assert_eq!(batch.faces.len(), 2);
        let mut hole_counts: Vec<usize> =
            batch.faces.iter().map(Face::hole_count).collect();
        hole_counts.sort();
        assert_eq!(hole_counts, vec![0, 1]);
    }

    #[test]
    fn test_scenario_disjoint_squares() {
        let mut fragments = square(0.0, 0.0, 5.0);
        fragments.extend(square(10.0, 0.0, 5.0));
        fragments.extend(square(20.0, 0.0, 5.0));

        let kernel = PolylineKernel::new();
        let batch = build_faces(fragments, &kernel, &ChainAssembler::new());

        assert!(batch.errors.is_empty());
        assert_eq!(batch.faces.len(), 3);
        assert!(batch.faces.iter().all(|f| f.hole_count() == 0));
    }

    #[test]
    fn test_scenario_open_c_shape() {
        let fragments = vec![
            CurveFragment::segment(DVec2::new(2.0, 0.0), DVec2::new(0.0, 0.0)),
            CurveFragment::segment(DVec2::new(0.0, 0.0), DVec2::new(0.0, 2.0)),
            CurveFragment::segment(DVec2::new(0.0, 2.0), DVec2::new(2.0, 2.0)),
        ];

        let kernel = PolylineKernel::new();
        let assembler = ChainAssembler::new().with_tolerance(0.01);
        let batch = build_faces(fragments, &kernel, &assembler);

        assert!(batch.faces.is_empty(), "open boundary must build no face");
        assert_eq!(batch.errors.len(), 1);
        assert!(matches!(batch.errors[0], TopoError::Assembly(_)));
    }

    #[test]
    fn test_open_loop_does_not_poison_batch() {
        // One good square plus one stranded fragment
        let mut fragments = square(0.0, 0.0, 5.0);
        fragments.push(CurveFragment::segment(
            DVec2::new(20.0, 0.0),
            DVec2::new(25.0, 0.0),
        ));

        let kernel = PolylineKernel::new();
        let batch = build_faces(fragments, &kernel, &ChainAssembler::new());

        assert_eq!(batch.faces.len(), 1, "the closed square still builds");
        assert_eq!(batch.errors.len(), 1);
    }

    #[test]
    fn test_multi_sketch_entry() {
        let sketches = vec![square(0.0, 0.0, 5.0), square(10.0, 0.0, 5.0)];
        let kernel = PolylineKernel::new();
        let batch = build_faces_for_sketches(sketches, &kernel, &ChainAssembler::new());
        assert_eq!(batch.faces.len(), 2);
        assert!(batch.errors.is_empty());
    }

    #[test]
    fn test_degenerate_count_surfaces() {
        let mut fragments = square(0.0, 0.0, 5.0);
        fragments.push(CurveFragment::segment(DVec2::ZERO, DVec2::ZERO));
        let kernel = PolylineKernel::new();
        let batch = build_faces(fragments, &kernel, &ChainAssembler::new());
        assert_eq!(batch.degenerate_fragments, 1);
        assert_eq!(batch.faces.len(), 1);
    }
}
