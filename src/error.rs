use thiserror::Error;

/// Which index list of a [`Mesh`](crate::Mesh) an element belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Primitive {
    Triangle,
    Quad,
    Line,
    Spline,
}

#[derive(Debug, Error)]
pub enum Error {
    // Topology.
    #[error("Edge ({0}, {1}) is not incident on any face")]
    EdgeNotFound(u32, u32),
    #[error("Vertex {0} is not referenced by any element")]
    IsolatedVertex(u32),
    // Degenerate geometry.
    #[error("Triangle {0} has zero area")]
    DegenerateTriangle(usize),
    #[error("Quad {0} has zero area")]
    DegenerateQuad(usize),
    #[error("Line {0} has zero length")]
    DegenerateLine(usize),
    #[error("Normal of vertex {0} vanishes")]
    DegenerateNormal(u32),
    #[error("Tangent of vertex {0} vanishes")]
    DegenerateTangent(u32),
    #[error("Control polygon of spline {0} has zero length")]
    DegenerateCurve(usize),
    #[error("Bezier splitting did not converge after {passes} passes ({segments} segments)")]
    BezierNotConverged { passes: u32, segments: usize },
    // Configuration.
    #[error("Subdivision level {level} exceeds the maximum of {max}")]
    InvalidLevel { level: u32, max: u32 },
    #[error("{primitive:?} {element} references vertex {index}, but there are only {len}")]
    IndexOutOfBounds {
        primitive: Primitive,
        element: usize,
        index: u32,
        len: usize,
    },
    #[error("Expected an array of length {0} or an empty array, found {1}")]
    MismatchedArrayLengths(usize, usize),
    /// The mesh holds more than one family of primitives, e.g. quads and
    /// splines at the same time.
    #[error("Mesh mixes polygons, lines and splines")]
    MixedPrimitives,
    #[error("{0} vertices cannot be addressed with u32 indices")]
    IndexOverflow(usize),
    #[error("Height field of {width}x{height} holds {len} samples")]
    InvalidHeightField {
        width: usize,
        height: usize,
        len: usize,
    },
    // Obj.
    #[error("Faces with {0} vertices are not supported")]
    UnsupportedFaceArity(usize),
    #[error("Cannot load obj: {0}")]
    ObjLoadFailed(String),
}
