use crate::params::{BezierParams, CatmullClarkParams};
use glam::{Affine3A, Vec2, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The family of primitives held by a mesh. Refinement expects a mesh to hold
/// one family at a time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrimitiveFamily {
    Empty,
    /// Triangles and / or quads.
    Polygons,
    Polylines,
    Splines,
    /// More than one of the above.
    Mixed,
}

/// Indexed mesh with flat vertex buffers.
///
/// Index `i` in `pos`, `norm` and `texcoord` refers to the same vertex. All
/// faces, lines and spline segments are tuples of indices into these
/// buffers. `norm` holds per-vertex normals for polygon meshes, and
/// per-vertex tangents for polylines. `texcoord` is either empty or exactly
/// as long as `pos`.
///
/// ```rust
/// use refine::{Mesh, PrimitiveFamily};
///
/// let mut mesh = Mesh::new();
/// mesh.pos.extend([
///     glam::vec3(0.0, 0.0, 0.0),
///     glam::vec3(1.0, 0.0, 0.0),
///     glam::vec3(0.0, 1.0, 0.0),
/// ]);
/// mesh.triangle.push([0, 1, 2]);
/// assert_eq!(PrimitiveFamily::Polygons, mesh.primitive_family());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Mesh {
    pub pos: Vec<Vec3>,
    pub norm: Vec<Vec3>,
    pub texcoord: Vec<Vec2>,
    pub triangle: Vec<[u32; 3]>,
    pub quad: Vec<[u32; 4]>,
    pub line: Vec<[u32; 2]>,
    /// Cubic Bezier segments `(p0, p1, p2, p3)`. `p0` and `p3` lie on the
    /// curve, `p1` and `p2` are control points.
    pub spline: Vec<[u32; 4]>,
    pub catmull_clark: CatmullClarkParams,
    pub bezier: BezierParams,
    /// Placement of the mesh in the scene. Not used by refinement.
    pub frame: Affine3A,
    /// Material slot of the scene. Not used by refinement.
    pub material: Option<usize>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    pub fn new() -> Self {
        Mesh {
            pos: Vec::new(),
            norm: Vec::new(),
            texcoord: Vec::new(),
            triangle: Vec::new(),
            quad: Vec::new(),
            line: Vec::new(),
            spline: Vec::new(),
            catmull_clark: CatmullClarkParams::default(),
            bezier: BezierParams::default(),
            frame: Affine3A::IDENTITY,
            material: None,
        }
    }

    /// Create a polygon mesh from positions, triangles and quads.
    pub fn from_polygons(pos: Vec<Vec3>, triangle: Vec<[u32; 3]>, quad: Vec<[u32; 4]>) -> Self {
        Mesh {
            pos,
            triangle,
            quad,
            ..Self::new()
        }
    }

    /// Create a spline mesh from control points and Bezier segments.
    pub fn from_splines(pos: Vec<Vec3>, spline: Vec<[u32; 4]>) -> Self {
        Mesh {
            pos,
            spline,
            ..Self::new()
        }
    }

    /// Create a polyline mesh from positions and line segments.
    pub fn from_lines(pos: Vec<Vec3>, line: Vec<[u32; 2]>) -> Self {
        Mesh {
            pos,
            line,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn with_catmull_clark(mut self, params: CatmullClarkParams) -> Self {
        self.catmull_clark = params;
        self
    }

    #[must_use]
    pub fn with_bezier(mut self, params: BezierParams) -> Self {
        self.bezier = params;
        self
    }

    pub fn num_vertices(&self) -> usize {
        self.pos.len()
    }

    /// Number of triangles and quads.
    pub fn num_faces(&self) -> usize {
        self.triangle.len() + self.quad.len()
    }

    pub fn has_normals(&self) -> bool {
        !self.norm.is_empty() && self.norm.len() == self.pos.len()
    }

    pub fn has_texcoords(&self) -> bool {
        !self.texcoord.is_empty()
    }

    pub fn primitive_family(&self) -> PrimitiveFamily {
        let polys = self.num_faces() > 0;
        let lines = !self.line.is_empty();
        let splines = !self.spline.is_empty();
        match (polys, lines, splines) {
            (false, false, false) => PrimitiveFamily::Empty,
            (true, false, false) => PrimitiveFamily::Polygons,
            (false, true, false) => PrimitiveFamily::Polylines,
            (false, false, true) => PrimitiveFamily::Splines,
            _ => PrimitiveFamily::Mixed,
        }
    }

    /// Compute the centroid of a face as the average position of its
    /// vertices. `points` must be the vertex positions.
    pub(crate) fn face_centroid<const N: usize>(face: &[u32; N], points: &[Vec3]) -> Vec3 {
        face.iter()
            .fold(Vec3::ZERO, |total, &v| total + points[v as usize])
            / (N as f32)
    }
}
