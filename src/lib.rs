/*!
Refinement of indexed meshes and analytic surfaces into meshes ready to be
drawn.

# Overview

+ A [`Mesh`] is a set of flat vertex buffers (positions, normals, texture
  coordinates) and lists of index tuples into those buffers: triangles,
  quads, lines and cubic Bezier spline segments. A mesh holds one family of
  primitives at a time.

+ Polygon meshes are refined with Catmull-Clark subdivision. Every level
  splits each triangle into 3 quads and each quad into 4 quads, then moves
  every vertex towards the average of the centroids of its incident
  quads. The [`EdgeMap`] assigns the edge ids used to share edge points
  between neighbouring faces.

+ Spline meshes are turned into polylines, either by sampling every segment
  at uniformly spaced parameters, or by recursively splitting the segments
  until they are flat.

+ A [`Surface`] is an analytic description of a plane or a sphere. It is
  tessellated into a display mesh at the resolution of its parameters, and
  can be retessellated at any other resolution without losing the
  description.

+ After refinement, facet or smooth normals are computed for polygon meshes,
  and tangents for polylines.

+ A [`Scene`] holds meshes and surfaces and refines all of them. Entities are
  independent, so a failure in one does not affect the others. With the
  `parallel` feature the entities are refined on the rayon thread pool.

The refinement parameters are stored on the entities themselves, see
[`CatmullClarkParams`], [`BezierParams`] and [`SurfaceParams`].
*/

mod bezier;
mod catmull;
mod check;
mod edge_map;
mod error;
mod macros;
mod mesh;
mod normals;
#[cfg(feature = "obj")]
mod obj;
mod params;
mod scene;
mod surface;

pub use bezier::{bernstein, eval_cubic, flatness_ratio, split_cubic};
pub use edge_map::EdgeMap;
pub use error::{Error, Primitive};
pub use mesh::{Mesh, PrimitiveFamily};
pub use normals::{NormalMode, quad_normal, triangle_normal};
pub use params::{
    BezierParams, BezierStrategy, CatmullClarkParams, DEFAULT_FLATNESS, DEFAULT_MAX_PASSES,
    MAX_LEVEL, SurfaceParams, SurfaceShape,
};
pub use scene::{EntityId, Refine, Scene, SubdivisionReport};
pub use surface::{Displacement, HeightField, MAX_TESSELLATION_LEVEL, Surface};
