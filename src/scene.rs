use crate::{error::Error, mesh::Mesh, surface::Surface};
use std::fmt;
use tracing::{info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Something that can be refined into a renderable mesh.
pub trait Refine {
    /// Apply the refinement configured on this entity. Refinement parameters
    /// that are consumed are reset, so refining twice without reconfiguring
    /// does nothing the second time.
    fn refine(&mut self) -> Result<(), Error>;

    /// The mesh to draw for this entity, if there is one.
    fn render_mesh(&self) -> Option<&Mesh>;
}

impl Refine for Mesh {
    /// Catmull-Clark subdivision followed by Bezier refinement. A mesh holds
    /// either polygons or splines, so at most one of them does anything.
    fn refine(&mut self) -> Result<(), Error> {
        self.subdivide_catmull_clark()?;
        self.subdivide_bezier()
    }

    fn render_mesh(&self) -> Option<&Mesh> {
        Some(self)
    }
}

impl Refine for Surface {
    fn refine(&mut self) -> Result<(), Error> {
        self.update_display_mesh()
    }

    fn render_mesh(&self) -> Option<&Mesh> {
        self.display_mesh.as_ref()
    }
}

/// Identifies an entity of a [`Scene`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntityId {
    Mesh(usize),
    Surface(usize),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Mesh(i) => write!(f, "mesh {i}"),
            EntityId::Surface(i) => write!(f, "surface {i}"),
        }
    }
}

/// The entities that could not be refined, and why.
#[derive(Debug, Default)]
pub struct SubdivisionReport {
    pub failures: Vec<(EntityId, Error)>,
}

impl SubdivisionReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self) -> impl Iterator<Item = EntityId> + use<'_> {
        self.failures.iter().map(|(id, _)| *id)
    }

    pub fn error(&self, id: EntityId) -> Option<&Error> {
        self.failures
            .iter()
            .find_map(|(fid, err)| (*fid == id).then_some(err))
    }
}

/// Collection of meshes and analytic surfaces.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Scene {
    pub meshes: Vec<Mesh>,
    pub surfaces: Vec<Surface>,
}

/// Refine every entity. Entities are independent, so with the `parallel`
/// feature they are refined on the rayon thread pool. The results are the
/// same either way.
fn refine_all<T: Refine + Send>(entities: &mut [T]) -> Vec<Result<(), Error>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};
        entities.par_iter_mut().map(Refine::refine).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        entities.iter_mut().map(Refine::refine).collect()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> EntityId {
        self.meshes.push(mesh);
        EntityId::Mesh(self.meshes.len() - 1)
    }

    pub fn add_surface(&mut self, surface: Surface) -> EntityId {
        self.surfaces.push(surface);
        EntityId::Surface(self.surfaces.len() - 1)
    }

    pub fn entity(&self, id: EntityId) -> Option<&dyn Refine> {
        match id {
            EntityId::Mesh(i) => self.meshes.get(i).map(|m| m as &dyn Refine),
            EntityId::Surface(i) => self.surfaces.get(i).map(|s| s as &dyn Refine),
        }
    }

    /// Refine every mesh and retessellate every surface.
    ///
    /// A failure only affects the entity it happened in. That entity is left
    /// in an unspecified state and reported, the other entities are refined
    /// as usual.
    ///
    /// ```rust
    /// use refine::{Scene, Surface, SurfaceParams};
    ///
    /// let mut scene = Scene::new();
    /// scene.add_surface(Surface::new(SurfaceParams::sphere(1.0).with_level(2)));
    /// let report = scene.subdivide();
    /// assert!(report.is_ok());
    /// assert_eq!(1, scene.display_meshes().count());
    /// ```
    pub fn subdivide(&mut self) -> SubdivisionReport {
        let meshes = refine_all(&mut self.meshes)
            .into_iter()
            .enumerate()
            .map(|(i, r)| (EntityId::Mesh(i), r));
        let surfaces = refine_all(&mut self.surfaces)
            .into_iter()
            .enumerate()
            .map(|(i, r)| (EntityId::Surface(i), r));
        let failures: Vec<(EntityId, Error)> = meshes
            .chain(surfaces)
            .filter_map(|(id, r)| r.err().map(|e| (id, e)))
            .inspect(|(id, err)| warn!(entity = %id, error = %err, "Cannot refine entity"))
            .collect();
        info!(
            meshes = self.meshes.len(),
            surfaces = self.surfaces.len(),
            failed = failures.len(),
            "Refined scene"
        );
        SubdivisionReport { failures }
    }

    /// The meshes to draw: every mesh, followed by the display meshes of the
    /// surfaces that have one.
    pub fn display_meshes(&self) -> impl Iterator<Item = &Mesh> + use<'_> {
        self.meshes
            .iter()
            .filter_map(Refine::render_mesh)
            .chain(self.surfaces.iter().filter_map(Refine::render_mesh))
    }
}
