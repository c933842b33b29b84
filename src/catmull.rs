use crate::{
    edge_map::EdgeMap,
    error::Error,
    mesh::Mesh,
    normals::NormalMode,
    params::{CatmullClarkParams, check_level},
};
use glam::Vec3;
use tracing::debug;

/// Offsets of the new points in the vertex buffer of the next level.
struct Offsets {
    edge: u32,
    triangle: u32,
    quad: u32,
}

impl Offsets {
    fn new(
        num_points: usize,
        num_edges: usize,
        num_triangles: usize,
        num_quads: usize,
    ) -> Result<Self, Error> {
        let total = num_points
            .saturating_add(num_edges)
            .saturating_add(num_triangles)
            .saturating_add(num_quads);
        if u32::try_from(total).is_err() {
            return Err(Error::IndexOverflow(total));
        }
        // Every offset is at most `total`.
        let edge = num_points as u32;
        let triangle = edge + num_edges as u32;
        Ok(Offsets {
            edge,
            triangle,
            quad: triangle + num_triangles as u32,
        })
    }
}

/// Result of splitting every face, before the positions are smoothed.
struct Split {
    points: Vec<Vec3>,
    quads: Vec<[u32; 4]>,
    edges: EdgeMap,
    offsets: Offsets,
}

/// Append the edge points and face points to a copy of the vertices, and
/// split every triangle into 3 quads and every quad into 4 quads.
fn split_faces(
    points: &[Vec3],
    triangles: &[[u32; 3]],
    quads: &[[u32; 4]],
) -> Result<Split, Error> {
    let edges = EdgeMap::new(triangles, quads);
    let offsets = Offsets::new(
        points.len(),
        edges.num_edges(),
        triangles.len(),
        quads.len(),
    )?;
    let mut newpts = Vec::with_capacity(offsets.quad as usize + quads.len());
    newpts.extend_from_slice(points);
    newpts.extend(
        edges
            .edges()
            .iter()
            .map(|&[a, b]| points[a as usize].midpoint(points[b as usize])),
    );
    newpts.extend(triangles.iter().map(|t| Mesh::face_centroid(t, points)));
    newpts.extend(quads.iter().map(|q| Mesh::face_centroid(q, points)));
    let edge_point = |a: u32, b: u32| -> Result<u32, Error> {
        Ok(offsets.edge + edges.edge_index(a, b)?)
    };
    let mut newquads = Vec::with_capacity(triangles.len() * 3 + quads.len() * 4);
    for (fi, &[a, b, c]) in triangles.iter().enumerate() {
        let d = offsets.triangle + fi as u32;
        let ab = edge_point(a, b)?;
        let bc = edge_point(b, c)?;
        let ca = edge_point(c, a)?;
        newquads.extend([[a, ab, d, ca], [ab, b, bc, d], [bc, c, ca, d]]);
    }
    for (fi, &[a, b, c, d]) in quads.iter().enumerate() {
        let e = offsets.quad + fi as u32;
        let ab = edge_point(a, b)?;
        let bc = edge_point(b, c)?;
        let cd = edge_point(c, d)?;
        let da = edge_point(d, a)?;
        newquads.extend([[a, ab, e, da], [ab, b, bc, e], [e, bc, c, cd], [da, e, cd, d]]);
    }
    Ok(Split {
        points: newpts,
        quads: newquads,
        edges,
        offsets,
    })
}

/// Move every vertex towards the average centroid of its incident quads.
///
/// Vertices on a boundary edge of the previous level, and the edge points of
/// those edges, keep their position.
fn smooth_points(
    points: &mut [Vec3],
    quads: &[[u32; 4]],
    edges: &EdgeMap,
    edge_offset: u32,
) -> Result<(), Error> {
    let mut sums = vec![Vec3::ZERO; points.len()];
    let mut counts = vec![0u32; points.len()];
    for q in quads {
        let centroid = Mesh::face_centroid(q, points);
        for &v in q {
            sums[v as usize] += centroid;
            counts[v as usize] += 1;
        }
    }
    let mut pinned = vec![false; points.len()];
    for e in edges.boundary_edges() {
        let [a, b] = edges.edges()[e as usize];
        pinned[a as usize] = true;
        pinned[b as usize] = true;
        pinned[(edge_offset + e) as usize] = true;
    }
    for (vi, ((p, sum), (&count, &pin))) in points
        .iter_mut()
        .zip(sums.iter())
        .zip(counts.iter().zip(pinned.iter()))
        .enumerate()
    {
        if count == 0 {
            return Err(Error::IsolatedVertex(vi as u32));
        }
        if pin {
            continue;
        }
        let avg = *sum / count as f32;
        *p += (avg - *p) * (4.0 / count as f32);
    }
    Ok(())
}

impl Mesh {
    /// Apply the Catmull-Clark subdivision configured on this mesh, then
    /// recompute the normals. The subdivision level is reset to zero, so
    /// calling this again does nothing until a new level is set.
    ///
    /// Texture coordinates do not survive subdivision.
    ///
    /// ```rust
    /// use refine::{CatmullClarkParams, Mesh};
    ///
    /// let mut mesh = Mesh::from_polygons(
    ///     vec![
    ///         glam::vec3(-1.0, -1.0, 0.0),
    ///         glam::vec3(1.0, -1.0, 0.0),
    ///         glam::vec3(1.0, 1.0, 0.0),
    ///         glam::vec3(-1.0, 1.0, 0.0),
    ///     ],
    ///     Vec::new(),
    ///     vec![[0, 1, 2, 3]],
    /// )
    /// .with_catmull_clark(CatmullClarkParams::new().with_level(1).with_smooth(true));
    /// mesh.subdivide_catmull_clark().expect("Subdivision failed");
    /// assert_eq!((9, 4), (mesh.num_vertices(), mesh.quad.len()));
    /// assert_eq!(0, mesh.catmull_clark.level);
    /// ```
    pub fn subdivide_catmull_clark(&mut self) -> Result<(), Error> {
        let CatmullClarkParams { level, smooth } = self.catmull_clark;
        if level == 0 {
            return Ok(());
        }
        if self.num_faces() == 0 {
            self.catmull_clark.level = 0;
            return Ok(());
        }
        self.subdivide_catmull_clark_levels(level)?;
        self.catmull_clark.level = 0;
        self.update_normals(NormalMode::from_smooth(smooth))
    }

    /// Apply `levels` levels of Catmull-Clark subdivision. Only the positions
    /// and faces are updated. Normals and texture coordinates are cleared.
    pub fn subdivide_catmull_clark_levels(&mut self, levels: u32) -> Result<(), Error> {
        check_level(levels)?;
        self.check()?;
        if levels == 0 || self.num_faces() == 0 {
            return Ok(());
        }
        self.norm.clear();
        self.texcoord.clear();
        for level in 0..levels {
            let mut split = split_faces(&self.pos, &self.triangle, &self.quad)?;
            smooth_points(
                &mut split.points,
                &split.quads,
                &split.edges,
                split.offsets.edge,
            )?;
            self.pos = split.points;
            self.quad = split.quads;
            self.triangle.clear();
            debug!(
                "Catmull-Clark level {}: {} vertices, {} quads",
                level + 1,
                self.pos.len(),
                self.quad.len()
            );
        }
        Ok(())
    }
}
