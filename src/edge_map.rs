use crate::{error::Error, mesh::Mesh};
use hashbrown::HashMap;

/// Deduplicated, undirected edges of a set of triangles and quads.
///
/// Each edge gets a sequential id the first time it is seen, so ids follow
/// the order of the faces. The orientation in which an edge is first seen
/// does not matter: both `(a, b)` and `(b, a)` map to the same id, and
/// meeting the edge again from another face does not add a new edge.
#[derive(Debug, Clone, Default)]
pub struct EdgeMap {
    lookup: HashMap<(u32, u32), u32>,
    edges: Vec<[u32; 2]>,
    valences: Vec<u32>,
}

/// Key that is the same for both orientations of an edge.
const fn canonical(a: u32, b: u32) -> (u32, u32) {
    if a <= b { (a, b) } else { (b, a) }
}

impl EdgeMap {
    /// Create an edge map with the boundary edges of every triangle and quad.
    pub fn new(triangles: &[[u32; 3]], quads: &[[u32; 4]]) -> Self {
        let nedges = (triangles.len() * 3 + quads.len() * 4) / 2;
        let mut map = EdgeMap {
            lookup: HashMap::with_capacity(nedges),
            edges: Vec::with_capacity(nedges),
            valences: Vec::with_capacity(nedges),
        };
        for &[a, b, c] in triangles {
            map.add_edge(a, b);
            map.add_edge(b, c);
            map.add_edge(c, a);
        }
        for &[a, b, c, d] in quads {
            map.add_edge(a, b);
            map.add_edge(b, c);
            map.add_edge(c, d);
            map.add_edge(d, a);
        }
        map
    }

    /// Edge map of the triangles and quads of `mesh`.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        Self::new(&mesh.triangle, &mesh.quad)
    }

    fn add_edge(&mut self, a: u32, b: u32) {
        let next = self.edges.len() as u32;
        let id = *self.lookup.entry(canonical(a, b)).or_insert(next);
        if id == next {
            self.edges.push([a, b]);
            self.valences.push(1);
        } else {
            self.valences[id as usize] += 1;
        }
    }

    /// The endpoints of all edges, indexed by edge id.
    pub fn edges(&self) -> &[[u32; 2]] {
        &self.edges
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Id of the edge between `a` and `b`, in either order.
    pub fn edge_index(&self, a: u32, b: u32) -> Result<u32, Error> {
        self.lookup
            .get(&canonical(a, b))
            .copied()
            .ok_or(Error::EdgeNotFound(a, b))
    }

    /// Number of faces incident on the edge, or `None` if there is no edge
    /// with this id.
    pub fn edge_valence(&self, id: u32) -> Option<u32> {
        self.valences.get(id as usize).copied()
    }

    /// An edge with exactly one incident face.
    pub fn is_boundary(&self, id: u32) -> bool {
        self.edge_valence(id) == Some(1)
    }

    /// Edges with exactly one incident face.
    pub fn boundary_edges(&self) -> impl Iterator<Item = u32> + use<'_> {
        (0..self.edges.len() as u32).filter(|&e| self.is_boundary(e))
    }
}

impl Mesh {
    /// Deduplicated edges of the triangles and quads of this mesh, as line
    /// segments. This is what a wireframe view draws.
    pub fn wireframe_lines(&self) -> Vec<[u32; 2]> {
        EdgeMap::from_mesh(self).edges
    }
}

#[cfg(test)]
mod test {
    use super::EdgeMap;
    use crate::{error::Error, params::SurfaceParams, surface::Surface};

    /// Box with the following topology.
    ///
    ///  ```text
    ///       7-----------6
    ///      /|          /|
    ///     / |         / |
    ///    4-----------5  |
    ///    |  |        |  |
    ///    |  3--------|--2
    ///    | /         | /
    ///    |/          |/
    ///    0-----------1
    ///  ```
    const BOX_QUADS: [[u32; 4]; 6] = [
        [0, 3, 2, 1],
        [0, 1, 5, 4],
        [1, 2, 6, 5],
        [2, 3, 7, 6],
        [3, 0, 4, 7],
        [4, 5, 6, 7],
    ];

    const TETRAHEDRON: [[u32; 3]; 4] = [[0, 1, 2], [0, 2, 3], [0, 3, 1], [3, 2, 1]];

    #[test]
    fn t_box_edges() {
        let map = EdgeMap::new(&[], &BOX_QUADS);
        assert_eq!(12, map.num_edges());
        assert_eq!(
            map.edges(),
            &[
                [0, 3],
                [3, 2],
                [2, 1],
                [1, 0],
                [1, 5],
                [5, 4],
                [4, 0],
                [2, 6],
                [6, 5],
                [3, 7],
                [7, 6],
                [4, 7],
            ]
        );
        assert_eq!(0, map.boundary_edges().count());
        for e in 0..12 {
            assert_eq!(Some(2), map.edge_valence(e));
        }
        assert_eq!(None, map.edge_valence(12));
        assert!(!map.is_boundary(12));
    }

    #[test]
    fn t_edge_index_symmetry() {
        let map = EdgeMap::new(&TETRAHEDRON, &BOX_QUADS);
        for f in &TETRAHEDRON {
            for i in 0..3 {
                let (a, b) = (f[i], f[(i + 1) % 3]);
                assert_eq!(
                    map.edge_index(a, b).expect("Cannot find edge"),
                    map.edge_index(b, a).expect("Cannot find edge")
                );
            }
        }
        for f in &BOX_QUADS {
            for i in 0..4 {
                let (a, b) = (f[i], f[(i + 1) % 4]);
                let e = map.edge_index(a, b).expect("Cannot find edge");
                assert_eq!(e, map.edge_index(b, a).expect("Cannot find edge"));
                let [x, y] = map.edges()[e as usize];
                assert!((x, y) == (a, b) || (x, y) == (b, a));
            }
        }
    }

    #[test]
    fn t_shared_edge_opposite_orientations() {
        // The edge (1, 2) is seen as (1, 2) from the first face and as (2, 1)
        // from the second.
        let map = EdgeMap::new(&[[0, 1, 2], [2, 1, 3]], &[]);
        assert_eq!(5, map.num_edges());
        let e = map.edge_index(1, 2).expect("Cannot find edge");
        assert_eq!(e, map.edge_index(2, 1).expect("Cannot find edge"));
        assert_eq!(1, e);
        assert_eq!([1, 2], map.edges()[e as usize]);
        assert_eq!(Some(2), map.edge_valence(e));
        assert_eq!(map.edges(), &[[0, 1], [1, 2], [2, 0], [1, 3], [3, 2]]);
    }

    #[test]
    fn t_edge_not_found() {
        let map = EdgeMap::new(&TETRAHEDRON, &[]);
        assert_eq!(6, map.num_edges());
        assert!(matches!(map.edge_index(0, 7), Err(Error::EdgeNotFound(0, 7))));
        assert!(EdgeMap::new(&[], &[]).is_empty());
    }

    #[test]
    fn t_open_mesh_boundary() {
        let map = EdgeMap::new(&[[0, 1, 2]], &[[1, 3, 4, 2]]);
        assert_eq!(6, map.num_edges());
        let shared = map.edge_index(2, 1).expect("Cannot find edge");
        assert!(!map.is_boundary(shared));
        assert_eq!(5, map.boundary_edges().count());
    }

    #[test]
    fn t_sphere_euler_characteristic() {
        for level in 0..4 {
            let mesh = Surface::new(SurfaceParams::sphere(1.0).with_level(level).with_smooth(true))
                .tessellate()
                .expect("Cannot tessellate sphere");
            let map = EdgeMap::from_mesh(&mesh);
            // Every edge of a closed mesh is shared by two faces.
            assert_eq!(
                (3 * mesh.triangle.len() + 4 * mesh.quad.len()) / 2,
                map.num_edges()
            );
            assert_eq!(0, map.boundary_edges().count());
            assert_eq!(
                2,
                mesh.num_vertices() as i64 - map.num_edges() as i64 + mesh.num_faces() as i64
            );
        }
    }

    #[test]
    fn t_wireframe_lines() {
        let mut mesh = crate::mesh::Mesh::new();
        mesh.pos = vec![glam::Vec3::ZERO; 8];
        mesh.quad.extend_from_slice(&BOX_QUADS);
        let lines = mesh.wireframe_lines();
        assert_eq!(12, lines.len());
        assert_eq!([0, 3], lines[0]);
    }
}
