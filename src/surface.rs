use crate::{
    error::Error,
    mesh::Mesh,
    normals::NormalMode,
    params::{SurfaceParams, SurfaceShape, check_level},
};
use glam::{Affine3A, Vec2, Vec3, vec2, vec3};
use std::f32::consts::{PI, TAU};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest accepted tessellation level. Beyond this the vertex count of a
/// sphere no longer fits in `u32` indices.
pub const MAX_TESSELLATION_LEVEL: u32 = 14;

/// Row major grid of scalar samples, `width` samples per row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawHeightField"))]
pub struct HeightField {
    width: usize,
    height: usize,
    samples: Vec<f32>,
}

/// Height field as read by a deserializer, before it is validated.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawHeightField {
    width: usize,
    height: usize,
    samples: Vec<f32>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawHeightField> for HeightField {
    type Error = Error;

    fn try_from(raw: RawHeightField) -> Result<Self, Self::Error> {
        HeightField::new(raw.width, raw.height, raw.samples)
    }
}

impl HeightField {
    pub fn new(width: usize, height: usize, samples: Vec<f32>) -> Result<Self, Error> {
        if width == 0 || height == 0 || width.checked_mul(height) != Some(samples.len()) {
            return Err(Error::InvalidHeightField {
                width,
                height,
                len: samples.len(),
            });
        }
        Ok(HeightField {
            width,
            height,
            samples,
        })
    }

    /// Height field with the same value everywhere.
    pub fn constant(value: f32) -> Self {
        HeightField {
            width: 1,
            height: 1,
            samples: vec![value],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Nearest sample to the parameters `u` and `v`. Both are clamped to
    /// `[0, 1]`, `u` runs along a row and `v` across rows.
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        let nearest =
            |t: f32, n: usize| (t.clamp(0.0, 1.0) * n.saturating_sub(1) as f32).round() as usize;
        let x = nearest(u, self.width);
        let y = nearest(v, self.height);
        self.samples
            .get(y * self.width + x)
            .copied()
            .unwrap_or_default()
    }
}

/// Offsets a tessellated surface by a scaled height field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Displacement {
    pub depth: f32,
    pub map: HeightField,
}

impl Displacement {
    pub fn new(depth: f32, map: HeightField) -> Self {
        Displacement { depth, map }
    }

    fn offset(&self, u: f32, v: f32) -> f32 {
        self.depth * self.map.sample(u, v)
    }
}

/// An analytic surface, and the mesh most recently tessellated from it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Surface {
    pub params: SurfaceParams,
    pub displacement: Option<Displacement>,
    pub frame: Affine3A,
    pub material: Option<usize>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub display_mesh: Option<Mesh>,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(SurfaceParams::default())
    }
}

impl Surface {
    pub fn new(params: SurfaceParams) -> Self {
        Surface {
            params,
            displacement: None,
            frame: Affine3A::IDENTITY,
            material: None,
            display_mesh: None,
        }
    }

    #[must_use]
    pub fn with_displacement(mut self, displacement: Displacement) -> Self {
        self.displacement = Some(displacement);
        self
    }

    #[must_use]
    pub fn with_frame(mut self, frame: Affine3A) -> Self {
        self.frame = frame;
        self
    }

    #[must_use]
    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }

    /// Build a new mesh approximating this surface at the resolution of its
    /// parameters, with facet or smooth normals depending on the parameters.
    ///
    /// ```rust
    /// use refine::{Surface, SurfaceParams};
    ///
    /// let sphere = Surface::new(SurfaceParams::sphere(1.0).with_level(1));
    /// let mesh = sphere.tessellate().expect("Cannot tessellate sphere");
    /// assert_eq!(16, mesh.triangle.len());
    /// assert_eq!(16, mesh.quad.len());
    /// ```
    pub fn tessellate(&self) -> Result<Mesh, Error> {
        let SurfaceParams {
            shape,
            radius,
            level,
            smooth,
        } = self.params;
        check_level(level)?;
        if level > MAX_TESSELLATION_LEVEL {
            return Err(Error::InvalidLevel {
                level,
                max: MAX_TESSELLATION_LEVEL,
            });
        }
        let mut mesh = match shape {
            SurfaceShape::Quad => self.quad_grid(radius, level),
            SurfaceShape::Sphere => self.uv_sphere(radius, level),
        };
        debug!(
            "Tessellated {:?} at level {}: {} vertices, {} faces",
            shape,
            level,
            mesh.num_vertices(),
            mesh.num_faces()
        );
        mesh.frame = self.frame;
        mesh.material = self.material;
        mesh.update_normals(NormalMode::from_smooth(smooth))?;
        Ok(mesh)
    }

    /// Tessellate this surface and keep the result as its display mesh. The
    /// previous display mesh is kept if tessellation fails.
    pub fn update_display_mesh(&mut self) -> Result<(), Error> {
        self.display_mesh = Some(self.tessellate()?);
        Ok(())
    }

    fn displace(&self, u: f32, v: f32) -> f32 {
        self.displacement
            .as_ref()
            .map_or(0.0, |d| d.offset(u, v))
    }

    /// Bilinear patch over the square with corners `(±r, ±r, 0)`.
    fn quad_grid(&self, radius: f32, level: u32) -> Mesh {
        let n = 1u32 << level;
        let side = n + 1;
        let corners = [
            vec3(1.0, 1.0, 0.0),
            vec3(-1.0, 1.0, 0.0),
            vec3(1.0, -1.0, 0.0),
            vec3(-1.0, -1.0, 0.0),
        ]
        .map(|c| c * radius);
        let params: Vec<Vec2> = (0..side)
            .flat_map(|i| (0..side).map(move |j| vec2(i as f32 / n as f32, j as f32 / n as f32)))
            .collect();
        let pos = params
            .iter()
            .map(|&Vec2 { x: u, y: v }| {
                let p = corners[0]
                    .lerp(corners[1], u)
                    .lerp(corners[2].lerp(corners[3], u), v);
                p + Vec3::Z * self.displace(u, v)
            })
            .collect();
        let quad = (0..n)
            .flat_map(|i| {
                (0..n).map(move |j| {
                    let v = i * side + j;
                    [v, v + side, v + side + 1, v + 1]
                })
            })
            .collect();
        let mut mesh = Mesh::from_polygons(pos, Vec::new(), quad);
        mesh.texcoord = params;
        mesh
    }

    /// Sphere with a single vertex at each pole. The bands touching the poles
    /// are triangle fans, the other bands are quads. Columns wrap around, so
    /// no vertex is duplicated along the seam.
    fn uv_sphere(&self, radius: f32, level: u32) -> Mesh {
        let cols = 1u32 << (level + 2);
        let bands = 1u32 << (level + 1);
        let rings = bands - 1;
        let point = |col: u32, band: u32| {
            let (u, v) = (col as f32 / cols as f32, band as f32 / bands as f32);
            let (sin_phi, cos_phi) = (u * TAU).sin_cos();
            let (sin_theta, cos_theta) = (v * PI).sin_cos();
            vec3(cos_phi * sin_theta, sin_phi * sin_theta, cos_theta)
                * (radius + self.displace(u, v))
        };
        let north = 0u32;
        let south = 1 + rings * cols;
        let vertex = |ring: u32, col: u32| 1 + (ring - 1) * cols + col % cols;
        let mut pos = Vec::with_capacity(south as usize + 1);
        pos.push(point(0, 0));
        pos.extend(
            (1..=rings)
                .flat_map(|r| (0..cols).map(move |c| (c, r)))
                .map(|(c, r)| point(c, r)),
        );
        pos.push(point(0, bands));
        let mut triangle = Vec::with_capacity(2 * cols as usize);
        triangle.extend((0..cols).map(|c| [north, vertex(1, c), vertex(1, c + 1)]));
        triangle.extend((0..cols).map(|c| [vertex(rings, c), south, vertex(rings, c + 1)]));
        let quad = (1..rings)
            .flat_map(|r| {
                (0..cols).map(move |c| {
                    [
                        vertex(r, c),
                        vertex(r + 1, c),
                        vertex(r + 1, c + 1),
                        vertex(r, c + 1),
                    ]
                })
            })
            .collect();
        Mesh::from_polygons(pos, triangle, quad)
    }
}
