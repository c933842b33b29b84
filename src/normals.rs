use crate::{error::Error, mesh::Mesh};
use glam::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the normals of a polygon mesh are computed.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NormalMode {
    /// One normal per face. Vertices are duplicated so faces don't share
    /// them.
    #[default]
    Facet,
    /// Vertex normals averaged over the incident faces.
    Smooth,
}

impl NormalMode {
    pub fn from_smooth(smooth: bool) -> Self {
        if smooth {
            NormalMode::Smooth
        } else {
            NormalMode::Facet
        }
    }
}

/// Unit normal of a triangle, or `None` if the triangle has no area.
pub fn triangle_normal(p0: Vec3, p1: Vec3, p2: Vec3) -> Option<Vec3> {
    (p1 - p0).cross(p2 - p0).try_normalize()
}

/// Unit normal of a quad, as the normalized average of the normals of the
/// triangles `(0, 1, 2)` and `(0, 2, 3)`. This tolerates quads that are not
/// exactly planar. Returns `None` if the quad has no area.
pub fn quad_normal(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Option<Vec3> {
    let n0 = (p1 - p0).cross(p2 - p0).normalize_or_zero();
    let n1 = (p2 - p0).cross(p3 - p0).normalize_or_zero();
    (n0 + n1).try_normalize()
}

impl Mesh {
    fn triangle_normals(&self) -> impl Iterator<Item = Result<Vec3, Error>> + use<'_> {
        self.triangle.iter().enumerate().map(|(i, &[a, b, c])| {
            triangle_normal(
                self.pos[a as usize],
                self.pos[b as usize],
                self.pos[c as usize],
            )
            .ok_or(Error::DegenerateTriangle(i))
        })
    }

    fn quad_normals(&self) -> impl Iterator<Item = Result<Vec3, Error>> + use<'_> {
        self.quad.iter().enumerate().map(|(i, &[a, b, c, d])| {
            quad_normal(
                self.pos[a as usize],
                self.pos[b as usize],
                self.pos[c as usize],
                self.pos[d as usize],
            )
            .ok_or(Error::DegenerateQuad(i))
        })
    }

    /// Give every face its own copy of its vertices, each carrying the flat
    /// normal of the face. Texture coordinates are duplicated along with the
    /// positions.
    pub fn facet_normals(&mut self) -> Result<(), Error> {
        self.check()?;
        let nverts = self.triangle.len() * 3 + self.quad.len() * 4;
        let with_texcoords = self.has_texcoords();
        let mut pos = Vec::with_capacity(nverts);
        let mut norm = Vec::with_capacity(nverts);
        let mut texcoord = Vec::with_capacity(if with_texcoords { nverts } else { 0 });
        let mut triangle = Vec::with_capacity(self.triangle.len());
        let mut quad = Vec::with_capacity(self.quad.len());
        for (f, fnorm) in self.triangle.iter().zip(self.triangle_normals()) {
            let fnorm = fnorm?;
            let nv = pos.len() as u32;
            triangle.push([nv, nv + 1, nv + 2]);
            for &v in f {
                pos.push(self.pos[v as usize]);
                norm.push(fnorm);
                if with_texcoords {
                    texcoord.push(self.texcoord[v as usize]);
                }
            }
        }
        for (f, fnorm) in self.quad.iter().zip(self.quad_normals()) {
            let fnorm = fnorm?;
            let nv = pos.len() as u32;
            quad.push([nv, nv + 1, nv + 2, nv + 3]);
            for &v in f {
                pos.push(self.pos[v as usize]);
                norm.push(fnorm);
                if with_texcoords {
                    texcoord.push(self.texcoord[v as usize]);
                }
            }
        }
        self.pos = pos;
        self.norm = norm;
        self.texcoord = texcoord;
        self.triangle = triangle;
        self.quad = quad;
        Ok(())
    }

    /// Compute vertex normals as the normalized sum of the normals of the
    /// incident faces. Vertices are not duplicated.
    ///
    /// Every vertex must be referenced by at least one face.
    pub fn smooth_normals(&mut self) -> Result<(), Error> {
        self.check()?;
        let mut norm = vec![Vec3::ZERO; self.pos.len()];
        let mut hits = vec![false; self.pos.len()];
        for (f, fnorm) in self.triangle.iter().zip(self.triangle_normals()) {
            let fnorm = fnorm?;
            for &v in f {
                norm[v as usize] += fnorm;
                hits[v as usize] = true;
            }
        }
        for (f, fnorm) in self.quad.iter().zip(self.quad_normals()) {
            let fnorm = fnorm?;
            for &v in f {
                norm[v as usize] += fnorm;
                hits[v as usize] = true;
            }
        }
        normalize_all(&mut norm, &hits, Error::DegenerateNormal)?;
        self.norm = norm;
        Ok(())
    }

    /// Compute per-vertex tangents of a polyline as the normalized sum of the
    /// directions of the incident line segments. The tangents are stored in
    /// `norm`.
    pub fn smooth_tangents(&mut self) -> Result<(), Error> {
        self.check()?;
        let mut norm = vec![Vec3::ZERO; self.pos.len()];
        let mut hits = vec![false; self.pos.len()];
        for (i, &[a, b]) in self.line.iter().enumerate() {
            let dir = (self.pos[b as usize] - self.pos[a as usize])
                .try_normalize()
                .ok_or(Error::DegenerateLine(i))?;
            for v in [a, b] {
                norm[v as usize] += dir;
                hits[v as usize] = true;
            }
        }
        normalize_all(&mut norm, &hits, Error::DegenerateTangent)?;
        self.norm = norm;
        Ok(())
    }

    /// Compute normals according to `mode`.
    pub fn update_normals(&mut self, mode: NormalMode) -> Result<(), Error> {
        match mode {
            NormalMode::Facet => self.facet_normals(),
            NormalMode::Smooth => self.smooth_normals(),
        }
    }
}

fn normalize_all(
    vectors: &mut [Vec3],
    hits: &[bool],
    degenerate: fn(u32) -> Error,
) -> Result<(), Error> {
    for (v, (vec, &hit)) in vectors.iter_mut().zip(hits.iter()).enumerate() {
        if !hit {
            return Err(Error::IsolatedVertex(v as u32));
        }
        *vec = vec.try_normalize().ok_or(degenerate(v as u32))?;
    }
    Ok(())
}
