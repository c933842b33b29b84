use crate::{error::Error, mesh::Mesh};
use glam::{Vec2, Vec3};
use std::{io::BufRead, path::Path};

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: true,
        triangulate: false,
        ignore_points: true,
        ignore_lines: false,
    }
}

impl Mesh {
    /// Load all models of an OBJ file into a single mesh. Materials are
    /// ignored.
    pub fn load_obj(path: &Path) -> Result<Self, Error> {
        let (models, _) = tobj::load_obj(path, &load_options())
            .map_err(|e| Error::ObjLoadFailed(format!("{}", e)))?;
        Self::from_models(models)
    }

    /// Load all models of OBJ data read from `reader` into a single mesh.
    /// Referenced material libraries are not loaded.
    pub fn from_obj_buf<R: BufRead>(reader: &mut R) -> Result<Self, Error> {
        let (models, _) = tobj::load_obj_buf(reader, &load_options(), |_| {
            Err(tobj::LoadError::OpenFileFailed)
        })
        .map_err(|e| Error::ObjLoadFailed(format!("{}", e)))?;
        Self::from_models(models)
    }

    fn from_models(models: Vec<tobj::Model>) -> Result<Self, Error> {
        let mut outmesh = Mesh::new();
        let nverts: usize = models.iter().map(|m| m.mesh.positions.len() / 3).sum();
        outmesh.pos.reserve(nverts);
        let with_texcoords = models
            .iter()
            .all(|m| m.mesh.texcoords.len() / 2 == m.mesh.positions.len() / 3)
            && models.iter().any(|m| !m.mesh.texcoords.is_empty());
        for model in models {
            let mesh = model.mesh;
            if mesh.positions.len() % 3 != 0 {
                return Err(Error::ObjLoadFailed(format!(
                    "Model '{}' has {} coordinates",
                    model.name,
                    mesh.positions.len()
                )));
            }
            let voffset = outmesh.pos.len() as u32;
            outmesh.pos.extend(
                mesh.positions
                    .chunks_exact(3)
                    .map(|c| Vec3::new(c[0], c[1], c[2])),
            );
            if with_texcoords {
                outmesh.texcoord.extend(
                    mesh.texcoords
                        .chunks_exact(2)
                        .map(|c| Vec2::new(c[0], c[1])),
                );
            }
            if mesh.face_arities.is_empty() {
                // All triangles.
                outmesh.triangle.extend(
                    mesh.indices
                        .chunks_exact(3)
                        .map(|f| [f[0] + voffset, f[1] + voffset, f[2] + voffset]),
                );
                continue;
            }
            let mut start = 0usize;
            for size in mesh.face_arities {
                let size = size as usize;
                let indices = mesh.indices.get(start..(start + size)).ok_or_else(|| {
                    Error::ObjLoadFailed(format!("Model '{}' has too few indices", model.name))
                })?;
                start += size;
                match *indices {
                    [a, b] => outmesh.line.push([a + voffset, b + voffset]),
                    [a, b, c] => outmesh
                        .triangle
                        .push([a + voffset, b + voffset, c + voffset]),
                    [a, b, c, d] => outmesh.quad.push([
                        a + voffset,
                        b + voffset,
                        c + voffset,
                        d + voffset,
                    ]),
                    _ => return Err(Error::UnsupportedFaceArity(size)),
                }
            }
        }
        Ok(outmesh)
    }
}
