use crate::{
    error::{Error, Primitive},
    mesh::{Mesh, PrimitiveFamily},
};

fn check_indices<const N: usize>(
    elements: &[[u32; N]],
    primitive: Primitive,
    len: usize,
) -> Result<(), Error> {
    for (element, indices) in elements.iter().enumerate() {
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= len) {
            return Err(Error::IndexOutOfBounds {
                primitive,
                element,
                index,
                len,
            });
        }
    }
    Ok(())
}

fn check_parallel_len(len: usize, actual: usize) -> Result<(), Error> {
    if actual != 0 && actual != len {
        return Err(Error::MismatchedArrayLengths(len, actual));
    }
    Ok(())
}

impl Mesh {
    /// Check that every index refers to an existing vertex, the per-vertex
    /// buffers are either empty or as long as `pos`, and the mesh holds only
    /// one family of primitives.
    pub fn check(&self) -> Result<(), Error> {
        let nverts = self.pos.len();
        check_indices(&self.triangle, Primitive::Triangle, nverts)?;
        check_indices(&self.quad, Primitive::Quad, nverts)?;
        check_indices(&self.line, Primitive::Line, nverts)?;
        check_indices(&self.spline, Primitive::Spline, nverts)?;
        check_parallel_len(nverts, self.norm.len())?;
        check_parallel_len(nverts, self.texcoord.len())?;
        if self.primitive_family() == PrimitiveFamily::Mixed {
            return Err(Error::MixedPrimitives);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::{
        error::{Error, Primitive},
        mesh::Mesh,
    };
    use glam::{vec2, vec3};

    fn unit_quad() -> Mesh {
        Mesh::from_polygons(
            vec![
                vec3(0.0, 0.0, 0.0),
                vec3(1.0, 0.0, 0.0),
                vec3(1.0, 1.0, 0.0),
                vec3(0.0, 1.0, 0.0),
            ],
            Vec::new(),
            vec![[0, 1, 2, 3]],
        )
    }

    #[test]
    fn t_check_valid() {
        unit_quad().check().expect("Valid mesh failed the check");
    }

    #[test]
    fn t_check_out_of_bounds() {
        let mut mesh = unit_quad();
        mesh.triangle.push([0, 1, 2]);
        mesh.triangle.push([0, 2, 4]);
        match mesh.check() {
            Err(Error::IndexOutOfBounds {
                primitive,
                element,
                index,
                len,
            }) => {
                assert_eq!(Primitive::Triangle, primitive);
                assert_eq!((1, 4, 4), (element, index, len));
            }
            other => panic!("Unexpected result: {other:?}"),
        }
        let mut splines = Mesh::from_splines(vec![vec3(0.0, 0.0, 0.0); 4], vec![[0, 1, 2, 9]]);
        assert!(matches!(
            splines.check(),
            Err(Error::IndexOutOfBounds {
                primitive: Primitive::Spline,
                ..
            })
        ));
        splines.spline[0][3] = 3;
        splines.check().expect("Valid spline failed the check");
    }

    #[test]
    fn t_check_lengths() {
        let mut mesh = unit_quad();
        mesh.texcoord.push(vec2(0.0, 0.0));
        assert!(matches!(
            mesh.check(),
            Err(Error::MismatchedArrayLengths(4, 1))
        ));
        mesh.texcoord.clear();
        mesh.norm = vec![vec3(0.0, 0.0, 1.0); 5];
        assert!(matches!(
            mesh.check(),
            Err(Error::MismatchedArrayLengths(4, 5))
        ));
    }

    #[test]
    fn t_check_mixed() {
        let mut mesh = unit_quad();
        mesh.line.push([0, 1]);
        assert!(matches!(mesh.check(), Err(Error::MixedPrimitives)));
    }
}
