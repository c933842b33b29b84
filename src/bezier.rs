use crate::{
    error::Error,
    mesh::Mesh,
    params::{BezierStrategy, check_level},
};
use glam::Vec3;
use tracing::debug;

/// Binomial coefficient `n choose k`.
fn binomial(n: u32, k: u32) -> f32 {
    (0..k).fold(1.0f32, |acc, i| acc * (n - i) as f32 / (i + 1) as f32)
}

/// The Bernstein polynomial `B(i, n)` evaluated at `t`.
pub fn bernstein(t: f32, i: u32, n: u32) -> f32 {
    binomial(n, i) * t.powi(i as i32) * (1.0 - t).powi((n - i) as i32)
}

/// Evaluate the cubic Bezier curve with control points `ctrl` at `t`.
///
/// The blend weights at `t = 0` and `t = 1` are exactly `(1, 0, 0, 0)` and
/// `(0, 0, 0, 1)`, so the curve passes exactly through the first and last
/// control points.
pub fn eval_cubic(ctrl: &[Vec3; 4], t: f32) -> Vec3 {
    ctrl[0] * bernstein(t, 0, 3)
        + ctrl[1] * bernstein(t, 1, 3)
        + ctrl[2] * bernstein(t, 2, 3)
        + ctrl[3] * bernstein(t, 3, 3)
}

/// Split a cubic Bezier segment at `t = 0.5` using de Casteljau's
/// construction.
pub fn split_cubic(ctrl: &[Vec3; 4]) -> ([Vec3; 4], [Vec3; 4]) {
    let [p0, p1, p2, p3] = *ctrl;
    let q0 = p0.midpoint(p1);
    let q1 = p1.midpoint(p2);
    let q2 = p2.midpoint(p3);
    let r0 = q0.midpoint(q1);
    let r1 = q1.midpoint(q2);
    let s = r0.midpoint(r1);
    ([p0, q0, r0, s], [s, r1, q2, p3])
}

fn control_polygon_length(ctrl: &[Vec3; 4]) -> f32 {
    ctrl.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Ratio of the length of the control polygon to the length of the chord
/// between the end points. This is `1` for a straight segment and grows with
/// the curvature. `None` if the chord has zero length.
pub fn flatness_ratio(ctrl: &[Vec3; 4]) -> Option<f32> {
    let chord = ctrl[0].distance(ctrl[3]);
    if chord > 0.0 {
        Some(control_polygon_length(ctrl) / chord)
    } else {
        None
    }
}

fn is_flat(ctrl: &[Vec3; 4], threshold: f32) -> bool {
    flatness_ratio(ctrl).is_some_and(|r| r < threshold)
}

fn control_points(points: &[Vec3], seg: &[u32; 4]) -> [Vec3; 4] {
    seg.map(|i| points[i as usize])
}

impl Mesh {
    /// Convert the Bezier splines of this mesh into a polyline according to
    /// the bezier parameters of the mesh. Does nothing if the bezier level is
    /// zero.
    pub fn subdivide_bezier(&mut self) -> Result<(), Error> {
        if self.bezier.level == 0 {
            return Ok(());
        }
        match self.bezier.strategy {
            BezierStrategy::Uniform => self.subdivide_bezier_uniform(self.bezier.level),
            BezierStrategy::Adaptive => self.subdivide_bezier_adaptive(),
        }
    }

    /// Sample every spline segment at `2^level + 1` uniformly spaced
    /// parameters, and connect consecutive samples with lines. Samples of
    /// different segments are never connected, and never shared.
    ///
    /// ```rust
    /// use refine::Mesh;
    ///
    /// let mut curve = Mesh::from_splines(
    ///     vec![
    ///         glam::vec3(0.0, 0.0, 0.0),
    ///         glam::vec3(0.0, 1.0, 0.0),
    ///         glam::vec3(1.0, 1.0, 0.0),
    ///         glam::vec3(1.0, 0.0, 0.0),
    ///     ],
    ///     vec![[0, 1, 2, 3]],
    /// );
    /// curve.subdivide_bezier_uniform(2).expect("Cannot subdivide curve");
    /// assert_eq!(5, curve.num_vertices());
    /// assert_eq!(4, curve.line.len());
    /// assert!(curve.spline.is_empty());
    /// ```
    pub fn subdivide_bezier_uniform(&mut self, level: u32) -> Result<(), Error> {
        check_level(level)?;
        self.check()?;
        if self.spline.is_empty() {
            self.bezier.level = 0;
            return Ok(());
        }
        let steps = 1u32 << level;
        let mut pos = Vec::with_capacity(self.spline.len() * (steps as usize + 1));
        let mut line = Vec::with_capacity(self.spline.len() * steps as usize);
        for seg in &self.spline {
            let ctrl = control_points(&self.pos, seg);
            let start = pos.len() as u32;
            pos.extend((0..=steps).map(|i| eval_cubic(&ctrl, i as f32 / steps as f32)));
            line.extend((0..steps).map(|i| [start + i, start + i + 1]));
        }
        debug!(
            "Sampled {} spline segments with {} steps each",
            self.spline.len(),
            steps
        );
        self.finish_bezier(pos, line)
    }

    /// Recursively split the spline segments at their midpoints until every
    /// segment is flat, then replace each segment with the line between its
    /// end points.
    ///
    /// Every pass splits all segments that are not flat. Fails with
    /// [`Error::BezierNotConverged`] if segments are still not flat after the
    /// maximum number of passes.
    pub fn subdivide_bezier_adaptive(&mut self) -> Result<(), Error> {
        self.check()?;
        if self.spline.is_empty() {
            self.bezier.level = 0;
            return Ok(());
        }
        let threshold = self.bezier.flatness;
        let max_passes = self.bezier.max_passes;
        if let Some(i) = self
            .spline
            .iter()
            .position(|seg| control_polygon_length(&control_points(&self.pos, seg)) == 0.0)
        {
            return Err(Error::DegenerateCurve(i));
        }
        let mut points = self.pos.clone();
        let mut segments = self.spline.clone();
        let mut flat = Vec::with_capacity(segments.len());
        let mut passes = 0u32;
        loop {
            flat.clear();
            flat.extend(
                segments
                    .iter()
                    .map(|seg| is_flat(&control_points(&points, seg), threshold)),
            );
            if flat.iter().all(|f| *f) {
                break;
            }
            if passes == max_passes {
                return Err(Error::BezierNotConverged {
                    passes,
                    segments: segments.len(),
                });
            }
            let mut next = Vec::with_capacity(segments.len() * 2);
            for (seg, &flat) in segments.iter().zip(flat.iter()) {
                if flat {
                    next.push(*seg);
                    continue;
                }
                let (left, right) = split_cubic(&control_points(&points, seg));
                let base = points.len() as u32;
                // Q0, R0, S, R1, Q2.
                points.extend([left[1], left[2], left[3], right[1], right[2]]);
                next.push([seg[0], base, base + 1, base + 2]);
                next.push([base + 2, base + 3, base + 4, seg[3]]);
            }
            segments = next;
            passes += 1;
            debug!("Pass {}: {} spline segments", passes, segments.len());
        }
        // Keep only the points on the curve, in the order they are used.
        let mut remap = vec![u32::MAX; points.len()];
        let mut pos = Vec::new();
        let line: Vec<[u32; 2]> = segments
            .iter()
            .map(|seg| {
                [seg[0], seg[3]].map(|v| {
                    let slot = &mut remap[v as usize];
                    if *slot == u32::MAX {
                        *slot = pos.len() as u32;
                        pos.push(points[v as usize]);
                    }
                    *slot
                })
            })
            .collect();
        debug!(
            "Split {} spline segments into {} lines in {} passes",
            self.spline.len(),
            line.len(),
            passes
        );
        self.finish_bezier(pos, line)
    }

    /// Install the polyline, clear the spline state and compute tangents.
    fn finish_bezier(&mut self, pos: Vec<Vec3>, line: Vec<[u32; 2]>) -> Result<(), Error> {
        self.pos = pos;
        self.line = line;
        self.norm.clear();
        self.texcoord.clear();
        self.spline.clear();
        self.bezier.level = 0;
        self.smooth_tangents()
    }
}

#[cfg(test)]
mod test {
    use super::{bernstein, eval_cubic, flatness_ratio, split_cubic};
    use crate::{
        error::Error,
        macros::{assert_f32_eq, assert_vec3_eq},
        mesh::Mesh,
        params::BezierParams,
    };
    use glam::{Vec3, vec3};

    fn arch() -> [Vec3; 4] {
        [
            vec3(0.0, 0.0, 0.0),
            vec3(0.0, 1.0, 0.0),
            vec3(1.0, 1.0, 0.0),
            vec3(1.0, 0.0, 0.0),
        ]
    }

    /// Two arches sharing the end point at index 3.
    fn double_arch() -> Mesh {
        let mut pos = arch().to_vec();
        pos.extend([vec3(1.0, -1.0, 0.0), vec3(2.0, -1.0, 0.0), vec3(2.0, 0.0, 0.0)]);
        Mesh::from_splines(pos, vec![[0, 1, 2, 3], [3, 4, 5, 6]])
    }

    fn assert_unit_tangents(mesh: &Mesh) {
        assert_eq!(mesh.pos.len(), mesh.norm.len());
        for t in &mesh.norm {
            assert_f32_eq!(1.0, t.length(), 1e-5);
        }
    }

    #[test]
    fn t_bernstein_partition_of_unity() {
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            let total: f32 = (0..=3).map(|k| bernstein(t, k, 3)).sum();
            assert_f32_eq!(1.0, total, 1e-6);
        }
        assert_eq!(1.0, bernstein(0.0, 0, 3));
        assert_eq!(0.0, bernstein(0.0, 3, 3));
        assert_eq!(1.0, bernstein(1.0, 3, 3));
        assert_eq!(0.375, bernstein(0.5, 1, 3));
    }

    #[test]
    fn t_eval_cubic() {
        let ctrl = arch();
        assert_eq!(ctrl[0], eval_cubic(&ctrl, 0.0));
        assert_eq!(ctrl[3], eval_cubic(&ctrl, 1.0));
        assert_vec3_eq!(vec3(0.5, 0.75, 0.0), eval_cubic(&ctrl, 0.5));
    }

    #[test]
    fn t_split_cubic() {
        let ctrl = arch();
        let (left, right) = split_cubic(&ctrl);
        assert_eq!(
            left,
            [
                vec3(0.0, 0.0, 0.0),
                vec3(0.0, 0.5, 0.0),
                vec3(0.25, 0.75, 0.0),
                vec3(0.5, 0.75, 0.0)
            ]
        );
        assert_eq!(
            right,
            [
                vec3(0.5, 0.75, 0.0),
                vec3(0.75, 0.75, 0.0),
                vec3(1.0, 0.5, 0.0),
                vec3(1.0, 0.0, 0.0)
            ]
        );
        // The halves trace the same curve.
        assert_vec3_eq!(eval_cubic(&ctrl, 0.25), eval_cubic(&left, 0.5));
        assert_vec3_eq!(eval_cubic(&ctrl, 0.75), eval_cubic(&right, 0.5));
    }

    #[test]
    fn t_flatness_ratio() {
        assert_f32_eq!(3.0, flatness_ratio(&arch()).expect("Zero chord"), 1e-6);
        let line = [
            vec3(0.0, 0.0, 0.0),
            vec3(1.0, 0.0, 0.0),
            vec3(2.0, 0.0, 0.0),
            vec3(3.0, 0.0, 0.0),
        ];
        assert_f32_eq!(1.0, flatness_ratio(&line).expect("Zero chord"), 1e-6);
        let closed = [
            vec3(0.0, 0.0, 0.0),
            vec3(1.0, 0.0, 0.0),
            vec3(1.0, 1.0, 0.0),
            vec3(0.0, 0.0, 0.0),
        ];
        assert_eq!(None, flatness_ratio(&closed));
    }

    #[test]
    fn t_uniform_level_zero() {
        let ctrl = [
            vec3(0.3, -1.0, 2.0),
            vec3(5.0, 2.0, 1.0),
            vec3(-4.0, 0.5, 0.0),
            vec3(1.0, 1.0, 1.0),
        ];
        let mut mesh = Mesh::from_splines(ctrl.to_vec(), vec![[0, 1, 2, 3]]);
        mesh.subdivide_bezier_uniform(0)
            .expect("Cannot subdivide curve");
        assert_eq!(mesh.pos, &[ctrl[0], ctrl[3]]);
        assert_eq!(mesh.line, &[[0, 1]]);
        assert_unit_tangents(&mesh);
    }

    #[test]
    fn t_uniform_segments_are_independent() {
        let mut mesh = double_arch();
        let ends = [mesh.pos[0], mesh.pos[3], mesh.pos[3], mesh.pos[6]];
        mesh.subdivide_bezier_uniform(2)
            .expect("Cannot subdivide curve");
        assert_eq!(10, mesh.num_vertices());
        assert_eq!(8, mesh.line.len());
        // End points are reproduced exactly.
        assert_eq!(ends, [mesh.pos[0], mesh.pos[4], mesh.pos[5], mesh.pos[9]]);
        // No line joins the two segments.
        assert!(!mesh.line.contains(&[4, 5]));
        assert_eq!([0, 1], mesh.line[0]);
        assert_eq!([5, 6], mesh.line[4]);
        assert_vec3_eq!(vec3(0.5, 0.75, 0.0), mesh.pos[2]);
        assert!(mesh.spline.is_empty());
        assert_unit_tangents(&mesh);
    }

    #[test]
    fn t_dispatch() {
        let mut mesh = double_arch().with_bezier(BezierParams::uniform(0));
        mesh.subdivide_bezier().expect("Cannot subdivide curve");
        // Level zero is a no-op.
        assert_eq!(2, mesh.spline.len());
        mesh.bezier = BezierParams::uniform(3);
        mesh.subdivide_bezier().expect("Cannot subdivide curve");
        assert_eq!(16, mesh.line.len());
        assert_eq!(0, mesh.bezier.level);
        // Already linearized.
        let before = mesh.clone();
        mesh.subdivide_bezier().expect("Cannot subdivide curve");
        assert_eq!(before, mesh);
    }

    #[test]
    fn t_adaptive_collinear() {
        let p0 = vec3(1.0, 1.0, 1.0);
        let p3 = vec3(4.0, 1.0, 1.0);
        let mut mesh = Mesh::from_splines(
            vec![p0, vec3(2.0, 1.0, 1.0), vec3(3.0, 1.0, 1.0), p3],
            vec![[0, 1, 2, 3]],
        )
        .with_bezier(BezierParams::adaptive());
        mesh.subdivide_bezier().expect("Cannot subdivide curve");
        assert_eq!(mesh.pos, &[p0, p3]);
        assert_eq!(mesh.line, &[[0, 1]]);
        assert_vec3_eq!(vec3(1.0, 0.0, 0.0), mesh.norm[0]);
        assert_vec3_eq!(vec3(1.0, 0.0, 0.0), mesh.norm[1]);
    }

    #[test]
    fn t_adaptive_curve() {
        let ctrl = arch();
        let mut mesh =
            Mesh::from_splines(ctrl.to_vec(), vec![[0, 1, 2, 3]]).with_bezier(BezierParams::adaptive());
        mesh.subdivide_bezier().expect("Cannot subdivide curve");
        let nlines = mesh.line.len();
        assert!(nlines > 4);
        // Split in halves, so the number of lines is a sum of powers of two
        // and the lines form one chain from p0 to p3.
        assert_eq!(nlines + 1, mesh.num_vertices());
        for (i, l) in mesh.line.iter().enumerate() {
            assert_eq!([i as u32, i as u32 + 1], *l);
        }
        assert_eq!(ctrl[0], mesh.pos[0]);
        assert_eq!(ctrl[3], mesh.pos[nlines]);
        // Every vertex is on the curve. The curve is symmetric, so the middle
        // point is always produced.
        assert!(
            mesh.pos
                .iter()
                .any(|p| p.distance(vec3(0.5, 0.75, 0.0)) < 1e-6)
        );
        assert_unit_tangents(&mesh);
        assert!(mesh.spline.is_empty());
    }

    #[test]
    fn t_adaptive_shared_endpoints() {
        let mut mesh = double_arch().with_bezier(BezierParams::adaptive());
        mesh.subdivide_bezier().expect("Cannot subdivide curve");
        // One connected chain.
        assert_eq!(mesh.line.len() + 1, mesh.num_vertices());
        assert_eq!(vec3(2.0, 0.0, 0.0), *mesh.pos.last().expect("No vertices"));
        assert_unit_tangents(&mesh);
    }

    #[test]
    fn t_adaptive_degenerate() {
        let mut mesh = Mesh::from_splines(vec![vec3(1.0, 2.0, 3.0); 4], vec![[0, 1, 2, 3]])
            .with_bezier(BezierParams::adaptive());
        assert!(matches!(
            mesh.subdivide_bezier(),
            Err(Error::DegenerateCurve(0))
        ));
    }

    #[test]
    fn t_adaptive_closed_loop() {
        // Zero chord, but not a point. Must split, not fail.
        let mut mesh = Mesh::from_splines(
            vec![
                vec3(0.0, 0.0, 0.0),
                vec3(1.0, 0.0, 0.0),
                vec3(1.0, 1.0, 0.0),
                vec3(0.0, 0.0, 0.0),
            ],
            vec![[0, 1, 2, 3]],
        )
        .with_bezier(BezierParams::adaptive());
        mesh.subdivide_bezier().expect("Cannot subdivide curve");
        // The input end points are distinct vertices at the same position.
        assert_eq!(mesh.line.len() + 1, mesh.num_vertices());
        assert_eq!(mesh.pos[0], *mesh.pos.last().expect("No vertices"));
        assert_unit_tangents(&mesh);
    }

    #[test]
    fn t_adaptive_not_converged() {
        let mut mesh = Mesh::from_splines(arch().to_vec(), vec![[0, 1, 2, 3]])
            .with_bezier(BezierParams::adaptive().with_max_passes(1));
        assert!(matches!(
            mesh.subdivide_bezier(),
            Err(Error::BezierNotConverged { passes: 1, .. })
        ));
    }

    #[test]
    fn t_control_point_out_of_bounds() {
        let mut mesh = Mesh::from_splines(arch().to_vec(), vec![[0, 1, 2, 4]]);
        assert!(matches!(
            mesh.subdivide_bezier_uniform(1),
            Err(Error::IndexOutOfBounds { index: 4, .. })
        ));
    }
}
