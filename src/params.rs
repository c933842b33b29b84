//! Per-entity refinement parameters.

use crate::error::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest accepted subdivision / tessellation level. Grids and step counts
/// grow as `2^level`.
pub const MAX_LEVEL: u32 = 16;

/// Default ratio of control polygon length to chord length below which a
/// cubic Bezier segment counts as flat.
pub const DEFAULT_FLATNESS: f32 = 1.03;

/// Default cap on the number of de Casteljau splitting passes.
pub const DEFAULT_MAX_PASSES: u32 = 16;

pub(crate) fn check_level(level: u32) -> Result<(), Error> {
    if level > MAX_LEVEL {
        Err(Error::InvalidLevel {
            level,
            max: MAX_LEVEL,
        })
    } else {
        Ok(())
    }
}

/// Catmull-Clark parameters of a polygon mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CatmullClarkParams {
    /// Number of subdivision levels still to be applied. Zero is a no-op.
    pub level: u32,
    /// Smooth (shared) vertex normals if `true`, facet normals otherwise.
    pub smooth: bool,
}

impl CatmullClarkParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub const fn with_smooth(mut self, smooth: bool) -> Self {
        self.smooth = smooth;
        self
    }

    /// Number of quads after applying all levels to a mesh with `ntris`
    /// triangles and `nquads` quads.
    #[must_use]
    pub const fn expected_quads(&self, ntris: usize, nquads: usize) -> usize {
        if self.level == 0 {
            return nquads;
        }
        let mut faces = 3 * ntris + 4 * nquads;
        let mut i = 1;
        while i < self.level {
            faces *= 4;
            i += 1;
        }
        faces
    }
}

/// How Bezier splines are turned into polylines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BezierStrategy {
    /// `2^level` equal parametric steps per segment.
    #[default]
    Uniform,
    /// Recursive de Casteljau splitting until every segment is flat.
    Adaptive,
}

/// Bezier refinement parameters of a spline mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BezierParams {
    /// Uniform sampling level. For the adaptive strategy any non-zero value
    /// only enables refinement.
    pub level: u32,
    pub strategy: BezierStrategy,
    /// Flatness threshold used by the adaptive strategy.
    pub flatness: f32,
    /// Maximum number of splitting passes of the adaptive strategy.
    pub max_passes: u32,
}

impl Default for BezierParams {
    fn default() -> Self {
        Self {
            level: 0,
            strategy: BezierStrategy::default(),
            flatness: DEFAULT_FLATNESS,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl BezierParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uniform sampling with `2^level` steps per segment.
    #[must_use]
    pub fn uniform(level: u32) -> Self {
        Self {
            level,
            strategy: BezierStrategy::Uniform,
            ..Self::default()
        }
    }

    /// Adaptive splitting with the default flatness threshold.
    #[must_use]
    pub fn adaptive() -> Self {
        Self {
            level: 1,
            strategy: BezierStrategy::Adaptive,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub const fn with_strategy(mut self, strategy: BezierStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub const fn with_flatness(mut self, flatness: f32) -> Self {
        self.flatness = flatness;
        self
    }

    #[must_use]
    pub const fn with_max_passes(mut self, max_passes: u32) -> Self {
        self.max_passes = max_passes;
        self
    }
}

/// Shape of an analytic surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SurfaceShape {
    /// Square of side `2 * radius` in the XY plane, facing `+Z`.
    #[default]
    Quad,
    /// Sphere of the given radius centered at the origin.
    Sphere,
}

/// Tessellation parameters of an analytic surface.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SurfaceParams {
    pub shape: SurfaceShape,
    pub radius: f32,
    /// Resolution level of the tessellation.
    pub level: u32,
    pub smooth: bool,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            shape: SurfaceShape::default(),
            radius: 1.0,
            level: 0,
            smooth: false,
        }
    }
}

impl SurfaceParams {
    #[must_use]
    pub fn quad(radius: f32) -> Self {
        Self {
            shape: SurfaceShape::Quad,
            radius,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sphere(radius: f32) -> Self {
        Self {
            shape: SurfaceShape::Sphere,
            radius,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub const fn with_smooth(mut self, smooth: bool) -> Self {
        self.smooth = smooth;
        self
    }
}
