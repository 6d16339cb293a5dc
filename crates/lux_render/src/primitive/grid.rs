//! UV-addressed material tables.

use crate::Material;
use lux_math::Vec2;
use std::sync::Arc;

/// Material lookup over a surface parameterization.
///
/// `Cells` divides the unit UV square into a `width x height` table; UVs
/// outside the unit square tile. A `None` cell is a hole: the surface does
/// not exist there and rays pass through.
#[derive(Debug, Clone)]
pub enum MaterialGrid {
    Uniform(Arc<Material>),
    Cells {
        width: usize,
        height: usize,
        cells: Vec<Option<Arc<Material>>>,
    },
}

impl MaterialGrid {
    pub fn uniform(material: Arc<Material>) -> Self {
        MaterialGrid::Uniform(material)
    }

    /// Build a cell table stored row-major, `v` selecting the row.
    ///
    /// A table with the wrong number of cells is padded with holes (or
    /// truncated) to `width * height`.
    pub fn cells(width: usize, height: usize, mut cells: Vec<Option<Arc<Material>>>) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        if cells.len() != width * height {
            log::warn!(
                "material grid expects {} cells, got {}",
                width * height,
                cells.len()
            );
            cells.resize(width * height, None);
        }
        MaterialGrid::Cells {
            width,
            height,
            cells,
        }
    }

    /// A `width x height` checkerboard alternating two materials.
    pub fn checker(width: usize, height: usize, a: Arc<Material>, b: Arc<Material>) -> Self {
        let cells = (0..width * height)
            .map(|i| {
                if (i % width + i / width) % 2 == 0 {
                    Some(a.clone())
                } else {
                    Some(b.clone())
                }
            })
            .collect();
        Self::cells(width, height, cells)
    }

    /// Material at `uv`, or `None` for a hole.
    pub fn lookup(&self, uv: Vec2) -> Option<&Material> {
        match self {
            MaterialGrid::Uniform(m) => Some(m),
            MaterialGrid::Cells {
                width,
                height,
                cells,
            } => {
                let col = cell_index(uv.x, *width);
                let row = cell_index(uv.y, *height);
                cells[row * *width + col].as_deref()
            }
        }
    }

    pub fn max_emission(&self) -> f32 {
        match self {
            MaterialGrid::Uniform(m) => m.emission().max_element(),
            MaterialGrid::Cells { cells, .. } => cells
                .iter()
                .flatten()
                .map(|m| m.emission().max_element())
                .fold(0.0, f32::max),
        }
    }
}

fn cell_index(t: f32, n: usize) -> usize {
    let t = t.rem_euclid(1.0);
    ((t * n as f32) as usize).min(n - 1)
}

impl From<Arc<Material>> for MaterialGrid {
    fn from(material: Arc<Material>) -> Self {
        MaterialGrid::Uniform(material)
    }
}
