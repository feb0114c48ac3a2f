use crate::{PolysurfError, invalid};

/// Default sampling domain along both mesh directions.
pub const DEFAULT_DOMAIN: (f64, f64) = (-5.0, 5.0);
/// Default number of samples per mesh direction.
pub const DEFAULT_SAMPLES: usize = 50;

/// Two evenly spaced coordinate axes and their outer-product mesh.
///
/// Mesh layout follows the usual `meshgrid(xs, ys)` convention: rows follow `ys`,
/// columns follow `xs`.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    pub(crate) xs: Vec<f64>,
    pub(crate) ys: Vec<f64>,
}

impl Grid {
    /// Evaluation slots a grid offers: mesh columns, mesh rows, and one held at zero.
    pub const SLOTS: usize = 3;

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// `(rows, cols)` of the mesh.
    pub fn shape(&self) -> (usize, usize) {
        (self.ys.len(), self.xs.len())
    }

    /// Coordinates of every mesh point as `(row, col, x, y)`, row-major.
    pub fn mesh(&self) -> impl Iterator<Item = (usize, usize, f64, f64)> + '_ {
        itertools::iproduct!(self.ys.iter().enumerate(), self.xs.iter().enumerate())
            .map(|((row, &y), (col, &x))| (row, col, x, y))
    }

    /// `((x_min, x_max), (y_min, y_max))`.
    pub fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        (first_last(&self.xs), first_last(&self.ys))
    }
}

impl Default for Grid {
    fn default() -> Self {
        let (min, max) = DEFAULT_DOMAIN;
        let axis: Vec<f64> = linspace(min, max, DEFAULT_SAMPLES).collect();
        Grid {
            xs: axis.clone(),
            ys: axis,
        }
    }
}

/// Build a square grid with `sample_count` points per direction over
/// `[domain_min, domain_max]`.
pub fn make_grid(
    domain_min: f64,
    domain_max: f64,
    sample_count: usize,
) -> Result<Grid, PolysurfError> {
    if !domain_min.is_finite() || !domain_max.is_finite() {
        return Err(invalid("grid bounds must be finite"));
    }
    if domain_min >= domain_max {
        return Err(invalid(format!(
            "grid domain is empty: [{domain_min}, {domain_max}]"
        )));
    }
    if sample_count < 2 {
        return Err(invalid("grid needs at least 2 samples per axis"));
    }
    let axis: Vec<f64> = linspace(domain_min, domain_max, sample_count).collect();
    Ok(Grid {
        xs: axis.clone(),
        ys: axis,
    })
}

fn first_last(axis: &[f64]) -> (f64, f64) {
    (axis[0], axis[axis.len() - 1])
}

/// `num` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, num: usize) -> impl Iterator<Item = f64> {
    let step = if num > 1 {
        (end - start) / (num - 1) as f64
    } else {
        0.0
    };
    // Pin the final sample so rounding never moves the upper bound.
    (0..num).map(move |i| {
        if num > 1 && i == num - 1 {
            end
        } else {
            start + i as f64 * step
        }
    })
}
