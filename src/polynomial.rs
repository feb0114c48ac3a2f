use fmtastic::Superscript;
use smallvec::SmallVec;

use crate::{Axis, PolysurfError, Selection, invalid};

/// Sum of independent single-variable power series, one per selected axis.
///
/// Coefficients are stored flat, one row of `degree + 1` entries per variable, in the
/// order the variables were selected. Entry `j` of a row multiplies the `j`-th power.
#[derive(Clone, PartialEq, Eq)]
pub struct Polynomial {
    pub(crate) variables: Selection,
    pub(crate) degree: u8,
    pub(crate) coeffs: SmallVec<[i32; 16]>,
}

impl Polynomial {
    /// Build a polynomial from row-major coefficients.
    ///
    /// Fails with `InvalidParameter` if `variables` is empty or repeats an axis,
    /// if `degree` is zero, or if `coeffs` is not `variables.len() * (degree + 1)` long.
    pub fn new(
        variables: &[Axis],
        degree: u8,
        coeffs: impl IntoIterator<Item = i32>,
    ) -> Result<Self, PolysurfError> {
        let variables = validate_variables(variables)?;
        if degree < 1 {
            return Err(invalid("degree must be at least 1"));
        }
        let coeffs: SmallVec<[i32; 16]> = coeffs.into_iter().collect();
        let expected = variables.len() * (degree as usize + 1);
        if coeffs.len() != expected {
            return Err(invalid(format!(
                "expected {expected} coefficients for {} variables of degree {degree}, got {}",
                variables.len(),
                coeffs.len()
            )));
        }
        Ok(Self {
            variables,
            degree,
            coeffs,
        })
    }

    pub fn variables(&self) -> &[Axis] {
        &self.variables
    }

    pub fn degree(&self) -> u8 {
        self.degree
    }

    /// Number of coefficients per variable.
    pub fn row_len(&self) -> usize {
        self.degree as usize + 1
    }

    /// Coefficients of the `index`-th selected variable, lowest power first.
    pub fn row(&self, index: usize) -> &[i32] {
        let len = self.row_len();
        &self.coeffs[index * len..(index + 1) * len]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[i32]> {
        self.coeffs.chunks_exact(self.row_len())
    }

    /// Coefficients for the given axis, if it was selected.
    pub fn coeffs_for(&self, axis: Axis) -> Option<&[i32]> {
        let index = self.variables.iter().position(|&v| v == axis)?;
        Some(self.row(index))
    }

    /// Evaluate at a point given in slot order: `[columns, rows, held]`.
    ///
    /// The `k`-th selected variable reads `point[k]`, whichever axis it is, so
    /// this agrees with [`crate::evaluate`] for every selection. Empty slots
    /// contribute nothing.
    pub fn eval(&self, point: &[f64; 3]) -> f64 {
        let slot = |k: usize| {
            self.rows()
                .nth(k)
                .map_or(0.0, |row| eval_series(row, point[k]))
        };
        slot(0) + slot(1) + slot(2)
    }
}

/// Evaluate `Σ_j coeffs[j] * t^j`, with `t^0 == 1` for every `t`.
pub fn eval_series(coeffs: &[i32], t: f64) -> f64 {
    let mut result = 0.0;
    for (j, &c) in coeffs.iter().enumerate() {
        result += c as f64 * t.powi(j as i32);
    }
    result
}

pub(crate) fn validate_variables(variables: &[Axis]) -> Result<Selection, PolysurfError> {
    if variables.is_empty() {
        return Err(invalid("no variables selected"));
    }
    let mut selection = Selection::new();
    for &axis in variables {
        if selection.contains(&axis) {
            return Err(invalid(format!("variable '{axis}' selected twice")));
        }
        selection.push(axis);
    }
    Ok(selection)
}

impl core::fmt::Debug for Polynomial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self, f)
    }
}

impl core::fmt::Display for Polynomial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let constant: i64 = self.rows().map(|row| row[0] as i64).sum();
        let mut first = true;
        if constant != 0 {
            write!(f, "{constant}")?;
            first = false;
        }

        for (axis, row) in self.variables.iter().zip(self.rows()) {
            for (j, &c) in row.iter().enumerate().skip(1) {
                if c == 0 {
                    continue;
                }
                let magnitude = c.unsigned_abs();
                if first {
                    if c < 0 {
                        write!(f, "-")?;
                    }
                } else if c < 0 {
                    write!(f, " - ")?;
                } else {
                    write!(f, " + ")?;
                }
                first = false;

                if magnitude != 1 {
                    write!(f, "{magnitude}")?;
                }
                write!(f, "{axis}")?;
                if j > 1 {
                    write!(f, "{}", Superscript(j as u8))?;
                }
            }
        }

        if first {
            write!(f, "0")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assertables::{assert_err, assert_ok};
    use pretty_assertions as pa;

    use super::*;

    #[test]
    fn build_polynomial_rows() {
        let poly = assert_ok!(Polynomial::new(&[Axis::X, Axis::Z], 2, [1, 2, 3, -4, -5, -6]));
        pa::assert_eq!(poly.row(0), &[1, 2, 3]);
        pa::assert_eq!(poly.row(1), &[-4, -5, -6]);
        pa::assert_eq!(poly.coeffs_for(Axis::Z), Some(&[-4, -5, -6][..]));
        pa::assert_eq!(poly.coeffs_for(Axis::Y), None);
        pa::assert_eq!(poly.rows().count(), 2);
    }

    #[test]
    fn build_polynomial_invalid() {
        assert_err!(Polynomial::new(&[], 2, [0i32; 0]));
        assert_err!(Polynomial::new(&[Axis::X], 0, [1]));
        assert_err!(Polynomial::new(&[Axis::X, Axis::X], 1, [1, 2, 3, 4]));
        assert_err!(Polynomial::new(&[Axis::X], 2, [1, 2]));
    }

    #[test]
    fn eval_separable() {
        // f = (1 + 2x) + (-1 + y^2)
        let poly = Polynomial::new(&[Axis::X, Axis::Y], 2, [1, 2, 0, -1, 0, 1]).unwrap();
        pa::assert_eq!(poly.eval(&[0.0, 0.0, 0.0]), 0.0);
        pa::assert_eq!(poly.eval(&[1.0, 0.0, 0.0]), 2.0);
        pa::assert_eq!(poly.eval(&[1.0, 2.0, 0.0]), 6.0);
        // Only two variables, so the held slot is empty.
        pa::assert_eq!(poly.eval(&[1.0, 2.0, 100.0]), 6.0);
    }

    #[test]
    fn eval_binds_variables_by_position() {
        // A lone y still reads the first slot.
        let poly = Polynomial::new(&[Axis::Y], 1, [0, 1]).unwrap();
        pa::assert_eq!(poly.eval(&[2.0, 0.0, 0.0]), 2.0);
        pa::assert_eq!(poly.eval(&[0.0, 2.0, 0.0]), 0.0);

        // f = (1 + 2z) + (3 + 4x), with z in the first slot and x in the second.
        let poly = Polynomial::new(&[Axis::Z, Axis::X], 1, [1, 2, 3, 4]).unwrap();
        pa::assert_eq!(poly.eval(&[1.0, 0.0, 0.0]), 6.0);
        pa::assert_eq!(poly.eval(&[0.0, 1.0, 0.0]), 8.0);
        pa::assert_eq!(poly.eval(&[0.0, 0.0, 9.0]), 4.0);
    }

    #[test]
    fn eval_series_zero_power_at_origin() {
        pa::assert_eq!(eval_series(&[7, 3], 0.0), 7.0);
        pa::assert_eq!(eval_series(&[0, 0, 2], -3.0), 18.0);
    }

    #[test]
    fn display_terms() {
        let poly = Polynomial::new(&[Axis::X, Axis::Y], 2, [3, -1, 1, 2, 0, -5]).unwrap();
        pa::assert_eq!(poly.to_string(), "5 - x + x² - 5y²");

        let zero = Polynomial::new(&[Axis::Z], 1, [0, 0]).unwrap();
        pa::assert_eq!(zero.to_string(), "0");

        let leading_negative = Polynomial::new(&[Axis::Y], 3, [0, 0, 0, -2]).unwrap();
        pa::assert_eq!(leading_negative.to_string(), "-2y³");
    }
}
