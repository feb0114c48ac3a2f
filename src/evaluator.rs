use crate::{Grid, Polynomial, PolysurfError, Surface, polynomial::eval_series};

/// Slot a selected variable is drawn along, by its position in the selection.
///
/// The first selected variable runs along the mesh columns (`xs`), the second along the
/// mesh rows (`ys`), and the third is held at zero, leaving only its constant term. The
/// mapping is positional, so selecting only `y` still plots `y`'s series along `xs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Columns,
    Rows,
    Held,
}

impl Slot {
    pub const ALL: [Slot; Grid::SLOTS] = [Slot::Columns, Slot::Rows, Slot::Held];

    pub fn of(index: usize) -> Option<Slot> {
        Self::ALL.get(index).copied()
    }
}

fn check_dimensions(poly: &Polynomial) -> Result<(), PolysurfError> {
    let variables = poly.variables.len();
    if variables > Grid::SLOTS || poly.coeffs.len() != variables * poly.row_len() {
        return Err(PolysurfError::DimensionMismatch {
            variables,
            slots: Grid::SLOTS,
        });
    }
    Ok(())
}

fn slot_series(poly: &Polynomial, slot: Slot, t: f64) -> f64 {
    match poly.rows().nth(slot as usize) {
        Some(row) => eval_series(row, t),
        None => 0.0,
    }
}

/// Evaluate `poly` over every point of `grid`.
///
/// Each slot's power series is evaluated once per axis sample and the surface is the
/// outer sum of those vectors, which matches `evaluate_at` point for point.
pub fn evaluate(poly: &Polynomial, grid: &Grid) -> Result<Surface, PolysurfError> {
    check_dimensions(poly)?;

    let col_terms: Vec<f64> = grid
        .xs
        .iter()
        .map(|&x| slot_series(poly, Slot::Columns, x))
        .collect();
    let row_terms: Vec<f64> = grid
        .ys
        .iter()
        .map(|&y| slot_series(poly, Slot::Rows, y))
        .collect();
    let held = slot_series(poly, Slot::Held, 0.0);

    let (rows, cols) = grid.shape();
    let mut values = Vec::with_capacity(rows * cols);
    for &row_term in &row_terms {
        values.extend(col_terms.iter().map(|&col_term| col_term + row_term + held));
    }

    Ok(Surface { values, rows, cols })
}

/// Evaluate `poly` at a single mesh coordinate using the same slot mapping as
/// [`evaluate`].
pub fn evaluate_at(poly: &Polynomial, x: f64, y: f64) -> Result<f64, PolysurfError> {
    check_dimensions(poly)?;
    Ok(poly.eval(&[x, y, 0.0]))
}

/// Evaluate a batch of polynomials over the same grid.
pub fn evaluate_all<'a>(
    polys: impl IntoIterator<Item = &'a Polynomial>,
    grid: &Grid,
) -> Result<Vec<Surface>, PolysurfError> {
    polys.into_iter().map(|poly| evaluate(poly, grid)).collect()
}
