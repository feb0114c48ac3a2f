use rand::Rng;

use crate::{Axis, Polynomial, PolysurfError, invalid, polynomial::validate_variables};

/// Smallest coefficient the generator draws (inclusive).
pub const COEFF_MIN: i32 = -10;
/// Largest coefficient the generator draws (inclusive).
pub const COEFF_MAX: i32 = 10;
/// Highest degree accepted by the generator.
pub const MAX_DEGREE: u8 = 25;

/// Draw `count` independent random polynomials over `variables`.
///
/// Every coefficient is sampled uniformly from `COEFF_MIN..=COEFF_MAX`. The caller owns
/// the random source so runs can be seeded.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    variables: &[Axis],
    degree: u8,
    count: usize,
) -> Result<Vec<Polynomial>, PolysurfError> {
    let variables = validate_variables(variables)?;
    if degree < 1 || degree > MAX_DEGREE {
        return Err(invalid(format!(
            "degree must be within 1..={MAX_DEGREE}, got {degree}"
        )));
    }
    if count < 1 {
        return Err(invalid("must generate at least one polynomial"));
    }

    let num_coeffs = variables.len() * (degree as usize + 1);
    let polys = (0..count)
        .map(|_| Polynomial {
            variables: variables.clone(),
            degree,
            coeffs: (0..num_coeffs)
                .map(|_| rng.random_range(COEFF_MIN..=COEFF_MAX))
                .collect(),
        })
        .collect();
    Ok(polys)
}
