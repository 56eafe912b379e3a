// eigen.rs - Eigendecomposition of a generator and matrix exponentials

use nalgebra::linalg::{Schur, SVD};
use nalgebra::{DMatrix, DVector};
use std::cmp::Ordering;

use crate::error::{Error, Result};

const MAX_ITERATIONS: usize = 10_000;
/// Relative bound on imaginary parts treated as round-off
const IMAGINARY_TOLERANCE: f64 = 1e-10;
/// Relative spread under which eigenvalues are treated as one repeated value
const CLUSTER_TOLERANCE: f64 = 1e-7;
/// Relative bound on singular values that belong to an eigenspace
const NULLSPACE_TOLERANCE: f64 = 1e-6;
/// Relative bound on `|V diag(l) V^-1 - Q|`
const RESIDUAL_TOLERANCE: f64 = 1e-6;

/// `Q = V diag(eigenvalues) V^-1` for a real generator with real spectrum.
#[derive(Debug, Clone)]
pub struct EigenSystem {
    eigenvalues: DVector<f64>,
    vectors: DMatrix<f64>,
    inverse: DMatrix<f64>,
}

impl EigenSystem {
    /// Decompose `q`. Complex spectra, defective eigenvalues and
    /// ill-conditioned eigenvector matrices are reported as numerical errors.
    pub fn decompose(q: &DMatrix<f64>) -> Result<Self> {
        let n = q.nrows();
        if n == 0 || n != q.ncols() {
            return Err(Error::numerical(format!(
                "generator must be a non-empty square matrix, got {}x{}",
                q.nrows(),
                q.ncols()
            )));
        }
        if q.iter().any(|x| !x.is_finite()) {
            return Err(Error::numerical("generator has non-finite entries"));
        }
        let scale = q.amax().max(1.0);

        let schur = Schur::try_new(q.clone(), f64::EPSILON, MAX_ITERATIONS)
            .ok_or_else(|| Error::numerical("Schur decomposition did not converge"))?;

        let mut values = Vec::with_capacity(n);
        for lambda in schur.complex_eigenvalues().iter() {
            if lambda.im.abs() > IMAGINARY_TOLERANCE * scale {
                return Err(Error::numerical(format!(
                    "generator has complex eigenvalue {:.6} {:+.6}i",
                    lambda.re, lambda.im
                )));
            }
            values.push(lambda.re);
        }
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        // (representative value, multiplicity)
        let mut clusters: Vec<(f64, usize)> = Vec::new();
        for value in values {
            match clusters.last_mut() {
                Some((mean, count)) if (value - *mean).abs() <= CLUSTER_TOLERANCE * scale => {
                    *mean = (*mean * *count as f64 + value) / (*count + 1) as f64;
                    *count += 1;
                }
                _ => clusters.push((value, 1)),
            }
        }

        let identity = DMatrix::<f64>::identity(n, n);
        let mut eigenvalues = Vec::with_capacity(n);
        let mut columns: Vec<DVector<f64>> = Vec::with_capacity(n);

        for (lambda, multiplicity) in clusters {
            let shifted = q - &identity * lambda;
            let svd = SVD::try_new(shifted, false, true, f64::EPSILON, MAX_ITERATIONS)
                .ok_or_else(|| Error::numerical("singular value decomposition did not converge"))?;
            let v_t = svd
                .v_t
                .as_ref()
                .ok_or_else(|| Error::numerical("singular vectors were not computed"))?;

            let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
            order.sort_by(|&a, &b| {
                svd.singular_values[a]
                    .partial_cmp(&svd.singular_values[b])
                    .unwrap_or(Ordering::Equal)
            });

            for &k in order.iter().take(multiplicity) {
                if svd.singular_values[k] > NULLSPACE_TOLERANCE * scale {
                    return Err(Error::numerical(format!(
                        "generator is not diagonalisable: eigenvalue {:.6} is defective",
                        lambda
                    )));
                }
                columns.push(v_t.row(k).transpose());
                eigenvalues.push(lambda);
            }
        }

        let vectors = DMatrix::from_fn(n, n, |i, j| columns[j][i]);
        let inverse = vectors
            .clone()
            .try_inverse()
            .ok_or_else(|| Error::numerical("eigenvector matrix is singular"))?;

        let system = Self {
            eigenvalues: DVector::from_vec(eigenvalues),
            vectors,
            inverse,
        };

        let residual = (system.reconstruct() - q).amax();
        #[cfg(feature = "debug-stats")]
        log::debug!("eigensystem residual {:.3e} for {}x{} generator", residual, n, n);
        if !residual.is_finite() || residual > RESIDUAL_TOLERANCE * scale {
            return Err(Error::numerical(format!(
                "eigensystem is ill-conditioned (residual {:.3e})",
                residual
            )));
        }
        Ok(system)
    }

    pub fn eigenvalues(&self) -> &DVector<f64> {
        &self.eigenvalues
    }

    pub fn vectors(&self) -> &DMatrix<f64> {
        &self.vectors
    }

    pub fn inverse(&self) -> &DMatrix<f64> {
        &self.inverse
    }

    /// Eigensystem of `factor * Q`: same eigenvectors, scaled eigenvalues.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            eigenvalues: &self.eigenvalues * factor,
            vectors: self.vectors.clone(),
            inverse: self.inverse.clone(),
        }
    }

    /// `exp(Q * time) = V diag(exp(l_i * time)) V^-1`
    pub fn exponentiate(&self, time: f64) -> DMatrix<f64> {
        let mut weighted = self.vectors.clone();
        for (j, mut column) in weighted.column_iter_mut().enumerate() {
            column *= (self.eigenvalues[j] * time).exp();
        }
        weighted * &self.inverse
    }

    fn reconstruct(&self) -> DMatrix<f64> {
        let mut weighted = self.vectors.clone();
        for (j, mut column) in weighted.column_iter_mut().enumerate() {
            column *= self.eigenvalues[j];
        }
        weighted * &self.inverse
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_two_state_symmetric_exponential() {
        // Q = [[-1, 1], [1, -1]], P(t)[0][0] = (1 + exp(-2t)) / 2
        let q = DMatrix::from_row_slice(2, 2, &[-1.0, 1.0, 1.0, -1.0]);
        let system = EigenSystem::decompose(&q).unwrap();
        let p = system.exponentiate(0.3);
        assert_relative_eq!(p[(0, 0)], (1.0 + (-0.6f64).exp()) / 2.0, epsilon = 1e-10);
        assert_relative_eq!(p[(0, 1)], (1.0 - (-0.6f64).exp()) / 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_triangular_generator() {
        // pure birth-death chain with distinct rates
        let q = DMatrix::from_row_slice(3, 3, &[-1.0, 1.0, 0.0, 0.0, -0.5, 0.5, 0.0, 0.0, 0.0]);
        let system = EigenSystem::decompose(&q).unwrap();
        let p = system.exponentiate(2.0);
        assert_relative_eq!(p[(0, 0)], (-2.0f64).exp(), epsilon = 1e-10);
        assert_relative_eq!(p[(1, 1)], (-1.0f64).exp(), epsilon = 1e-10);
        assert_relative_eq!(p[(2, 2)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(p[(2, 0)], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_repeated_but_diagonalisable_eigenvalue() {
        // death rate 0: eigenvalue 0 appears twice with two eigenvectors
        let q = DMatrix::from_row_slice(3, 3, &[-1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let system = EigenSystem::decompose(&q).unwrap();
        let p = system.exponentiate(1.0);
        assert_relative_eq!(p[(0, 1)], 1.0 - (-1.0f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn test_defective_generator_is_numerical_error() {
        // equal birth and death rate gives a Jordan block
        let q = DMatrix::from_row_slice(3, 3, &[-1.0, 1.0, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0, 0.0]);
        let err = EigenSystem::decompose(&q).unwrap_err();
        assert!(matches!(err, Error::Numerical(_)));
    }

    #[test]
    fn test_rotation_has_complex_spectrum() {
        let q = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -1.0, 0.0]);
        assert!(matches!(
            EigenSystem::decompose(&q),
            Err(Error::Numerical(_))
        ));
    }

    #[test]
    fn test_scaled_matches_scaled_generator() {
        let q = DMatrix::from_row_slice(2, 2, &[-2.0, 2.0, 1.0, -1.0]);
        let system = EigenSystem::decompose(&q).unwrap();
        let direct = EigenSystem::decompose(&(&q * 0.5)).unwrap();
        let a = system.scaled(0.5).exponentiate(1.7);
        let b = direct.exponentiate(1.7);
        assert!((a - b).amax() < 1e-10);
    }
}
