//! QR by Gram–Schmidt for the periodic reorthonormalization of the flow
//! Jacobian. The modified scheme is the default; the classical one is kept
//! for comparison.

use nalgebra::{DMatrix, DVector};

/// Which orthonormalization runs after each accepted step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GramSchmidt {
    /// Modified Gram–Schmidt: each column is projected against the already
    /// orthonormalized columns one at a time. Numerically the stable choice.
    Modified,
    /// Classical Gram–Schmidt: all projections are taken against the
    /// original column.
    Classical,
}

/// Replaces the columns of `a` by the orthonormal factor Q and returns the
/// diagonal of R (the norms removed from each column, all non-negative).
pub fn modified_gram_schmidt(a: &mut DMatrix<f64>) -> DVector<f64> {
    let m = a.ncols();
    let mut rdiag = DVector::zeros(m);
    for j in 0..m {
        for i in 0..j {
            let qi = a.column(i).clone_owned();
            let r = qi.dot(&a.column(j));
            a.column_mut(j).axpy(-r, &qi, 1.0);
        }
        let norm = a.column(j).norm();
        rdiag[j] = norm;
        if norm > 0.0 {
            a.column_mut(j).scale_mut(1.0 / norm);
        }
    }
    rdiag
}

/// Classical variant of [`modified_gram_schmidt`], identical contract.
pub fn classical_gram_schmidt(a: &mut DMatrix<f64>) -> DVector<f64> {
    let m = a.ncols();
    let mut rdiag = DVector::zeros(m);
    for j in 0..m {
        let original = a.column(j).clone_owned();
        let mut v = original.clone();
        for i in 0..j {
            let qi = a.column(i).clone_owned();
            let r = qi.dot(&original);
            v.axpy(-r, &qi, 1.0);
        }
        let norm = v.norm();
        rdiag[j] = norm;
        if norm > 0.0 {
            v /= norm;
        }
        a.set_column(j, &v);
    }
    rdiag
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_matrix(rng: &mut StdRng, n: usize, m: usize) -> DMatrix<f64> {
        DMatrix::from_fn(n, m, |_, _| rng.gen_range(-1.0..1.0))
    }

    fn assert_orthonormal(q: &DMatrix<f64>) {
        let gram = q.transpose() * q;
        for i in 0..gram.nrows() {
            for j in 0..gram.ncols() {
                let expect = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(gram[(i, j)], expect, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn both_schemes_produce_an_orthonormal_q() {
        let mut rng = StdRng::seed_from_u64(5);
        for scheme in [modified_gram_schmidt, classical_gram_schmidt] {
            let mut a = random_matrix(&mut rng, 5, 5);
            let rdiag = scheme(&mut a);
            assert_orthonormal(&a);
            assert!(rdiag.iter().all(|r| *r > 0.0));
        }
    }

    #[test]
    fn r_diagonal_matches_nalgebra_qr_up_to_sign() {
        let mut rng = StdRng::seed_from_u64(13);
        let a = random_matrix(&mut rng, 4, 4);
        let mut mgs = a.clone();
        let rdiag = modified_gram_schmidt(&mut mgs);
        let r = a.qr().r();
        for j in 0..4 {
            assert_relative_eq!(rdiag[j], r[(j, j)].abs(), epsilon = 1e-12);
        }
    }

    #[test]
    fn schemes_agree_on_well_conditioned_input() {
        let mut rng = StdRng::seed_from_u64(21);
        let a = random_matrix(&mut rng, 6, 3);
        let mut m = a.clone();
        let mut c = a.clone();
        let rm = modified_gram_schmidt(&mut m);
        let rc = classical_gram_schmidt(&mut c);
        for j in 0..3 {
            assert_relative_eq!(rm[j], rc[j], epsilon = 1e-10);
        }
        assert_orthonormal(&m);
        assert_orthonormal(&c);
    }

    #[test]
    fn rank_deficiency_shows_up_as_a_zero_diagonal() {
        let mut a = DMatrix::from_columns(&[
            DVector::from_vec(vec![1.0, 0.0, 0.0]),
            DVector::from_vec(vec![2.0, 0.0, 0.0]),
        ]);
        let rdiag = modified_gram_schmidt(&mut a);
        assert!(rdiag[0] > 0.0);
        assert_relative_eq!(rdiag[1], 0.0, epsilon = 1e-15);
    }
}
