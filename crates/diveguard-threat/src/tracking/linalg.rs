//! Fixed-size matrix helpers for the 6-state estimator.
//!
//! Row-major `[[f64; N]; M]` arrays; sizes are small enough that plain loops
//! beat any general-purpose matrix type.

/// 6×6 matrix (row-major)
pub type Mat6 = [[f64; 6]; 6];
/// 3×3 matrix (row-major)
pub type Mat3 = [[f64; 3]; 3];
/// 6-vector
pub type Vec6 = [f64; 6];
/// 3-vector
pub type Vec3 = [f64; 3];

/// `s · I₆`
pub fn mat6_scaled_identity(s: f64) -> Mat6 {
    std::array::from_fn(|i| std::array::from_fn(|j| if i == j { s } else { 0.0 }))
}

/// Constant-velocity transition: identity with `dt` coupling position to velocity
pub fn constant_velocity_transition(dt: f64) -> Mat6 {
    let mut f = mat6_scaled_identity(1.0);
    for axis in 0..3 {
        f[axis][axis + 3] = dt;
    }
    f
}

/// `A · B`
pub fn mat6_mul(a: &Mat6, b: &Mat6) -> Mat6 {
    std::array::from_fn(|i| std::array::from_fn(|j| (0..6).map(|k| a[i][k] * b[k][j]).sum()))
}

/// `Aᵀ`
pub fn mat6_transpose(a: &Mat6) -> Mat6 {
    std::array::from_fn(|i| std::array::from_fn(|j| a[j][i]))
}

/// `A + B`
pub fn mat6_add(a: &Mat6, b: &Mat6) -> Mat6 {
    std::array::from_fn(|i| std::array::from_fn(|j| a[i][j] + b[i][j]))
}

/// `A · v`
pub fn mat6_mul_vec6(a: &Mat6, v: &Vec6) -> Vec6 {
    std::array::from_fn(|i| (0..6).map(|k| a[i][k] * v[k]).sum())
}

/// Top-left 3×3 block (the position covariance)
pub fn position_block(p: &Mat6) -> Mat3 {
    std::array::from_fn(|i| std::array::from_fn(|j| p[i][j]))
}

/// `(A + Aᵀ) / 2`
pub fn symmetrize(a: &Mat6) -> Mat6 {
    std::array::from_fn(|i| std::array::from_fn(|j| 0.5 * (a[i][j] + a[j][i])))
}

/// Trace of a 3×3 matrix
pub fn mat3_trace(m: &Mat3) -> f64 {
    m[0][0] + m[1][1] + m[2][2]
}

/// Inverse of a 3×3 matrix by cofactors; `None` when |det| < 1e-12.
pub fn mat3_inv(m: &Mat3) -> Option<Mat3> {
    let cof = |r0: usize, r1: usize, c0: usize, c1: usize| m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0];

    let c00 = cof(1, 2, 1, 2);
    let c01 = -cof(1, 2, 0, 2);
    let c02 = cof(1, 2, 0, 1);
    let det = m[0][0] * c00 + m[0][1] * c01 + m[0][2] * c02;
    if !det.is_finite() || det.abs() < 1e-12 {
        return None;
    }

    let c10 = -cof(0, 2, 1, 2);
    let c11 = cof(0, 2, 0, 2);
    let c12 = -cof(0, 2, 0, 1);
    let c20 = cof(0, 1, 1, 2);
    let c21 = -cof(0, 1, 0, 2);
    let c22 = cof(0, 1, 0, 1);

    let inv = 1.0 / det;
    // adjugate = cofactor matrix transposed
    Some([
        [c00 * inv, c10 * inv, c20 * inv],
        [c01 * inv, c11 * inv, c21 * inv],
        [c02 * inv, c12 * inv, c22 * inv],
    ])
}

/// True when every element is finite
pub fn all_finite<const R: usize, const C: usize>(m: &[[f64; C]; R]) -> bool {
    m.iter().flatten().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: &Mat3, b: &Mat3, eps: f64) -> bool {
        a.iter().flatten().zip(b.iter().flatten()).all(|(x, y)| (x - y).abs() < eps)
    }

    #[test]
    fn test_identity_is_neutral() {
        let f = constant_velocity_transition(0.1);
        let i = mat6_scaled_identity(1.0);
        assert_eq!(mat6_mul(&f, &i), f);
        assert_eq!(mat6_mul(&i, &f), f);
    }

    #[test]
    fn test_transition_moves_position() {
        let f = constant_velocity_transition(0.5);
        let x = mat6_mul_vec6(&f, &[100.0, 0.0, 0.0, -2.0, 4.0, 0.0]);
        assert!((x[0] - 99.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
        assert!((x[3] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_transpose_and_symmetrize() {
        let mut a = mat6_scaled_identity(2.0);
        a[0][5] = 4.0;
        let t = mat6_transpose(&a);
        assert_eq!(t[5][0], 4.0);
        let s = symmetrize(&a);
        assert_eq!(s[0][5], 2.0);
        assert_eq!(s[5][0], 2.0);
        assert_eq!(mat6_add(&a, &t)[0][5], 4.0);
    }

    #[test]
    fn test_mat3_inverse() {
        let m: Mat3 = [[4.0, 1.0, 0.0], [1.0, 3.0, 0.5], [0.0, 0.5, 2.0]];
        let inv = mat3_inv(&m).unwrap();
        let product: Mat3 = std::array::from_fn(|i| {
            std::array::from_fn(|j| (0..3).map(|k| m[i][k] * inv[k][j]).sum())
        });
        let identity: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(approx_eq(&product, &identity, 1e-12));
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let m: Mat3 = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]];
        assert!(mat3_inv(&m).is_none());
    }

    #[test]
    fn test_finite_check() {
        let mut m = mat6_scaled_identity(1.0);
        assert!(all_finite(&m));
        m[2][3] = f64::NAN;
        assert!(!all_finite(&m));
    }
}
