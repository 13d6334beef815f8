//! Dense ridge least squares for the small design matrices used by the model.

/// Row-major design matrix
#[derive(Debug, Clone)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, value: f64) {
        self.data[r * self.cols + c] = value;
    }

    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// `self · beta`
    pub fn mul_vec(&self, beta: &[f64]) -> Vec<f64> {
        (0..self.rows)
            .map(|r| self.row(r).iter().zip(beta).map(|(x, b)| x * b).sum())
            .collect()
    }
}

/// Solve `(XᵀX + diag(penalty)) β = Xᵀy` by Cholesky decomposition.
///
/// Returns `None` when the system is not positive definite or not finite.
pub fn ridge_solve(x: &Matrix, y: &[f64], penalty: &[f64]) -> Option<Vec<f64>> {
    let n = x.cols();
    debug_assert_eq!(penalty.len(), n);
    debug_assert_eq!(y.len(), x.rows());

    // Normal equations
    let mut a = vec![0.0; n * n];
    let mut b = vec![0.0; n];
    for r in 0..x.rows() {
        let row = x.row(r);
        for i in 0..n {
            if row[i] == 0.0 {
                continue;
            }
            b[i] += row[i] * y[r];
            for j in i..n {
                a[i * n + j] += row[i] * row[j];
            }
        }
    }
    for i in 0..n {
        a[i * n + i] += penalty[i];
        for j in 0..i {
            a[i * n + j] = a[j * n + i];
        }
    }

    let l = cholesky(&a, n)?;

    // Forward substitution: L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        let sum: f64 = (0..i).map(|k| l[i * n + k] * z[k]).sum();
        z[i] = (b[i] - sum) / l[i * n + i];
    }

    // Back substitution: Lᵀ β = z
    let mut beta = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|k| l[k * n + i] * beta[k]).sum();
        beta[i] = (z[i] - sum) / l[i * n + i];
    }

    beta.iter().all(|v| v.is_finite()).then_some(beta)
}

/// Lower-triangular factor of a symmetric positive definite matrix
fn cholesky(a: &[f64], n: usize) -> Option<Vec<f64>> {
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[i * n + k] * l[j * n + k]).sum();
            if i == j {
                let d = a[i * n + i] - sum;
                // Pivot must stay clear of round-off relative to the diagonal
                let tolerance = a[i * n + i].abs() * 1e-12;
                if !d.is_finite() || d <= tolerance {
                    return None;
                }
                l[i * n + i] = d.sqrt();
            } else {
                l[i * n + j] = (a[i * n + j] - sum) / l[j * n + j];
            }
        }
    }
    Some(l)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[f64]]) -> Matrix {
        let mut m = Matrix::zeros(rows.len(), rows[0].len());
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                m.set(r, c, *v);
            }
        }
        m
    }

    #[test]
    fn test_exact_line_fit() {
        // y = 2 + 3x
        let x = matrix(&[&[1.0, 0.0], &[1.0, 1.0], &[1.0, 2.0], &[1.0, 3.0]]);
        let y = [2.0, 5.0, 8.0, 11.0];
        let beta = ridge_solve(&x, &y, &[0.0, 0.0]).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-9);
        assert!((beta[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_penalty_shrinks_coefficients() {
        let x = matrix(&[&[1.0], &[1.0]]);
        let y = [4.0, 4.0];
        let free = ridge_solve(&x, &y, &[0.0]).unwrap();
        let shrunk = ridge_solve(&x, &y, &[2.0]).unwrap();
        assert!((free[0] - 4.0).abs() < 1e-12);
        // (2 + 2) β = 8
        assert!((shrunk[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rank_deficient_without_penalty_fails() {
        let x = matrix(&[&[1.0, 1.0], &[2.0, 2.0]]);
        assert!(ridge_solve(&x, &[1.0, 2.0], &[0.0, 0.0]).is_none());
        assert!(ridge_solve(&x, &[1.0, 2.0], &[1e-6, 1e-6]).is_some());
    }

    #[test]
    fn test_mul_vec() {
        let x = matrix(&[&[1.0, 2.0], &[3.0, 4.0]]);
        assert_eq!(x.mul_vec(&[1.0, 1.0]), vec![3.0, 7.0]);
    }
}
