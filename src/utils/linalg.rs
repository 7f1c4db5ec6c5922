//! Small dense linear-algebra helpers

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Solve the symmetric positive-definite system `a x = b` by Cholesky
/// decomposition. Returns `None` if `a` is not positive definite.
pub fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // A = L * L^T
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward substitution: L * y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T * x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Ridge regression with an unpenalized intercept.
///
/// Centers `x` and `y`, solves `(XᵀX + αI) w = Xᵀy` and returns
/// `(w, intercept)`. When the system cannot be solved, or there are no
/// features, the coefficients are zero and the intercept is the mean of `y`.
pub fn ridge_fit(x: ArrayView2<f64>, y: ArrayView1<f64>, alpha: f64) -> (Array1<f64>, f64) {
    let p = x.ncols();
    let y_mean = y.mean().unwrap_or(0.0);

    if x.nrows() == 0 || p == 0 {
        return (Array1::zeros(p), y_mean);
    }

    let x_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(p));
    let xc = &x - &x_mean;
    let yc = &y - y_mean;

    let mut gram = xc.t().dot(&xc);
    // Keep the system definite even when alpha is zero and features are collinear
    let jitter = 1e-10 * gram.diag().iter().map(|v| v.abs()).sum::<f64>().max(1.0) / p as f64;
    for k in 0..p {
        gram[[k, k]] += alpha.max(0.0) + jitter;
    }
    let rhs = xc.t().dot(&yc);

    match cholesky_solve(&gram, &rhs) {
        Some(w) => {
            let intercept = y_mean - w.dot(&x_mean);
            (w, intercept)
        }
        None => (Array1::zeros(p), y_mean),
    }
}
