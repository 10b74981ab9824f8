//! Shared fixtures: tensor Gauss-Legendre rules and point sets on boxes.

#![allow(dead_code)]

use nalgebra::{DMatrix, DVector};
use polyrbf_basis::Quadrature;
use rand::Rng;

/// Gauss-Legendre nodes and weights on [-1, 1].
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];
    for i in 0..n {
        let mut x = (std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut dp = 1.0;
        for _ in 0..100 {
            // Three-term recurrence for P_n(x) and P_{n-1}(x)
            let (mut p0, mut p1) = (1.0, x);
            for k in 2..=n {
                let p2 = ((2 * k - 1) as f64 * x * p1 - (k - 1) as f64 * p0) / k as f64;
                p0 = p1;
                p1 = p2;
            }
            dp = n as f64 * (x * p1 - p0) / (x * x - 1.0);
            let dx = p1 / dp;
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }
        nodes[i] = x;
        weights[i] = 2.0 / ((1.0 - x * x) * dp * dp);
    }
    (nodes, weights)
}

/// Tensor rule with `n` points per axis on the box [lo, hi].
pub fn box_rule(lo: &[f64], hi: &[f64], n: usize) -> Quadrature {
    let dim = lo.len();
    let (nodes, weights) = gauss_legendre(n);
    let total = n.pow(dim as u32);

    let mut points = DMatrix::zeros(total, dim);
    let mut w = DVector::zeros(total);
    for q in 0..total {
        let mut index = q;
        let mut wq = 1.0;
        for d in 0..dim {
            let i = index % n;
            index /= n;
            let half = 0.5 * (hi[d] - lo[d]);
            points[(q, d)] = lo[d] + half * (nodes[i] + 1.0);
            wq *= half * weights[i];
        }
        w[q] = wq;
    }

    Quadrature::new(points, w).unwrap()
}

/// Randomly jittered midpoint rule on [0, 1]^dim with positive random weights.
pub fn jittered_rule<R: Rng>(rng: &mut R, dim: usize, cells: usize) -> Quadrature {
    let total = cells.pow(dim as u32);
    let h = 1.0 / cells as f64;

    let mut points = DMatrix::zeros(total, dim);
    let mut weights = DVector::zeros(total);
    for q in 0..total {
        let mut index = q;
        for d in 0..dim {
            let i = index % cells;
            index /= cells;
            points[(q, d)] = (i as f64 + rng.gen_range(0.1..0.9)) * h;
        }
        weights[q] = h.powi(dim as i32) * rng.gen_range(0.5..1.5);
    }

    Quadrature::new(points, weights).unwrap()
}

/// Regular grid with `n` points per axis on [lo, hi] (boundary included).
pub fn grid(lo: &[f64], hi: &[f64], n: usize) -> DMatrix<f64> {
    let dim = lo.len();
    let total = n.pow(dim as u32);
    let mut points = DMatrix::zeros(total, dim);
    for q in 0..total {
        let mut index = q;
        for d in 0..dim {
            let i = index % n;
            index /= n;
            points[(q, d)] = lo[d] + (hi[d] - lo[d]) * i as f64 / (n - 1) as f64;
        }
    }
    points
}

/// `n` centers on a circle of radius `radius` around (cx, cy).
pub fn ring(n: usize, cx: f64, cy: f64, radius: f64) -> DMatrix<f64> {
    DMatrix::from_fn(n, 2, |k, d| {
        let angle = 2.0 * std::f64::consts::PI * (k as f64 + 0.25) / n as f64;
        if d == 0 {
            cx + radius * angle.cos()
        } else {
            cy + radius * angle.sin()
        }
    })
}

/// Corners of the cube [c - h, c + h]^3.
pub fn cube_corners(c: f64, h: f64) -> DMatrix<f64> {
    DMatrix::from_fn(8, 3, |k, d| if (k >> d) & 1 == 1 { c + h } else { c - h })
}

/// Central finite difference of `f` along `axis` at every row of `samples`.
pub fn central_difference<F>(samples: &DMatrix<f64>, axis: usize, step: f64, f: F) -> DVector<f64>
where
    F: Fn(&DMatrix<f64>) -> DVector<f64>,
{
    let mut plus = samples.clone();
    let mut minus = samples.clone();
    for i in 0..samples.nrows() {
        plus[(i, axis)] += step;
        minus[(i, axis)] -= step;
    }
    (f(&plus) - f(&minus)) / (2.0 * step)
}
