//! Synthetic datasets for the demos.
//!
//! Features are already angles: every generator places its clusters inside
//! `[0, π]` so they can be fed to Y rotations without rescaling.

use std::f64::consts::PI;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// XOR clusters: corners `(0, 0)` and `(π, π)` are class 0, `(0, π)` and
/// `(π, 0)` class 1.
///
/// Returns `4 * per_cluster` rows with two features, shuffled by cluster
/// order only (rows cycle through the four corners).
pub fn xor(per_cluster: usize, spread: f64, seed: u64) -> (Array2<f64>, Vec<usize>) {
    const CORNERS: [(f64, f64, usize); 4] = [(0.0, 0.0, 0), (0.0, PI, 1), (PI, 0.0, 1), (PI, PI, 0)];

    let mut rng = StdRng::seed_from_u64(seed);
    let rows = 4 * per_cluster;
    let mut x = Array2::zeros((rows, 2));
    let mut y = Vec::with_capacity(rows);

    for i in 0..rows {
        let (cx, cy, label) = CORNERS[i % 4];
        x[[i, 0]] = cx + jitter(&mut rng, spread);
        x[[i, 1]] = cy + jitter(&mut rng, spread);
        y.push(label);
    }
    (x, y)
}

/// Class centres of the iris-style dataset, one row per class.
///
/// Loosely follows the per-species means of sepal/petal length and width,
/// mapped linearly onto `[0.3, 2.8]`.
pub const IRIS_CENTERS: [[f64; 4]; 3] = [
    [0.9, 2.2, 0.4, 0.3],
    [1.6, 1.2, 1.7, 1.5],
    [2.1, 1.6, 2.5, 2.6],
];

/// Class names of the iris-style dataset.
pub const IRIS_CLASSES: [&str; 3] = ["setosa", "versicolor", "virginica"];

/// Three-class, four-feature dataset shaped like the iris measurements.
pub fn iris_like(per_class: usize, spread: f64, seed: u64) -> (Array2<f64>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = IRIS_CENTERS.len() * per_class;
    let mut x = Array2::zeros((rows, 4));
    let mut y = Vec::with_capacity(rows);

    for i in 0..rows {
        let label = i % IRIS_CENTERS.len();
        for (j, center) in IRIS_CENTERS[label].iter().enumerate() {
            x[[i, j]] = (center + jitter(&mut rng, spread)).clamp(0.0, PI);
        }
        y.push(label);
    }
    (x, y)
}

/// Split rows into a training and a test part.
///
/// Every `k`-th row (starting at row `k - 1`) goes to the test part.
pub fn split_every(
    x: &Array2<f64>,
    y: &[usize],
    k: usize,
) -> ((Array2<f64>, Vec<usize>), (Array2<f64>, Vec<usize>)) {
    let k = k.max(2);
    let (test_rows, train_rows): (Vec<usize>, Vec<usize>) =
        (0..x.nrows()).partition(|i| i % k == k - 1);

    let take = |rows: &[usize]| {
        (
            x.select(ndarray::Axis(0), rows),
            rows.iter().map(|&i| y[i]).collect::<Vec<usize>>(),
        )
    };
    (take(&train_rows), take(&test_rows))
}

/// Triangular noise in `[-spread, spread]`, denser near zero.
fn jitter(rng: &mut StdRng, spread: f64) -> f64 {
    if spread <= 0.0 {
        return 0.0;
    }
    let a: f64 = rng.gen_range(-spread..spread);
    let b: f64 = rng.gen_range(-spread..spread);
    0.5 * (a + b)
}
