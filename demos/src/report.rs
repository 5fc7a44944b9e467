//! Classification reports.

use console::style;
use ndarray::Array2;

pub use polyq_ml::metrics::accuracy;

/// Confusion matrix: entry `[t, p]` counts samples of true label `t`
/// predicted as `p`. Labels at or above `num_labels` are ignored.
pub fn confusion_matrix(predicted: &[usize], truth: &[usize], num_labels: usize) -> Array2<usize> {
    let mut matrix = Array2::zeros((num_labels, num_labels));
    for (&p, &t) in predicted.iter().zip(truth) {
        if p < num_labels && t < num_labels {
            matrix[[t, p]] += 1;
        }
    }
    matrix
}

/// Per-label recall (diagonal over row sums); `None` for absent labels.
pub fn recall(matrix: &Array2<usize>) -> Vec<Option<f64>> {
    matrix
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let total: usize = row.sum();
            (total > 0).then(|| row[i] as f64 / total as f64)
        })
        .collect()
}

/// Print a confusion matrix with class names as row and column headers.
pub fn print_confusion(matrix: &Array2<usize>, names: &[&str]) {
    let width = names.iter().map(|n| n.len()).max().unwrap_or(0).max(6);

    print!("  {:>width$} ", "");
    for name in names {
        print!(" {:>width$}", style(name).dim());
    }
    println!();

    for (i, row) in matrix.rows().into_iter().enumerate() {
        let name = names.get(i).copied().unwrap_or("?");
        print!("  {:>width$} ", style(name).dim());
        for (j, count) in row.iter().enumerate() {
            let cell = format!("{count:>width$}");
            if i == j {
                print!(" {}", style(cell).green());
            } else if *count > 0 {
                print!(" {}", style(cell).red());
            } else {
                print!(" {cell}");
            }
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_confusion_matrix() {
        let truth = [0, 0, 1, 1, 2, 2];
        let predicted = [0, 1, 1, 1, 2, 0];
        let matrix = confusion_matrix(&predicted, &truth, 3);
        assert_eq!(matrix, array![[1, 1, 0], [0, 2, 0], [1, 0, 1]]);
        assert_eq!(matrix.sum(), 6);
    }

    #[test]
    fn test_recall() {
        let matrix = array![[1, 1, 0], [0, 2, 0], [0, 0, 0]];
        assert_eq!(recall(&matrix), vec![Some(0.5), Some(1.0), None]);
    }

    #[test]
    fn test_out_of_range_labels_are_ignored() {
        let matrix = confusion_matrix(&[0, 5], &[0, 0], 2);
        assert_eq!(matrix.sum(), 1);
    }
}
