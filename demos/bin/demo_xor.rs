//! XOR Classification Demo
//!
//! Trains a two-qubit classifier on the four XOR clusters, prints the decision
//! regions and re-evaluates the trained model on a sampling backend.

use std::f64::consts::PI;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ndarray::Array2;

use polyq_adapter_sim::SimulatorBackend;
use polyq_demos::ansatz::{XOR_BITSTRINGS, xor_circuit};
use polyq_demos::datasets::{split_every, xor};
use polyq_demos::report::{accuracy, confusion_matrix, print_confusion};
use polyq_demos::{
    create_spinner, init_logging, print_header, print_info, print_result, print_section,
    print_success, print_warning,
};
use polyq_hal::Backend;
use polyq_ml::{Classifier, ClassifierConfig, FitOptions, Method};

#[derive(Parser, Debug)]
#[command(name = "demo-xor")]
#[command(about = "Train a quantum classifier on the XOR problem")]
struct Args {
    /// Samples per XOR corner
    #[arg(short = 'n', long, default_value = "20")]
    per_cluster: usize,

    /// Cluster half-width in radians
    #[arg(long, default_value = "0.4")]
    spread: f64,

    /// Optimization method (nelder-mead, spsa, bfgs)
    #[arg(short, long)]
    method: Option<Method>,

    /// Maximum loss evaluations
    #[arg(short, long)]
    budget: Option<usize>,

    /// Seed for data, initial parameters and sampling
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Shots for the sampled re-evaluation
    #[arg(short, long, default_value = "300")]
    shots: u32,

    /// Classifier configuration file (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    print_header("XOR Quantum Classifier Demo");

    let mut config = ClassifierConfig::load(args.config.as_deref())?.with_seed(args.seed);
    if let Some(method) = args.method {
        config = config.with_method(method);
    }
    if let Some(budget) = args.budget {
        config = config.with_budget(budget);
    }

    let (x, y) = xor(args.per_cluster, args.spread, args.seed);
    let ((train_x, train_y), (test_x, test_y)) = split_every(&x, &y, 4);

    print_section("Problem Setup");
    print_result("Training samples", train_x.nrows());
    print_result("Test samples", test_x.nrows());
    print_result("Qubits", 2);
    print_result("Label bitstrings", XOR_BITSTRINGS.join(" / "));
    print_result("Method", config.method);
    print_result("Budget", config.budget);

    let method = config.method;
    let mut clf = Classifier::new(xor_circuit(None)?, &XOR_BITSTRINGS, config)?;

    print_section("Training (exact simulation)");
    let pb = create_spinner("Optimizing...");
    let report = clf.fit_with(
        train_x.view(),
        &train_y,
        FitOptions::default().with_method(method),
    )?;
    pb.finish_with_message("Optimization complete");

    print_result("Evaluations", report.num_evaluations);
    print_result("Iterations", report.num_iterations);
    print_result("Final loss", format!("{:.4}", report.final_loss));
    print_result("Converged", if report.converged { "Yes" } else { "No" });

    print_section("Loss Progression");
    let history = clf.loss_progress();
    let step = (history.len() / 8).max(1);
    for (i, loss) in history.iter().enumerate().step_by(step) {
        println!("  Evaluation {i:4}: {loss:.4}");
    }

    print_section("Exact Results");
    let train_pred = clf.predict_label(train_x.view())?;
    let test_pred = clf.predict_label(test_x.view())?;
    let test_acc = accuracy(&test_pred, &test_y);
    print_result("Training accuracy", format!("{:.1}%", 100.0 * accuracy(&train_pred, &train_y)));
    print_result("Test accuracy", format!("{:.1}%", 100.0 * test_acc));
    print_confusion(&confusion_matrix(&test_pred, &test_y, 2), &["even", "odd"]);

    print_section("Decision Regions");
    print_grid(&clf, 9)?;

    print_section(&format!("Sampled Re-evaluation ({} shots)", args.shots));
    let sampler: Arc<dyn Backend> = Arc::new(SimulatorBackend::new().with_seed(args.seed));
    clf.set_circuit(xor_circuit(Some(sampler))?)?;
    clf.set_nbshots(Some(args.shots))?;

    let sampled_pred = clf.predict_label(test_x.view())?;
    let sampled_acc = accuracy(&sampled_pred, &test_y);
    print_result("Test accuracy", format!("{:.1}%", 100.0 * sampled_acc));
    let agreement = accuracy(&sampled_pred, &test_pred);
    print_result("Agreement with exact", format!("{:.1}%", 100.0 * agreement));

    println!();
    if test_acc >= 0.9 {
        print_success("The classifier learned the XOR parity");
    } else {
        print_warning("Accuracy is low; try a larger --budget or another --method");
    }
    print_info("Run with -vv to see the loss of every evaluation");

    Ok(())
}

/// Print the predicted label over a `size × size` grid covering `[0, π]²`.
fn print_grid(clf: &Classifier, size: usize) -> anyhow::Result<()> {
    let size = size.max(2);
    let points = Array2::from_shape_fn((size * size, 2), |(i, j)| {
        let cell = if j == 0 { i / size } else { i % size };
        PI * cell as f64 / (size - 1) as f64
    });
    let labels = clf.predict_label(points.view())?;

    println!("  x0 ↓  x1 →");
    for row in labels.chunks(size) {
        let line: String = row
            .iter()
            .map(|&label| if label == 0 { " ·" } else { " ■" })
            .collect();
        println!("  {line}");
    }
    Ok(())
}
