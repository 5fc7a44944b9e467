//! Iris-Style Classification Demo
//!
//! Three classes over four features on two qubits. The model is trained on
//! the exact simulator, then the same parameters are evaluated on a sampling
//! backend, the way a trained circuit would be moved to a device.

use std::path::PathBuf;

use clap::Parser;

use polyq_demos::ansatz::{IRIS_BITSTRINGS, iris_circuit};
use polyq_demos::datasets::{IRIS_CLASSES, iris_like, split_every};
use polyq_demos::report::{accuracy, confusion_matrix, print_confusion, recall};
use polyq_demos::{
    create_backend, create_spinner, init_logging, print_header, print_info, print_result,
    print_section, print_success, print_warning,
};
use polyq_ml::{Classifier, ClassifierConfig, FitOptions, Method};

#[derive(Parser, Debug)]
#[command(name = "demo-iris")]
#[command(about = "Train a three-class quantum classifier and move it to a sampling backend")]
struct Args {
    /// Samples per class
    #[arg(short = 'n', long, default_value = "30")]
    per_class: usize,

    /// Feature noise in radians
    #[arg(long, default_value = "0.5")]
    spread: f64,

    /// Optimization method (nelder-mead, spsa, bfgs)
    #[arg(short, long)]
    method: Option<Method>,

    /// Maximum loss evaluations
    #[arg(short, long, default_value = "300")]
    budget: usize,

    /// Training rows per evaluation (all rows when omitted)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Seed for data, initial parameters and sampling
    #[arg(long, default_value = "7")]
    seed: u64,

    /// Registered backend to evaluate the trained model on
    #[arg(long, default_value = "sim")]
    backend: String,

    /// Shots of the sampling backend
    #[arg(short, long, default_value = "300")]
    shots: u32,

    /// Save the trained model to this JSON file
    #[arg(long)]
    save: Option<PathBuf>,

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

    print_header("Iris-Style Quantum Classifier Demo");

    let mut config = ClassifierConfig::load(args.config.as_deref())?
        .with_seed(args.seed)
        .with_budget(args.budget);
    if let Some(method) = args.method {
        config = config.with_method(method);
    }
    if args.batch_size.is_some() {
        config = config.with_batch_size(args.batch_size);
    }
    // Training always runs exact; shots only apply after the swap
    config = config.with_nbshots(None);

    let (x, y) = iris_like(args.per_class, args.spread, args.seed);
    let ((train_x, train_y), (test_x, test_y)) = split_every(&x, &y, 5);

    print_section("Problem Setup");
    print_result("Classes", IRIS_CLASSES.join(", "));
    print_result("Features", x.ncols());
    print_result("Training samples", train_x.nrows());
    print_result("Test samples", test_x.nrows());
    print_result("Label bitstrings", IRIS_BITSTRINGS.join(" / "));
    print_result("Method", config.method);
    print_result("Budget", config.budget);
    if let Some(batch) = config.batch_size {
        print_result("Mini-batch", batch);
    }

    let method = config.method;
    let mut clf = Classifier::new(iris_circuit(None)?, &IRIS_BITSTRINGS, config)?;

    print_section("Training (exact simulation)");
    let pb = create_spinner("Optimizing...");
    let report = clf.fit_with(
        train_x.view(),
        &train_y,
        FitOptions::default().with_method(method),
    )?;
    pb.finish_with_message("Optimization complete");

    print_result("Evaluations", report.num_evaluations);
    print_result("Final loss", format!("{:.4}", report.final_loss));
    print_result("Converged", if report.converged { "Yes" } else { "No" });

    print_section("Exact Results");
    let exact_pred = clf.predict_label(test_x.view())?;
    let exact_acc = accuracy(&exact_pred, &test_y);
    print_result("Training accuracy", format!("{:.1}%", 100.0 * clf.score(train_x.view(), &train_y)?));
    print_result("Test accuracy", format!("{:.1}%", 100.0 * exact_acc));
    let exact_matrix = confusion_matrix(&exact_pred, &test_y, IRIS_CLASSES.len());
    print_confusion(&exact_matrix, &IRIS_CLASSES);

    print_section(&format!("Sampling Backend ({} shots)", args.shots));
    let device = create_backend(&args.backend, args.seed)?;
    clf.set_circuit(iris_circuit(Some(device))?)?;
    clf.set_nbshots(Some(args.shots))?;

    let sampled_pred = clf.predict_label(test_x.view())?;
    let sampled_acc = accuracy(&sampled_pred, &test_y);
    print_result("Backend", clf.circuit().backend().name());
    print_result("Test accuracy", format!("{:.1}%", 100.0 * sampled_acc));
    let sampled_matrix = confusion_matrix(&sampled_pred, &test_y, IRIS_CLASSES.len());
    print_confusion(&sampled_matrix, &IRIS_CLASSES);

    print_section("Per-class Recall (exact / sampled)");
    for ((name, exact), sampled) in IRIS_CLASSES
        .iter()
        .zip(recall(&exact_matrix))
        .zip(recall(&sampled_matrix))
    {
        let fmt = |r: Option<f64>| r.map_or("n/a".to_string(), |r| format!("{:.0}%", 100.0 * r));
        print_result(name, format!("{} / {}", fmt(exact), fmt(sampled)));
    }

    if let Some(path) = &args.save {
        clf.save(path)?;
        print_info(&format!("Model saved to {}", path.display()));
    }

    println!();
    if (exact_acc - sampled_acc).abs() <= 0.1 {
        print_success("Sampled predictions track the exact model");
    } else {
        print_warning("Sampling noise changed many predictions; try more --shots");
    }

    Ok(())
}
