//! polyq Demo Suite
//!
//! End-to-end walkthroughs of the variational classifier:
//!
//! - **XOR**: four clusters that no linear separator can split, learned by a
//!   two-qubit circuit with a CNOT parity step
//! - **Iris-style**: three classes over four features, trained on the exact
//!   simulator and then evaluated on a 300-shot sampling backend
//!
//! ```ignore
//! use polyq_demos::{ansatz, datasets};
//! use polyq_ml::{Classifier, ClassifierConfig, Method};
//!
//! let (x, y) = datasets::xor(25, 0.3, 42);
//! let mut clf = Classifier::new(ansatz::xor_circuit(None)?, &["00", "01"], ClassifierConfig::default())?;
//! clf.fit(x.view(), &y, Method::NelderMead)?;
//! ```

pub mod ansatz;
pub mod datasets;
pub mod report;

use std::sync::Arc;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use polyq_adapter_sim::SimulatorBackend;
use polyq_hal::{Backend, BackendConfig, BackendRegistry, HalResult};
use tracing_subscriber::EnvFilter;

/// Registry of the backends the demos can select with `--backend`.
pub fn backend_registry() -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register::<SimulatorBackend>("sim");
    registry
}

/// Create the backend registered as `name`, seeded when it samples.
pub fn create_backend(name: &str, seed: u64) -> HalResult<Arc<dyn Backend>> {
    let config = BackendConfig::new(name).with_extra("seed", serde_json::json!(seed));
    backend_registry().create(name, config)
}

/// Install a `fmt` subscriber whose level follows a `-v` count.
pub fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Spinner shown while a blocking fit runs.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a demo header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!("{}", style(format!("  {title}")).cyan().bold());
    println!("{}", style("═".repeat(60)).cyan());
    println!();
}

/// Print a demo section.
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(format!("▶ {title}")).green().bold());
    println!("{}", style("─".repeat(40)).dim());
}

/// Print a result line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("ℹ").blue(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}
