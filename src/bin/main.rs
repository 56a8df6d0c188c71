//! hogsvm command line interface
//!
//! Runs the cats-vs-dogs pipeline, trains and evaluates single models, and
//! inspects descriptors, saved models and exported result tables.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use hogsvm::api::train_classifier;
use hogsvm::config::{KernelSpec, PipelineConfig};
use hogsvm::core::{Dataset, OptimizerConfig, Result, SVMError, WorkingSetStrategy};
use hogsvm::data::{load_split, SubstringLabel};
use hogsvm::evaluation::{evaluate, ClassificationReport};
use hogsvm::export::{read_result_table, write_result_table};
use hogsvm::features::{FeatureExtractor, HogDescriptor, HogParams};
use hogsvm::kernel::KernelKind;
use hogsvm::persistence::SerializableModel;
use hogsvm::pipeline::Pipeline;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "hogsvm")]
#[command(about = "Cats vs. dogs classification with HOG descriptors and kernel SVMs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hogsvm contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train, evaluate and export every configured kernel variant
    Run(RunArgs),
    /// Train a single model and save it
    Train(TrainArgs),
    /// Evaluate a saved model on a test directory
    Evaluate(EvaluateArgs),
    /// Display model information
    Info(InfoArgs),
    /// Print the HOG descriptor statistics of one image
    Describe(DescribeArgs),
    /// Print an exported result table with its metrics
    Show(ShowArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CliKernel {
    /// Linear kernel <x, y>
    #[value(name = "linear")]
    Linear,
    /// Radial basis function exp(-gamma ||x - y||^2)
    #[value(name = "rbf")]
    Rbf,
    /// Sigmoid tanh(gamma <x, y> + coef0)
    #[value(name = "sigmoid")]
    Sigmoid,
}

impl From<CliKernel> for KernelKind {
    fn from(kernel: CliKernel) -> Self {
        match kernel {
            CliKernel::Linear => KernelKind::Linear,
            CliKernel::Rbf => KernelKind::RadialBasis,
            CliKernel::Sigmoid => KernelKind::Sigmoid,
        }
    }
}

#[derive(ValueEnum, Clone, Debug)]
enum CliWorkingSetStrategy {
    /// SMO heuristic: max |E_i - E_j| (fast, default)
    #[value(name = "smo-heuristic")]
    SMOHeuristic,
    /// Steepest descent: max KKT violation (SVMlight style, more rigorous)
    #[value(name = "steepest-descent")]
    SteepestDescent,
    /// Random selection (for debugging/comparison)
    #[value(name = "random")]
    Random,
}

impl From<CliWorkingSetStrategy> for WorkingSetStrategy {
    fn from(cli_strategy: CliWorkingSetStrategy) -> Self {
        match cli_strategy {
            CliWorkingSetStrategy::SMOHeuristic => WorkingSetStrategy::SMOHeuristic,
            CliWorkingSetStrategy::SteepestDescent => WorkingSetStrategy::SteepestDescent,
            CliWorkingSetStrategy::Random => WorkingSetStrategy::Random,
        }
    }
}

/// Descriptor geometry flags
#[derive(Args, Clone, Debug)]
struct HogArgs {
    /// Side of the square images are resized to
    #[arg(long)]
    image_size: Option<u32>,

    /// Number of orientation bins
    #[arg(long)]
    orientations: Option<usize>,

    /// Cell side in pixels
    #[arg(long)]
    pixels_per_cell: Option<usize>,

    /// Block side in cells
    #[arg(long)]
    cells_per_block: Option<usize>,
}

impl HogArgs {
    fn apply(&self, base: HogParams) -> HogParams {
        HogParams {
            image_size: self.image_size.unwrap_or(base.image_size),
            orientations: self.orientations.unwrap_or(base.orientations),
            pixels_per_cell: self.pixels_per_cell.unwrap_or(base.pixels_per_cell),
            cells_per_block: self.cells_per_block.unwrap_or(base.cells_per_block),
        }
    }
}

#[derive(Args)]
struct RunArgs {
    /// JSON configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Training split root (one directory per class)
    #[arg(long)]
    train_dir: Option<PathBuf>,

    /// Test split root (one directory per class)
    #[arg(long)]
    test_dir: Option<PathBuf>,

    /// Results go to <PREFIX>_<kernel>.csv
    #[arg(short, long)]
    output_prefix: Option<String>,

    /// Kernel variants to run, in order (repeatable)
    #[arg(short, long = "kernel", value_enum)]
    kernels: Vec<CliKernel>,

    /// Seed every selected variant with this value
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    hog: HogArgs,

    /// Regularization parameter C
    #[arg(short = 'C', long)]
    c: Option<f64>,

    /// Convergence tolerance
    #[arg(short, long)]
    epsilon: Option<f64>,

    /// Maximum solver passes
    #[arg(short, long)]
    max_iterations: Option<usize>,

    /// Extract features in parallel
    #[arg(long, conflicts_with = "sequential")]
    parallel: bool,

    /// Extract features on the calling thread
    #[arg(long)]
    sequential: bool,

    /// Do not print result tables and reports
    #[arg(short, long)]
    quiet: bool,

    /// Save each trained model next to its result table
    #[arg(long)]
    save_models: bool,
}

#[derive(Args)]
struct TrainArgs {
    /// Training split root (one directory per class)
    #[arg(long)]
    train_dir: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    /// Kernel variant
    #[arg(short, long, value_enum, default_value = "linear")]
    kernel: CliKernel,

    /// Solver seed (defaults to 42 for rbf, unseeded otherwise)
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    hog: HogArgs,

    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// Convergence tolerance
    #[arg(short, long, default_value = "0.001")]
    epsilon: f64,

    /// Maximum solver passes
    #[arg(short, long, default_value = "10000")]
    max_iterations: usize,

    /// Kernel cache size in MB
    #[arg(long, default_value = "100")]
    cache_size: usize,

    /// Working set selection strategy
    #[arg(long, default_value = "smo-heuristic")]
    working_set_strategy: CliWorkingSetStrategy,

    /// Extract features on the calling thread
    #[arg(long)]
    sequential: bool,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Test split root (one directory per class)
    #[arg(long)]
    test_dir: PathBuf,

    /// Write the result table here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not print the result table and report
    #[arg(short, long)]
    quiet: bool,

    /// Extract features on the calling thread
    #[arg(long)]
    sequential: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

#[derive(Args)]
struct DescribeArgs {
    /// Image file
    image: PathBuf,

    #[command(flatten)]
    hog: HogArgs,

    /// Also print every descriptor value
    #[arg(long)]
    values: bool,
}

#[derive(Args)]
struct ShowArgs {
    /// Result table written by `run` or `evaluate`
    results: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Run(args) => run_command(args),
        Commands::Train(args) => train_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Info(args) => info_command(args),
        Commands::Describe(args) => describe_command(args),
        Commands::Show(args) => show_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn build_config(args: &RunArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            PipelineConfig::from_file(path)?
        }
        None => PipelineConfig::default(),
    };

    if let Some(dir) = &args.train_dir {
        config.train_dir = dir.clone();
    }
    if let Some(dir) = &args.test_dir {
        config.test_dir = dir.clone();
    }
    if let Some(prefix) = &args.output_prefix {
        config.output_prefix = prefix.clone();
    }

    if !args.kernels.is_empty() {
        // Keep per-kernel settings (such as the RBF seed) of kernels already configured
        let configured = config.kernels.clone();
        config.kernels = args
            .kernels
            .iter()
            .map(|&k| {
                let kind = KernelKind::from(k);
                configured
                    .iter()
                    .find(|spec| spec.kind == kind)
                    .cloned()
                    .or_else(|| KernelSpec::defaults().into_iter().find(|s| s.kind == kind))
                    .unwrap_or_else(|| KernelSpec::new(kind))
            })
            .collect();
    }
    if let Some(seed) = args.seed {
        warn!("Seeding every variant with {seed}");
        for spec in &mut config.kernels {
            spec.seed = Some(seed);
        }
    }

    let hog = args.hog.apply(config.hog_params());
    config.image_size = hog.image_size;
    config.hog_orientations = hog.orientations;
    config.hog_pixels_per_cell = hog.pixels_per_cell;
    config.hog_cells_per_block = hog.cells_per_block;

    if let Some(c) = args.c {
        config.c = c;
    }
    if let Some(epsilon) = args.epsilon {
        config.epsilon = epsilon;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    if args.parallel {
        config.parallel = true;
    }
    if args.sequential {
        config.parallel = false;
    }
    if args.quiet {
        config.print_reports = false;
    }
    if args.save_models {
        config.save_models = true;
    }

    config.validate()?;
    Ok(config)
}

fn run_command(args: RunArgs) -> Result<()> {
    let config = build_config(&args)?;
    info!(
        "Running {} kernel variant(s): train {}, test {}",
        config.kernels.len(),
        config.train_dir.display(),
        config.test_dir.display()
    );

    let pipeline = Pipeline::new(config)?;
    let runs = pipeline.run()?;

    println!("=== Summary ===");
    for run in &runs {
        println!(
            "{:<8} accuracy {:.4}  -> {}",
            run.kind.as_str(),
            run.evaluation.accuracy(),
            run.output_path.display()
        );
    }

    Ok(())
}

fn train_command(args: TrainArgs) -> Result<()> {
    let params = args.hog.apply(HogParams::default());
    let descriptor = HogDescriptor::new(params)?;
    let kind = KernelKind::from(args.kernel);

    let mut spec = KernelSpec::defaults()
        .into_iter()
        .find(|s| s.kind == kind)
        .unwrap_or_else(|| KernelSpec::new(kind));
    if args.seed.is_some() {
        spec.seed = args.seed;
    }

    info!("Training {} model on {}", kind, args.train_dir.display());
    info!(
        "Parameters: C={}, epsilon={}, max_iter={}",
        args.c, args.epsilon, args.max_iterations
    );

    let train = load_split(
        &args.train_dir,
        &descriptor,
        &SubstringLabel::default(),
        !args.sequential,
    )?;
    if train.len() < 2 {
        return Err(SVMError::InvalidDataset(
            "Dataset must contain at least 2 samples".to_string(),
        ));
    }

    let config = OptimizerConfig {
        c: args.c,
        epsilon: args.epsilon,
        max_iterations: args.max_iterations,
        cache_size: args.cache_size * 1024 * 1024,
        working_set_strategy: args.working_set_strategy.into(),
        seed: spec.seed,
        ..OptimizerConfig::default()
    };

    let model = train_classifier(train.features(), train.labels(), &spec, &config)?;

    let info = model.info();
    info!("Support vectors: {}", info.n_support_vectors);
    info!("Bias: {:.6}", info.bias);

    SerializableModel::from_trained_model(&model)
        .with_hog_params(params)
        .save_to_file(&args.output)?;
    info!("Model saved to: {}", args.output.display());

    let accuracy = model.evaluate(&train);
    info!("Training accuracy: {:.2}%", accuracy * 100.0);

    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    info!("Loading model from: {}", args.model.display());
    let serializable_model = SerializableModel::load_from_file(&args.model)?;
    let model = serializable_model.to_trained_model()?;

    let params = match serializable_model.metadata.hog_params {
        Some(params) => params,
        None => {
            warn!("Model does not record its HOG geometry, assuming the defaults");
            HogParams::default()
        }
    };
    let descriptor = HogDescriptor::new(params)?;

    let test = load_split(
        &args.test_dir,
        &descriptor,
        &SubstringLabel::default(),
        !args.sequential,
    )?;
    let evaluation = evaluate(&model, &test)?;

    if !args.quiet {
        serializable_model.print_summary();
        println!();
        evaluation.print();
    }

    if let Some(output) = &args.output {
        let comment = format!(
            "{} model {} on {}: accuracy {:.4}",
            evaluation.kind,
            args.model.display(),
            args.test_dir.display(),
            evaluation.accuracy()
        );
        write_result_table(&evaluation.table, output, &comment)?;
    }

    println!("Accuracy: {:.2}%", evaluation.accuracy() * 100.0);
    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading model from: {}", args.model.display());
    let serializable_model = SerializableModel::load_from_file(&args.model)?;

    serializable_model.print_summary();

    println!("\nSupport Vector Details:");
    println!("  Total: {}", serializable_model.support_vectors.len());

    let (positive, negative): (Vec<_>, Vec<_>) = serializable_model
        .support_vectors
        .iter()
        .partition(|sv| sv.label > 0.0);
    println!("  dog: {}, cat: {}", positive.len(), negative.len());

    println!("\nAlpha*Y values:");
    let alpha_y = &serializable_model.alpha_y;
    let n_show = alpha_y.len().min(10);
    for (i, &alpha_y_val) in alpha_y.iter().enumerate().take(n_show) {
        println!("  α{i}*y{i}: {alpha_y_val:.6}");
    }
    if alpha_y.len() > n_show {
        println!("  ... ({} more)", alpha_y.len() - n_show);
    }

    Ok(())
}

fn describe_command(args: DescribeArgs) -> Result<()> {
    let descriptor = HogDescriptor::new(args.hog.apply(HogParams::default()))?;
    let features = descriptor.extract(&args.image)?;
    let values = features.as_slice();

    let n = values.len().max(1) as f64;
    let mean = values.iter().sum::<f64>() / n;
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let nonzero = values.iter().filter(|&&v| v != 0.0).count();

    println!("Image: {}", args.image.display());
    println!("Descriptor length: {}", values.len());
    println!("Min: {min:.6}");
    println!("Max: {max:.6}");
    println!("Mean: {mean:.6}");
    println!("L2 norm: {:.6}", features.norm());
    println!("Nonzero: {nonzero}");

    if args.values {
        for (i, v) in values.iter().enumerate() {
            println!("{i} {v:.6}");
        }
    }

    Ok(())
}

fn show_command(args: ShowArgs) -> Result<()> {
    let table = read_result_table(&args.results)?;
    let report = ClassificationReport::from_labels(&table.actuals(), &table.predictions());

    print!("{table}");
    println!();
    println!(
        "Accuracy: {:.4} ({}/{})",
        table.accuracy(),
        table.n_correct(),
        table.len()
    );
    println!();
    print!("{report}");

    Ok(())
}
