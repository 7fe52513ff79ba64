// External crates
use anyhow::Result;
use burn::module::AutodiffModule;
use burn::tensor::backend::Backend;
use clap::{Parser, ValueHint};
use std::path::PathBuf;

// Local modules
use trajcast::constants;
use trajcast::error::PipelineError;
use trajcast::rnn::step_1_sequence_preparation::build_examples;
use trajcast::rnn::step_4_train_model::{train_model, TrainBackend, TrainingConfig};
use trajcast::rnn::step_5_evaluation::evaluate_model;
use trajcast::util::{plotting, pre_processor};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Next-location prediction for mobility traces",
    long_about = None
)]
struct Cli {
    /// Input trajectory CSV with columns uid, d, t, x, y
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Directory the rendered plots are written to
    #[arg(short, long, default_value = "/output", value_hint = ValueHint::DirPath)]
    output: PathBuf,

    /// Highest user id to keep
    #[arg(long, default_value_t = constants::UID_CAP)]
    uid_cap: i64,

    /// Last day index included in the training split
    #[arg(long, default_value_t = constants::TRAIN_MAX_DAY)]
    train_max_day: i64,

    /// First day index included in the validation split
    #[arg(long, default_value_t = constants::VAL_MIN_DAY)]
    val_min_day: i64,

    /// Last day index included in the validation split
    #[arg(long, default_value_t = constants::VAL_MAX_DAY)]
    val_max_day: i64,

    /// Number of training epochs
    #[arg(long, default_value_t = constants::EPOCHS)]
    epochs: usize,

    /// Hidden width of each recurrent direction
    #[arg(long, default_value_t = constants::HIDDEN_SIZE)]
    hidden_size: usize,

    /// Number of stacked bidirectional layers
    #[arg(long, default_value_t = constants::NUM_LAYERS)]
    num_layers: usize,

    /// Batch size
    #[arg(long, default_value_t = constants::BATCH_SIZE)]
    batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = constants::LEARNING_RATE)]
    learning_rate: f64,

    /// Random seed for parameter init and batch shuffling
    #[arg(long, default_value_t = constants::SEED)]
    seed: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !cli.output.is_dir() {
        return Err(PipelineError::OutputPathInvalid(cli.output).into());
    }

    let device = <TrainBackend as Backend>::Device::default();
    println!("Using device: {:?}", device);

    let df = pre_processor::load_trajectories(&cli.input)?;

    let train_examples = build_examples(&df, i64::MIN..=cli.train_max_day, cli.uid_cap)?;
    let val_examples = build_examples(&df, cli.val_min_day..=cli.val_max_day, cli.uid_cap)?;
    println!("Training examples: {}", train_examples.len());
    println!("Validation examples: {}", val_examples.len());

    let config = TrainingConfig {
        learning_rate: cli.learning_rate,
        batch_size: cli.batch_size,
        epochs: cli.epochs,
        hidden_size: cli.hidden_size,
        num_layers: cli.num_layers,
        seed: cli.seed,
    };
    let (model, loss_history) = train_model(&train_examples, &config, &device)?;

    let prefix = pre_processor::input_prefix(&cli.input);
    let loss_path = cli.output.join(format!("{}_trainingloss.png", prefix));
    plotting::plot_training_loss(&loss_history, &prefix, &loss_path)?;

    let report = evaluate_model(&model.valid(), &val_examples, cli.batch_size, &device)?;
    println!("Validation Loss: {:.4}\n", report.mean_loss);

    let histogram_path = cli.output.join(format!("{}_L2dist.png", prefix));
    plotting::plot_l2_histogram(&report.l2_distances, constants::HISTOGRAM_BINS, &histogram_path)?;

    let scatter_path = cli.output.join(format!("{}_scatterplot.png", prefix));
    plotting::plot_scatter_panels(&report, &scatter_path)?;
    println!("Plot saved to {}", scatter_path.display());

    Ok(())
}
