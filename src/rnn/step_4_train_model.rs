// External imports
use anyhow::Result;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::{backend::Backend, Tensor};
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use rand::rngs::StdRng;
use rand::SeedableRng;

// Internal imports
use super::step_1_sequence_preparation::TrainingExample;
use super::step_2_batch_collation::{shuffled_batches, PaddedBatch};
use super::step_3_rnn_model_arch::CoordRnn;
use crate::constants;
use crate::error::PipelineError;

pub type TrainBackend = Autodiff<NdArray<f32>>;

/// Configuration for training the model
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub batch_size: usize,
    pub epochs: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: constants::LEARNING_RATE,
            batch_size: constants::BATCH_SIZE,
            epochs: constants::EPOCHS,
            hidden_size: constants::HIDDEN_SIZE,
            num_layers: constants::NUM_LAYERS,
            seed: constants::SEED,
        }
    }
}

/// Mean squared error over all coordinates in the batch.
pub fn mse_loss<B: Backend>(predictions: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let diff = predictions - targets;
    (diff.clone() * diff).mean()
}

/// Trains the bidirectional RNN for a fixed number of epochs and returns the
/// trained model together with the per-epoch mean loss curve.
///
/// Batches are re-shuffled every epoch from a seeded RNG, so a run is
/// deterministic end-to-end for a fixed seed and input. The loss accumulator
/// is reset at the start of every epoch; each curve entry is the mean batch
/// loss of that epoch alone.
pub fn train_model(
    examples: &[TrainingExample],
    config: &TrainingConfig,
    device: &<TrainBackend as Backend>::Device,
) -> Result<(CoordRnn<TrainBackend>, Vec<f64>)> {
    if examples.is_empty() {
        return Err(PipelineError::EmptyTrainingSet.into());
    }

    TrainBackend::seed(config.seed);
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut model = CoordRnn::<TrainBackend>::new(
        constants::COORD_DIM,
        config.hidden_size,
        constants::COORD_DIM,
        config.num_layers,
        device,
    );
    let mut optimizer = AdamConfig::new().init();

    let mut loss_history = Vec::with_capacity(config.epochs);
    for epoch in 1..=config.epochs {
        let batches: Vec<PaddedBatch<TrainBackend>> =
            shuffled_batches(examples, config.batch_size, &mut rng, device);
        let num_batches = batches.len();

        let mut epoch_loss = 0.0;
        for batch in batches {
            let PaddedBatch {
                histories,
                targets,
                lengths,
            } = batch;

            let predictions = model.forward(histories, &lengths);
            let loss_tensor = mse_loss(predictions, targets);
            epoch_loss += loss_tensor.clone().into_scalar() as f64;

            let grads = loss_tensor.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);
        }

        let avg_loss = epoch_loss / num_batches as f64;
        println!("Epoch {}, train loss: {}", epoch, avg_loss);
        loss_history.push(avg_loss);
    }

    Ok((model, loss_history))
}
