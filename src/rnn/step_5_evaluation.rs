// External imports
use anyhow::{anyhow, Result};
use burn::tensor::backend::Backend;

// Internal imports
use super::step_1_sequence_preparation::TrainingExample;
use super::step_2_batch_collation::collate_batch;
use super::step_3_rnn_model_arch::CoordRnn;
use super::step_4_train_model::mse_loss;
use crate::constants::COORD_DIM;
use crate::error::PipelineError;

/// Results of running the trained model over a held-out split.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub mean_loss: f64,
    pub actual: Vec<[f32; 2]>,
    pub predicted: Vec<[f32; 2]>,
    pub l2_distances: Vec<f64>,
}

/// Euclidean distance between a predicted and an actual coordinate pair.
pub fn l2_distance(pred: [f32; 2], actual: [f32; 2]) -> f64 {
    let dx = (pred[0] - actual[0]) as f64;
    let dy = (pred[1] - actual[1]) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Runs the model in inference mode over the validation examples.
///
/// Collects every (actual, predicted) coordinate pair, the per-example L2
/// distance and the mean MSE loss across batches. The model is only read;
/// no parameter is updated.
pub fn evaluate_model<B: Backend>(
    model: &CoordRnn<B>,
    examples: &[TrainingExample],
    batch_size: usize,
    device: &B::Device,
) -> Result<EvaluationReport> {
    if examples.is_empty() {
        return Err(PipelineError::EmptyValidationSet.into());
    }

    let mut total_loss = 0.0;
    let mut num_batches = 0usize;
    let mut actual = Vec::with_capacity(examples.len());
    let mut predicted = Vec::with_capacity(examples.len());

    for chunk in examples.chunks(batch_size.max(1)) {
        let batch = collate_batch::<B>(chunk, device);
        let predictions = model.forward(batch.histories, &batch.lengths);

        let loss = mse_loss(predictions.clone(), batch.targets);
        let loss_data = loss.to_data().convert::<f32>();
        let loss_value = loss_data
            .as_slice::<f32>()
            .map_err(|e| anyhow!("failed to read loss tensor: {:?}", e))?[0];
        total_loss += loss_value as f64;
        num_batches += 1;

        let prediction_data = predictions.to_data().convert::<f32>();
        let prediction_values = prediction_data
            .as_slice::<f32>()
            .map_err(|e| anyhow!("failed to read prediction tensor: {:?}", e))?;
        for (row, example) in prediction_values.chunks(COORD_DIM).zip(chunk) {
            predicted.push([row[0], row[1]]);
            actual.push(example.target);
        }
    }

    let l2_distances = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| l2_distance(*p, *a))
        .collect();

    Ok(EvaluationReport {
        mean_loss: total_loss / num_batches as f64,
        actual,
        predicted,
        l2_distances,
    })
}
