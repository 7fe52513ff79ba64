// External crates
use burn::tensor::{backend::Backend, Shape, Tensor};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

// Internal modules
use super::step_1_sequence_preparation::TrainingExample;
use crate::constants::COORD_DIM;

/// A rectangular batch of padded histories plus the true length of each row.
///
/// Histories are zero-filled after each row's real data (never before), and
/// `lengths` is recorded prior to padding so the model can mask the padded
/// steps out of the recurrence. Targets are single coordinates; widening them
/// to padded target sequences only requires changing [`collate_batch`].
#[derive(Debug, Clone)]
pub struct PaddedBatch<B: Backend> {
    pub histories: Tensor<B, 3>,
    pub targets: Tensor<B, 2>,
    pub lengths: Vec<usize>,
}

/// Collates a list of examples into one padded batch.
///
/// Every history is padded to the maximum history length present in this
/// batch; batches carry no cross-batch state.
pub fn collate_batch<B: Backend>(
    examples: &[TrainingExample],
    device: &B::Device,
) -> PaddedBatch<B> {
    let batch = examples.len();
    let max_len = examples
        .iter()
        .map(|e| e.history.len())
        .max()
        .unwrap_or(0)
        .max(1);

    let mut history_data = vec![0f32; batch * max_len * COORD_DIM];
    let mut target_data = vec![0f32; batch * COORD_DIM];
    let mut lengths = Vec::with_capacity(batch);

    for (i, example) in examples.iter().enumerate() {
        for (j, point) in example.history.iter().enumerate() {
            let offset = (i * max_len + j) * COORD_DIM;
            history_data[offset] = point[0];
            history_data[offset + 1] = point[1];
        }
        target_data[i * COORD_DIM] = example.target[0];
        target_data[i * COORD_DIM + 1] = example.target[1];
        lengths.push(example.history.len());
    }

    let histories = Tensor::<B, 1>::from_floats(history_data.as_slice(), device)
        .reshape(Shape::new([batch, max_len, COORD_DIM]));
    let targets = Tensor::<B, 1>::from_floats(target_data.as_slice(), device)
        .reshape(Shape::new([batch, COORD_DIM]));

    PaddedBatch {
        histories,
        targets,
        lengths,
    }
}

/// Shuffles the examples with the supplied RNG and cuts them into padded
/// batches of at most `batch_size` rows.
pub fn shuffled_batches<B: Backend>(
    examples: &[TrainingExample],
    batch_size: usize,
    rng: &mut StdRng,
    device: &B::Device,
) -> Vec<PaddedBatch<B>> {
    let mut order: Vec<usize> = (0..examples.len()).collect();
    order.shuffle(rng);

    order
        .chunks(batch_size.max(1))
        .map(|chunk| {
            let batch: Vec<TrainingExample> =
                chunk.iter().map(|&i| examples[i].clone()).collect();
            collate_batch(&batch, device)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::{NdArray, NdArrayDevice};
    use rand::SeedableRng;

    fn example(uid: i64, history: Vec<[f32; 2]>, target: [f32; 2]) -> TrainingExample {
        TrainingExample {
            uid,
            day: 1,
            history,
            target,
        }
    }

    #[test]
    fn test_collate_pads_after_real_data() {
        let device = NdArrayDevice::default();
        let examples = vec![
            example(1, vec![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]], [7.0, 8.0]),
            example(2, vec![[9.0, 10.0]], [11.0, 12.0]),
        ];

        let batch = collate_batch::<NdArray>(&examples, &device);
        assert_eq!(batch.histories.dims(), [2, 3, 2]);
        assert_eq!(batch.targets.dims(), [2, 2]);
        assert_eq!(batch.lengths, vec![3, 1]);

        let data = batch.histories.to_data().convert::<f32>();
        let values = data.as_slice::<f32>().unwrap();

        // Row 0: full sequence, no padding
        assert_eq!(values[0..6], [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        // Row 1: one real point, then zero padding
        assert_eq!(values[6..8], [9.0, 10.0]);
        assert_eq!(values[8..12], [0.0, 0.0, 0.0, 0.0]);

        let target_data = batch.targets.to_data().convert::<f32>();
        let targets = target_data.as_slice::<f32>().unwrap();
        assert_eq!(targets, [7.0, 8.0, 11.0, 12.0]);
    }

    #[test]
    fn test_lengths_never_exceed_max_len() {
        let device = NdArrayDevice::default();
        let examples = vec![
            example(1, vec![[0.0, 0.0]; 4], [0.0, 0.0]),
            example(2, vec![[0.0, 0.0]; 2], [0.0, 0.0]),
            example(3, vec![[0.0, 0.0]; 7], [0.0, 0.0]),
        ];

        let batch = collate_batch::<NdArray>(&examples, &device);
        let max_len = batch.histories.dims()[1];
        assert!(batch.lengths.iter().all(|&len| len <= max_len));
    }

    #[test]
    fn test_shuffled_batches_cover_all_examples() {
        let device = NdArrayDevice::default();
        let examples: Vec<TrainingExample> = (0..10)
            .map(|i| example(i, vec![[i as f32, 0.0], [0.0, i as f32]], [1.0, 1.0]))
            .collect();

        let mut rng = StdRng::seed_from_u64(4020);
        let batches = shuffled_batches::<NdArray>(&examples, 4, &mut rng, &device);
        assert_eq!(batches.len(), 3);

        let total_rows: usize = batches.iter().map(|b| b.lengths.len()).sum();
        assert_eq!(total_rows, examples.len());
    }

    #[test]
    fn test_shuffle_is_deterministic_for_fixed_seed() {
        let device = NdArrayDevice::default();
        let examples: Vec<TrainingExample> = (0..20)
            .map(|i| example(i, vec![[i as f32, 0.0]], [0.0, 0.0]))
            .collect();

        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let batches_a = shuffled_batches::<NdArray>(&examples, 8, &mut rng_a, &device);
        let batches_b = shuffled_batches::<NdArray>(&examples, 8, &mut rng_b, &device);

        for (a, b) in batches_a.iter().zip(batches_b.iter()) {
            assert_eq!(a.lengths, b.lengths);
            let data_a = a.histories.to_data().convert::<f32>();
            let data_b = b.histories.to_data().convert::<f32>();
            assert_eq!(
                data_a.as_slice::<f32>().unwrap(),
                data_b.as_slice::<f32>().unwrap()
            );
        }
    }
}
