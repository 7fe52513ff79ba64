// External imports
use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::{activation, backend::Backend, Shape, Tensor};

use crate::constants::COORD_DIM;

/// Single-direction Elman recurrence: h_t = tanh(W_ih x_t + W_hh h_{t-1}).
#[derive(Module, Debug)]
pub struct RnnCell<B: Backend> {
    input: Linear<B>,
    hidden: Linear<B>,
    hidden_size: usize,
}

impl<B: Backend> RnnCell<B> {
    pub fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            input: LinearConfig::new(input_size, hidden_size).init(device),
            hidden: LinearConfig::new(hidden_size, hidden_size).init(device),
            hidden_size,
        }
    }

    pub fn step(&self, x_t: Tensor<B, 2>, h: Tensor<B, 2>) -> Tensor<B, 2> {
        activation::tanh(self.input.forward(x_t) + self.hidden.forward(h))
    }
}

/// One bidirectional recurrent layer.
///
/// Both directions run over the padded sequence with an explicit step mask,
/// so padded positions leave the hidden state untouched. The mechanism only
/// depends on per-row true lengths and tolerates batches in any length order.
#[derive(Module, Debug)]
pub struct BiRnnLayer<B: Backend> {
    forward_cell: RnnCell<B>,
    backward_cell: RnnCell<B>,
    hidden_size: usize,
}

impl<B: Backend> BiRnnLayer<B> {
    pub fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            forward_cell: RnnCell::new(input_size, hidden_size, device),
            backward_cell: RnnCell::new(input_size, hidden_size, device),
            hidden_size,
        }
    }

    /// Runs both directions over `x` of shape [batch, seq_len, input_size].
    ///
    /// `mask` is [batch, seq_len] holding 1.0 at real steps and 0.0 at padded
    /// steps. Returns `(outputs, last_forward, first_backward)` where
    /// `outputs` is [batch, seq_len, 2 * hidden], `last_forward` is the
    /// forward hidden state at each row's final real step and
    /// `first_backward` is the backward hidden state at step 0.
    pub fn forward(
        &self,
        x: Tensor<B, 3>,
        mask: &Tensor<B, 2>,
    ) -> (Tensor<B, 3>, Tensor<B, 2>, Tensor<B, 2>) {
        let device = x.device();
        let [batch, seq_len, input_size] = x.dims();

        let mut h_forward = Tensor::zeros([batch, self.hidden_size], &device);
        let mut h_backward = Tensor::zeros([batch, self.hidden_size], &device);
        let mut out_forward = Tensor::zeros([batch, seq_len, self.hidden_size], &device);
        let mut out_backward = Tensor::zeros([batch, seq_len, self.hidden_size], &device);

        for t in 0..seq_len {
            let x_t = x.clone().narrow(1, t, 1).reshape([batch, input_size]);
            let m_t = mask
                .clone()
                .narrow(1, t, 1)
                .repeat_dim(1, self.hidden_size);
            let keep = Tensor::ones_like(&m_t) - m_t.clone();

            let candidate = self.forward_cell.step(x_t, h_forward.clone());
            h_forward = candidate * m_t + h_forward * keep;
            out_forward = out_forward.slice_assign(
                [0..batch, t..t + 1, 0..self.hidden_size],
                h_forward.clone().reshape([batch, 1, self.hidden_size]),
            );
        }

        for t in (0..seq_len).rev() {
            let x_t = x.clone().narrow(1, t, 1).reshape([batch, input_size]);
            let m_t = mask
                .clone()
                .narrow(1, t, 1)
                .repeat_dim(1, self.hidden_size);
            let keep = Tensor::ones_like(&m_t) - m_t.clone();

            let candidate = self.backward_cell.step(x_t, h_backward.clone());
            h_backward = candidate * m_t + h_backward * keep;
            out_backward = out_backward.slice_assign(
                [0..batch, t..t + 1, 0..self.hidden_size],
                h_backward.clone().reshape([batch, 1, self.hidden_size]),
            );
        }

        let outputs = Tensor::cat(vec![out_forward, out_backward], 2);
        (outputs, h_forward, h_backward)
    }
}

/// Bidirectional recurrent model mapping a padded, length-annotated
/// coordinate sequence to a predicted next coordinate.
///
/// The final forward and backward hidden states of the last layer are
/// concatenated and passed through a single affine projection. No activation
/// follows the projection, so the output is an unconstrained coordinate pair.
#[derive(Module, Debug)]
pub struct CoordRnn<B: Backend> {
    layers: Vec<BiRnnLayer<B>>,
    output: Linear<B>,
    input_size: usize,
    hidden_size: usize,
    output_size: usize,
}

impl<B: Backend> CoordRnn<B> {
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        num_layers: usize,
        device: &B::Device,
    ) -> Self {
        let num_layers = num_layers.max(1);
        let mut layers = Vec::with_capacity(num_layers);
        let mut layer_input = input_size;
        for _ in 0..num_layers {
            layers.push(BiRnnLayer::new(layer_input, hidden_size, device));
            layer_input = 2 * hidden_size;
        }

        Self {
            layers,
            output: LinearConfig::new(2 * hidden_size, output_size).init(device),
            input_size,
            hidden_size,
            output_size,
        }
    }

    /// A small single-layer model with hidden width 4.
    pub fn with_defaults(device: &B::Device) -> Self {
        Self::new(COORD_DIM, 4, COORD_DIM, 1, device)
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn build_mask(lengths: &[usize], seq_len: usize, device: &B::Device) -> Tensor<B, 2> {
        let batch = lengths.len();
        let mut data = vec![0f32; batch * seq_len];
        for (i, &len) in lengths.iter().enumerate() {
            for t in 0..len.min(seq_len) {
                data[i * seq_len + t] = 1.0;
            }
        }
        Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape(Shape::new([batch, seq_len]))
    }

    /// Forward pass over a padded batch of shape [batch, max_len, 2].
    ///
    /// The hidden state starts at zero on every call; `lengths` carries the
    /// true length of each row so padding never enters the recurrence.
    /// Output shape is [batch, 2] regardless of batch size or max_len.
    pub fn forward(&self, x: Tensor<B, 3>, lengths: &[usize]) -> Tensor<B, 2> {
        let device = x.device();
        let [batch, seq_len, _] = x.dims();
        let mask = Self::build_mask(lengths, seq_len, &device);

        let mut sequence = x;
        let mut h_forward = Tensor::zeros([batch, self.hidden_size], &device);
        let mut h_backward = Tensor::zeros([batch, self.hidden_size], &device);
        for layer in &self.layers {
            let (outputs, forward, backward) = layer.forward(sequence, &mask);
            sequence = outputs;
            h_forward = forward;
            h_backward = backward;
        }

        let last_states = Tensor::cat(vec![h_forward, h_backward], 1);
        self.output.forward(last_states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::{NdArray, NdArrayDevice};

    #[test]
    fn test_model_creation() {
        let device = NdArrayDevice::default();
        let model: CoordRnn<NdArray> = CoordRnn::new(2, 8, 2, 1, &device);

        assert_eq!(model.input_size(), 2);
        assert_eq!(model.hidden_size(), 8);
        // Projection maps concatenated directions to the coordinate dim
        assert_eq!(model.output.weight.dims(), [16, 2]);
    }

    #[test]
    fn test_forward_output_shape() {
        let device = NdArrayDevice::default();
        let model: CoordRnn<NdArray> = CoordRnn::with_defaults(&device);

        for (batch, seq_len) in [(1usize, 1usize), (3, 5), (7, 12)] {
            let x = Tensor::<NdArray, 3>::ones([batch, seq_len, 2], &device);
            let lengths = vec![seq_len; batch];
            let output = model.forward(x, &lengths);
            assert_eq!(output.dims(), [batch, 2]);
        }
    }

    #[test]
    fn test_stacked_layers_output_shape() {
        let device = NdArrayDevice::default();
        let model: CoordRnn<NdArray> = CoordRnn::new(2, 4, 2, 3, &device);

        let x = Tensor::<NdArray, 3>::ones([2, 6, 2], &device);
        let output = model.forward(x, &[6, 4]);
        assert_eq!(output.dims(), [2, 2]);
    }

    #[test]
    fn test_padding_does_not_change_predictions() {
        let device = NdArrayDevice::default();
        let model: CoordRnn<NdArray> = CoordRnn::with_defaults(&device);

        // The same 3-step sequence, once in a batch alone and once padded to
        // length 6 next to a longer row. Row 0 must predict identically.
        let points = [[0.5f32, -0.25], [1.0, 0.75], [-0.5, 0.25]];

        let mut alone = vec![0f32; 3 * 2];
        for (j, p) in points.iter().enumerate() {
            alone[j * 2] = p[0];
            alone[j * 2 + 1] = p[1];
        }
        let x_alone = Tensor::<NdArray, 1>::from_floats(alone.as_slice(), &device)
            .reshape([1usize, 3, 2]);
        let prediction_alone = model.forward(x_alone, &[3]);

        let mut padded = vec![0f32; 2 * 6 * 2];
        for (j, p) in points.iter().enumerate() {
            padded[j * 2] = p[0];
            padded[j * 2 + 1] = p[1];
        }
        for j in 0..6 {
            padded[(6 + j) * 2] = 0.1 * j as f32;
            padded[(6 + j) * 2 + 1] = -0.1 * j as f32;
        }
        let x_padded = Tensor::<NdArray, 1>::from_floats(padded.as_slice(), &device)
            .reshape([2usize, 6, 2]);
        // Shorter row first: the mask must not rely on length-sorted batches
        let prediction_padded = model.forward(x_padded, &[3, 6]);

        let alone_data = prediction_alone.to_data().convert::<f32>();
        let alone_values = alone_data.as_slice::<f32>().unwrap();
        let padded_data = prediction_padded.to_data().convert::<f32>();
        let padded_values = padded_data.as_slice::<f32>().unwrap();

        for k in 0..2 {
            assert!(
                (alone_values[k] - padded_values[k]).abs() < 1e-5,
                "row 0 prediction changed with padding: {} vs {}",
                alone_values[k],
                padded_values[k]
            );
        }
    }

    #[test]
    fn test_zero_length_rows_stay_at_projection_of_zero_state() {
        let device = NdArrayDevice::default();
        let model: CoordRnn<NdArray> = CoordRnn::with_defaults(&device);

        // A fully masked row must be equivalent to projecting the zero
        // hidden state, whatever values sit in the padded positions.
        let x_a = Tensor::<NdArray, 3>::ones([1, 4, 2], &device);
        let x_b = Tensor::<NdArray, 3>::zeros([1, 4, 2], &device);
        let out_a = model.forward(x_a, &[0]);
        let out_b = model.forward(x_b, &[0]);

        let a = out_a.to_data().convert::<f32>();
        let b = out_b.to_data().convert::<f32>();
        assert_eq!(a.as_slice::<f32>().unwrap(), b.as_slice::<f32>().unwrap());
    }
}
