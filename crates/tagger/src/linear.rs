#![forbid(unsafe_code)]

/// Dense layer: out = W * in + b
#[derive(Clone, Debug, PartialEq)]
pub struct Linear {
    in_dim: usize,
    out_dim: usize,
    // row-major, out_dim x in_dim
    weights: Vec<f32>,
    bias: Vec<f32>,
}

impl Linear {
    /// Build from a buffer holding the weights followed by the bias.
    ///
    /// Returns `None` unless `raw` holds exactly `out_dim * in_dim + out_dim`
    /// values and `in_dim` is positive.
    pub fn from_raw(in_dim: usize, out_dim: usize, raw: &[f32]) -> Option<Self> {
        let expected = out_dim.checked_mul(in_dim)?;
        if in_dim == 0 || raw.len() != expected.checked_add(out_dim)? {
            return None;
        }
        let (weights, bias) = raw.split_at(expected);
        Some(Self {
            in_dim,
            out_dim,
            weights: weights.to_vec(),
            bias: bias.to_vec(),
        })
    }

    /// Input width.
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    /// Output width.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Forward pass for a single input vector. Missing input values count as 0.
    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        self.weights
            .chunks_exact(self.in_dim)
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + b)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_applies_weights_and_bias() {
        // rows: [1 2], [0 -1]; bias [0.5, 1]
        let lin = Linear::from_raw(2, 2, &[1.0, 2.0, 0.0, -1.0, 0.5, 1.0]).unwrap();
        assert_eq!(lin.forward(&[3.0, 4.0]), vec![11.5, -3.0]);
        assert_eq!(lin.out_dim(), 2);
    }

    #[test]
    fn wrong_buffer_size_is_rejected() {
        assert!(Linear::from_raw(2, 2, &[1.0; 5]).is_none());
        assert!(Linear::from_raw(0, 2, &[0.0; 2]).is_none());
    }
}
