//! Uniformly partitioned FFT convolution (overlap-save).
//!
//! The impulse response is cut into partitions of one render quantum `B`.
//! Each partition is zero-padded to `2B` and transformed once. Per block the
//! last `2B` input samples are transformed, pushed into a frequency-domain
//! delay line, multiplied against the partition spectra and summed; the last
//! `B` samples of the inverse transform are the linear convolution output.
//!
//! Latency is zero; cost per block is one forward FFT, one inverse FFT and
//! `P` complex multiply-adds of length `2B`.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Partitioned convolver for a fixed block size.
pub(crate) struct PartitionedConvolver {
    block: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    partitions: Vec<Vec<Complex<f32>>>,
    history: Vec<Vec<Complex<f32>>>,
    head: usize,
    window: Vec<f32>,
    work: Vec<Complex<f32>>,
    acc: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl PartitionedConvolver {
    /// Build a convolver for `impulse` processing `block` samples at a time.
    ///
    /// An empty impulse is treated as a single zero tap.
    pub fn new(impulse: &[f32], block: usize) -> Self {
        let size = block * 2;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());
        let mut scratch = vec![Complex::new(0.0, 0.0); scratch_len];

        let taps: &[f32] = if impulse.is_empty() { &[0.0] } else { impulse };
        let partitions: Vec<Vec<Complex<f32>>> = taps
            .chunks(block)
            .map(|chunk| {
                let mut spectrum = vec![Complex::new(0.0, 0.0); size];
                for (slot, &tap) in spectrum.iter_mut().zip(chunk) {
                    *slot = Complex::new(tap, 0.0);
                }
                fft.process_with_scratch(&mut spectrum, &mut scratch);
                spectrum
            })
            .collect();
        let count = partitions.len();

        Self {
            block,
            fft,
            ifft,
            partitions,
            history: vec![vec![Complex::new(0.0, 0.0); size]; count],
            head: 0,
            window: vec![0.0; size],
            work: vec![Complex::new(0.0, 0.0); size],
            acc: vec![Complex::new(0.0, 0.0); size],
            scratch,
        }
    }

    /// Number of partitions.
    #[cfg(test)]
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Convolve one block. `input` and `output` must be `block` long.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        let b = self.block;
        let size = 2 * b;

        // slide the input window: [previous block, current block]
        self.window.copy_within(b..size, 0);
        self.window[b..].copy_from_slice(&input[..b]);

        for (slot, &x) in self.work.iter_mut().zip(&self.window) {
            *slot = Complex::new(x, 0.0);
        }
        self.fft.process_with_scratch(&mut self.work, &mut self.scratch);
        self.history[self.head].copy_from_slice(&self.work);

        let count = self.partitions.len();
        self.acc.fill(Complex::new(0.0, 0.0));
        for (k, partition) in self.partitions.iter().enumerate() {
            let spectrum = &self.history[(self.head + count - k) % count];
            for ((acc, x), h) in self.acc.iter_mut().zip(spectrum).zip(partition) {
                *acc += x * h;
            }
        }
        self.ifft.process_with_scratch(&mut self.acc, &mut self.scratch);

        let norm = 1.0 / size as f32;
        for (out, y) in output[..b].iter_mut().zip(&self.acc[b..]) {
            *out = y.re * norm;
        }
        self.head = (self.head + 1) % count;
    }
}

impl std::fmt::Debug for PartitionedConvolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionedConvolver")
            .field("block", &self.block)
            .field("partitions", &self.partitions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(signal: &[f32], impulse: &[f32]) -> Vec<f32> {
        (0..signal.len())
            .map(|n| {
                impulse
                    .iter()
                    .enumerate()
                    .filter(|(k, _)| *k <= n)
                    .map(|(k, h)| h * signal[n - k])
                    .sum()
            })
            .collect()
    }

    #[test]
    fn matches_direct_convolution() {
        let block = 16;
        let impulse: Vec<f32> = (0..40).map(|i| ((i * 7 % 11) as f32 - 5.0) / 10.0).collect();
        let signal: Vec<f32> = (0..128).map(|i| ((i * 13 % 17) as f32 - 8.0) / 8.0).collect();

        let mut conv = PartitionedConvolver::new(&impulse, block);
        assert_eq!(conv.partition_count(), 3);
        let mut out = vec![0.0; signal.len()];
        for (inp, outp) in signal.chunks(block).zip(out.chunks_mut(block)) {
            conv.process(inp, outp);
        }

        let expected = direct(&signal, &impulse);
        for (a, b) in out.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn unit_impulse_is_identity() {
        let mut conv = PartitionedConvolver::new(&[1.0], 8);
        let input = [0.5, -0.25, 1.0, 0.0, 0.0, 0.3, 0.0, -1.0];
        let mut out = [0.0; 8];
        conv.process(&input, &mut out);
        for (a, b) in out.iter().zip(&input) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
