//! Sample conversion: down-mix, resample and accumulate

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::{error, info};

/// Resampler block size in output frames (0.1 seconds at 16kHz)
pub(crate) const CHUNK_SIZE: usize = 1600;

/// Average interleaved frames down to mono
pub(crate) fn downmix(data: &[i16], channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

pub(crate) fn f32_to_i16(data: &[f32]) -> Vec<i16> {
    data.iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect()
}

/// Mono accumulator that resamples to the target rate as blocks fill up
pub(crate) struct SampleAccumulator {
    source_rate: u32,
    resampler: Option<SincFixedIn<f32>>,
    input_chunk_size: usize,
    pending: Vec<i16>,
    output: Vec<i16>,
}

impl SampleAccumulator {
    /// Accumulator converting `source_rate` to `target_rate`
    ///
    /// If no resampler can be built the samples are kept at the source rate.
    pub(crate) fn new(source_rate: u32, target_rate: u32) -> Self {
        if source_rate == target_rate {
            return Self::passthrough(source_rate);
        }

        info!("Creating resampler: {} Hz -> {} Hz", source_rate, target_rate);
        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };
        let input_frames =
            (CHUNK_SIZE as f64 * source_rate as f64 / target_rate as f64).ceil() as usize;
        match SincFixedIn::<f32>::new(
            target_rate as f64 / source_rate as f64,
            2.0,
            params,
            input_frames,
            1, // mono
        ) {
            Ok(resampler) => Self {
                source_rate,
                resampler: Some(resampler),
                input_chunk_size: input_frames,
                pending: Vec::with_capacity(input_frames * 2),
                output: Vec::new(),
            },
            Err(e) => {
                error!("Failed to create resampler: {}", e);
                Self::passthrough(source_rate)
            }
        }
    }

    fn passthrough(source_rate: u32) -> Self {
        Self {
            source_rate,
            resampler: None,
            input_chunk_size: CHUNK_SIZE,
            pending: Vec::new(),
            output: Vec::new(),
        }
    }

    /// Whether samples come out at the requested rate
    pub(crate) fn resamples(&self) -> bool {
        self.resampler.is_some()
    }

    pub(crate) fn source_rate(&self) -> u32 {
        self.source_rate
    }

    /// Add mono samples
    pub(crate) fn push(&mut self, mono: &[i16]) {
        let Some(resampler) = self.resampler.as_mut() else {
            self.output.extend_from_slice(mono);
            return;
        };

        self.pending.extend_from_slice(mono);
        while self.pending.len() >= self.input_chunk_size {
            let block: Vec<f32> = self
                .pending
                .drain(..self.input_chunk_size)
                .map(|s| s as f32 / 32768.0)
                .collect();
            match resampler.process(&[block], None) {
                Ok(resampled) => self.output.extend(f32_to_i16(&resampled[0])),
                Err(e) => error!("Resampling error: {}", e),
            }
        }
    }

    /// Flush the partial block (zero-padded) and take everything collected
    pub(crate) fn finish(&mut self) -> Vec<i16> {
        if self.resampler.is_some() && !self.pending.is_empty() {
            let tail = self.pending.len();
            let ratio = CHUNK_SIZE as f64 / self.input_chunk_size as f64;
            let keep = self.output.len() + (tail as f64 * ratio).round() as usize;
            let padding = vec![0i16; self.input_chunk_size - tail];
            self.push(&padding);
            self.output.truncate(keep);
        }
        self.pending.clear();
        std::mem::take(&mut self.output)
    }
}
