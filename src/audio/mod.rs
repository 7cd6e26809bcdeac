//! Microphone capture using cpal
//!
//! Recording is two-phase: [`AudioSource::begin_capture`] opens the default
//! input device and returns a handle; [`CaptureHandle::finish`] stops the
//! stream and yields the clip as a 16 kHz mono WAV. The cpal stream lives on
//! a dedicated thread and is dropped whenever the handle is finished,
//! cancelled or dropped, so the device is never left open.

mod resampler;
mod types;

pub(crate) use types::{AudioSource, CaptureError, CaptureHandle, CapturedAudio};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use resampler::{downmix, f32_to_i16, SampleAccumulator};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};
use types::WAV_MIME;

/// Sample rate of recorded clips
pub(crate) const TARGET_SAMPLE_RATE: u32 = 16000;

/// Samples collected by the capture thread
struct Recording {
    samples: Vec<i16>,
    sample_rate: u32,
}

/// The system default microphone
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct MicrophoneSource;

impl AudioSource for MicrophoneSource {
    /// Open the device on a capture thread and wait until the stream runs
    fn begin_capture(&self) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        let is_capturing = Arc::new(AtomicBool::new(true));
        let is_capturing_clone = is_capturing.clone();
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread_handle = thread::spawn(move || {
            run_capture(is_capturing_clone, ready_tx, TARGET_SAMPLE_RATE)
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(MicrophoneCapture {
                is_capturing,
                thread_handle: Some(thread_handle),
            })),
            Ok(Err(e)) => {
                let _ = thread_handle.join();
                Err(e)
            }
            Err(_) => {
                // Thread ended without reporting; surface its error if any
                match thread_handle.join() {
                    Ok(Err(e)) => Err(e),
                    _ => Err(CaptureError::ThreadExited),
                }
            }
        }
    }
}

/// Handle to a running microphone capture
struct MicrophoneCapture {
    is_capturing: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<Result<Recording, CaptureError>>>,
}

impl MicrophoneCapture {
    fn stop(&mut self) -> Option<Result<Recording, CaptureError>> {
        self.is_capturing.store(false, Ordering::SeqCst);
        let handle = self.thread_handle.take()?;
        let result = handle.join().unwrap_or(Err(CaptureError::ThreadExited));
        info!("Audio capture stopped");
        Some(result)
    }
}

impl CaptureHandle for MicrophoneCapture {
    fn finish(mut self: Box<Self>) -> Result<CapturedAudio, CaptureError> {
        let recording = self.stop().unwrap_or(Err(CaptureError::ThreadExited))?;
        info!(
            samples = recording.samples.len(),
            sample_rate = recording.sample_rate,
            "Encoding captured audio"
        );
        let bytes = encode_wav(&recording.samples, recording.sample_rate)?;
        Ok(CapturedAudio::new(bytes, WAV_MIME))
    }

    fn cancel(mut self: Box<Self>) {
        if let Some(Err(e)) = self.stop() {
            warn!("Capture ended with error while cancelling: {}", e);
        }
    }
}

impl Drop for MicrophoneCapture {
    fn drop(&mut self) {
        // No-op after finish/cancel, otherwise releases the device
        let _ = self.stop();
    }
}

/// Encode mono 16-bit samples as a WAV file in memory
pub(crate) fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, CaptureError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Run audio capture on the current thread until the flag is cleared
fn run_capture(
    is_capturing: Arc<AtomicBool>,
    ready_tx: mpsc::Sender<Result<(), CaptureError>>,
    target_sample_rate: u32,
) -> Result<Recording, CaptureError> {
    let (stream, accumulator) = match open_stream(&is_capturing, target_sample_rate) {
        Ok(opened) => opened,
        Err(e) => {
            error!("Audio capture error: {}", e);
            let _ = ready_tx.send(Err(e));
            return Err(CaptureError::ThreadExited);
        }
    };
    let _ = ready_tx.send(Ok(()));
    info!("Audio capture started");

    // Keep the stream alive until capture is stopped
    while is_capturing.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(50));
    }
    drop(stream);

    let mut accumulator = accumulator
        .lock()
        .map_err(|_| CaptureError::ThreadExited)?;
    let sample_rate = if accumulator.resamples() {
        target_sample_rate
    } else {
        accumulator.source_rate()
    };
    Ok(Recording {
        samples: accumulator.finish(),
        sample_rate,
    })
}

type Shared<T> = Arc<Mutex<T>>;

/// Open the default input device and start streaming into an accumulator
fn open_stream(
    is_capturing: &Arc<AtomicBool>,
    target_sample_rate: u32,
) -> Result<(cpal::Stream, Shared<SampleAccumulator>), CaptureError> {
    let host = cpal::default_host();

    let device = host
        .default_input_device()
        .ok_or(CaptureError::NoInputDevice)?;

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    info!("Using audio input device: {}", device_name);

    let supported_configs = device
        .supported_input_configs()
        .map_err(|e| CaptureError::ConfigError(e.to_string()))?;

    // Prefer a config that supports the target rate directly
    let mut best_config = None;
    for config in supported_configs {
        if config.channels() == 0 {
            continue;
        }
        if config.min_sample_rate().0 <= target_sample_rate
            && config.max_sample_rate().0 >= target_sample_rate
        {
            best_config = Some(config.with_sample_rate(cpal::SampleRate(target_sample_rate)));
            break;
        } else if best_config.is_none() {
            best_config = Some(config.with_max_sample_rate());
        }
    }

    let supported_config = best_config.ok_or(CaptureError::NoSupportedConfig)?;
    let sample_format = supported_config.sample_format();
    let config: cpal::StreamConfig = supported_config.into();
    let sample_rate = config.sample_rate.0;
    let channels = config.channels as usize;

    if sample_rate != target_sample_rate {
        warn!(
            "{}Hz not supported, using {}Hz instead",
            target_sample_rate, sample_rate
        );
    }
    info!("Audio config: {} channels, {} Hz", channels, sample_rate);

    let accumulator = Arc::new(Mutex::new(SampleAccumulator::new(
        sample_rate,
        target_sample_rate,
    )));

    let err_callback = |err| {
        error!("Audio stream error: {}", err);
    };

    let stream = match sample_format {
        SampleFormat::I16 => {
            let flag = is_capturing.clone();
            let acc = accumulator.clone();
            device.build_input_stream(
                &config,
                move |data: &[i16], _| {
                    if flag.load(Ordering::SeqCst) {
                        push_samples(&acc, data, channels);
                    }
                },
                err_callback,
                None,
            )?
        }
        SampleFormat::F32 => {
            let flag = is_capturing.clone();
            let acc = accumulator.clone();
            device.build_input_stream(
                &config,
                move |data: &[f32], _| {
                    if flag.load(Ordering::SeqCst) {
                        push_samples(&acc, &f32_to_i16(data), channels);
                    }
                },
                err_callback,
                None,
            )?
        }
        sample_format => {
            return Err(CaptureError::UnsupportedFormat(format!(
                "{:?}",
                sample_format
            )));
        }
    };

    stream.play()?;
    Ok((stream, accumulator))
}

fn push_samples(accumulator: &Shared<SampleAccumulator>, data: &[i16], channels: usize) {
    let mono = downmix(data, channels);
    if let Ok(mut acc) = accumulator.lock() {
        acc.push(&mono);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wav_header_and_length() {
        let samples = vec![0i16, 1000, -1000, 32767];
        let bytes = encode_wav(&samples, TARGET_SAMPLE_RATE).expect("encode");

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // 44-byte canonical header plus two bytes per sample
        assert_eq!(bytes.len(), 44 + samples.len() * 2);

        let reader = hound::WavReader::new(Cursor::new(bytes)).expect("decode");
        assert_eq!(reader.spec().sample_rate, TARGET_SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);
    }

    #[test]
    fn test_microphone_capture() {
        // Only exercises the device on machines with audio input
        match MicrophoneSource.begin_capture() {
            Ok(handle) => {
                let clip = handle.finish().expect("finish");
                assert_eq!(clip.mime_type, WAV_MIME);
            }
            Err(e) => println!("No usable audio input ({}), expected in CI", e),
        }
    }
}
