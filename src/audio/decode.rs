use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::transcode::Transcoder;
use crate::error::{PipelineError, Result};

/// Mono PCM signal. Immutable once decoded.
#[derive(Clone, Debug)]
pub struct AudioSignal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Decode `path` to mono. Containers symphonia cannot probe are converted with
/// `transcoder` into `scratch_dir` first; the intermediate is removed afterwards.
pub fn load_audio(path: &Path, transcoder: &dyn Transcoder, scratch_dir: &Path) -> Result<AudioSignal> {
    if !path.is_file() {
        return Err(PipelineError::input(path, "no such file"));
    }

    match probe(path)? {
        Some(format) => decode_format(format),
        None => {
            log::info!("{} is not natively decodable, transcoding", path.display());
            let intermediate = scratch_dir.join("transcoded.wav");
            transcoder.to_wav(path, &intermediate)?;

            let decoded = probe(&intermediate).and_then(|format| match format {
                Some(format) => decode_format(format),
                None => Err(PipelineError::Decode(
                    "transcoded intermediate is not a readable WAV file".into(),
                )),
            });
            if let Err(e) = std::fs::remove_file(&intermediate) {
                log::warn!("Failed to remove {}: {}", intermediate.display(), e);
            }
            decoded
        }
    }
}

/// `Ok(None)` means no demuxer recognised the container.
fn probe(path: &Path) -> Result<Option<Box<dyn FormatReader>>> {
    let file = std::fs::File::open(path).map_err(|e| PipelineError::input(path, e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    match symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    ) {
        Ok(probed) => Ok(Some(probed.format)),
        Err(SymphoniaError::Unsupported(_)) => Ok(None),
        // The probe scans to end of stream when no marker matches.
        Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Ok(None)
        }
        Err(e) => Err(PipelineError::Decode(format!("probe {}: {}", path.display(), e))),
    }
}

fn decode_format(mut format: Box<dyn FormatReader>) -> Result<AudioSignal> {
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| PipelineError::Decode("no audio tracks found".into()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| PipelineError::Decode("unknown sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PipelineError::Decode(format!("create decoder: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut warned_channels = false;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(PipelineError::Decode(format!("read packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(PipelineError::Decode(format!("decode packet: {}", e))),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        if channels > 2 && !warned_channels {
            log::warn!("{} channels in source, only the first two are mixed", channels);
            warned_channels = true;
        }

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        downmix(sample_buf.samples(), channels, &mut samples);
    }

    if samples.is_empty() {
        return Err(PipelineError::Decode("stream contains no samples".into()));
    }

    log::info!(
        "Decoded audio: {} samples, {}Hz, {:.1}s",
        samples.len(),
        sample_rate,
        samples.len() as f32 / sample_rate as f32
    );

    Ok(AudioSignal { samples, sample_rate })
}

/// Reduce interleaved samples to mono. Multi-channel frames become the plain
/// sum of channels 0 and 1; there is no averaging or clipping guard.
pub fn downmix(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    match channels {
        0 => {}
        1 => out.extend_from_slice(interleaved),
        _ => out.extend(interleaved.chunks_exact(channels).map(|f| f[0] + f[1])),
    }
}
