use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read};
use std::path::Path;

/// Read a mono WAV file as float samples plus its header sample rate.
pub fn read_wav(filename: &Path) -> io::Result<(Vec<f32>, u32)> {
    let reader = hound::WavReader::open(filename)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, format!("{err}")))?;
    let spec = reader.spec();
    let sample_rate = spec.sample_rate;

    let samples: io::Result<Vec<f32>> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|sample| {
                sample.map_err(|err| {
                    io::Error::new(io::ErrorKind::Other, format!("{err}"))
                })
            })
            .collect(),
        hound::SampleFormat::Int => {
            let amplitude =
                (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|sample| {
                    sample
                        .map(|value| value as f32 / amplitude)
                        .map_err(|err| {
                            io::Error::new(
                                io::ErrorKind::Other,
                                format!("{err}"),
                            )
                        })
                })
                .collect()
        }
    };

    Ok((samples?, sample_rate))
}

pub fn write_wav(
    signal: &[f32],
    sample_rate: u32,
    filename: &Path,
) -> io::Result<()> {
    if let Some(parent) = filename.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(filename, spec)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, format!("{err}")))?;
    let amplitude = i16::MAX as f32;
    for &sample in signal {
        writer
            .write_sample((sample.clamp(-1.0, 1.0) * amplitude) as i16)
            .map_err(|err| {
                io::Error::new(io::ErrorKind::Other, format!("{err}"))
            })?;
    }
    writer
        .finalize()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, format!("{err}")))?;
    Ok(())
}

/// Pull up to `max_samples` raw little-endian f32 samples from a byte stream.
/// Returns the number read; 0 means end of stream.
pub fn read_f32_chunk(
    reader: &mut dyn Read,
    out: &mut Vec<f32>,
    max_samples: usize,
) -> io::Result<usize> {
    out.clear();
    for _ in 0..max_samples {
        match reader.read_f32::<LittleEndian>() {
            Ok(value) => out.push(value),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err),
        }
    }
    Ok(out.len())
}
