use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use zstd::{Decoder, Encoder};

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("trailing data after deserialized value in {0}")]
    TrailingData(String),
}

pub fn create_file_buf_write<P: AsRef<Path>>(path: P) -> io::Result<BufWriter<File>> {
    let file = File::create(path)?;
    Ok(BufWriter::new(file))
}

pub fn open_file_buf_read<P: AsRef<Path>>(path: P) -> io::Result<BufReader<File>> {
    let file = File::open(path)?;
    Ok(BufReader::new(file))
}

// directly copied from [https://doc.rust-lang.org/std/io/trait.BufRead.html#method.has_data_left]
// unfortunately, that method isn't stable yet
pub fn has_data_left<R: BufRead>(mut reader: R) -> io::Result<bool> {
    reader.fill_buf().map(|b| !b.is_empty())
}

/// Writes `value` to `path` as zstd-compressed bincode, replacing any
/// existing file.
pub fn save_compressed<P, T>(path: P, value: &T) -> Result<(), CodecError>
where
    P: AsRef<Path>,
    T: Serialize + ?Sized,
{
    let mut encoder = Encoder::new(create_file_buf_write(path)?, 0)?;
    bincode::serialize_into(&mut encoder, value)?;
    encoder.finish()?.flush()?;
    Ok(())
}

/// Reads a value written by [`save_compressed`]. The whole file must be
/// consumed by the value.
pub fn load_compressed<P, T>(path: P) -> Result<T, CodecError>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let mut reader = BufReader::new(Decoder::new(open_file_buf_read(path)?)?);
    let value = bincode::deserialize_from(&mut reader)?;
    if has_data_left(&mut reader)? {
        return Err(CodecError::TrailingData(path.display().to_string()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Params {
        weights: Vec<f32>,
        step: u32,
    }

    #[test]
    fn compressed_value_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.ckpt");
        let params = Params {
            weights: vec![0.5, -1.25, 3.0],
            step: 17,
        };
        save_compressed(&path, &params).unwrap();
        let loaded: Params = load_compressed(&path).unwrap();
        assert_eq!(loaded, params);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<Params, _> = load_compressed(dir.path().join("absent"));
        assert!(matches!(result, Err(CodecError::Io(_))));
    }
}
