use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::trace;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{RecognitionError, Result};
use crate::features::{Descriptors, FeatureSet, Keypoint};

/// Element size and type tag of a single channel 32-bit float matrix.
const ELEM_SIZE: u64 = 4;
const ELEM_TYPE_F32: u64 = 5;

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize>(output_path: impl AsRef<Path>, object: &T) -> Result<()> {
    let j = serde_json::to_string_pretty(object)?;
    let mut file = File::create(output_path)?;
    file.write_all(j.as_bytes())?;
    Ok(())
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T> {
    let contents = std::fs::read_to_string(file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn invalid_data(msg: String) -> RecognitionError {
    std::io::Error::new(std::io::ErrorKind::InvalidData, msg).into()
}

/// Writes descriptors as `i32 cols, i32 rows, u64 elem_size, u64 elem_type`
/// followed by the row-major `f32` data, all little-endian.
pub fn write_descriptors<W: Write>(writer: &mut W, descriptors: &Descriptors) -> Result<()> {
    let cols = i32::try_from(descriptors.dim())
        .map_err(|_| invalid_data(format!("descriptor length {}", descriptors.dim())))?;
    let rows = i32::try_from(descriptors.len())
        .map_err(|_| invalid_data(format!("descriptor count {}", descriptors.len())))?;
    writer.write_all(&cols.to_le_bytes())?;
    writer.write_all(&rows.to_le_bytes())?;
    writer.write_all(&ELEM_SIZE.to_le_bytes())?;
    writer.write_all(&ELEM_TYPE_F32.to_le_bytes())?;
    for v in descriptors.as_slice() {
        writer.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

pub fn read_descriptors<R: Read>(reader: &mut R) -> Result<Descriptors> {
    let mut b4 = [0u8; 4];
    let mut b8 = [0u8; 8];
    reader.read_exact(&mut b4)?;
    let cols = i32::from_le_bytes(b4);
    reader.read_exact(&mut b4)?;
    let rows = i32::from_le_bytes(b4);
    reader.read_exact(&mut b8)?;
    let elem_size = u64::from_le_bytes(b8);
    reader.read_exact(&mut b8)?;
    let elem_type = u64::from_le_bytes(b8);

    if elem_size != ELEM_SIZE || elem_type != ELEM_TYPE_F32 {
        return Err(RecognitionError::CacheFormat {
            elem_size,
            elem_type,
        });
    }
    if cols < 0 || rows < 0 {
        return Err(invalid_data(format!("negative shape {} x {}", rows, cols)));
    }

    let len = (cols as u64)
        .checked_mul(rows as u64)
        .and_then(|n| n.checked_mul(ELEM_SIZE))
        .ok_or_else(|| invalid_data(format!("shape {} x {} overflows", rows, cols)))?;
    // read at most the declared length, a corrupt header must not size the buffer
    let mut bytes = Vec::new();
    reader.take(len).read_to_end(&mut bytes)?;
    if bytes.len() as u64 != len {
        return Err(invalid_data(format!(
            "expected {} descriptor bytes, found {}",
            len,
            bytes.len()
        )));
    }
    let data = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok(Descriptors::new(cols as usize, data))
}

pub fn write_descriptor_cache(path: impl AsRef<Path>, descriptors: &Descriptors) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_descriptors(&mut writer, descriptors)?;
    writer.flush()?;
    Ok(())
}

pub fn read_descriptor_cache(path: impl AsRef<Path>) -> Result<Descriptors> {
    let mut reader = BufReader::new(File::open(path)?);
    read_descriptors(&mut reader)
}

/// Keypoint and descriptor file paths of object `name` inside `dir`.
pub fn cache_paths(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{}.keypoints.json", name)),
        dir.join(format!("{}.desc", name)),
    )
}

pub fn save_feature_set(dir: &Path, name: &str, features: &FeatureSet) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let (kp_path, desc_path) = cache_paths(dir, name);
    object_to_json(&kp_path, &features.keypoints().to_vec())?;
    write_descriptor_cache(&desc_path, features.descriptors())?;
    trace!("cached {} features of {}", features.len(), name);
    Ok(())
}

/// `Ok(None)` when the cache of `name` does not exist yet.
pub fn load_feature_set(dir: &Path, name: &str) -> Result<Option<FeatureSet>> {
    let (kp_path, desc_path) = cache_paths(dir, name);
    if !kp_path.is_file() || !desc_path.is_file() {
        return Ok(None);
    }
    let keypoints: Vec<Keypoint> = object_from_json(&kp_path)?;
    let descriptors = read_descriptor_cache(&desc_path)?;
    if keypoints.len() != descriptors.len() {
        return Err(invalid_data(format!(
            "{}: {} keypoints but {} descriptors",
            name,
            keypoints.len(),
            descriptors.len()
        )));
    }
    Ok(Some(FeatureSet::new(keypoints, descriptors)))
}
