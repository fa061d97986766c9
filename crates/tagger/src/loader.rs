#![forbid(unsafe_code)]

use std::path::Path;

use crate::error::{Result, TaggerError};

/// Load a file of little-endian `f32` values.
///
/// # Errors
///
/// `ModelLoad` if the file cannot be read or its length is not a multiple of 4.
pub fn load_f32_file(path: impl AsRef<Path>) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let fail = |reason: String| TaggerError::ModelLoad {
        path: path.to_path_buf(),
        reason,
    };
    let buf = std::fs::read(path).map_err(|e| fail(e.to_string()))?;
    if buf.len() % 4 != 0 {
        return Err(fail(format!("{} bytes is not a whole number of f32 values", buf.len())));
    }
    buf.chunks_exact(4)
        .map(|b| {
            <[u8; 4]>::try_from(b)
                .map(f32::from_le_bytes)
                .map_err(|e| fail(e.to_string()))
        })
        .collect()
}

/// Write `values` as little-endian `f32`, the format read by [`load_f32_file`].
///
/// # Errors
///
/// `ModelLoad` if the file cannot be written.
pub fn save_f32_file(path: impl AsRef<Path>, values: &[f32]) -> Result<()> {
    let path = path.as_ref();
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    std::fs::write(path, bytes).map_err(|e| TaggerError::ModelLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
