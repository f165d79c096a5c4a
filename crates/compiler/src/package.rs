//! Executable packaging.
//!
//! A packaged program is the prebuilt runtime executable followed by a
//! marker, the debug flag, the requested heap size, and the bytecode. The
//! runtime finds its payload by scanning for the marker from the end of
//! its own file.

use n7_core::{DBG_FLAG, RUNTIME_MARKER};
use std::fmt;
use std::fs;
use std::io::Write as _;
use std::path::Path;

/// Why packaging failed; rendered with the original driver's wording.
#[derive(Debug)]
pub enum PackageError {
    Runtime,
    Bytecode,
    Output,
    Write,
}

impl fmt::Display for PackageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            PackageError::Runtime => "could not load runtime file",
            PackageError::Bytecode => "could not load n7b file",
            PackageError::Output => "could not create exe file",
            PackageError::Write => "failed writing to exe file",
        };
        write!(f, "error: {}", message)
    }
}

impl std::error::Error for PackageError {}

/// Concatenate runtime, marker, flags and bytecode into `output`.
pub fn build_executable(
    runtime: &Path,
    bytecode: &Path,
    output: &Path,
    flags: u32,
    heap_size: u32,
) -> Result<(), PackageError> {
    let runtime_bytes = fs::read(runtime).map_err(|_| PackageError::Runtime)?;
    let bytecode_bytes = fs::read(bytecode).map_err(|_| PackageError::Bytecode)?;

    let mut image =
        Vec::with_capacity(runtime_bytes.len() + RUNTIME_MARKER.len() + 5 + bytecode_bytes.len());
    image.extend_from_slice(&runtime_bytes);
    image.extend_from_slice(&RUNTIME_MARKER);
    image.push(if flags & DBG_FLAG != 0 { 1 } else { 0 });
    image.extend_from_slice(&heap_size.to_le_bytes());
    image.extend_from_slice(&bytecode_bytes);

    let mut file = fs::File::create(output).map_err(|_| PackageError::Output)?;
    file.write_all(&image).map_err(|_| PackageError::Write)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn payload_layout() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = dir.path().join("renv_console");
        let bin = dir.path().join("p.n7b");
        let exe = dir.path().join("p.exe");
        fs::write(&runtime, b"RUNTIME").unwrap();
        fs::write(&bin, [0x01, 0x02, 0x03]).unwrap();

        build_executable(&runtime, &bin, &exe, DBG_FLAG, 4096).unwrap();

        let image = fs::read(&exe).unwrap();
        assert!(image.starts_with(b"RUNTIME"));
        let payload = &image[b"RUNTIME".len()..];
        assert_eq!(&payload[..7], &RUNTIME_MARKER);
        assert_eq!(payload[7], 1);
        assert_eq!(&payload[8..12], &4096u32.to_le_bytes());
        assert_eq!(&payload[12..], &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn missing_runtime_reports_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("p.n7b");
        fs::write(&bin, [0u8]).unwrap();
        let err = build_executable(
            &dir.path().join("missing"),
            &bin,
            &dir.path().join("p.exe"),
            0,
            0,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "error: could not load runtime file");
    }
}
