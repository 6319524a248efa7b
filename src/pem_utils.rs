use std::fs;
use std::path::Path;

use crate::error::{PkiError, Result};

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert a PEM block to DER‑encoded bytes, requiring the given label.
pub fn pem_to_der(data: &[u8], label: &str) -> Result<Vec<u8>> {
    let block = pem::parse(data)?;
    if block.tag() != label {
        return Err(PkiError::MalformedInput(format!(
            "expected PEM block {label}, found {}",
            block.tag()
        )));
    }
    Ok(block.into_contents())
}

/// Writes `data` to `path`, creating missing parent directories first.
pub fn write_file(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PkiError::file_io(parent, e))?;
    }
    fs::write(path, data).map_err(|e| PkiError::file_io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "wrote file");
    Ok(())
}

pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| PkiError::file_io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mismatch_is_malformed() {
        let pem = der_to_pem(&[0x30, 0x00], "X509 CRL");
        assert!(pem.starts_with("-----BEGIN X509 CRL-----\n"));
        assert_eq!(pem_to_der(pem.as_bytes(), "X509 CRL").unwrap(), vec![0x30, 0x00]);
        assert!(matches!(
            pem_to_der(pem.as_bytes(), "CERTIFICATE"),
            Err(PkiError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_write_file_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.bin");
        write_file(&path, b"data").unwrap();
        assert_eq!(read_file(&path).unwrap(), b"data");
    }

    #[test]
    fn test_read_missing_file_is_file_io() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_file(dir.path().join("missing.pem")),
            Err(PkiError::FileIO { .. })
        ));
    }
}
