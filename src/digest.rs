use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("IO error reading {path}: {source}")]
    ReadFailure {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Computes the SHA-256 digest of a file's content, hex encoded.
///
/// # Behavior
/// - Reads the file in fixed-size blocks, so memory use is constant
///   regardless of file size
/// - Digest equality is the only change signal this tool uses; raw content
///   is never compared
///
/// # Errors
/// - `DigestError::NotFound`: The path does not exist at call time
/// - `DigestError::PermissionDenied`: Insufficient permissions to read the file
/// - `DigestError::ReadFailure`: Any other I/O error while opening or reading
///   (e.g. the file was removed mid-read, or a device error)
pub fn digest_file(path: &Path) -> Result<String, DigestError> {
    info!("Digesting {}", path.display());

    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DigestError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => DigestError::PermissionDenied(path.to_path_buf()),
        _ => DigestError::ReadFailure {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| DigestError::ReadFailure {
            path: path.to_path_buf(),
            source: e,
        })?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let digest = format!("{:x}", hasher.finalize());

    debug!("Digest of {} is {}", path.display(), digest);

    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_digest_simple_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"Hello, world!").unwrap();
        temp_file.flush().unwrap();

        let digest = digest_file(temp_file.path()).unwrap();

        assert_eq!(
            digest,
            "315f5bdb76d078c43b8ac0064e4a0164612b1fce77c869345bfc94c75894edd3"
        );
    }

    #[test]
    fn test_digest_empty_file() {
        let temp_file = NamedTempFile::new().unwrap();

        let digest = digest_file(temp_file.path()).unwrap();

        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digest_large_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let content = vec![b'A'; 1024 * 1024];
        temp_file.write_all(&content).unwrap();
        temp_file.flush().unwrap();

        let digest = digest_file(temp_file.path()).unwrap();

        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn test_digest_nonexistent_file() {
        let result = digest_file(Path::new("/nonexistent/file.txt"));

        assert!(result.is_err());
        match result {
            Err(DigestError::NotFound(path)) => {
                assert_eq!(path, Path::new("/nonexistent/file.txt"));
            }
            _ => panic!("Expected NotFound error for nonexistent file"),
        }
    }

    #[test]
    fn test_digest_deterministic() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"test content").unwrap();
        temp_file.flush().unwrap();

        let digest1 = digest_file(temp_file.path()).unwrap();
        let digest2 = digest_file(temp_file.path()).unwrap();

        assert_eq!(digest1, digest2);
    }

    #[test]
    fn test_digest_differs_for_different_content() {
        let mut file_a = NamedTempFile::new().unwrap();
        file_a.write_all(b"v1").unwrap();
        file_a.flush().unwrap();

        let mut file_b = NamedTempFile::new().unwrap();
        file_b.write_all(b"v2").unwrap();
        file_b.flush().unwrap();

        assert_ne!(
            digest_file(file_a.path()).unwrap(),
            digest_file(file_b.path()).unwrap()
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_digest_permission_denied() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"test content").unwrap();
        temp_file.flush().unwrap();

        let mut perms = fs::metadata(temp_file.path()).unwrap().permissions();
        perms.set_mode(0o000);
        fs::set_permissions(temp_file.path(), perms).unwrap();

        let result = digest_file(temp_file.path());

        assert!(result.is_err());
        match result {
            Err(DigestError::PermissionDenied(_)) => {}
            _ => panic!("Expected PermissionDenied error for permission denied"),
        }
    }
}
