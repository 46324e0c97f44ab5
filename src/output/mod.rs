//! Token delivery to a file or standard output.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::error::{Result, TokenError};

/// Write `token` to `output`, or print it to `stdout` when no path is given.
pub fn deliver(token: &str, output: Option<&Path>, stdout: &mut impl Write) -> Result<()> {
    match output {
        Some(path) => {
            write_token_file(token, path).map_err(|source| TokenError::OutputWrite {
                path: path.to_path_buf(),
                source,
            })?;
            info!("Token written to {}", path.display());
            Ok(())
        }
        None => writeln!(stdout, "{}", token)
            .and_then(|_| stdout.flush())
            .map_err(|source| TokenError::OutputWrite {
                path: "<stdout>".into(),
                source,
            }),
    }
}

/// Owner-only file containing exactly the token bytes.
fn write_token_file(token: &str, path: &Path) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;

    // mode() only applies on creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(token.as_bytes())?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_deliver_to_stdout() {
        let mut out = Vec::new();
        deliver("ghs_abc", None, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ghs_abc\n");
    }

    #[test]
    fn test_deliver_to_file_writes_only_token() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("token");
        let mut out = Vec::new();

        deliver("ghs_abc", Some(&path), &mut out).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"ghs_abc");
        assert!(out.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_deliver_overwrites_and_restricts_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("token");
        std::fs::write(&path, "an older and much longer token").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        deliver("ghs_new", Some(&path), &mut Vec::new()).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ghs_new");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_deliver_to_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("token");
        let err = deliver("ghs_abc", Some(&path), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, TokenError::OutputWrite { .. }));
    }
}
