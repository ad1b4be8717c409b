//! Key and configuration files of WireGuard tunnels

use std::io::Write as _;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::GatewayResult;

/// Mode of files holding key material
pub const SECRET_FILE_MODE: u32 = 0o600;

/// Ensure a directory exists, creating it if necessary
pub async fn ensure_directory_exists(path: &Path) -> GatewayResult<()> {
    if !path.exists() {
        tokio::fs::create_dir_all(path).await?;
        info!("Created directory: {:?}", path);
    }
    Ok(())
}

/// Write a file that is never readable beyond `mode`
///
/// New files are created with `mode`; an existing file is restricted before
/// it is truncated and rewritten.
pub async fn write_secure_file(path: &Path, content: &str, mode: u32) -> GatewayResult<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .mode(mode)
        .open(path)
        .await?;
    file.set_permissions(std::fs::Permissions::from_mode(mode)).await?;
    file.set_len(0).await?;
    file.write_all(content.as_bytes()).await?;
    file.flush().await?;
    debug!("Wrote {:?} with permissions {:o}", path, mode);
    Ok(())
}

/// Blocking variant of [`write_secure_file`]
pub fn write_secure_file_sync(path: &Path, content: &str, mode: u32) -> GatewayResult<()> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .mode(mode)
        .open(path)?;
    file.set_permissions(std::fs::Permissions::from_mode(mode))?;
    file.set_len(0)?;
    file.write_all(content.as_bytes())?;
    debug!("Wrote {:?} with permissions {:o}", path, mode);
    Ok(())
}

/// Delete a file if it exists
pub async fn delete_file(path: &Path) -> GatewayResult<()> {
    if path.exists() {
        tokio::fs::remove_file(path).await?;
        debug!("Deleted file: {:?}", path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_secure_file() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("wireguard");
        ensure_directory_exists(&nested).await.unwrap();

        let path = nested.join("wg0.privatekey");
        write_secure_file(&path, "secret\n", SECRET_FILE_MODE).await.unwrap();
        let metadata = std::fs::metadata(&path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "secret\n");

        delete_file(&path).await.unwrap();
        assert!(!path.exists());
        delete_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_secure_file_restricts_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wg0.conf");
        std::fs::write(&path, "a much longer previous content\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_secure_file(&path, "short\n", SECRET_FILE_MODE).await.unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o600);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "short\n");
    }

    #[test]
    fn test_write_secure_file_sync() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wireguard.json");
        std::fs::write(&path, "[{\"stale\": true}]").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_secure_file_sync(&path, "[]", SECRET_FILE_MODE).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o600);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
