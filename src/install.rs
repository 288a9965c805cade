//! Downloads resolved artifacts into a versioned tool cache

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::catalog::Package;
use crate::config::{FETCH_TIMEOUT_MS, USER_AGENT};
use crate::error::InstallError;

/// Installs package binaries under `{cache_root}/{name}/{version}/{architecture}/`
pub struct Installer {
    client: reqwest::Client,
    cache_root: PathBuf,
}

impl Installer {
    pub fn new(cache_root: impl Into<PathBuf>) -> Result<Self, InstallError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
            .build()?;

        Ok(Self {
            client,
            cache_root: cache_root.into(),
        })
    }

    /// Where `package` is (or would be) cached as `binary_name`
    pub fn cache_path(&self, package: &Package, binary_name: &str) -> PathBuf {
        self.cache_root
            .join(&package.name)
            .join(&package.version)
            .join(package.architecture.as_str())
            .join(binary_name)
    }

    /// Returns the cached binary if it is already installed
    pub fn find(&self, package: &Package, binary_name: &str) -> Option<PathBuf> {
        let path = self.cache_path(package, binary_name);
        path.is_file().then_some(path)
    }

    /// Install `package` as `binary_name`, reusing the cached copy when present.
    ///
    /// The download is written to a uniquely named temp file next to its
    /// destination and persisted into place. A failed install removes the temp
    /// file, and concurrent installs never share one.
    pub async fn install(
        &self,
        package: &Package,
        binary_name: &str,
    ) -> Result<PathBuf, InstallError> {
        if let Some(path) = self.find(package, binary_name) {
            info!("Using cached {} {} at {}", package.name, package.version, path.display());
            return Ok(path);
        }

        let destination = self.cache_path(package, binary_name);
        let directory = destination
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.cache_root.clone());
        tokio::fs::create_dir_all(&directory).await?;

        info!("Downloading {} {} from {}", package.name, package.version, package.download_url);
        let response = self.client.get(&package.download_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Download of {} returned status {}", package.download_url, status);
            return Err(InstallError::Status {
                url: package.download_url.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        debug!("Downloaded {} bytes", bytes.len());

        let target = destination.clone();
        tokio::task::spawn_blocking(move || persist_executable(&directory, &bytes, &target))
            .await
            .map_err(std::io::Error::other)??;

        info!("Installed {} {} to {}", package.name, package.version, destination.display());
        Ok(destination)
    }
}

/// Write `bytes` to a temp file in `directory`, mark it executable and move it
/// to `destination`; the temp file is deleted on any failure
fn persist_executable(directory: &Path, bytes: &[u8], destination: &Path) -> std::io::Result<()> {
    let mut file = tempfile::Builder::new()
        .prefix(".partial-")
        .tempfile_in(directory)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    make_executable(file.path())?;
    file.persist(destination).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
