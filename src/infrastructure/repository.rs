//! Site directory discovery and layout

use crate::error::{CbciError, Result};
use crate::infrastructure::config::SITE_DIR;
use crate::infrastructure::{Config, LocalStore};
use std::fs;
use std::path::{Path, PathBuf};

/// Abstract access to a site's on-disk metadata
pub trait SiteRepository {
    /// Get the root directory of this site
    fn root(&self) -> &Path;

    /// Load configuration from .cbcimath/config.toml
    fn load_config(&self) -> Result<Config>;

    /// Save configuration to .cbcimath/config.toml
    fn save_config(&self, config: &Config) -> Result<()>;

    /// Check if .cbcimath directory exists
    fn is_initialized(&self) -> bool;

    /// Create .cbcimath directory structure
    fn initialize(&self) -> Result<()>;
}

/// File system implementation of SiteRepository
#[derive(Debug, Clone)]
pub struct FileSystemRepository {
    pub root: PathBuf,
}

impl FileSystemRepository {
    pub fn new(root: PathBuf) -> Self {
        FileSystemRepository { root }
    }

    /// Discover the site root.
    /// First checks CBCIMATH_ROOT, then walks up from the current directory.
    pub fn discover() -> Result<Self> {
        if let Ok(root_path) = std::env::var("CBCIMATH_ROOT") {
            let path = PathBuf::from(root_path);
            if Self::has_site_dir(&path) {
                return Ok(FileSystemRepository::new(path));
            }
            return Err(CbciError::Config(format!(
                "CBCIMATH_ROOT is set to '{}' but no {} directory found. \
                Run 'cbcimath init' in that directory or unset CBCIMATH_ROOT.",
                path.display(),
                SITE_DIR
            )));
        }

        let current_dir = std::env::current_dir()?;
        Self::discover_from(&current_dir)
    }

    /// Discover the site root by walking up from a specific starting directory
    pub fn discover_from(start: &Path) -> Result<Self> {
        start
            .ancestors()
            .find(|dir| Self::has_site_dir(dir))
            .map(|dir| FileSystemRepository::new(dir.to_path_buf()))
            .ok_or_else(|| CbciError::NotCbciDirectory(start.to_path_buf()))
    }

    fn has_site_dir(path: &Path) -> bool {
        path.join(SITE_DIR).is_dir()
    }

    /// Directory holding the local key-value store
    pub fn store_dir(&self) -> PathBuf {
        self.root.join(SITE_DIR).join("store")
    }

    /// Local key-value store of this site
    pub fn local_store(&self) -> LocalStore {
        LocalStore::new(self.store_dir())
    }
}

impl SiteRepository for FileSystemRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn load_config(&self) -> Result<Config> {
        Config::load_from_dir(&self.root)
    }

    fn save_config(&self, config: &Config) -> Result<()> {
        config.save_to_dir(&self.root)
    }

    fn is_initialized(&self) -> bool {
        Self::has_site_dir(&self.root)
    }

    fn initialize(&self) -> Result<()> {
        let site_dir = self.root.join(SITE_DIR);

        if site_dir.exists() {
            return Err(CbciError::Config(format!(
                "Directory already initialized: {}",
                self.root.display()
            )));
        }

        fs::create_dir(&site_dir)?;
        fs::create_dir(self.store_dir())?;
        Ok(())
    }
}
