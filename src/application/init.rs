//! Initialize site use case

use crate::domain::RecordKind;
use crate::error::{CbciError, Result};
use crate::infrastructure::{BackendKind, Config, FileSystemRepository, LocalStore, SiteRepository};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::info;

const SAMPLES: &str = include_str!("samples.json");

/// Initialize a new site at the specified path.
pub fn init(path: &Path, backend: BackendKind, with_samples: bool) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }

    let repo = FileSystemRepository::new(path.to_path_buf());
    repo.initialize()?;

    let config = Config::new(backend);
    repo.save_config(&config)?;

    println!("Initialized cbcimath site at {}", path.display());
    println!("Backend: {}", format!("{:?}", backend).to_lowercase());

    if with_samples {
        let seeded = seed_samples(&repo.local_store())?;
        println!("Seeded sample records for {} kinds", seeded);
    }

    Ok(())
}

/// Write the bundled sample records for every kind whose key is still unset.
/// Returns how many kinds were seeded.
pub fn seed_samples(store: &LocalStore) -> Result<usize> {
    let samples: Map<String, Value> = serde_json::from_str(SAMPLES)?;
    let mut seeded = 0;

    for kind in RecordKind::all() {
        let key = kind.storage_key();
        if store.get(key).is_some() {
            continue;
        }
        let Some(Value::Array(items)) = samples.get(key) else {
            continue;
        };
        for item in items {
            kind.check_document(item).map_err(|e| {
                CbciError::Config(format!("bundled {} sample is invalid: {}", key, e))
            })?;
        }
        store.set_list(key, items.clone())?;
        info!(key, count = items.len(), "sample records seeded");
        seeded += 1;
    }

    Ok(seeded)
}
