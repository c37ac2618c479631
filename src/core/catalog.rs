use crate::core::index::FlatIndex;
use crate::domain::model::GrantProgram;
use crate::domain::ports::Storage;
use crate::utils::error::{AdvisorError, Result};

/// Read-only pairing of the program catalog with its prebuilt vector index.
#[derive(Debug, Clone)]
pub struct GrantCatalog {
    programs: Vec<GrantProgram>,
    index: FlatIndex,
}

impl GrantCatalog {
    pub fn new(programs: Vec<GrantProgram>, index: FlatIndex) -> Result<Self> {
        if programs.len() != index.len() {
            return Err(AdvisorError::IndexError {
                message: format!(
                    "catalog has {} programs but the index has {} rows",
                    programs.len(),
                    index.len()
                ),
            });
        }
        Ok(Self { programs, index })
    }

    pub async fn load<S: Storage>(storage: &S, catalog_path: &str, index_path: &str) -> Result<Self> {
        let programs = load_programs(storage, catalog_path).await?;

        let index_bytes = storage.read_file(index_path).await.map_err(|e| {
            tracing::warn!("⚠️ Grant index '{}' could not be read: {}", index_path, e);
            AdvisorError::IndexError {
                message: format!("index file '{}' is missing or unreadable", index_path),
            }
        })?;
        let index = FlatIndex::from_json(&index_bytes)?;

        tracing::debug!(
            "Loaded {} grant programs with a {}-dimensional index",
            programs.len(),
            index.dimension()
        );
        Self::new(programs, index)
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn program(&self, row: usize) -> Option<&GrantProgram> {
        self.programs.get(row)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

pub async fn load_programs<S: Storage>(storage: &S, catalog_path: &str) -> Result<Vec<GrantProgram>> {
    let bytes = storage.read_file(catalog_path).await?;
    let programs: Vec<GrantProgram> = serde_json::from_slice(&bytes)?;
    Ok(programs)
}
