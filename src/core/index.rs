use crate::core::strategy::NO_RESULTS_DISTANCE;
use crate::utils::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};

/// On-disk layout of a prebuilt index. Row `i` belongs to catalog record `i`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexFile {
    pub dimension: usize,
    #[serde(default)]
    pub model: Option<String>,
    pub vectors: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    /// Squared euclidean distance.
    pub distance: f32,
}

/// 暴力搜尋的唯讀 L2 索引
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    model: Option<String>,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new(dimension: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if dimension == 0 {
            return Err(AdvisorError::IndexError {
                message: "index dimension must be positive".to_string(),
            });
        }
        if let Some((row, v)) = vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != dimension)
        {
            return Err(AdvisorError::IndexError {
                message: format!(
                    "row {} has {} components, expected {}",
                    row,
                    v.len(),
                    dimension
                ),
            });
        }
        Ok(Self {
            dimension,
            model: None,
            vectors,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let file: IndexFile = serde_json::from_slice(bytes)?;
        let index = Self::new(file.dimension, file.vectors)?;
        Ok(match file.model {
            Some(model) => index.with_model(model),
            None => index,
        })
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        let file = IndexFile {
            dimension: self.dimension,
            model: self.model.clone(),
            vectors: self.vectors.clone(),
        };
        Ok(serde_json::to_vec(&file)?)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Up to `k` nearest rows, closest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(AdvisorError::IndexError {
                message: format!(
                    "query has {} components, index expects {}",
                    query.len(),
                    self.dimension
                ),
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(row, v)| Neighbor {
                row,
                distance: squared_l2(query, v),
            })
            .collect();

        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(k);
        Ok(neighbors)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

pub fn average_distance(neighbors: &[Neighbor]) -> f32 {
    if neighbors.is_empty() {
        return NO_RESULTS_DISTANCE;
    }
    neighbors.iter().map(|n| n.distance).sum::<f32>() / neighbors.len() as f32
}
