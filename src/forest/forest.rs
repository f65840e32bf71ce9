use crate::errors::GroveError;
use crate::observations::Observations;
use crate::tree::tree::Tree;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// An ordered collection of trained trees sharing one observation table.
/// Tree order always matches training index order; the out-of-bag masks
/// depend on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forest {
    trees: Vec<Tree>,
    observations: Observations,
    ci_group_size: usize,
}

impl Forest {
    pub fn new(trees: Vec<Tree>, observations: Observations, ci_group_size: usize) -> Self {
        Forest {
            trees,
            observations,
            ci_group_size,
        }
    }

    pub fn get_trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn get_observations(&self) -> &Observations {
        &self.observations
    }

    /// The confidence-interval group size this forest was trained with.
    pub fn get_ci_group_size(&self) -> usize {
        self.ci_group_size
    }

    /// Save the forest as a json object to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GroveError> {
        fs::write(path, self.json_dump()?).map_err(|e| GroveError::UnableToWrite(e.to_string()))
    }

    /// Load a forest from a path to a json forest object.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GroveError> {
        let json_str = fs::read_to_string(path).map_err(|e| GroveError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }

    /// Dump the forest as a json object.
    pub fn json_dump(&self) -> Result<String, GroveError> {
        serde_json::to_string(self).map_err(|e| GroveError::UnableToWrite(e.to_string()))
    }

    /// Read a forest from a json string.
    pub fn from_json(json_str: &str) -> Result<Self, GroveError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| GroveError::UnableToRead(e.to_string()))
    }
}
