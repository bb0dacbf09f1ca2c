//! Pose snapshots and their persistent store.
//!
//! A pose maps stable actuator ids to target values. The store keeps every
//! pose under a name and mirrors itself to a JSON file, so stored poses
//! survive across runs.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal
use world_if::eqpt::ActuatorId;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One stored actuator target.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PoseTarget {
    pub id: ActuatorId,
    pub target: f64,
}

/// A named snapshot of actuator targets.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Pose {
    pub targets: Vec<PoseTarget>,
}

/// The persistent pose store.
pub struct PoseStore {
    /// Backing file, or `None` for a purely in-memory store
    path: Option<PathBuf>,

    poses: BTreeMap<String, Pose>,
}

/// Errors raised by the pose store.
#[derive(Debug, Error)]
pub enum PoseStoreError {
    #[error("Cannot access the pose file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Cannot parse the pose file: {0}")]
    ParseError(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    /// Get the stored target for an actuator, if one was captured.
    pub fn target_for(&self, id: ActuatorId) -> Option<f64> {
        self.targets.iter().find(|t| t.id == id).map(|t| t.target)
    }

    /// Set the target for an actuator, replacing any previous value.
    pub fn set(&mut self, id: ActuatorId, target: f64) {
        match self.targets.iter_mut().find(|t| t.id == id) {
            Some(t) => t.target = target,
            None => self.targets.push(PoseTarget { id, target }),
        }
    }
}

impl PoseStore {
    /// Create a store with no backing file. Used in tests and when no pose
    /// file is configured.
    pub fn in_memory() -> Self {
        PoseStore {
            path: None,
            poses: BTreeMap::new(),
        }
    }

    /// Load the store from the given file, or start empty if the file does
    /// not exist yet.
    pub fn load_or_new<P: AsRef<Path>>(path: P) -> Result<Self, PoseStoreError> {
        let path = path.as_ref().to_path_buf();

        let poses = if path.exists() {
            let text = fs::read_to_string(&path)?;
            let poses: BTreeMap<String, Pose> = serde_json::from_str(&text)?;
            info!("Loaded {} pose(s) from {:?}", poses.len(), path);
            poses
        } else {
            info!("No pose file at {:?}, starting with an empty store", path);
            BTreeMap::new()
        };

        Ok(PoseStore {
            path: Some(path),
            poses,
        })
    }

    /// Get a stored pose by name.
    pub fn get(&self, name: &str) -> Option<&Pose> {
        self.poses.get(name)
    }

    /// True if a pose of the given name is stored.
    pub fn contains(&self, name: &str) -> bool {
        self.poses.contains_key(name)
    }

    /// Store a pose under a name, overwriting any previous pose of that
    /// name, and persist the store.
    pub fn set(&mut self, name: &str, pose: Pose) -> Result<(), PoseStoreError> {
        self.poses.insert(name.to_string(), pose);

        if let Some(path) = &self.path {
            let text = serde_json::to_string_pretty(&self.poses)?;
            fs::write(path, text)?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
