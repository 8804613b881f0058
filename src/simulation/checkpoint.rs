//! Checkpoints: accounting tables plus the tracker position
//!
//! A checkpoint does not contain the engine state or the current
//! configuration. Resuming requires the caller to hand the driver the
//! configuration (and engine) the checkpointed run stopped at.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tracker::{AccountingTables, TrackerCursor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub tables: AccountingTables,
    pub cursor: TrackerCursor,
}

impl Checkpoint {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
