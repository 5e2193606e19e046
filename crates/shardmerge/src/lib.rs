//! ## Crate layout
//! - `config`: TOML configuration document and validation.
//! - `core`: cell values, comparators, merge strategies, pagination, and
//!   observability.
//! - `error`: the public error taxonomy callers match on.
//!
//! `Engine` is the configured entry point; `prelude` mirrors the vocabulary
//! needed to describe a statement and feed shard cursors into a merge.

pub use shardmerge_config as config;
pub use shardmerge_core as core;

mod error;
mod result;


pub use error::{Error, ErrorKind, ErrorOrigin};
pub use result::MergedRows;

use crate::core::merge::{DqlMerger, SchemaCatalog, ShardCursor, StatementContext};
use shardmerge_config::MergeConfig;
use std::path::Path;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Engine
///
/// Configured merge entry point. Owns one `DqlMerger` and translates its
/// internal failures into the public `Error`.
///

#[derive(Clone, Debug, Default)]
pub struct Engine {
    merger: DqlMerger,
}

impl Engine {
    /// Build an engine from an already-parsed configuration document.
    pub fn from_config(config: &MergeConfig) -> Result<Self, Error> {
        Ok(Self {
            merger: DqlMerger::from_config(config)?,
        })
    }

    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        Self::from_config(&MergeConfig::from_toml_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_config(&MergeConfig::from_path(path)?)
    }

    #[must_use]
    pub const fn merger(&self) -> &DqlMerger {
        &self.merger
    }

    /// Merge per-shard cursors into one logical cursor.
    pub fn merge<S>(
        &self,
        shards: Vec<S>,
        statement: &StatementContext,
        catalog: Option<&dyn SchemaCatalog>,
    ) -> Result<MergedRows, Error>
    where
        S: ShardCursor + 'static,
    {
        self.merger
            .merge(shards, statement, catalog)
            .map(MergedRows::from_inner)
            .map_err(Error::from)
    }
}

impl From<DqlMerger> for Engine {
    fn from(merger: DqlMerger) -> Self {
        Self { merger }
    }
}

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Engine, Error, ErrorKind, MergedRows,
        core::prelude::*,
    };
}
