// SPDX-License-Identifier: Apache-2.0
//! atelier-store: the persistence port for programs.
//!
//! The engine never touches storage itself; callers load a program, edit
//! it through the engine, and store it back. Two callers sharing one store
//! get no cross-copy coordination — last store wins — so anything needing
//! exclusivity goes through the header's advisory read-only flag.

mod fs;

use std::collections::BTreeSet;

use thiserror::Error;

use atelier_program::{Program, ProgramHeader, ProgramId};

pub use fs::FsProgramStore;

/// Error raised by a program store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No program stored under this id.
    #[error("program not found: {0}")]
    NotFound(ProgramId),
    /// Every id in `[1, 65535)` is taken.
    #[error("no free program id")]
    Exhausted,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Storage port for serialized programs, keyed by header id.
pub trait ProgramStore {
    /// Headers of every stored program, ordered by id.
    fn program_headers(&self) -> Result<Vec<ProgramHeader>, StoreError>;

    /// Loads the program stored under `id`.
    fn load_program(&self, id: ProgramId) -> Result<Program, StoreError>;

    /// Persists `program` under its header id, replacing any previous
    /// version.
    fn store_program(&mut self, program: &Program) -> Result<(), StoreError>;

    /// Removes the program stored under `id`.
    fn delete_program(&mut self, id: ProgramId) -> Result<(), StoreError>;

    /// Flips the advisory read-only flag on a stored program.
    fn set_readonly(&mut self, id: ProgramId, readonly: bool) -> Result<(), StoreError> {
        let mut program = self.load_program(id)?;
        program.header.readonly = readonly;
        self.store_program(&program)
    }
}

/// Smallest unused program id in `[1, 65535)`.
///
/// # Errors
///
/// [`StoreError::Exhausted`] when the whole range is taken.
pub fn allocate_program_id<S: ProgramStore + ?Sized>(store: &S) -> Result<ProgramId, StoreError> {
    let used: BTreeSet<u16> = store
        .program_headers()?
        .iter()
        .map(|h| h.id.0)
        .collect();
    (1..u16::MAX)
        .find(|id| !used.contains(id))
        .map(ProgramId)
        .ok_or(StoreError::Exhausted)
}

/// Allocates an id, seeds the canonical empty program, and stores it.
pub fn create_program<S: ProgramStore + ?Sized>(store: &mut S) -> Result<Program, StoreError> {
    let id = allocate_program_id(store)?;
    let program = Program::seed(id);
    store.store_program(&program)?;
    Ok(program)
}

/// In-memory store; backs tests and simulations.
#[derive(Debug, Default)]
pub struct MemProgramStore {
    programs: std::collections::BTreeMap<ProgramId, Program>,
}

impl MemProgramStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgramStore for MemProgramStore {
    fn program_headers(&self) -> Result<Vec<ProgramHeader>, StoreError> {
        Ok(self.programs.values().map(|p| p.header.clone()).collect())
    }

    fn load_program(&self, id: ProgramId) -> Result<Program, StoreError> {
        self.programs
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn store_program(&mut self, program: &Program) -> Result<(), StoreError> {
        self.programs.insert(program.header.id, program.clone());
        Ok(())
    }

    fn delete_program(&mut self, id: ProgramId) -> Result<(), StoreError> {
        self.programs
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
