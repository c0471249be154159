// SPDX-License-Identifier: Apache-2.0
//! Filesystem-backed `ProgramStore` (one JSON document per program id).

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use tracing::{debug, warn};

use atelier_program::{Program, ProgramHeader, ProgramId};

use crate::{ProgramStore, StoreError};

/// Store programs as JSON files under a base directory.
#[derive(Debug)]
pub struct FsProgramStore {
    base: PathBuf,
}

impl FsProgramStore {
    /// Create a store rooted at the user data directory (e.g.,
    /// `~/.local/share/Atelier/programs`).
    pub fn new() -> Result<Self, StoreError> {
        let proj = ProjectDirs::from("dev", "atelier-robotics", "Atelier")
            .ok_or_else(|| StoreError::Other("could not resolve data dir".into()))?;
        Self::with_base(proj.data_dir().join("programs"))
    }

    /// Create a store rooted at an explicit directory.
    pub fn with_base(base: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    fn path_for(&self, id: ProgramId) -> PathBuf {
        self.base.join(format!("{id}.json"))
    }
}

impl ProgramStore for FsProgramStore {
    fn program_headers(&self) -> Result<Vec<ProgramHeader>, StoreError> {
        let mut headers = Vec::new();
        for entry in fs::read_dir(&self.base)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path)?;
            match serde_json::from_slice::<Program>(&bytes) {
                Ok(program) => headers.push(program.header),
                Err(err) => {
                    // A corrupt document must not hide the rest of the store.
                    warn!(path = %path.display(), %err, "skipping unreadable program document");
                }
            }
        }
        headers.sort_by_key(|h| h.id);
        Ok(headers)
    }

    fn load_program(&self, id: ProgramId) -> Result<Program, StoreError> {
        let path = self.path_for(id);
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id));
            }
            Err(err) => return Err(StoreError::Io(err)),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn store_program(&mut self, program: &Program) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(program)?;
        fs::write(self.path_for(program.header.id), data)?;
        debug!(id = %program.header.id, "stored program");
        Ok(())
    }

    fn delete_program(&mut self, id: ProgramId) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => {
                debug!(%id, "deleted program");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound(id)),
            Err(err) => Err(StoreError::Io(err)),
        }
    }
}
