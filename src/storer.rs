use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::Error;

/// Document-storage collaborator. The workflow never looks inside a
/// document; it only stores and hands back opaque retrieval paths.
pub trait FileStorer {
    fn write(&self, bytes: Bytes) -> Result<String, Error>;
    fn read(&self, fetch_code: &str) -> Result<Bytes, Error>;
}

/// Stores uploads on the local disk under a single directory, named by the
/// SHA-256 of their content.
pub struct LocalStorer {
    path: String,
}

impl LocalStorer {
    pub fn new(path: &str) -> Self {
        Self { path: path.to_owned() }
    }
}

impl FileStorer for LocalStorer {
    fn write(&self, bytes: Bytes) -> Result<String, Error> {
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let name = format!("{:x}", hasher.finalize());
        let mut file = File::create(Path::new(&self.path).join(&name))?;
        file.write_all(&bytes)?;
        Ok(name)
    }

    fn read(&self, fetch_code: &str) -> Result<Bytes, Error> {
        let mut file = File::open(Path::new(&self.path).join(fetch_code))?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        Ok(Bytes::from(content))
    }
}
