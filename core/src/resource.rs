use crate::error::LoadError;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

pub const RECIPES_FILE: &str = "Recipes.json";
pub const CATALOG_FILE: &str = "ing.json";

/// Locations of the bundled datasets inside a data directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub root: PathBuf,
    recipes_file: String,
    catalog_file: String,
}

impl DataPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            recipes_file: RECIPES_FILE.to_string(),
            catalog_file: CATALOG_FILE.to_string(),
        }
    }

    pub fn with_recipes_file(mut self, name: impl Into<String>) -> Self {
        self.recipes_file = name.into();
        self
    }

    pub fn with_catalog_file(mut self, name: impl Into<String>) -> Self {
        self.catalog_file = name.into();
        self
    }

    pub fn recipes(&self) -> PathBuf { self.root.join(&self.recipes_file) }
    pub fn catalog(&self) -> PathBuf { self.root.join(&self.catalog_file) }
}

/// Open a dataset for reading. A missing file is `ResourceNotFound`, not an I/O error.
pub fn open_resource(path: &Path) -> Result<BufReader<File>, LoadError> {
    match File::open(path) {
        Ok(f) => Ok(BufReader::new(f)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(LoadError::ResourceNotFound { path: path.to_path_buf() })
        }
        Err(source) => Err(LoadError::Io { path: path.to_path_buf(), source }),
    }
}
