use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::database::DatabaseConnection;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path for a translated book
    // @format: {output_dir}/[{YYYY-mm-dd_HH-MM-SS}]{file name}
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        time: DateTime<Local>,
    ) -> PathBuf {
        let file_name = input_file
            .as_ref()
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "book".to_string());

        let output_filename = format!("[{}]{}", time.format("%Y-%m-%d_%H-%M-%S"), file_name);
        output_dir.as_ref().join(output_filename)
    }

    /// SHA-256 of a file's content as lowercase hex
    pub fn hash_file<P: AsRef<Path>>(path: P) -> Result<String> {
        let path = path.as_ref();
        let mut file = fs::File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;

        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];
        loop {
            let read = file
                .read(&mut buffer)
                .with_context(|| format!("Failed to read file: {:?}", path))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hasher
            .finalize()
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect())
    }

    // @returns: Default cache file of a book, keyed by its content hash
    pub fn default_cache_path<P: AsRef<Path>>(book: P) -> Result<PathBuf> {
        let hash = Self::hash_file(book)?;
        DatabaseConnection::default_database_path(&format!("{}.db", hash))
    }
}
