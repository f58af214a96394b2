use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{errors::AppResult, resolver};

/// Files written by `/setup-sample`, relative to the root.
pub const SAMPLES: &[(&str, &str)] = &[
    ("hello.txt", "Hello from safe file!\n"),
    ("notes/readme.md", "# Readme\nSample readme file"),
];

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("file not found")]
    NotFound,
    #[error("is a directory")]
    IsDirectory,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReadError {
    fn classify(err: std::io::Error) -> Self {
        match err.kind() {
            ErrorKind::NotFound | ErrorKind::NotADirectory => ReadError::NotFound,
            ErrorKind::IsADirectory => ReadError::IsDirectory,
            _ => ReadError::Io(err),
        }
    }
}

/// Read a resolved path with one open-and-read; the error is the existence check.
pub async fn read_text(path: &Path) -> Result<String, ReadError> {
    let data = tokio::fs::read(path).await.map_err(ReadError::classify)?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// UNSAFE: checks existence, then reads in a second call. The file can be
/// swapped between the two. Kept next to [`read_text`] for comparison.
pub async fn read_unchecked(path: &Path) -> Result<String, ReadError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(ReadError::NotFound);
    }
    let data = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Write `content` to `relative` under `root`, going through the same resolver
/// as reads so a sample can never land outside the root.
pub async fn write_sample(root: &Path, relative: &str, content: &str) -> AppResult<PathBuf> {
    let full = resolver::resolve(root, relative)?;
    if let Some(parent) = full.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(ReadError::from)?;
    }
    tokio::fs::write(&full, content).await.map_err(ReadError::from)?;
    Ok(full)
}

pub async fn write_samples(root: &Path) -> AppResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(SAMPLES.len());
    for (relative, content) in SAMPLES {
        written.push(write_sample(root, relative, content).await?);
    }
    Ok(written)
}
