//! Struct archiving functionality
//!
//! To add archiving functionality to a struct implement the `Archived` trait,
//! backed by one or more `Archiver`s which write headered CSV files into the
//! session's archive directory.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
///
/// The default archiver is not attached to any file and will refuse to
/// serialise records.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while archiving.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Could not create the archive file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not write the archive record: {0}")]
    Csv(#[from] csv::Error),

    #[error("The archiver has not been attached to a file")]
    NotInit,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A trait which enables a struct to be archived as CSV.
///
/// Implementors hold an `Archiver` member, set up from the session with
/// `init_archives` before the first call to `write`.
pub trait Archived {
    /// Create the archive files for this struct within the session.
    fn init_archives(&mut self, session: &Session) -> Result<(), ArchiveError>;

    /// Write the current state of this struct into its archives.
    fn write(&mut self) -> Result<(), ArchiveError>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a path relative to the session's archive
    /// root, creating any missing parent directories.
    pub fn from_path<P: AsRef<Path>>(session: &Session, path: P) -> Result<Self, ArchiveError> {
        Self::create(session.arch_root.join(path))
    }

    /// Create a new archiver writing to an absolute path. Any existing file is
    /// truncated.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;

        let w = WriterBuilder::new().has_headers(true).from_writer(file);

        Ok(Self { writer: Some(w) })
    }

    /// Returns true if the archiver is attached to a file.
    pub fn is_init(&self) -> bool {
        self.writer.is_some()
    }

    /// Serialise a record into the archive.
    ///
    /// The record must be flat (no nested sequences or structs) for the header
    /// row to be written.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), ArchiveError> {
        match self.writer {
            Some(ref mut w) => {
                w.serialize(record)?;
                w.flush()?;
                Ok(())
            }
            None => Err(ArchiveError::NotInit),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        time_s: f64,
        demand_deg: f64,
        ball_x: Option<f64>,
    }

    #[test]
    fn test_serialise() {
        let path = std::env::temp_dir()
            .join(format!("util_archive_test_{}", std::process::id()))
            .join("sample.csv");

        let mut arch = Archiver::create(&path).unwrap();
        assert!(arch.is_init());

        arch.serialise(Sample {
            time_s: 0.5,
            demand_deg: 45.0,
            ball_x: Some(320.0),
        })
        .unwrap();
        arch.serialise(Sample {
            time_s: 1.0,
            demand_deg: 46.5,
            ball_x: None,
        })
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["time_s,demand_deg,ball_x", "0.5,45.0,320.0", "1.0,46.5,"]);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_uninit() {
        let mut arch = Archiver::default();
        assert!(!arch.is_init());
        match arch.serialise(1.0f64) {
            Err(ArchiveError::NotInit) => (),
            r => panic!("Expected NotInit, got {:?}", r),
        }
    }
}
