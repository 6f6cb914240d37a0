//! # Command script interpreter
//!
//! This module provides an interpreter for timestamped command scripts,
//! allowing operator commands to be replayed without anyone at the keyboard.
//!
//! A script is a sequence of entries of the form
//!
//! ```text
//! <time_s>: <json>;
//! ```
//!
//! where `<json>` deserialises into the command type `C`. Entries may span
//! several lines; anything after a `#` at the start of a line is ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
struct Entry<C> {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The command to run
    cmd: C,
}

/// A script interpreter.
///
/// After loading a script use `get_pending` each cycle to acquire the
/// commands that are due.
pub struct ScriptInterpreter<C> {
    entries: VecDeque<Entry<C>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("Script contains an invalid timestamp: {0}. Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid command at {0} s: {1}")]
    InvalidCmd(f64, serde_json::Error),

    #[error("Script entries must be in time order, found {1} s after {0} s")]
    OutOfOrder(f64, f64),
}

/// Result of polling the interpreter for due commands.
#[derive(Debug, PartialEq)]
pub enum PendingCmds<C> {
    None,
    Some(Vec<C>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C> ScriptInterpreter<C>
where
    C: DeserializeOwned,
{
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let script = fs::read_to_string(script_path).map_err(ScriptError::ScriptLoadError)?;

        Self::from_script(&script)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script(script: &str) -> Result<Self, ScriptError> {
        // Strip comment lines before matching so they can contain anything
        let stripped: String = script
            .lines()
            .filter(|l| !l.trim_start().starts_with('#'))
            .collect::<Vec<_>>()
            .join("\n");

        let re = RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .expect("Script regex is invalid");

        let mut entries: VecDeque<Entry<C>> = VecDeque::new();

        for cap in re.captures_iter(&stripped) {
            let time_str = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}: {}", time_str, e)))?;

            if let Some(prev) = entries.back() {
                if exec_time_s < prev.exec_time_s {
                    return Err(ScriptError::OutOfOrder(prev.exec_time_s, exec_time_s));
                }
            }

            let payload = cap.get(3).map(|m| m.as_str()).unwrap_or_default();
            let cmd: C = serde_json::from_str(payload)
                .map_err(|e| ScriptError::InvalidCmd(exec_time_s, e))?;

            entries.push_back(Entry { exec_time_s, cmd });
        }

        if entries.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(ScriptInterpreter { entries })
    }

    /// Return the commands whose execution time is at or before
    /// `current_time_s`, in script order.
    pub fn get_pending(&mut self, current_time_s: f64) -> PendingCmds<C> {
        if self.entries.is_empty() {
            return PendingCmds::EndOfScript;
        }

        let mut cmds: Vec<C> = vec![];

        while self
            .entries
            .front()
            .map_or(false, |e| e.exec_time_s <= current_time_s)
        {
            if let Some(e) = self.entries.pop_front() {
                cmds.push(e.cmd);
            }
        }

        if cmds.is_empty() {
            PendingCmds::None
        } else {
            PendingCmds::Some(cmds)
        }
    }

    /// Get the number of commands remaining in the script
    pub fn get_num_cmds(&self) -> usize {
        self.entries.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.entries.back() {
            Some(e) => e.exec_time_s,
            None => 0f64,
        }
    }
}
