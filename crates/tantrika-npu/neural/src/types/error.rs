// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for network assembly and simulation

use std::path::PathBuf;

/// Error types for tantrika operations
///
/// Every variant except [`TantrikaError::NotImplemented`] and [`TantrikaError::Io`] is a
/// configuration error: it is raised by the assembly/wiring call that caused it and the
/// simulation must not proceed past it.
#[derive(Debug, thiserror::Error)]
pub enum TantrikaError {
    #[error("Invalid clock period {0}s: must be finite and > 0")]
    InvalidClockPeriod(f64),

    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Invalid element path '{0}': paths must be non-empty and must not contain whitespace, '[', ']' or '.'")]
    InvalidPath(String),

    #[error("Duplicate element path: {0}")]
    DuplicatePath(String),

    #[error("Unknown element path: {0}")]
    UnknownPath(String),

    #[error("Element {path} is a {actual}, expected a {expected}")]
    WrongElementType {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Element {path} ({element_type}) has no port named '{port}'")]
    UnknownPort {
        path: String,
        element_type: &'static str,
        port: String,
    },

    #[error("Port {path}.{port} is an {actual} port, expected an {expected} port")]
    WrongPortDirection {
        path: String,
        port: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Input port {0} is already bound")]
    PortAlreadyBound(String),

    #[error("Signal {source_signal} is already bound to input port {target}")]
    DuplicateBinding {
        source_signal: String,
        target: String,
    },

    #[error("Port kind mismatch: {source_port} ({source_kind}) cannot drive {target_port} ({target_kind})")]
    PortKindMismatch {
        source_port: String,
        source_kind: &'static str,
        target_port: String,
        target_kind: &'static str,
    },

    #[error("Index {index} out of range for {path} of size {size}")]
    IndexOutOfRange { path: String, index: usize, size: usize },

    #[error("Group size mismatch: {source_path} has {source_size} members, {target_path} has {target_size}")]
    GroupSizeMismatch {
        source_path: String,
        source_size: usize,
        target_path: String,
        target_size: usize,
    },

    #[error("Cannot change {parameter} of {path} after the simulation has started")]
    MutationAfterStart {
        path: String,
        parameter: &'static str,
    },

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TantrikaError {
    /// Configuration errors are raised at the assembly call that caused them.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::NotImplemented(_) | Self::Io { .. })
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented(_))
    }

    /// Process exit code used by the command-line tools.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotImplemented(_) => 2,
            Self::Io { .. } => 3,
            _ => 1,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = core::result::Result<T, TantrikaError>;
pub type Error = TantrikaError;
