// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

const EIO: i32 = 5;
const ENODEV: i32 = 19;
const EINVAL: i32 = 22;

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Resource unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TriggerError {
    /// Negative errno a device-style collaborator reports for this failure.
    pub fn errno(&self) -> i32 {
        match self {
            TriggerError::InvalidArgument(_) => -EINVAL,
            TriggerError::Unavailable(_) => -ENODEV,
            TriggerError::Configuration(_) | TriggerError::Io(_) | TriggerError::Other(_) => -EIO,
        }
    }
}

pub type Result<T> = std::result::Result<T, TriggerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(TriggerError::InvalidArgument("x".into()).errno(), -22);
        assert_eq!(TriggerError::Unavailable("x".into()).errno(), -19);
        assert_eq!(TriggerError::Configuration("x".into()).errno(), -5);
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::other("boom");
        let err: TriggerError = io.into();
        assert!(matches!(err, TriggerError::Io(_)));
        assert!(err.to_string().contains("boom"));
    }
}
