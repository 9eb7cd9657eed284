//! Session-level error classification.
//!
//! Every call into the serial device service ends in one of four failure
//! classes. The class decides the diagnostic prefix and the process exit
//! code; nothing here terminates the process.

use crate::config::ConfigError;
use crate::port::PortError;
use std::fmt;
use thiserror::Error;

/// The step of a session that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    List,
    Resolve,
    Open,
    SetBaudRate,
    SetDataBits,
    SetParity,
    SetStopBits,
    SetFlowControl,
    Write,
    Read,
    Close,
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::List => "list ports",
            Self::Resolve => "resolve port",
            Self::Open => "open port",
            Self::SetBaudRate => "set baud rate",
            Self::SetDataBits => "set data bits",
            Self::SetParity => "set parity",
            Self::SetStopBits => "set stop bits",
            Self::SetFlowControl => "set flow control",
            Self::Write => "write",
            Self::Read => "read",
            Self::Close => "close port",
            Self::Report => "report",
        };
        f.write_str(s)
    }
}

/// Failure classes of the serial device service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    InvalidArgument,
    Failed,
    Unsupported,
    OutOfMemory,
}

impl ErrorClass {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Failed => 1,
            Self::InvalidArgument => 2,
            Self::Unsupported => 3,
            Self::OutOfMemory => 4,
        }
    }
}

impl From<&PortError> for ErrorClass {
    fn from(err: &PortError) -> Self {
        match err {
            PortError::NotFound(_) | PortError::InvalidInput(_) | PortError::NotOpenFor(_) => {
                Self::InvalidArgument
            }
            PortError::Unsupported(_) => Self::Unsupported,
            PortError::Io(e) if e.kind() == std::io::ErrorKind::OutOfMemory => Self::OutOfMemory,
            PortError::AccessDenied(_)
            | PortError::Unavailable(_)
            | PortError::Io(_)
            | PortError::Serial(_) => Self::Failed,
        }
    }
}

/// A classified failure, tagged with the step it happened in.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Error: Invalid argument. ({stage}: {detail})")]
    InvalidArgument { stage: Stage, detail: String },

    #[error("Error: Failed: {message} ({stage})")]
    Failed { stage: Stage, message: String },

    #[error("Error: Not supported. ({stage}: {detail})")]
    Unsupported { stage: Stage, detail: String },

    #[error("Error: Couldn't allocate memory. ({stage})")]
    OutOfMemory { stage: Stage },
}

impl SessionError {
    /// Classify a service failure.
    pub fn from_port(stage: Stage, err: PortError) -> Self {
        match ErrorClass::from(&err) {
            ErrorClass::InvalidArgument => Self::InvalidArgument {
                stage,
                detail: err.to_string(),
            },
            ErrorClass::Failed => Self::Failed {
                stage,
                message: err.to_string(),
            },
            ErrorClass::Unsupported => Self::Unsupported {
                stage,
                detail: err.to_string(),
            },
            ErrorClass::OutOfMemory => Self::OutOfMemory { stage },
        }
    }

    pub fn invalid_argument(stage: Stage, detail: impl Into<String>) -> Self {
        Self::InvalidArgument {
            stage,
            detail: detail.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidArgument { .. } => ErrorClass::InvalidArgument,
            Self::Failed { .. } => ErrorClass::Failed,
            Self::Unsupported { .. } => ErrorClass::Unsupported,
            Self::OutOfMemory { .. } => ErrorClass::OutOfMemory,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::InvalidArgument { stage, .. }
            | Self::Failed { stage, .. }
            | Self::Unsupported { stage, .. }
            | Self::OutOfMemory { stage } => *stage,
        }
    }
}

/// Adapter for `map_err` at each service call site.
pub fn check(stage: Stage) -> impl FnOnce(PortError) -> SessionError {
    move |err| SessionError::from_port(stage, err)
}

/// Anything that ends the program early.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error: Invalid argument. ({0})")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Error: Failed: {0} (report)")]
    Output(#[from] std::io::Error),

    #[error("Error: Failed: {0} (report)")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => ErrorClass::InvalidArgument.exit_code(),
            Self::Session(e) => e.class().exit_code(),
            Self::Output(_) | Self::Json(_) => ErrorClass::Failed.exit_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::Direction;
    use std::io;

    #[test]
    fn test_classification_table() {
        let cases = vec![
            (PortError::not_found("X"), ErrorClass::InvalidArgument),
            (PortError::invalid_input("bad"), ErrorClass::InvalidArgument),
            (PortError::NotOpenFor(Direction::Read), ErrorClass::InvalidArgument),
            (PortError::unsupported("baud"), ErrorClass::Unsupported),
            (PortError::AccessDenied("X".into()), ErrorClass::Failed),
            (PortError::Unavailable("X".into()), ErrorClass::Failed),
            (
                PortError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone")),
                ErrorClass::Failed,
            ),
            (
                PortError::Io(io::Error::new(io::ErrorKind::OutOfMemory, "oom")),
                ErrorClass::OutOfMemory,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ErrorClass::from(&err), expected, "for {err}");
        }
    }

    #[test]
    fn test_diagnostics() {
        let err = SessionError::from_port(Stage::Resolve, PortError::not_found("X"));
        assert_eq!(
            err.to_string(),
            "Error: Invalid argument. (resolve port: Serial port not found: X)"
        );

        let err = SessionError::from_port(Stage::Open, PortError::Unavailable("X: busy".into()));
        assert_eq!(
            err.to_string(),
            "Error: Failed: Device unavailable: X: busy (open port)"
        );

        let err = SessionError::OutOfMemory { stage: Stage::Read };
        assert_eq!(err.to_string(), "Error: Couldn't allocate memory. (read)");
    }

    #[test]
    fn test_exit_codes() {
        let err = SessionError::from_port(Stage::SetBaudRate, PortError::unsupported("baud"));
        assert_eq!(err.class(), ErrorClass::Unsupported);
        assert_eq!(err.stage(), Stage::SetBaudRate);
        assert_eq!(AppError::from(err).exit_code(), 3);

        let err = AppError::from(ConfigError::validation("serial.baud_rate", "must be > 0"));
        assert_eq!(err.exit_code(), 2);
    }
}
