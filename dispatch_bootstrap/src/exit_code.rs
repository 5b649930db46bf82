// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Management
//!
//! Standardized Unix exit codes following BSD `sysexits.h` conventions.

use std::fmt;

/// Exit codes following Unix conventions (BSD sysexits.h)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    #[default]
    Success = 0,
    Error = 1,
    UsageError = 64,
    DataError = 65,
    NoInput = 66,
    Unavailable = 69,
    Software = 70,
    OsError = 71,
    IoError = 74,
    TempFail = 75,
    NoPerm = 77,
    Config = 78,
    Interrupted = 130,
    Terminated = 143,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a [`dispatch_domain::DispatchError`] to an exit code. Transient
    /// errors (store unavailable) map distinctly from configuration and
    /// usage mistakes so operators can tell "retry me" from "fix my flags"
    /// at a glance.
    pub fn from_dispatch_error(error: &dispatch_domain::DispatchError) -> Self {
        use dispatch_domain::DispatchError::*;
        match error {
            StoreUnavailable(_) => ExitCode::TempFail,
            ModelUnavailable(_) => ExitCode::Unavailable,
            Validation(_) => ExitCode::UsageError,
            Internal(_) => ExitCode::Software,
            _ => ExitCode::Error,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::Error => "General error",
            ExitCode::UsageError => "Command line usage error",
            ExitCode::DataError => "Data format error",
            ExitCode::NoInput => "Cannot open input",
            ExitCode::Unavailable => "Service unavailable",
            ExitCode::Software => "Internal software error",
            ExitCode::OsError => "System error",
            ExitCode::IoError => "I/O error",
            ExitCode::TempFail => "Temporary failure, retry",
            ExitCode::NoPerm => "Permission denied",
            ExitCode::Config => "Configuration error",
            ExitCode::Interrupted => "Interrupted by signal (SIGINT)",
            ExitCode::Terminated => "Terminated by signal (SIGTERM)",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn is_signal(self) -> bool {
        matches!(self, ExitCode::Interrupted | ExitCode::Terminated)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

/// Map a process-level `Result` to a process exit code.
pub fn result_to_exit_code<E: std::fmt::Display>(result: Result<(), E>) -> std::process::ExitCode {
    match result {
        Ok(()) => std::process::ExitCode::from(ExitCode::Success.as_i32() as u8),
        Err(e) => {
            tracing::error!("fatal error: {e}");
            std::process::ExitCode::from(ExitCode::Error.as_i32() as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::Error.as_i32(), 1);
        assert_eq!(ExitCode::UsageError.as_i32(), 64);
        assert_eq!(ExitCode::Config.as_i32(), 78);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
        assert_eq!(ExitCode::Terminated.as_i32(), 143);
    }

    #[test]
    fn test_is_success() {
        assert!(ExitCode::Success.is_success());
        assert!(!ExitCode::Error.is_success());
    }

    #[test]
    fn test_is_signal() {
        assert!(ExitCode::Interrupted.is_signal());
        assert!(!ExitCode::Success.is_signal());
    }

    #[test]
    fn test_default() {
        assert_eq!(ExitCode::default(), ExitCode::Success);
    }

    #[test]
    fn dispatch_error_mapping() {
        use dispatch_domain::DispatchError;
        assert_eq!(
            ExitCode::from_dispatch_error(&DispatchError::StoreUnavailable("down".into())),
            ExitCode::TempFail
        );
        assert_eq!(
            ExitCode::from_dispatch_error(&DispatchError::Validation("bad".into())),
            ExitCode::UsageError
        );
    }
}
