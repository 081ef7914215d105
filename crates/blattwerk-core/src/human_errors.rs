// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain language with a clear suggestion.
// Severity drives how the front end presents it.

use crate::error::BlattwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Wait and try again.
    Transient,
    /// User must do something (pick another file, fix a setting).
    ActionRequired,
    /// The input cannot be used as-is.
    Permanent,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `BlattwerkError` into a `HumanError`.
pub fn humanize_error(err: &BlattwerkError) -> HumanError {
    match err {
        BlattwerkError::UnsupportedFormat(detail) => HumanError {
            message: "This type of file isn't supported.".into(),
            suggestion: format!(
                "Use a PNG or JPEG image as the template, and a PDF, Word (.docx), text, or image file as content. ({detail})"
            ),
            severity: Severity::Permanent,
        },

        BlattwerkError::DecodeError(detail) => HumanError {
            message: "The file couldn't be read.".into(),
            suggestion: format!(
                "The file may be damaged or password protected. Try re-saving it and load it again. ({detail})"
            ),
            severity: Severity::Permanent,
        },

        BlattwerkError::ExportFailed(detail) => HumanError {
            message: "The document couldn't be exported.".into(),
            suggestion: format!("Nothing was saved. Try exporting again. ({detail})"),
            severity: Severity::Transient,
        },

        BlattwerkError::ExportInProgress => HumanError {
            message: "An export is already running.".into(),
            suggestion: "Wait for it to finish, then try again.".into(),
            severity: Severity::Transient,
        },

        BlattwerkError::InvalidConfig(detail) => HumanError {
            message: "A setting has an invalid value.".into(),
            suggestion: format!("Check the configuration and try again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        BlattwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "Check the file name and location, then try again.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Permission denied.".into(),
                    suggestion: "Choose a location you are allowed to read from or write to."
                        .into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "A file error occurred.".into(),
                    suggestion: format!("Try again. ({io_err})"),
                    severity: Severity::Transient,
                }
            }
        }

        BlattwerkError::Serialization(detail) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: format!("Fix or remove the settings file. ({detail})"),
            severity: Severity::ActionRequired,
        },
    }
}
