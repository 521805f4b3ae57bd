// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people printing their own proxies.
//
// Every technical error is mapped to plain English with a clear suggestion.

use crate::error::CardsheetError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Only one card was affected; the sheet still printed.
    Recovered,
    /// Trying again later may work (service down, network blip).
    Transient,
    /// The input or settings must be changed first.
    ActionRequired,
    /// A bug or an unwritable destination.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    pub severity: Severity,
}

fn human(message: impl Into<String>, suggestion: impl Into<String>, severity: Severity) -> HumanError {
    HumanError {
        message: message.into(),
        suggestion: suggestion.into(),
        severity,
    }
}

/// Convert a `CardsheetError` into a `HumanError`.
pub fn humanize_error(err: &CardsheetError) -> HumanError {
    match err {
        CardsheetError::Config(detail) => human(
            format!("Some settings don't make sense: {detail}"),
            "Check your layout file and print settings, then try again.",
            Severity::ActionRequired,
        ),

        CardsheetError::InvalidPosition(pos) => human(
            format!("Tried to place a card in slot {pos}, but a sheet only has 9 slots."),
            "This is a bug. Please report it with the layout file you used.",
            Severity::Permanent,
        ),

        CardsheetError::ImageLoad { url, .. } => human(
            format!("One card image couldn't be downloaded ({url})."),
            "A grey placeholder was printed in its place. Check the link or try again later.",
            Severity::Recovered,
        ),

        CardsheetError::EnhancementUnavailable(_) => human(
            "The image upscaler isn't running.",
            "Start the local enhancement service, or turn upscaling off. Your sheets were printed with the original images.",
            Severity::Transient,
        ),

        CardsheetError::Enhancement { url, .. } => human(
            format!("One card couldn't be upscaled ({url})."),
            "The original image was used instead.",
            Severity::Recovered,
        ),

        CardsheetError::Encoding(_) => human(
            "We couldn't produce the output file.",
            "Try a lower DPI or a different output format.",
            Severity::Permanent,
        ),

        CardsheetError::Cancelled => human(
            "The export was cancelled.",
            "Start it again when you're ready.",
            Severity::Transient,
        ),

        CardsheetError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => human(
                "A file couldn't be found.",
                "Check the path to your layout file and output folder.",
                Severity::ActionRequired,
            ),
            std::io::ErrorKind::PermissionDenied => human(
                "We're not allowed to write there.",
                "Choose a different output folder.",
                Severity::ActionRequired,
            ),
            _ => human(
                "Something went wrong reading or writing a file.",
                "Make sure the disk isn't full and try again.",
                Severity::Transient,
            ),
        },

        CardsheetError::Serialization(_) => human(
            "The layout file isn't valid JSON.",
            "Re-export the card list and try again.",
            Severity::ActionRequired,
        ),
    }
}
