use thiserror::Error;

/// Errors that end the run. The parser flips the shared run status to
/// aborted before returning any of these, so the presenter either never
/// opens a display or tears it down on the next frame.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("bad version banner: {0:?}")]
    BadVersionLine(String),

    #[error("bad copyright line: {0:?}")]
    BadCopyrightLine(String),

    #[error("bad timestamp line: {0:?}")]
    BadTimestampLine(String),

    /// a draw directive arrived before any scene dimensions were seen,
    /// so there is nowhere to put the pixel
    #[error("draw before scene dimensions: {0:?}")]
    DrawBeforeScene(String),

    /// DAMSON itself reported an error; the line is echoed verbatim
    #[error("DAMSON error: {0}")]
    DamsonError(String),

    /// DAMSON printed its "No file?" marker, meaning it never had input
    #[error("DAMSON could not open its own input (\"No file?\")")]
    NoFile,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Non-fatal diagnostics. The offending line is dropped, the warning goes
/// to stderr and the on-screen error ring, and parsing continues.
#[derive(Debug, Error)]
pub enum ParseWarning {
    #[error("disfigured draw call ({what}): {line:?}")]
    DisfiguredDraw { what: String, line: String },

    #[error("draw coordinate ({x}, {y}) out of range")]
    OutOfRangeCoord { x: i32, y: i32 },

    #[error("bad scene description: {0:?}")]
    BadSceneDescription(String),

    #[error("unrecognised summary line: {0:?}")]
    UnknownSummaryLine(String),

    #[error("over-long line truncated at {0} bytes")]
    TruncatedLine(usize),
}
