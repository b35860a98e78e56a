//! The streaming line parser: header recognition, body classification,
//! the summary phase, and the glue between the micro-grammars and the
//! shared raster/overlay state.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::draw::{self, ScanError};
use crate::error::{FatalError, ParseWarning};
use crate::raster::Scene;
use crate::reader::{LineSource, LINE_CAP_BYTES};
use crate::shared::Shared;

/// shape of the third header line, as strftime would print it
const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Global parsing mode. Transitions only ever move forward:
/// AwaitHeader0 -> AwaitHeader1 -> AwaitHeader2 -> Body -> Summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitHeader0,
    AwaitHeader1,
    AwaitHeader2,
    Body,
    Summary,
}

/// what one delivered line amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// blank line, debug chatter, or a dropped bad line
    Skipped,
    /// one header line accepted
    HeaderAccepted,
    /// a pixel was written
    PixelDrawn,
    /// scene dimensions fixed and the planes published
    SceneFixed,
    /// the `Workspace:` sentinel moved the run into the summary phase
    SummaryEntered,
    /// a tagged summary line was captured
    SummaryRecorded,
}

pub struct Parser {
    shared: Arc<Shared>,
    phase: Phase,
}

impl Parser {
    /// `skip_header` bypasses the header recogniser entirely; the stream
    /// starts in Body (the `noheader` configuration flag)
    pub fn new(shared: Arc<Shared>, skip_header: bool) -> Self {
        let phase = if skip_header {
            Phase::Body
        } else {
            Phase::AwaitHeader0
        };
        shared.with_overlay(|overlay| overlay.phase = phase);
        Parser { shared, phase }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Drain the source end-to-end. Ok means a clean end-of-stream; a
    /// fatal error has already flipped the shared flag and been echoed to
    /// the diagnostics by the time it comes back here.
    pub fn run(&mut self, source: &mut dyn LineSource) -> Result<(), FatalError> {
        match self.run_inner(source) {
            Ok(()) => {
                self.shared.finish_without_scene();
                Ok(())
            }
            Err(fatal) => {
                self.shared.error(&fatal.to_string());
                self.shared.abort();
                Err(fatal)
            }
        }
    }

    fn run_inner(&mut self, source: &mut dyn LineSource) -> Result<(), FatalError> {
        while let Some(line) = source.next_line()? {
            if line.truncated {
                self.warn(ParseWarning::TruncatedLine(LINE_CAP_BYTES));
            }
            self.feed(&line.text)?;
        }
        Ok(())
    }

    /// process one line, newline already stripped
    pub fn feed(&mut self, line: &str) -> Result<Outcome, FatalError> {
        match self.phase {
            Phase::AwaitHeader0 => self.feed_version(line),
            Phase::AwaitHeader1 => self.feed_copyright(line),
            Phase::AwaitHeader2 => self.feed_timestamp(line),
            Phase::Body => self.feed_body(line),
            Phase::Summary => self.feed_summary(line),
        }
    }

    // header lines are the first three non-skipped lines; blanks do not
    // consume a slot

    fn feed_version(&mut self, line: &str) -> Result<Outcome, FatalError> {
        if line.trim().is_empty() {
            return Ok(Outcome::Skipped);
        }
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some("DAMSON"), Some("Version"), Some(version), None) => {
                self.shared.with_overlay(|overlay| {
                    overlay.header.version_line = format!("DAMSON Version {}", version);
                });
                self.advance(Phase::AwaitHeader1);
                Ok(Outcome::HeaderAccepted)
            }
            _ => Err(FatalError::BadVersionLine(line.to_string())),
        }
    }

    fn feed_copyright(&mut self, line: &str) -> Result<Outcome, FatalError> {
        if line.trim().is_empty() {
            return Ok(Outcome::Skipped);
        }
        if line.split_whitespace().count() < 5 {
            return Err(FatalError::BadCopyrightLine(line.to_string()));
        }
        self.shared
            .with_overlay(|overlay| overlay.header.copyright = line.to_string());
        self.advance(Phase::AwaitHeader2);
        Ok(Outcome::HeaderAccepted)
    }

    fn feed_timestamp(&mut self, line: &str) -> Result<Outcome, FatalError> {
        if line.trim().is_empty() {
            return Ok(Outcome::Skipped);
        }
        if NaiveDateTime::parse_from_str(line, TIMESTAMP_FORMAT).is_err() {
            return Err(FatalError::BadTimestampLine(line.to_string()));
        }
        self.shared
            .with_overlay(|overlay| overlay.header.timestamp = line.to_string());
        self.advance(Phase::Body);
        Ok(Outcome::HeaderAccepted)
    }

    fn feed_body(&mut self, line: &str) -> Result<Outcome, FatalError> {
        if line.trim().is_empty() {
            return Ok(Outcome::Skipped);
        }
        if line.starts_with("Timeout") {
            return Ok(Outcome::Skipped);
        }
        // the sentinel is recognised before the last-instruction update,
        // so Workspace lines never reach the overlay's instruction slot
        if line.starts_with("Workspace:") {
            self.shared
                .with_overlay(|overlay| overlay.summary.workspace = Some(line.to_string()));
            self.advance(Phase::Summary);
            return Ok(Outcome::SummaryEntered);
        }
        if line.starts_with("No file?") {
            return Err(FatalError::NoFile);
        }
        if line.len() < 6 {
            return Ok(Outcome::Skipped);
        }
        self.shared
            .with_overlay(|overlay| overlay.set_last_instruction(line));
        if let Some(at) = line.find("draw") {
            return self.handle_draw(line, at + "draw".len());
        }
        if contains_ignore_ascii_case(line, "error") {
            return Err(FatalError::DamsonError(line.to_string()));
        }
        if line.len() > 17
            && contains_ignore_ascii_case(line, "dimension")
            && contains_ignore_ascii_case(line, "scene")
        {
            return self.handle_scene(line);
        }
        Ok(Outcome::Skipped)
    }

    fn handle_draw(&mut self, line: &str, after: usize) -> Result<Outcome, FatalError> {
        let tail = &line[after..];
        let marks = match draw::scan_marks(tail) {
            Ok(marks) => marks,
            Err(ScanError::Incomplete) => return Ok(Outcome::Skipped),
            Err(ScanError::Malformed(what)) => {
                self.warn(ParseWarning::DisfiguredDraw {
                    what: what.to_string(),
                    line: line.to_string(),
                });
                return Ok(Outcome::Skipped);
            }
        };
        let Some(planes) = self.shared.planes() else {
            return Err(FatalError::DrawBeforeScene(line.to_string()));
        };
        let (x, y, r, g, b) = match draw::extract_fields(tail, &marks) {
            Ok(fields) => fields,
            Err(what) => {
                self.warn(ParseWarning::DisfiguredDraw {
                    what,
                    line: line.to_string(),
                });
                return Ok(Outcome::Skipped);
            }
        };
        let scene = planes.scene();
        // NB. the range check is inclusive of width and height, matching
        // how DAMSON emits edge pixels; the planes guard the flat index
        if x < 0 || x > scene.width as i32 || y < 0 || y > scene.height as i32 {
            self.warn(ParseWarning::OutOfRangeCoord { x, y });
            return Ok(Outcome::Skipped);
        }
        planes.set_pixel(x, y, r, g, b);
        Ok(Outcome::PixelDrawn)
    }

    fn handle_scene(&mut self, line: &str) -> Result<Outcome, FatalError> {
        match draw::scan_scene_dimensions(line) {
            Some((width, height)) => {
                if self.shared.publish_scene(Scene { width, height }) {
                    Ok(Outcome::SceneFixed)
                } else {
                    // dimensions are immutable; later directives are chatter
                    Ok(Outcome::Skipped)
                }
            }
            None => {
                self.warn(ParseWarning::BadSceneDescription(line.to_string()));
                Ok(Outcome::Skipped)
            }
        }
    }

    fn feed_summary(&mut self, line: &str) -> Result<Outcome, FatalError> {
        if line.trim().is_empty() {
            return Ok(Outcome::Skipped);
        }
        let recorded = self
            .shared
            .with_overlay(|overlay| overlay.summary.record(line));
        if recorded {
            Ok(Outcome::SummaryRecorded)
        } else {
            self.warn(ParseWarning::UnknownSummaryLine(line.to_string()));
            Ok(Outcome::Skipped)
        }
    }

    fn advance(&mut self, phase: Phase) {
        self.phase = phase;
        self.shared.with_overlay(|overlay| overlay.phase = phase);
    }

    fn warn(&self, warning: ParseWarning) {
        self.shared.warn(&warning.to_string());
    }
}

/// case-insensitive substring scan; DAMSON output is ASCII
fn contains_ignore_ascii_case(line: &str, needle: &str) -> bool {
    line.as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}
