//! ## Design
//!
//! * consume DAMSON's textual output line by line; recognise the handful
//!   of structured directives, log everything else
//! * a global parsing mode-machine: header, then body, then the summary
//!   after the `Workspace:` sentinel; transitions only move forward
//! * two pixel planes, allocated once when the scene directive fixes the
//!   dimensions: persistent colour, plus a green activity layer whose
//!   alpha decays one step per presenter frame
//! * abstract display and input behind traits so alternatives plug in;
//!   starting with TUI in-console, dummies for tests
//! * two threads: the reader+parser drains the stream end-to-end on a
//!   worker while the presenter polls a shared status flag (-1 aborted,
//!   0 parsing, 1 scene known); the 0 -> 1 flip publishes the planes
//! * word-sized relaxed pixel traffic; a torn frame costs nothing, the
//!   next one is fine
//!
//! Model
//!
//! Controller
//!  |-- shared state (status flag, planes, overlay)
//!  |-- parser worker
//!  |    |-- line source (file, or pipe with EOF retries)
//!  |    |-- header recogniser, body classifier, summary collector
//!  |    `-- draw / scene micro-grammars
//!  `-- presenter loop
//!       |-- poll commands (A activity, I info, S snapshot, Q quit)
//!       |-- decay activity once per frame while enabled
//!       `-- draw colour + activity + info overlay

pub mod controller;
pub mod display;
pub mod draw;
pub mod error;
pub mod input;
pub mod overlay;
pub mod parser;
pub mod raster;
pub mod reader;
pub mod shared;
pub mod snapshot;
