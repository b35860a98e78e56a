use std::io;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::display::{Display, FrameView};
use crate::input::{Command, Input};
use crate::parser::Parser;
use crate::reader::LineSource;
use crate::shared::{RunStatus, Shared};
use crate::snapshot;

/// presenter cadence; the activity overlay decays once per frame at this
/// rate while it is enabled
pub const FRAME_RATE_HZ: u32 = 60;

/// how the presenter loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentEnd {
    /// the user asked to leave
    Quit,
    /// the parser hit a fatal error while the window was up
    Aborted,
}

/// Owns the shared state and wires the parser worker to the presenter.
/// The worker is detached: Quit ends the process without joining it.
pub struct Controller {
    shared: Arc<Shared>,
}

impl Controller {
    pub fn new() -> Controller {
        Controller {
            shared: Arc::new(Shared::new()),
        }
    }

    pub fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    /// start the line reader and parser end-to-end on a worker thread
    pub fn spawn_parser(
        &self,
        mut source: Box<dyn LineSource + Send>,
        skip_header: bool,
    ) -> Result<(), io::Error> {
        let shared = Arc::clone(&self.shared);
        thread::Builder::new()
            .name("damson-parser".to_string())
            .spawn(move || {
                let mut parser = Parser::new(shared, skip_header);
                // the run result has already been reported and flagged
                let _ = parser.run(source.as_mut());
            })?;
        Ok(())
    }

    /// Block until the parser either publishes a scene, finishes without
    /// one, or aborts.
    pub fn wait_for_scene(&self) -> RunStatus {
        loop {
            match self.shared.status() {
                RunStatus::Parsing => spin_sleep::sleep(Duration::from_millis(1)),
                status => return status,
            }
        }
    }

    /// The presenter main loop. Assumes the scene is already published.
    /// Runs until Quit or a late fatal error; the parser finishing cleanly
    /// keeps the last frame on screen.
    pub fn present(
        &self,
        display: &mut dyn Display,
        input: &mut dyn Input,
    ) -> Result<PresentEnd, io::Error> {
        self.present_at(display, input, Path::new(snapshot::SNAPSHOT_PATH))
    }

    /// as [`present`](Self::present), with the snapshot target injectable
    pub fn present_at(
        &self,
        display: &mut dyn Display,
        input: &mut dyn Input,
        snapshot_path: &Path,
    ) -> Result<PresentEnd, io::Error> {
        let frame_budget = Duration::from_nanos(1_000_000_000 / FRAME_RATE_HZ as u64);
        let mut show_activity = true;
        let mut show_info = false;

        loop {
            let frame_start = Instant::now();
            if self.shared.status() == RunStatus::Aborted {
                return Ok(PresentEnd::Aborted);
            }
            let Some(planes) = self.shared.planes() else {
                return Ok(PresentEnd::Aborted);
            };

            for command in input.poll_commands()? {
                match command {
                    Command::ToggleActivity => show_activity = !show_activity,
                    Command::ToggleInfo => show_info = !show_info,
                    Command::Snapshot => {
                        if let Err(e) = snapshot::save_colour_plane(planes, snapshot_path) {
                            self.shared.error(&format!("snapshot failed: {}", e));
                        }
                    }
                    Command::Quit => return Ok(PresentEnd::Quit),
                }
            }

            if show_activity {
                planes.decay_tick();
            }

            let overlay = self.shared.overlay_snapshot();
            display.draw(&FrameView {
                planes,
                overlay: &overlay,
                show_activity,
                show_info,
            })?;

            let elapsed = frame_start.elapsed();
            if elapsed < frame_budget {
                spin_sleep::sleep(frame_budget - elapsed);
            }
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DummyDisplay;
    use crate::input::DummyInput;
    use crate::raster::activity_alpha;
    use crate::reader::PipeSource;

    fn run_script(script: &'static str) -> Controller {
        let controller = Controller::new();
        controller
            .spawn_parser(Box::new(PipeSource::new(script.as_bytes())), true)
            .unwrap();
        controller
    }

    #[test]
    fn test_wait_reports_scene() {
        let controller = run_script("Scene Dimensions 4 4\ndraw(1, 2) = 1.0 0.0 0.0\n");
        assert_eq!(controller.wait_for_scene(), RunStatus::SceneReady);
    }

    #[test]
    fn test_wait_reports_abort() {
        let controller = run_script("draw(0, 0) = 0 0 0\n");
        assert_eq!(controller.wait_for_scene(), RunStatus::Aborted);
    }

    #[test]
    fn test_wait_reports_sceneless_finish() {
        let controller = run_script("nothing to draw here\n");
        assert_eq!(controller.wait_for_scene(), RunStatus::Finished);
    }

    #[test]
    fn test_present_quits_on_command() {
        let controller = run_script("Scene Dimensions 2 2\n");
        assert_eq!(controller.wait_for_scene(), RunStatus::SceneReady);
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(vec![vec![], vec![Command::Quit]]);
        let end = controller.present(&mut display, &mut input).unwrap();
        assert_eq!(end, PresentEnd::Quit);
        assert_eq!(display.frames, 1);
    }

    #[test]
    fn test_activity_decays_once_per_frame() {
        let controller = run_script("Scene Dimensions 2 2\ndraw(0, 0) = 1 1 1\n");
        assert_eq!(controller.wait_for_scene(), RunStatus::SceneReady);
        // give the draw line a moment to land
        while activity_alpha(controller.shared().planes().unwrap().activity_at(0)) == 0 {
            spin_sleep::sleep(Duration::from_millis(1));
        }
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(vec![vec![], vec![], vec![], vec![Command::Quit]]);
        controller.present(&mut display, &mut input).unwrap();
        let alpha = activity_alpha(controller.shared().planes().unwrap().activity_at(0));
        assert_eq!(alpha, 255 - 3);
    }

    #[test]
    fn test_toggled_off_overlay_stops_decay() {
        let controller = run_script("Scene Dimensions 2 2\ndraw(0, 0) = 1 1 1\n");
        assert_eq!(controller.wait_for_scene(), RunStatus::SceneReady);
        while activity_alpha(controller.shared().planes().unwrap().activity_at(0)) == 0 {
            spin_sleep::sleep(Duration::from_millis(1));
        }
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(vec![
            vec![Command::ToggleActivity],
            vec![],
            vec![Command::Quit],
        ]);
        controller.present(&mut display, &mut input).unwrap();
        assert_eq!(
            activity_alpha(controller.shared().planes().unwrap().activity_at(0)),
            255
        );
    }

    #[test]
    fn test_snapshot_command_writes_png() {
        let controller = run_script("Scene Dimensions 2 2\ndraw(0, 0) = 1 0 0\n");
        assert_eq!(controller.wait_for_scene(), RunStatus::SceneReady);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.png");
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(vec![vec![Command::Snapshot], vec![Command::Quit]]);
        controller
            .present_at(&mut display, &mut input, &path)
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_present_reports_late_abort() {
        // scene first, then a DAMSON error; depending on timing the abort
        // may land before or after the wait returns
        let controller = run_script("Scene Dimensions 2 2\nnode 1 hit an error state\n");
        assert_ne!(controller.wait_for_scene(), RunStatus::Finished);
        let mut display = DummyDisplay::new();
        // never quit; the abort has to end the loop
        let mut input = DummyInput::new(vec![vec![]; 1000]);
        let end = controller.present(&mut display, &mut input).unwrap();
        assert_eq!(end, PresentEnd::Aborted);
    }
}
