use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use damsonparser::controller::{Controller, PresentEnd};
use damsonparser::display::TermDisplay;
use damsonparser::input::TermInput;
use damsonparser::reader::{FileSource, LineSource, PipeSource};
use damsonparser::shared::RunStatus;

#[derive(Debug, Parser)]
#[command(name = "damsonparser")]
#[command(about = "Draws the pixel output of a DAMSON run", version)]
struct Cli {
    /// captured DAMSON output to read; stdin is used when absent
    #[arg(short, long)]
    filename: Option<PathBuf>,

    /// the stream carries no version/copyright/timestamp header
    #[arg(long)]
    noheader: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    println!("DAMSON Parser {}", env!("CARGO_PKG_VERSION"));

    let source: Box<dyn LineSource + Send> = match &cli.filename {
        Some(path) => Box::new(
            FileSource::open(path)
                .with_context(|| format!("cannot open {}", path.display()))?,
        ),
        None => {
            if io::stdin().is_terminal() {
                println!("No input file specified");
                return Ok(());
            }
            Box::new(PipeSource::new(io::stdin()))
        }
    };

    let controller = Controller::new();
    controller
        .spawn_parser(source, cli.noheader)
        .context("failed to start the parser worker")?;

    match controller.wait_for_scene() {
        RunStatus::Aborted => std::process::exit(1),
        RunStatus::Finished => return Ok(()),
        _ => {}
    }

    let mut display = TermDisplay::new().context("failed to open the terminal display")?;
    let mut input = TermInput::new().context("failed to take over the keyboard")?;
    match controller.present(&mut display, &mut input)? {
        // the parser worker is detached; leaving does not join it
        PresentEnd::Quit => Ok(()),
        PresentEnd::Aborted => {
            drop(input);
            drop(display);
            std::process::exit(1);
        }
    }
}
