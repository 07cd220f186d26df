use clap::Parser;
use outlinecheck::{test_font, CheckConfig, FontRunOptions, TestId, TestSelection};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "outlinecheck", about = "Find drawing mistakes in UFO glyph outlines")]
struct Cli {
    /// Input UFO path
    ufo: PathBuf,

    /// Comma separated tests to run (default: all)
    #[arg(long)]
    tests: Option<TestSelection>,

    /// Comma separated tests to leave out
    #[arg(long)]
    skip: Option<TestSelection>,

    /// JSON file with threshold overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only test this glyph (repeatable)
    #[arg(long = "glyph")]
    glyphs: Vec<String>,

    /// Test glyphs on all cores
    #[arg(long)]
    parallel: bool,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CheckConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => CheckConfig::default(),
    };
    let mut selection = cli.tests.clone().unwrap_or_default();
    if let Some(skip) = &cli.skip {
        for id in TestId::all().filter(|id| skip.contains(*id)) {
            selection.remove(id);
        }
    }

    // Header
    eprintln!();
    eprintln!("  outlinecheck \u{00b7} {}", cli.ufo.display());
    eprintln!();

    let t_start = Instant::now();
    let font = outlinecheck::ufo::load(&cli.ufo)?;
    eprintln!("  Load        {} glyphs ({}ms)", font.len(), t_start.elapsed().as_millis());

    let tested = if cli.glyphs.is_empty() { font.len() } else { cli.glyphs.len() };
    let options = FontRunOptions {
        parallel: cli.parallel,
        glyphs: (!cli.glyphs.is_empty()).then_some(cli.glyphs.as_slice()),
        ..Default::default()
    };
    let t_check = Instant::now();
    let report = test_font(&font, &selection, &config, options)?;
    eprintln!(
        "  Check       {} tests \u{00b7} {} glyphs \u{00b7} {} flagged  ({}ms)",
        selection.defs().count(),
        tested,
        report.len(),
        t_check.elapsed().as_millis(),
    );

    let json = serde_json::to_string_pretty(&report)?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, json)?;
            eprintln!();
            eprintln!("  \u{2713} {}", path.display());
        }
        None => println!("{json}"),
    }
    eprintln!();

    Ok(())
}
