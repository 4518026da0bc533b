use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use stdio_tap_core::error::CliError;
use stdio_tap_core::transcript;

/// Pretty-print the JSON payloads of a stdio-tap transcript.
#[derive(Parser, Debug)]
#[command(name = "tap-format", version)]
struct Args {
    /// Transcript file (mcp-capture-*.log)
    input: PathBuf,

    /// Where to write the result [default: <stem>_formatted.<ext> next to the input]
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CliError> {
    if !args.input.exists() {
        return Err(CliError::Format(format!(
            "Input file '{}' does not exist",
            args.input.display()
        )));
    }

    let raw = std::fs::read(&args.input)?;
    let formatted = transcript::format_transcript(&String::from_utf8_lossy(&raw));

    match args
        .output
        .or_else(|| transcript::default_output_path(&args.input))
    {
        Some(out) => {
            std::fs::write(&out, formatted)?;
            println!("Formatted log saved to {}", out.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(formatted.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
