use std::path::PathBuf;

use clap::Parser;

/// Run COMMAND behind this process's stdio and keep a raw copy of every stream.
#[derive(Parser, Debug)]
#[command(name = "stdio-tap", version)]
pub struct Args {
    /// Directory for the stream logs [default: ./logs]
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<String>,

    /// Suppress this proxy's own diagnostics on the terminal. Relayed bytes and logs are unaffected.
    #[arg(long)]
    pub quiet: bool,

    /// Also write a combined, timestamped transcript of all three streams.
    #[arg(long)]
    pub transcript: bool,

    /// Read configuration from this file instead of the default locations.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Give up waiting for stdout/stderr to close this long after the child exits.
    #[arg(long, value_name = "MS")]
    pub drain_timeout_ms: Option<u64>,

    /// The command to run and its arguments, passed through unmodified.
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND [ARGS]..."
    )]
    pub command: Vec<String>,
}

impl Args {
    pub fn program(&self) -> &str {
        &self.command[0]
    }

    pub fn program_args(&self) -> Vec<String> {
        self.command[1..].to_vec()
    }
}
