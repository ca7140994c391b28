use clap::{ArgAction, Parser};

use reaper_core::driver::RunOptions;

#[derive(Debug, Parser)]
#[command(name = "reaper")]
#[command(about = "Find inactive channels, warn them, and archive them", version)]
pub struct Cli {
    /// Set dry run to true or false. Defaults to true
    #[arg(
        short = 'd',
        long = "dryrun",
        value_name = "true/false",
        default_value = "true",
        action = ArgAction::Set,
        value_parser = parse_flag_bool
    )]
    pub dry_run: bool,

    /// Post the pre-archival warning to every candidate channel
    #[arg(long, default_value_t = false)]
    pub warn: bool,
}

impl Cli {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            warn: self.warn,
        }
    }
}

fn parse_flag_bool(raw: &str) -> std::result::Result<bool, String> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "t" | "y" => Ok(true),
        "0" | "false" | "no" | "off" | "f" | "n" => Ok(false),
        other => Err(format!("expected true or false, got '{other}'")),
    }
}
