// src/cli.rs

use clap::{Arg, ArgAction, Command};

/// Build the command-line interface for the application
pub fn build_cli() -> Command {
    Command::new("torro")
        .version(crate::VERSION)
        .about("Concurrent media download manager with live progress tracking")
        .arg(
            Arg::new("urls")
                .help("One or more media URLs to download")
                .required(true)
                .num_args(1..)
                .index(1),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .short('o')
                .help("Specify custom output directory")
                .value_name("DIRECTORY"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Override the format-selection fallback chain passed to the engine")
                .value_name("FORMAT_CHAIN"),
        )
        .arg(
            Arg::new("playlist")
                .long("playlist")
                .short('p')
                .help("Download entire playlist instead of the single linked item")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Suppress the live progress display")
                .action(ArgAction::SetTrue),
        )
}
