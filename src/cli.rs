use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Batch-upload staged files to a wiki", long_about = None)]
pub struct Cli {
    #[clap(short, long, help = "Path to the TOML config file")]
    pub config: Option<PathBuf>,
    #[clap(short, long, help = "Upload summary (skips the interactive prompt)")]
    pub summary: Option<String>,
    #[clap(long, help = "Seconds to wait between uploads")]
    pub delay: Option<f64>,
    #[clap(long, help = "Directory holding files to upload")]
    pub upload_dir: Option<PathBuf>,
    #[clap(long, help = "Directory uploaded files are moved to")]
    pub done_dir: Option<PathBuf>,
    #[clap(long, help = "Log file for failed uploads")]
    pub log_file: Option<PathBuf>,
    #[clap(short, long, help = "Write debug entries to the log file")]
    pub verbose: bool,
}
