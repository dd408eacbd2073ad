// Entrypoint for the uploader.
// - Keeps `main` small: parse flags and hand them to the UI flow.
// - Returns `anyhow::Result` so startup failures print their context chain.

use clap::Parser;
use wiki_batch_upload::{cli::Cli, ui};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    ui::run(cli)
}
