// UI layer: loads configuration, collects what is missing interactively
// with `dialoguer`, and drives login, queue discovery and the upload run.

use crate::api::{self, ApiClient, ApiTransport};
use crate::cli::Cli;
use crate::config::{self, AppConfig};
use crate::engine::UploadEngine;
use crate::logging;
use crate::queue::FileQueue;
use crate::report::{summarize, RunSummary};
use anyhow::{Context, Result};
use crossterm::style::Stylize;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, error};

/// One full run: login, find staged files, upload them, print the tally.
pub fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let config = config::apply_overrides(config::load_config(&config_path)?, &cli);
    config.validate()?;

    let _guard = logging::init(&config.paths.log_file, cli.verbose)?;

    let password = resolve_password(&config)?;
    let api = ApiClient::new(&config.wiki.url).context("Failed to build HTTP client")?;
    let queue = FileQueue::new(&config.paths.upload_dir, &config.paths.done_dir);
    let preset_summary = cli.summary;
    let ask_summary = move || -> Result<String> {
        match preset_summary {
            Some(text) => Ok(text),
            None => Ok(Input::new()
                .with_prompt("Upload summary")
                .allow_empty(true)
                .interact_text()?),
        }
    };

    let stdout = io::stdout();
    let tally = login_and_upload(
        &api,
        &config.user.username,
        &password,
        &queue,
        config.delay(),
        ask_summary,
        &mut stdout.lock(),
    )?;

    if let Some(tally) = tally {
        let text = summarize(&tally, &config.paths.log_file);
        println!();
        if tally.is_clean() {
            println!("{}", text.green());
        } else {
            println!("{}", text.yellow());
        }
    }
    Ok(())
}

/// Log in, then upload whatever is staged. A rejected login ends the run
/// before the queue is touched.
pub fn login_and_upload(
    api: &impl ApiTransport,
    username: &str,
    password: &str,
    queue: &FileQueue,
    delay: Duration,
    ask_summary: impl FnOnce() -> Result<String>,
    out: &mut impl Write,
) -> Result<Option<RunSummary>> {
    log_in(api, username, password)?;
    writeln!(out, "Logged in as {}.", username)?;
    upload_staged(api, queue, delay, ask_summary, out)
}

/// Prepare the directories, list staged files and upload them. Returns
/// `None` without asking for a summary when nothing is staged.
pub fn upload_staged(
    api: &impl ApiTransport,
    queue: &FileQueue,
    delay: Duration,
    ask_summary: impl FnOnce() -> Result<String>,
    out: &mut impl Write,
) -> Result<Option<RunSummary>> {
    queue.prepare(&mut *out).context("Failed to create upload directories")?;

    writeln!(out, "Searching upload directory for files...")?;
    let mut files = queue.list_pending().with_context(|| {
        format!("Failed to read {}", queue.upload_dir().display())
    })?;
    if files.is_empty() {
        writeln!(out, "No files found, exiting.")?;
        return Ok(None);
    }
    writeln!(out, "Found {} file(s)!", files.len())?;
    out.flush()?;

    let summary = ask_summary()?;

    let engine = UploadEngine::new(api, queue, delay);
    let tally = engine.run(&mut files, &summary, out)?;
    debug!(
        processed = tally.processed,
        uploaded = tally.uploaded,
        errors = tally.errors,
        "run complete"
    );
    Ok(Some(tally))
}

/// Use the configured password, or ask for it with hidden input.
fn resolve_password(config: &AppConfig) -> Result<String> {
    if !config.user.password.is_empty() {
        return Ok(config.user.password.clone());
    }
    let password = Password::new()
        .with_prompt(format!("Password for {}", config.user.username))
        .interact()?;
    Ok(password)
}

/// Login with a spinner; a rejected login ends the run.
fn log_in(api: &impl ApiTransport, username: &str, password: &str) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message("Logging in...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = api::login(api, username, password);
    spinner.finish_and_clear();

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(user = %username, "Login failed: {}", e);
            Err(e).context("Login failed")
        }
    }
}
