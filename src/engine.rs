// Upload engine: walks the queue in order, one request at a time, and moves
// every file the wiki accepted into the completed directory.

use crate::api::{self, fetch_token, ApiTransport, TokenKind};
use crate::queue::{FileQueue, FileRecord, Location};
use crate::report::RunSummary;
use chrono::Local;
use serde_json::Value;
use std::fs::File;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Outcome of one upload attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadResult {
    Success,
    /// The wiki accepted the request but reported warnings (duplicate,
    /// name conflict, ...). The file was not stored.
    Warning { warnings: Value },
    /// Service error, or a local/transport failure before a reply arrived.
    Error { code: String, info: String },
}

impl UploadResult {
    fn local(code: &str, info: impl ToString) -> Self {
        UploadResult::Error {
            code: code.to_string(),
            info: info.to_string(),
        }
    }
}

/// Classify an `action=upload` reply.
pub fn classify(res: &Value) -> UploadResult {
    if let Some(err) = res.get("error") {
        return UploadResult::Error {
            code: api::field_str(err, "code"),
            info: api::field_str(err, "info"),
        };
    }
    match res.pointer("/upload/result").and_then(Value::as_str) {
        Some("Success") => UploadResult::Success,
        Some("Warning") => UploadResult::Warning {
            warnings: res
                .pointer("/upload/warnings")
                .cloned()
                .unwrap_or(Value::Null),
        },
        _ => UploadResult::local("unexpected-response", res),
    }
}

pub struct UploadEngine<'a, T: ApiTransport> {
    api: &'a T,
    queue: &'a FileQueue,
    delay: Duration,
}

impl<'a, T: ApiTransport> UploadEngine<'a, T> {
    pub fn new(api: &'a T, queue: &'a FileQueue, delay: Duration) -> Self {
        UploadEngine { api, queue, delay }
    }

    /// Upload `files` in the given order using `summary` as both the upload
    /// comment and the page text. Progress lines go to `out`; failures go to
    /// the log. Only a failing `out` stops the run early.
    pub fn run(
        &self,
        files: &mut [FileRecord],
        summary: &str,
        out: &mut impl Write,
    ) -> io::Result<RunSummary> {
        let mut tally = RunSummary::default();
        let total = files.len();

        for (index, record) in files.iter_mut().enumerate() {
            writeln!(
                out,
                "[{}][File {} of {}] Uploading {}",
                Local::now().format("%H:%M"),
                index + 1,
                total,
                record.name
            )?;

            let result = self.upload_one(record, summary);
            tally.processed += 1;
            self.settle(record, result, &mut tally);

            if index + 1 < total && !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
        }

        Ok(tally)
    }

    fn upload_one(&self, record: &FileRecord, summary: &str) -> UploadResult {
        let file = match File::open(self.queue.pending_path(record)) {
            Ok(file) => file,
            Err(e) => return UploadResult::local("file-unreadable", e),
        };
        let token = match fetch_token(self.api, TokenKind::Csrf) {
            Ok(token) => token,
            Err(e) => return UploadResult::local("token-unavailable", e),
        };
        let params = vec![
            ("action", "upload".to_string()),
            ("filename", record.name.clone()),
            ("comment", summary.to_string()),
            ("text", summary.to_string()),
            ("ignorewarnings", "true".to_string()),
            ("token", token),
            ("format", "json".to_string()),
        ];
        match self.api.post_upload(params, &record.name, file) {
            Ok(res) => classify(&res),
            Err(e) => UploadResult::local("transport", e),
        }
    }

    // Apply the outcome: log it, count it, and move the file when accepted.
    fn settle(&self, record: &mut FileRecord, result: UploadResult, tally: &mut RunSummary) {
        match result {
            UploadResult::Success => match self.queue.complete(record) {
                Ok(()) => {
                    tally.uploaded += 1;
                    debug!(file = %record.name, "uploaded");
                }
                Err(e) => {
                    record.location = Location::Failed;
                    tally.errors += 1;
                    error!(
                        file = %record.name,
                        "Uploaded \"{}\" but could not move it to {}: {}",
                        record.name,
                        self.queue.done_dir().display(),
                        e
                    );
                }
            },
            UploadResult::Warning { warnings } => {
                record.location = Location::Failed;
                tally.errors += 1;
                warn!(file = %record.name, "Failed to upload \"{}\": Got {}", record.name, warnings);
            }
            UploadResult::Error { code, info } => {
                record.location = Location::Failed;
                tally.errors += 1;
                error!(file = %record.name, "Failed to upload \"{}\": Got {}: {}", record.name, code, info);
            }
        }
    }
}
