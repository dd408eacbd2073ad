// Library root
// -----------
// This crate exposes the uploader as a library; the binary (`main.rs`)
// only parses arguments and hands over to `ui::run`.
//
// Module responsibilities:
// - `api`: HTTP interactions with the wiki (token fetch, login, upload)
//   behind the `ApiTransport` trait.
// - `queue`: staging/completed directories and upload order.
// - `engine`: the sequential upload loop and reply classification.
// - `report`: run tallies and the completion message.
// - `config`, `cli`, `logging`: startup plumbing.
// - `ui`: interactive flow tying the pieces together.
//
// Keeping the engine generic over `ApiTransport` lets tests drive it with a
// scripted transport instead of a live wiki.
pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod queue;
pub mod report;
pub mod ui;

pub use error::{ApiError, AuthError};
