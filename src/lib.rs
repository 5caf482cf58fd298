// Library root
// -----------
// The binary (`main.rs`) only parses arguments and sets up logging; the
// work happens in these modules.
//
// Module responsibilities:
// - `detector`: guesses the data types (uuid, email, url, domain) of the
//   search terms.
// - `tree`: rebuilds and renders a directory tree from flat file paths.
// - `ui`: type confirmation/selection, result printing and the setup
//   prompts.
// - `api`: blocking HTTP client for the keyscore API.
// - `models`: request/response shapes.
// - `config`: config file, environment overrides and saved results.
// - `spinner`: the loading spinner shown during requests.
// - `cli`: argument definitions and command handlers.
pub mod api;
pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod models;
pub mod spinner;
pub mod tree;
pub mod ui;

pub use error::{Error, Result};
