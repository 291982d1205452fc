pub mod config;
pub mod deploy;
pub mod error;
pub mod io;
pub mod locator;
pub mod paths;
pub mod phase;
pub mod pipeline;
pub mod prompt;
pub mod rules;
pub mod types;
pub mod validator;

pub use error::{DeckError, Result};
