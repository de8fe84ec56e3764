//! Text vs. JSON output selection.

use anyhow::Result;
use serde::Serialize;

use super::envelope::Envelope;

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

impl OutputMode {
    pub const fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }

    /// Print a successful result.
    pub fn success<T: Serialize>(self, data: &T, text: impl FnOnce()) -> Result<()> {
        match self {
            Self::Json => println!("{}", Envelope::ok(data).render()?),
            Self::Text => text(),
        }
        Ok(())
    }

    /// Print a result that represents a failure but still has data to show.
    pub fn failure<T: Serialize>(self, data: &T, error: &str, text: impl FnOnce()) -> Result<()> {
        match self {
            Self::Json => println!("{}", Envelope::failed(data, error).render()?),
            Self::Text => text(),
        }
        Ok(())
    }

    /// Print an error that has no result attached.
    pub fn error(self, message: &str) {
        match self {
            Self::Json => match Envelope::error(message).render() {
                Ok(rendered) => println!("{rendered}"),
                Err(_) => eprintln!("Error: {message}"),
            },
            Self::Text => eprintln!("Error: {message}"),
        }
    }
}
