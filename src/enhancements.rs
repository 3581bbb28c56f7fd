//! Enhancement prompt dispatch — an external collaborator the reverter
//! never calls, included because it's named as a worked redesign example
//! (see the crate-level design notes): a tagged-variant dispatch with an
//! explicit display capability, replacing a name-keyed function table and
//! a process-wide service lookup.

use crate::reverter::error::{ReverterError, Result};

/// An enhancement the operator may be asked about before the agent edits
/// the web server's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enhancement {
    /// Whether to redirect HTTP requests to HTTPS by default.
    Redirect,
}

impl std::fmt::Display for Enhancement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Enhancement::Redirect => write!(f, "redirect"),
        }
    }
}

impl std::str::FromStr for Enhancement {
    type Err = ReverterError;

    /// Parses the CLI's `--enhancement` string. Unlike the closed `match`
    /// in [`ask`], this boundary is where an "unsupported enhancement"
    /// name can actually occur at runtime.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "redirect" => Ok(Enhancement::Redirect),
            other => Err(ReverterError::UnsupportedEnhancement(other.to_string())),
        }
    }
}

/// The interactive capability `ask` needs, passed explicitly instead of
/// fetched from a global registry.
pub trait EnhancementPrompt {
    /// Ask the operator whether HTTP should redirect to HTTPS.
    fn ask_redirect(&self) -> bool;
}

/// Ask the operator about `enhancement` using `display`. Returns an error
/// for any variant with no handler, mirroring the original's `KeyError`.
pub fn ask(enhancement: Enhancement, display: &dyn EnhancementPrompt) -> Result<bool> {
    match enhancement {
        Enhancement::Redirect => Ok(display.ask_redirect()),
    }
}
