pub mod bind;
pub mod decode;
pub mod encode;
pub mod fetch;
pub mod resolve;
pub mod version;

use peerswap_core::{Blake3Registry, IdentityRegistry, PeerSwapError};
use serde::Serialize;
use std::sync::Arc;

/// Error payload shared by every `--json` command.
#[derive(Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
}

impl From<&PeerSwapError> for ErrorInfo {
    fn from(err: &PeerSwapError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[derive(Serialize)]
struct Failure {
    ok: bool,
    error: ErrorInfo,
}

/// Identity registry used by all commands.
pub fn identity_registry() -> Arc<dyn IdentityRegistry> {
    Arc::new(Blake3Registry)
}

/// Report `err` and exit with status 1.
pub fn fail(err: &PeerSwapError, json: bool) -> ! {
    if json {
        let failure = Failure {
            ok: false,
            error: err.into(),
        };
        println!("{}", serde_json::to_string_pretty(&failure).unwrap());
    } else {
        eprintln!("error: {err}");
    }
    std::process::exit(1);
}
