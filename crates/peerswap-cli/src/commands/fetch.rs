use super::{fail, identity_registry};
use miette::{miette, IntoDiagnostic, Result};
use peerswap_core::config::REGISTRY_ENV;
use peerswap_core::{Config, Fetcher, IdentityRegistry, LocalRegistry, PeerEditResolver};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct FetchOutput {
    ok: bool,
    locator: String,
    path: String,
    checksum: String,
}

/// Run the fetch command.
pub fn run(config: &Config, locator: &str, json: bool) -> Result<()> {
    let registry_dir = config
        .registry_dir()
        .ok_or_else(|| miette!("no registry directory; pass --registry or set {REGISTRY_ENV}"))?;
    let registry = identity_registry();

    let locator = registry
        .parse_locator(locator)
        .unwrap_or_else(|e| fail(&e, json));

    let upstream = LocalRegistry::new(&registry_dir, Arc::clone(&registry));
    let fetcher = PeerEditResolver::with_protocol(config.protocol.clone(), registry, upstream);

    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    let fetched = runtime
        .block_on(fetcher.fetch(&locator))
        .unwrap_or_else(|e| fail(&e, json));

    let output = FetchOutput {
        ok: true,
        locator: fetched.locator.to_string(),
        path: fetched.path.display().to_string(),
        checksum: fetched.checksum,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
    } else {
        println!("{}", output.path);
        println!("blake3:{}", output.checksum);
    }
    Ok(())
}
