use super::{fail, identity_registry};
use miette::Result;
use peerswap_core::{
    extract_source, Config, IdentityRegistry, Manifest, PeerEditResolver, PeerSwapError,
};
use serde::Serialize;

#[derive(Serialize)]
struct BindResult {
    ok: bool,
    descriptor: String,
    source: String,
}

/// Run the bind command against the manifest in `config.cwd`.
pub fn run(config: &Config, descriptor: &str, json: bool) -> Result<()> {
    let registry = identity_registry();
    let requested = registry
        .parse_descriptor(descriptor)
        .unwrap_or_else(|e| fail(&e, json));

    let binder = PeerEditResolver::with_protocol(config.protocol.clone(), registry, ());
    if !requested.range().starts_with(binder.protocol()) {
        fail(
            &PeerSwapError::UnsupportedRange {
                range: requested.range().to_string(),
            },
            json,
        );
    }

    let manifest = Manifest::load_from_dir(&config.cwd).unwrap_or_else(|e| fail(&e, json));
    let bound = binder.bind_to_manifest(&requested, &manifest);
    let source = extract_source(bound.range());
    tracing::debug!(descriptor = %bound, %source, "bound descriptor");

    if json {
        let result = BindResult {
            ok: true,
            descriptor: bound.to_string(),
            source,
        };
        println!("{}", serde_json::to_string_pretty(&result).unwrap());
    } else {
        println!("{bound}");
    }
    Ok(())
}
