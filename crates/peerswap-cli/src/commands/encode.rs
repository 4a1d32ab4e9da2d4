use super::{fail, identity_registry};
use miette::Result;
use peerswap_core::{Config, IdentityRegistry, PeerEdit, PeerSwapError, RangeCodec, TaggedRange};
use serde::Serialize;

#[derive(Serialize)]
struct EncodeResult {
    ok: bool,
    range: String,
}

/// Run the encode command.
///
/// Each edit is `<descriptor>` to remove a peer or
/// `<descriptor>=<descriptor>` to replace it.
pub fn run(config: &Config, source: &str, edits: &[String], json: bool) -> Result<()> {
    let registry = identity_registry();
    let edits: Vec<PeerEdit> = edits
        .iter()
        .map(|raw| parse_edit(registry.as_ref(), raw))
        .collect::<Result<_, _>>()
        .unwrap_or_else(|e| fail(&e, json));

    let codec = RangeCodec::new(registry);
    let range = codec.encode(&TaggedRange::new(config.protocol.clone(), source, edits));
    tracing::debug!(%range, "encoded tagged range");

    if json {
        let result = EncodeResult { ok: true, range };
        println!("{}", serde_json::to_string_pretty(&result).unwrap());
    } else {
        println!("{range}");
    }
    Ok(())
}

fn parse_edit(registry: &dyn IdentityRegistry, raw: &str) -> Result<PeerEdit, PeerSwapError> {
    match raw.split_once('=') {
        Some((source, target)) => Ok(PeerEdit::replace(
            registry.parse_descriptor(source)?,
            registry.parse_descriptor(target)?,
        )),
        None => Ok(PeerEdit::remove(registry.parse_descriptor(raw)?)),
    }
}
