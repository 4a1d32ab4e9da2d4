use super::{fail, identity_registry};
use miette::Result;
use peerswap_core::{Config, Descriptor, RangeCodec, TaggedRange};
use serde::Serialize;

#[derive(Serialize)]
struct DecodeResult<'a> {
    ok: bool,
    protocol: &'a str,
    source: &'a str,
    unspecified: bool,
    edits: Vec<EditView<'a>>,
}

#[derive(Serialize)]
struct EditView<'a> {
    source: &'a Descriptor,
    target: Option<&'a Descriptor>,
}

/// Run the decode command.
pub fn run(config: &Config, range: &str, json: bool) -> Result<()> {
    let codec = RangeCodec::new(identity_registry());
    let tagged = codec.decode(range).unwrap_or_else(|e| fail(&e, json));

    if tagged.protocol() != config.protocol {
        tracing::warn!(
            expected = %config.protocol,
            found = %tagged.protocol(),
            "range uses a different protocol tag"
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&view(&tagged)).unwrap());
    } else {
        print_human(&tagged);
    }
    Ok(())
}

fn view(tagged: &TaggedRange) -> DecodeResult<'_> {
    DecodeResult {
        ok: true,
        protocol: tagged.protocol(),
        source: tagged.source(),
        unspecified: tagged.is_unspecified(),
        edits: tagged
            .edits()
            .iter()
            .map(|edit| EditView {
                source: &edit.source,
                target: edit.target.as_ref(),
            })
            .collect(),
    }
}

fn print_human(tagged: &TaggedRange) {
    println!("protocol: {}", tagged.protocol());
    if tagged.is_unspecified() {
        println!("source:   (unspecified)");
    } else {
        println!("source:   {}", tagged.source());
    }

    if tagged.edits().is_empty() {
        println!("edits:    (none)");
        return;
    }
    println!("edits:");
    for edit in tagged.edits() {
        match &edit.target {
            Some(target) => println!("  {} -> {target}", edit.source),
            None => println!("  {} -> (removed)", edit.source),
        }
    }
}
