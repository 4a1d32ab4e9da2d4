use super::{fail, identity_registry, ErrorInfo};
use miette::{miette, IntoDiagnostic, Result};
use peerswap_core::config::REGISTRY_ENV;
use peerswap_core::{
    Config, Descriptor, IdentityRegistry, LocalRegistry, Manifest, PackageSummary,
    PeerEditResolver, PeerSwapError,
};
use peerswap_util::fs::atomic_write;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Serialize)]
struct ResolveOutput {
    ok: bool,
    results: Vec<ResolveEntry>,
}

#[derive(Serialize)]
struct ResolveEntry {
    descriptor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    package: Option<PackageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
}

/// Run the resolve command.
///
/// Every descriptor is resolved independently; the command exits with 1 if
/// any of them failed, after reporting all of them.
pub fn run(config: &Config, descriptors: &[String], out: Option<&Path>, json: bool) -> Result<()> {
    let registry_dir = require_registry(config)?;
    let registry = identity_registry();

    let descriptors: Vec<Descriptor> = descriptors
        .iter()
        .map(|input| registry.parse_descriptor(input))
        .collect::<Result<_, _>>()
        .unwrap_or_else(|e| fail(&e, json));

    let manifest = load_manifest(config).unwrap_or_else(|e| fail(&e, json));

    let upstream = LocalRegistry::new(&registry_dir, Arc::clone(&registry));
    let resolver = PeerEditResolver::with_protocol(config.protocol.clone(), registry, upstream);

    tracing::debug!(
        count = descriptors.len(),
        registry = %registry_dir.display(),
        "resolving descriptors"
    );

    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    let outcomes = runtime.block_on(resolver.resolve_all(&descriptors, &manifest));

    let results: Vec<ResolveEntry> = outcomes
        .into_iter()
        .map(|(descriptor, outcome)| match outcome {
            Ok(package) => ResolveEntry {
                descriptor: descriptor.to_string(),
                package: Some(package.summary()),
                error: None,
            },
            Err(e) => {
                tracing::debug!(%descriptor, code = e.code(), "resolution failed");
                ResolveEntry {
                    descriptor: descriptor.to_string(),
                    package: None,
                    error: Some((&e).into()),
                }
            }
        })
        .collect();

    let output = ResolveOutput {
        ok: results.iter().all(|r| r.error.is_none()),
        results,
    };
    let rendered = serde_json::to_string_pretty(&output).into_diagnostic()?;

    if let Some(path) = out {
        let path = config.cwd.join(path);
        atomic_write(&path, rendered.as_bytes())
            .map_err(|e| miette!("failed to write {}: {e}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote resolution results");
    }

    if json {
        println!("{rendered}");
    } else {
        print_human(&output);
    }

    if !output.ok {
        std::process::exit(1);
    }
    Ok(())
}

fn require_registry(config: &Config) -> Result<PathBuf> {
    config.registry_dir().ok_or_else(|| {
        miette!("no registry directory; pass --registry or set {REGISTRY_ENV}")
    })
}

/// The workspace manifest, or an empty one when there is none.
fn load_manifest(config: &Config) -> Result<Manifest, PeerSwapError> {
    match Manifest::load_from_dir(&config.cwd) {
        Err(PeerSwapError::ManifestNotFound { path }) => {
            tracing::warn!(path = %path.display(), "no manifest, binding without declarations");
            Ok(Manifest::default())
        }
        other => other,
    }
}

fn print_human(output: &ResolveOutput) {
    for entry in &output.results {
        match (&entry.package, &entry.error) {
            (Some(package), _) => {
                println!("{} -> {}@{}", entry.descriptor, package.name, package.reference);
                for (name, range) in &package.peer_dependencies {
                    println!("  peer {name}@{range}");
                }
            }
            (None, Some(error)) => {
                eprintln!("error: {}: {} [{}]", entry.descriptor, error.message, error.code);
            }
            (None, None) => {}
        }
    }
}
