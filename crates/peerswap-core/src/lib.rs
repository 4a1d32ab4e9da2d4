#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod ident;
pub mod manifest;
pub mod package;
pub mod range;
pub mod resolver;
pub mod version;

pub use codec::{PeerEdit, RangeCodec, TaggedRange};
pub use config::Config;
pub use engine::PeerRewriteEngine;
pub use error::{codes, PeerSwapError};
pub use ident::{Blake3Registry, Descriptor, Ident, IdentHash, IdentityRegistry, Locator};
pub use manifest::{DeclaredRange, Manifest};
pub use package::{Package, PackageSummary};
pub use range::{
    change_source, extract_source, is_unspecified_source, make_range, parse_range, RangeParts,
};
pub use resolver::{
    FetchResult, Fetcher, LocalRegistry, PeerEditResolver, ResolutionDependencies, Resolver,
    DEFAULT_PROTOCOL, SOURCE_DEPENDENCY,
};
pub use version::VERSION;
