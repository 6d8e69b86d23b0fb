//! runbridge core: the bundle contract.
//!
//! Everything needed to carry key/value outputs, provenance metadata, and
//! files across a producer/consumer trust boundary: the schema and
//! sanitize rules, the dotted-path resolver, the canonical on-disk bundle
//! layout, the expectation validator, and the `name=path` extraction
//! mapper.
//!
//! The hosting platform's plumbing (artifact transport, input/output
//! wiring, event payload delivery) stays outside this crate; entrypoints
//! inject everything through explicit parameters so the validation logic
//! remains pure and independently testable.

pub mod bundle;
pub mod context;
pub mod error;
pub mod expect;
pub mod extract;
pub mod meta;
pub mod obs;
pub mod outputs;
pub mod path;
pub mod telemetry;
pub mod tokens;

pub use bundle::{
    normalize_bundle_path, read_bundle, restore_files, write_bundle, Bundle, BUNDLE_DIR,
    FILES_DIR, META_FILE, OUTPUTS_FILE,
};
pub use context::{resolve_first, resolve_required};
pub use error::{BridgeError, ExpectationError, Result};
pub use expect::{validate_expectations, Expectations};
pub use extract::{
    apply_extract_mappings, parse_extract_mappings, scalar_to_string, ExtractMapping,
};
pub use meta::{
    build_bridge_meta, validate_meta, BridgeMeta, ProducerContext, SCHEMA_VERSION,
};
pub use outputs::{
    is_valid_output_key, normalize_outputs, parse_and_merge_outputs, parse_json_object,
    OutputsMap, SanitizeMode,
};
pub use path::{get_by_path, pick_by_paths};
pub use telemetry::init_tracing;
pub use tokens::split_list;

/// runbridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
