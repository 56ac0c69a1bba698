// Call-site interception: checked functions and checked construction
//
// Both entry points extract a vocabulary once, classify the keyword names of
// every call against it, and leave the call itself untouched.

pub mod function;
pub mod registry;

use std::collections::BTreeMap;
use std::sync::Arc;

use misprint_core::{DiagnosticSink, TracingSink};

pub use function::{Checked, detect_misprints};
pub use registry::{RegisteredType, RegistryError, TypeRegistry};

/// Keyword arguments of one call, by name.
pub type Kwargs<V> = BTreeMap<String, V>;

/// A sink that can be shared between interceptors and threads.
pub type SharedSink = Arc<dyn DiagnosticSink + Send + Sync>;

pub(crate) fn default_sink() -> SharedSink {
    Arc::new(TracingSink)
}
