//! Event type catalog.
//!
//! Maps (provider GUID, opcode) pairs to static payload schemas. The table
//! is built once per flavor on first use and is immutable afterwards;
//! lookups are O(1) on the composite key.

pub mod providers;
pub mod schema;

use std::collections::HashMap;
use std::sync::OnceLock;

pub use schema::{EventSchema, Field, FieldKind, Guid};

/// Which naming convention event names are rendered with.
///
/// Layouts are identical in both flavors; only the labels differ. `Xperf`
/// matches the short action names xperf prints in its own dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaFlavor {
    #[default]
    Native,
    Xperf,
}

/// Immutable lookup table over the built-in provider schemas.
pub struct Catalog {
    map: HashMap<(Guid, u8), &'static EventSchema>,
    flavor: SchemaFlavor,
}

impl Catalog {
    fn build(flavor: SchemaFlavor) -> Self {
        let mut map = HashMap::with_capacity(providers::SCHEMAS.len());
        for schema in providers::SCHEMAS {
            map.insert((schema.provider, schema.opcode), schema);
        }
        Catalog { map, flavor }
    }

    /// Look up the schema for a (provider, opcode) pair.
    ///
    /// Returns None for unrecognized providers; the decoder treats that as
    /// a raw-payload fallback, not an error.
    pub fn lookup(&self, provider: &Guid, opcode: u8) -> Option<&'static EventSchema> {
        self.map.get(&(*provider, opcode)).copied()
    }

    /// Render the display name of a schema in this catalog's flavor.
    pub fn event_name(&self, schema: &EventSchema) -> String {
        match self.flavor {
            SchemaFlavor::Native => schema.native_name(),
            SchemaFlavor::Xperf => schema.xperf_label.to_string(),
        }
    }

    pub fn flavor(&self) -> SchemaFlavor {
        self.flavor
    }
}

/// Shared catalog instance for the given flavor, built on first use.
pub fn catalog(flavor: SchemaFlavor) -> &'static Catalog {
    static NATIVE: OnceLock<Catalog> = OnceLock::new();
    static XPERF: OnceLock<Catalog> = OnceLock::new();
    match flavor {
        SchemaFlavor::Native => NATIVE.get_or_init(|| Catalog::build(SchemaFlavor::Native)),
        SchemaFlavor::Xperf => XPERF.get_or_init(|| Catalog::build(SchemaFlavor::Xperf)),
    }
}
