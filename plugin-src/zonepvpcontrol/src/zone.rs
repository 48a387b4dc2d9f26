//! Zone classification: position -> zone name -> zone group.

use crate::error::ZoneResolveError;
use crate::host::ZoneResolver;

/// Separates the group prefix from the variant suffix (`Zone2_East`).
pub const ZONE_GROUP_DELIMITER: char = '_';

/// The group a zone belongs to: everything before the first delimiter.
#[must_use]
pub fn zone_group(zone_name: &str) -> &str {
    zone_name
        .split_once(ZONE_GROUP_DELIMITER)
        .map_or(zone_name, |(group, _)| group)
}

/// Reusable output slot for zone lookups, kept per player so polling does not
/// allocate a fresh name every tick.
#[derive(Debug, Clone, Default)]
pub struct ZoneQueryBuffer {
    name: String,
    present: bool,
}

impl ZoneQueryBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.present = false;
    }

    pub fn set_zone(&mut self, name: &str) {
        self.name.clear();
        self.name.push_str(name);
        self.present = true;
    }

    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        self.present.then_some(self.name.as_str())
    }
}

pub struct ZoneClassifier;

impl ZoneClassifier {
    /// Resolve the zone at `(x, z)` into `buf` and return its name.
    pub fn classify<'b>(
        resolver: &dyn ZoneResolver,
        seed: i64,
        x: f64,
        z: f64,
        buf: &'b mut ZoneQueryBuffer,
    ) -> Result<Option<&'b str>, ZoneResolveError> {
        buf.clear();
        resolver.resolve(seed, x, z, buf)?;
        Ok(buf.zone())
    }
}
