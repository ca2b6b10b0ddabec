//! Catalogue data model
//!
//! Ordered mapping from destination key to item list. Order is a contract:
//! destinations emit in catalogue order, items in list order, so the mapping
//! is a typed ordered sequence rather than a hash map.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use validator::Validate;

/// A single broadcast item
///
/// `frequency` is the interval in seconds between two emissions. Frequency 0
/// marks a one-shot item that fires only on the first tick.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(try_from = "RawItem")]
pub struct Item {
    /// Emission interval in seconds
    #[validate(range(min = 0.0))]
    pub frequency: f64,

    /// Instrument identifier (stored-procedure addressing)
    pub instrument: Option<String>,

    /// Signal name (stored-procedure addressing)
    pub name: Option<String>,

    /// Where the emitted value comes from
    pub payload: PayloadSource,
}

/// Source of an item's emitted value
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadSource {
    /// Opaque value emitted unchanged every time the item is due
    Literal(serde_json::Value),
    /// Expression template evaluated against elapsed time at yield time
    Expression(String),
}

/// Wire form of an item: exactly one of `message` / `function` must be set
#[derive(Debug, Deserialize)]
struct RawItem {
    frequency: f64,
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    function: Option<String>,
    #[serde(default)]
    instrument: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl TryFrom<RawItem> for Item {
    type Error = String;

    fn try_from(raw: RawItem) -> Result<Self, Self::Error> {
        let payload = match (raw.message, raw.function) {
            (Some(_), Some(_)) => {
                return Err("item declares both 'message' and 'function'".to_string())
            }
            (None, None) => {
                return Err("item declares neither 'message' nor 'function'".to_string())
            }
            (Some(message), None) => PayloadSource::Literal(message),
            (None, Some(function)) => PayloadSource::Expression(function),
        };

        Ok(Item {
            frequency: raw.frequency,
            instrument: raw.instrument,
            name: raw.name,
            payload,
        })
    }
}

/// One destination and its items, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueEntry {
    /// Queue/topic name or stored-procedure name
    pub destination: String,
    /// Items broadcast to this destination
    pub items: Vec<Item>,
}

/// The immutable, loaded description of all destinations and their items
///
/// Entries keep document order. Re-setting an existing destination replaces
/// its item list in place (the key keeps its original position); new
/// destinations append at the end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalogue {
    entries: Vec<CatalogueEntry>,
}

impl Catalogue {
    /// Create an empty catalogue
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of destinations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no destinations are present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of items across all destinations
    pub fn item_count(&self) -> usize {
        self.entries.iter().map(|e| e.items.len()).sum()
    }

    /// Entries in emission order
    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    /// Iterate entries in emission order
    pub fn iter(&self) -> std::slice::Iter<'_, CatalogueEntry> {
        self.entries.iter()
    }

    /// Items for a destination, if present
    pub fn get(&self, destination: &str) -> Option<&[Item]> {
        self.entries
            .iter()
            .find(|e| e.destination == destination)
            .map(|e| e.items.as_slice())
    }

    /// Set a destination's item list
    ///
    /// Replaces the list in place when the destination already exists,
    /// appends otherwise.
    pub fn set(&mut self, destination: String, items: Vec<Item>) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.destination == destination)
        {
            Some(entry) => entry.items = items,
            None => self.entries.push(CatalogueEntry { destination, items }),
        }
    }

    /// Merge another catalogue into this one, later entries winning
    ///
    /// Shallow merge at the destination level: an overlapping key takes the
    /// other catalogue's item list entirely, discarding the earlier one.
    pub fn merge(&mut self, other: Catalogue) {
        for entry in other.entries {
            self.set(entry.destination, entry.items);
        }
    }
}

impl<'a> IntoIterator for &'a Catalogue {
    type Item = &'a CatalogueEntry;
    type IntoIter = std::slice::Iter<'a, CatalogueEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<'de> Deserialize<'de> for Catalogue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CatalogueVisitor;

        impl<'de> Visitor<'de> for CatalogueVisitor {
            type Value = Catalogue;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of destination keys to item lists")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut catalogue = Catalogue::new();
                while let Some((destination, items)) = map.next_entry::<String, Vec<Item>>()? {
                    catalogue.set(destination, items);
                }
                Ok(catalogue)
            }
        }

        deserializer.deserialize_map(CatalogueVisitor)
    }
}
