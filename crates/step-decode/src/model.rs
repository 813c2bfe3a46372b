//! The resolved entity graph that decoders run against.
//!
//! Entities live in a flat arena keyed by their instance id. References
//! between entities are stored as ids and looked up at decode time, which
//! keeps the graph immutable even when it contains cycles.

use std::collections::BTreeMap;
use std::fmt;

/// Entity instance identifier (the `123` in `#123`).
pub type EntityId = u64;

/// Canonical schema type name.
///
/// STEP type names are case-insensitive; the canonical form is upper case,
/// so `TypeName::new("point") == TypeName::new("POINT")`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeName(String);

impl TypeName {
    /// Canonicalize a type name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().to_ascii_uppercase())
    }

    /// The canonical (upper-case) spelling.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A single attribute value of an entity record.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// Logical `.T.` / `.F.`.
    Bool(bool),
    /// Integer number.
    Int(i64),
    /// Real number.
    Float(f64),
    /// String literal, still in its encoded form (escapes not yet decoded).
    String(String),
    /// Enumeration literal other than `.T.`/`.F.`, canonical upper case.
    Enum(String),
    /// Aggregate (list, set, bag, array) or fixed-size tuple.
    List(Vec<Attribute>),
    /// Inline typed parameter, e.g. `LENGTH_MEASURE(2.5)`.
    Typed(TypeName, Box<Attribute>),
    /// Reference to another entity in the same file.
    Reference(EntityId),
    /// The `$` marker: no value.
    Null,
    /// The `*` marker: value is derived elsewhere.
    Derived,
}

/// One type facet of an entity: a type name plus its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    /// Canonical type name.
    pub type_name: TypeName,
    /// Attributes in declaration order.
    pub attributes: Vec<Attribute>,
}

impl EntityRecord {
    /// Create a record, canonicalizing the type name.
    pub fn new(type_name: impl Into<TypeName>, attributes: Vec<Attribute>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes,
        }
    }
}

/// An entity instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// Instance of a single type, `#1 = POINT(...)`.
    Simple(EntityRecord),
    /// Instance of several types at once, `#1 = (A(...) B(...))`.
    ///
    /// Records are kept in the order they appear in the file and the list
    /// is never empty.
    Complex(Vec<EntityRecord>),
}

impl Entity {
    /// All records of this entity, in declaration order.
    pub fn records(&self) -> &[EntityRecord] {
        match self {
            Entity::Simple(record) => std::slice::from_ref(record),
            Entity::Complex(records) => records,
        }
    }

    /// Human-readable description of the entity's type(s), used in diagnostics.
    pub fn describe_type(&self) -> String {
        match self {
            Entity::Simple(record) => record.type_name.to_string(),
            Entity::Complex(records) => {
                let names: Vec<&str> = records.iter().map(|r| r.type_name.as_str()).collect();
                format!("({})", names.join(" "))
            }
        }
    }
}

/// Header section of a file: `FILE_DESCRIPTION`, `FILE_NAME`, `FILE_SCHEMA`
/// and any other header records, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    /// Header records, each a simple entity.
    pub entities: Vec<Entity>,
}

/// A fully resolved STEP file.
///
/// Every [`Attribute::Reference`] reachable from the file names an entity
/// that exists in [`File::entities`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct File {
    header: Header,
    entities: BTreeMap<EntityId, Entity>,
}

impl File {
    pub(crate) fn from_parts(header: Header, entities: BTreeMap<EntityId, Entity>) -> Self {
        Self { header, entities }
    }

    /// Header section.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Look up an entity by id.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Iterate over all entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, e)| (*id, e))
    }

    /// Number of data-section entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the data section is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_is_case_insensitive() {
        assert_eq!(TypeName::new("Cartesian_Point"), TypeName::new("CARTESIAN_POINT"));
        assert_eq!(TypeName::from("line").as_str(), "LINE");
    }

    #[test]
    fn test_records() {
        let simple = Entity::Simple(EntityRecord::new("a", vec![]));
        assert_eq!(simple.records().len(), 1);
        assert_eq!(simple.describe_type(), "A");

        let complex = Entity::Complex(vec![
            EntityRecord::new("a", vec![]),
            EntityRecord::new("b", vec![Attribute::Int(1)]),
        ]);
        assert_eq!(complex.records().len(), 2);
        assert_eq!(complex.describe_type(), "(A B)");
    }

    #[test]
    fn test_ascending_iteration() {
        let mut entities = BTreeMap::new();
        for id in [30, 2, 11] {
            entities.insert(id, Entity::Simple(EntityRecord::new("X", vec![])));
        }
        let file = File::from_parts(Header::default(), entities);
        let ids: Vec<EntityId> = file.entities().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 11, 30]);
        assert!(file.get(11).is_some());
        assert!(file.get(12).is_none());
    }
}
