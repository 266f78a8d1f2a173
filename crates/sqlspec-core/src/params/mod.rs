//! Parameter registry: an ordered, named-and-positioned set of bound
//! parameter slots, plus the placeholder-style converter that rewrites SQL
//! between placeholder conventions.

mod style;

pub use style::{
    DetectedStyle, Placeholder, PlaceholderKind, PlaceholderStyle, allocate, bind, detect_style,
    merge, parse_placeholders,
};

use crate::value::Value;

/// Where a slot's value originated. Used by caches and by the pipeline to
/// decide which slots are safe to re-bind across cached runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamOrigin {
    User,
    ExtractedLiteral,
    Filter,
}

/// A single bound (or declared-but-unbound) parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSlot {
    pub name: Option<String>,
    pub position: usize,
    pub value: Value,
    pub origin: ParamOrigin,
}

impl ParamSlot {
    #[must_use]
    pub const fn new(name: Option<String>, position: usize, value: Value, origin: ParamOrigin) -> Self {
        Self {
            name,
            position,
            value,
            origin,
        }
    }
}

/// An ordered sequence of [`ParamSlot`]s, indexable by position or name.
///
/// Invariant: names are unique, positions are contiguous after
/// [`ParamBag::compact`]. A slot can hold `Value::Null`; there is no
/// representation for "missing" inside the bag — a missing value is a
/// `ParamMissing` error raised before a slot is ever constructed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamBag {
    slots: Vec<ParamSlot>,
}

impl ParamBag {
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    #[must_use]
    pub fn from_slots(slots: Vec<ParamSlot>) -> Self {
        Self { slots }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn slots(&self) -> &[ParamSlot] {
        &self.slots
    }

    #[must_use]
    pub fn by_position(&self, position: usize) -> Option<&ParamSlot> {
        self.slots.iter().find(|s| s.position == position)
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&ParamSlot> {
        self.slots.iter().find(|s| s.name.as_deref() == Some(name))
    }

    pub fn push(&mut self, slot: ParamSlot) {
        self.slots.push(slot);
    }

    pub fn slots_mut(&mut self) -> &mut [ParamSlot] {
        &mut self.slots
    }

    /// Renumbers positions to be contiguous and 1-based, preserving order.
    pub fn compact(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.position = i + 1;
        }
    }

    #[must_use]
    pub fn values(&self) -> Vec<&Value> {
        self.slots.iter().map(|s| &s.value).collect()
    }

    /// Iterates the bag slot by slot: parameter count must equal placeholder
    /// count, and every placeholder references a unique slot.
    pub fn iter(&self) -> std::slice::Iter<'_, ParamSlot> {
        self.slots.iter()
    }
}

impl<'a> IntoIterator for &'a ParamBag {
    type Item = &'a ParamSlot;
    type IntoIter = std::slice::Iter<'a, ParamSlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_renumbers_contiguously() {
        let mut bag = ParamBag::from_slots(vec![
            ParamSlot::new(None, 5, Value::Int(1), ParamOrigin::User),
            ParamSlot::new(None, 9, Value::Int(2), ParamOrigin::User),
        ]);
        bag.compact();
        assert_eq!(bag.by_position(1).unwrap().value, Value::Int(1));
        assert_eq!(bag.by_position(2).unwrap().value, Value::Int(2));
    }

    #[test]
    fn lookup_by_name_and_position() {
        let bag = ParamBag::from_slots(vec![ParamSlot::new(
            Some("id".to_string()),
            1,
            Value::Int(7),
            ParamOrigin::User,
        )]);
        assert_eq!(bag.by_name("id").unwrap().value, Value::Int(7));
        assert_eq!(bag.by_position(1).unwrap().value, Value::Int(7));
        assert!(bag.by_name("missing").is_none());
    }
}
