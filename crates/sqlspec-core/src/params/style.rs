//! Placeholder-style detection, scanning, allocation, merging and binding.
//!
//! Scanning honors quoting and comment rules so that placeholder-looking
//! bytes inside string literals or comments are never mistaken for real
//! placeholders.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{ParamBag, ParamOrigin, ParamSlot};
use crate::error::{SqlSpecError, SqlSpecResult};
use crate::value::Value;

/// Target/source placeholder convention. `Static` only ever appears as a
/// *target* for rendering (literals inlined, no placeholders emitted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceholderStyle {
    Qmark,
    NumericDollar,
    NumericColon,
    NamedColon,
    NamedAt,
    PyformatPositional,
    PyformatNamed,
    Static,
}

/// Same shape as [`PlaceholderStyle`] minus `Static`, since a style can
/// never be *detected* as "inline the literal" — that is purely a render
/// target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    Qmark,
    NumericDollar,
    NumericColon,
    NamedColon,
    NamedAt,
    PyformatPositional,
    PyformatNamed,
}

impl From<PlaceholderKind> for PlaceholderStyle {
    fn from(k: PlaceholderKind) -> Self {
        match k {
            PlaceholderKind::Qmark => Self::Qmark,
            PlaceholderKind::NumericDollar => Self::NumericDollar,
            PlaceholderKind::NumericColon => Self::NumericColon,
            PlaceholderKind::NamedColon => Self::NamedColon,
            PlaceholderKind::NamedAt => Self::NamedAt,
            PlaceholderKind::PyformatPositional => Self::PyformatPositional,
            PlaceholderKind::PyformatNamed => Self::PyformatNamed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub span: (usize, usize),
    pub kind: PlaceholderKind,
    pub name: Option<String>,
    pub index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectedStyle {
    None,
    Single(PlaceholderStyle),
    Mixed,
}

/// Scans `sql`, classifying quote/comment regions, and returns every
/// placeholder found in order, ignoring any placeholder-looking bytes that
/// fall inside a string literal, quoted identifier, or comment.
#[must_use]
pub fn parse_placeholders(sql: &str) -> Vec<Placeholder> {
    let bytes = sql.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;

    #[derive(PartialEq)]
    enum Mode {
        Code,
        SingleQuoted,
        DoubleQuoted,
        LineComment,
        BlockComment,
    }
    let mut mode = Mode::Code;

    while i < bytes.len() {
        let c = bytes[i];
        match mode {
            Mode::SingleQuoted => {
                if c == b'\'' {
                    if bytes.get(i + 1) == Some(&b'\'') {
                        i += 2;
                        continue;
                    }
                    mode = Mode::Code;
                }
                i += 1;
            }
            Mode::DoubleQuoted => {
                if c == b'"' {
                    mode = Mode::Code;
                }
                i += 1;
            }
            Mode::LineComment => {
                if c == b'\n' {
                    mode = Mode::Code;
                }
                i += 1;
            }
            Mode::BlockComment => {
                if c == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    i += 2;
                    mode = Mode::Code;
                } else {
                    i += 1;
                }
            }
            Mode::Code => {
                if c == b'\'' {
                    mode = Mode::SingleQuoted;
                    i += 1;
                } else if c == b'"' {
                    mode = Mode::DoubleQuoted;
                    i += 1;
                } else if c == b'-' && bytes.get(i + 1) == Some(&b'-') {
                    mode = Mode::LineComment;
                    i += 2;
                } else if c == b'/' && bytes.get(i + 1) == Some(&b'*') {
                    mode = Mode::BlockComment;
                    i += 2;
                } else if let Some((ph, next)) = try_match_placeholder(sql, i) {
                    out.push(ph);
                    i = next;
                } else {
                    i += 1;
                }
            }
        }
    }
    out
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}
fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn try_match_placeholder(sql: &str, i: usize) -> Option<(Placeholder, usize)> {
    let bytes = sql.as_bytes();
    let c = bytes[i];
    match c {
        b'?' => Some((
            Placeholder {
                span: (i, i + 1),
                kind: PlaceholderKind::Qmark,
                name: None,
                index: None,
            },
            i + 1,
        )),
        b'$' => {
            let mut j = i + 1;
            while bytes.get(j).is_some_and(u8::is_ascii_digit) {
                j += 1;
            }
            if j > i + 1 {
                let idx: usize = sql[i + 1..j].parse().ok()?;
                Some((
                    Placeholder {
                        span: (i, j),
                        kind: PlaceholderKind::NumericDollar,
                        name: None,
                        index: Some(idx),
                    },
                    j,
                ))
            } else {
                None
            }
        }
        b':' => {
            let mut j = i + 1;
            if bytes.get(j).is_some_and(u8::is_ascii_digit) {
                while bytes.get(j).is_some_and(u8::is_ascii_digit) {
                    j += 1;
                }
                let idx: usize = sql[i + 1..j].parse().ok()?;
                Some((
                    Placeholder {
                        span: (i, j),
                        kind: PlaceholderKind::NumericColon,
                        name: None,
                        index: Some(idx),
                    },
                    j,
                ))
            } else if bytes.get(j).is_some_and(|&b| is_ident_start(b)) {
                while bytes.get(j).is_some_and(|&b| is_ident_continue(b)) {
                    j += 1;
                }
                Some((
                    Placeholder {
                        span: (i, j),
                        kind: PlaceholderKind::NamedColon,
                        name: Some(sql[i + 1..j].to_string()),
                        index: None,
                    },
                    j,
                ))
            } else {
                None
            }
        }
        b'@' => {
            let mut j = i + 1;
            if bytes.get(j).is_some_and(|&b| is_ident_start(b)) {
                while bytes.get(j).is_some_and(|&b| is_ident_continue(b)) {
                    j += 1;
                }
                Some((
                    Placeholder {
                        span: (i, j),
                        kind: PlaceholderKind::NamedAt,
                        name: Some(sql[i + 1..j].to_string()),
                        index: None,
                    },
                    j,
                ))
            } else {
                None
            }
        }
        b'%' => {
            if bytes.get(i + 1) == Some(&b's') {
                Some((
                    Placeholder {
                        span: (i, i + 2),
                        kind: PlaceholderKind::PyformatPositional,
                        name: None,
                        index: None,
                    },
                    i + 2,
                ))
            } else if bytes.get(i + 1) == Some(&b'(') {
                let mut j = i + 2;
                while bytes.get(j).is_some_and(|&b| b != b')') {
                    j += 1;
                }
                let name_end = j;
                if bytes.get(j) == Some(&b')') && bytes.get(j + 1) == Some(&b's') {
                    let name = sql[i + 2..name_end].to_string();
                    Some((
                        Placeholder {
                            span: (i, j + 2),
                            kind: PlaceholderKind::PyformatNamed,
                            name: Some(name),
                            index: None,
                        },
                        j + 2,
                    ))
                } else {
                    None
                }
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Classifies the placeholder convention used in `sql`. Returns
/// `DetectedStyle::None` when there are no placeholders at all.
#[must_use]
pub fn detect_style(sql: &str) -> DetectedStyle {
    let placeholders = parse_placeholders(sql);
    if placeholders.is_empty() {
        return DetectedStyle::None;
    }
    let first_kind = placeholders[0].kind;
    if placeholders
        .iter()
        .all(|p| same_style_family(p.kind, first_kind))
    {
        DetectedStyle::Single(first_kind.into())
    } else {
        DetectedStyle::Mixed
    }
}

fn same_style_family(a: PlaceholderKind, b: PlaceholderKind) -> bool {
    std::mem::discriminant(&a) == std::mem::discriminant(&b)
}

/// Yields `"{prefix}_1"`, `"{prefix}_2"`, … skipping any name already
/// present in `taken`.
#[must_use]
pub fn allocate(prefix: &str, taken: &std::collections::HashSet<String>) -> String {
    let mut n = 1usize;
    loop {
        let candidate = format!("{prefix}_{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Appends `extracted` slots after `primary`, renumbering positions.
/// Fails with `ParamConflict` if a name collides with a *different* value;
/// same name + equal value is idempotent (the second copy is dropped).
pub fn merge(primary: &ParamBag, extracted: &ParamBag) -> SqlSpecResult<ParamBag> {
    let mut merged: Vec<ParamSlot> = primary.slots().to_vec();

    for slot in extracted.slots() {
        if let Some(name) = &slot.name {
            if let Some(existing) = merged.iter().find(|s| s.name.as_deref() == Some(name)) {
                if existing.value == slot.value {
                    continue;
                }
                return Err(SqlSpecError::ParamConflict { name: name.clone() });
            }
        }
        merged.push(slot.clone());
    }

    let mut bag = ParamBag::from_slots(merged);
    bag.compact();
    Ok(bag)
}

/// One declared parameter slot, derived from placeholders found in the SQL
/// (or constructed directly by the query builder), independent of whether
/// it has a bound value yet.
#[derive(Debug, Clone)]
pub struct SlotSpec {
    pub name: Option<String>,
    pub position: usize,
}

/// The three shapes a caller may supply parameter values in.
pub enum BindInput {
    Positional(Vec<Value>),
    Named(HashMap<String, Value>),
    Blended(Vec<Value>, HashMap<String, Value>),
}

/// Binds `input` onto `specs` in order: positional values fill
/// name-less slots in order, named values fill named slots by name.
/// Every slot must end up with a value (`ParamMissing`); every supplied
/// value must be consumed (`ParamArityMismatch`).
pub fn bind(input: BindInput, specs: &[SlotSpec]) -> SqlSpecResult<ParamBag> {
    let (mut positional, named) = match input {
        BindInput::Positional(v) => (v, HashMap::new()),
        BindInput::Named(m) => (Vec::new(), m),
        BindInput::Blended(v, m) => (v, m),
    };
    positional.reverse(); // pop() from the front

    let mut slots = Vec::with_capacity(specs.len());
    for spec in specs {
        let value = if let Some(name) = &spec.name {
            named
                .get(name)
                .cloned()
                .ok_or_else(|| SqlSpecError::ParamMissing { slot: name.clone() })?
        } else {
            positional
                .pop()
                .ok_or_else(|| SqlSpecError::ParamMissing {
                    slot: spec.position.to_string(),
                })?
        };
        slots.push(ParamSlot::new(
            spec.name.clone(),
            spec.position,
            value,
            ParamOrigin::User,
        ));
    }

    if !positional.is_empty() {
        return Err(SqlSpecError::ParamArityMismatch {
            expected: specs.len(),
            actual: specs.len() + positional.len(),
        });
    }

    let named_used: std::collections::HashSet<&String> =
        specs.iter().filter_map(|s| s.name.as_ref()).collect();
    if named.len() > named_used.len() {
        return Err(SqlSpecError::ParamArityMismatch {
            expected: named_used.len(),
            actual: named.len(),
        });
    }

    Ok(ParamBag::from_slots(slots))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_placeholder_inside_string_literal() {
        let sql = "SELECT * FROM t WHERE name = 'what? $1 :x' AND id = ?";
        let found = parse_placeholders(sql);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, PlaceholderKind::Qmark);
    }

    #[test]
    fn ignores_placeholder_inside_comment() {
        let sql = "SELECT 1 -- what about ? $2\nWHERE id = $1";
        let found = parse_placeholders(sql);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].index, Some(1));
    }

    #[test]
    fn detects_mixed_styles() {
        let sql = "SELECT * FROM t WHERE a = ? AND b = $1";
        assert_eq!(detect_style(sql), DetectedStyle::Mixed);
    }

    #[test]
    fn detects_single_style() {
        let sql = "SELECT * FROM t WHERE a = $1 AND b = $2";
        assert_eq!(
            detect_style(sql),
            DetectedStyle::Single(PlaceholderStyle::NumericDollar)
        );
    }

    #[test]
    fn allocate_skips_taken_names() {
        let mut taken = std::collections::HashSet::new();
        taken.insert("param_1".to_string());
        assert_eq!(allocate("param", &taken), "param_2");
    }

    #[test]
    fn merge_is_idempotent_for_equal_values() {
        let mut primary = ParamBag::new();
        primary.push(ParamSlot::new(
            Some("id".to_string()),
            1,
            Value::Int(1),
            ParamOrigin::User,
        ));
        let mut extracted = ParamBag::new();
        extracted.push(ParamSlot::new(
            Some("id".to_string()),
            1,
            Value::Int(1),
            ParamOrigin::ExtractedLiteral,
        ));
        let merged = merge(&primary, &extracted).unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn merge_conflict_on_same_name_different_value() {
        let mut primary = ParamBag::new();
        primary.push(ParamSlot::new(
            Some("id".to_string()),
            1,
            Value::Int(1),
            ParamOrigin::User,
        ));
        let mut extracted = ParamBag::new();
        extracted.push(ParamSlot::new(
            Some("id".to_string()),
            1,
            Value::Int(2),
            ParamOrigin::ExtractedLiteral,
        ));
        assert!(matches!(
            merge(&primary, &extracted),
            Err(SqlSpecError::ParamConflict { .. })
        ));
    }

    #[test]
    fn bind_positional_in_order() {
        let specs = vec![
            SlotSpec {
                name: None,
                position: 1,
            },
            SlotSpec {
                name: None,
                position: 2,
            },
        ];
        let bag = bind(
            BindInput::Positional(vec![Value::Int(1), Value::Int(2)]),
            &specs,
        )
        .unwrap();
        assert_eq!(bag.by_position(1).unwrap().value, Value::Int(1));
        assert_eq!(bag.by_position(2).unwrap().value, Value::Int(2));
    }

    #[test]
    fn bind_arity_mismatch_on_extra_values() {
        let specs = vec![SlotSpec {
            name: None,
            position: 1,
        }];
        let result = bind(
            BindInput::Positional(vec![Value::Int(1), Value::Int(2)]),
            &specs,
        );
        assert!(matches!(
            result,
            Err(SqlSpecError::ParamArityMismatch { .. })
        ));
    }
}
