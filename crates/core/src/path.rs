//! Payload path engine
//!
//! Resolves dotted paths against nested payloads. A segment addresses a
//! map key, or an index when the parent node is a sequence. The engine
//! backs [`Event::get_field`](crate::Event::get_field) and friends, and
//! is shared by processors and bindings that navigate event data.
//!
//! # Path rules
//!
//! - Segments are split on `.`; a path addresses exactly one node
//! - Sequence indices are base-10, unsigned, no sign; leading zeros are
//!   allowed (`"01"` == 1)
//! - Reads miss (`NoSuchField`) on unknown keys, out-of-range indices
//!   and descents into primitives
//! - Writes reshape: absent intermediate nodes materialize as a
//!   sequence when the *next* segment is an integer, as a mapping
//!   otherwise; writing past the end of a sequence extends it with
//!   nulls first
//! - Writes fail (`InvalidPath`) on non-integer segments against a
//!   sequence and on descents through existing primitives

use std::collections::HashMap;

use crate::error::PathError;
use crate::payload::Payload;

/// Parse a path segment as a sequence index
///
/// Base-10, digits only; `"01"` parses to 1, signs are rejected.
fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Resolve a dotted path to a node, borrowing it from the payload
///
/// Returns [`PathError::NoSuchField`] when any segment misses: an absent
/// map key, an out-of-range or non-integer index against a sequence, or
/// a descent into a primitive.
pub fn find_in_payload<'a>(payload: &'a Payload, key: &str) -> Result<&'a Payload, PathError> {
    let mut node = payload;
    for segment in key.split('.') {
        node = match node {
            Payload::Mapping(map) => map.get(segment).ok_or(PathError::NoSuchField)?,
            Payload::Sequence(seq) => {
                let index = parse_index(segment).ok_or(PathError::NoSuchField)?;
                seq.get(index).ok_or(PathError::NoSuchField)?
            }
            _ => return Err(PathError::NoSuchField),
        };
    }
    Ok(node)
}

/// Write a value at a dotted path, returning the new root
///
/// The root itself may be created or reshaped: a null root becomes a
/// sequence when the first segment is an integer, a mapping otherwise.
/// The terminal segment replaces the addressed node without merging.
pub fn put_in_payload(payload: Payload, key: &str, value: Payload) -> Result<Payload, PathError> {
    try_put(payload, key, value).map_err(|(_, err)| err)
}

/// Remove the node at a dotted path, returning the new root
///
/// Map entries are removed; sequence elements are spliced out, shifting
/// the tail left. Returns [`PathError::NoSuchField`] when any segment
/// misses.
pub fn delete_from_payload(payload: Payload, key: &str) -> Result<Payload, PathError> {
    try_delete(payload, key).map_err(|(_, err)| err)
}

/// Put variant that hands the untouched payload back on failure
///
/// [`Event::set_field`](crate::Event::set_field) uses this to keep the
/// event data intact when the path is invalid.
pub(crate) fn try_put(
    payload: Payload,
    key: &str,
    value: Payload,
) -> Result<Payload, (Payload, PathError)> {
    if key.is_empty() {
        return Err((payload, PathError::InvalidPath));
    }
    let segments: Vec<&str> = key.split('.').collect();
    put_node(payload, &segments, value)
}

/// Delete variant that hands the untouched payload back on failure
pub(crate) fn try_delete(payload: Payload, key: &str) -> Result<Payload, (Payload, PathError)> {
    if key.is_empty() {
        return Err((payload, PathError::InvalidPath));
    }
    let segments: Vec<&str> = key.split('.').collect();
    delete_node(payload, &segments)
}

fn put_node(
    node: Payload,
    segments: &[&str],
    value: Payload,
) -> Result<Payload, (Payload, PathError)> {
    let segment = segments[0];
    let rest = &segments[1..];

    match node {
        Payload::Mapping(mut map) => {
            // integer-looking segments are plain keys against a mapping
            if rest.is_empty() {
                map.insert(segment.to_owned(), value);
                return Ok(Payload::Mapping(map));
            }
            let existing = map.remove(segment);
            let existed = existing.is_some();
            match put_node(existing.unwrap_or(Payload::Null), rest, value) {
                Ok(child) => {
                    map.insert(segment.to_owned(), child);
                    Ok(Payload::Mapping(map))
                }
                Err((child, err)) => {
                    if existed {
                        map.insert(segment.to_owned(), child);
                    }
                    Err((Payload::Mapping(map), err))
                }
            }
        }
        Payload::Sequence(mut seq) => {
            let Some(index) = parse_index(segment) else {
                return Err((Payload::Sequence(seq), PathError::InvalidPath));
            };
            if rest.is_empty() {
                if index >= seq.len() {
                    seq.resize(index + 1, Payload::Null);
                }
                seq[index] = value;
                return Ok(Payload::Sequence(seq));
            }
            if index < seq.len() {
                let child = std::mem::take(&mut seq[index]);
                match put_node(child, rest, value) {
                    Ok(child) => {
                        seq[index] = child;
                        Ok(Payload::Sequence(seq))
                    }
                    Err((child, err)) => {
                        seq[index] = child;
                        Err((Payload::Sequence(seq), err))
                    }
                }
            } else {
                match put_node(Payload::Null, rest, value) {
                    Ok(child) => {
                        seq.resize(index + 1, Payload::Null);
                        seq[index] = child;
                        Ok(Payload::Sequence(seq))
                    }
                    Err((_, err)) => Err((Payload::Sequence(seq), err)),
                }
            }
        }
        Payload::Null => {
            // materialize the container the current segment calls for
            let container = if parse_index(segment).is_some() {
                Payload::Sequence(Vec::new())
            } else {
                Payload::Mapping(HashMap::new())
            };
            match put_node(container, segments, value) {
                Ok(node) => Ok(node),
                Err((_, err)) => Err((Payload::Null, err)),
            }
        }
        primitive => Err((primitive, PathError::InvalidPath)),
    }
}

fn delete_node(node: Payload, segments: &[&str]) -> Result<Payload, (Payload, PathError)> {
    let segment = segments[0];
    let rest = &segments[1..];

    match node {
        Payload::Mapping(mut map) => {
            if rest.is_empty() {
                return match map.remove(segment) {
                    Some(_) => Ok(Payload::Mapping(map)),
                    None => Err((Payload::Mapping(map), PathError::NoSuchField)),
                };
            }
            let Some(child) = map.remove(segment) else {
                return Err((Payload::Mapping(map), PathError::NoSuchField));
            };
            match delete_node(child, rest) {
                Ok(child) => {
                    map.insert(segment.to_owned(), child);
                    Ok(Payload::Mapping(map))
                }
                Err((child, err)) => {
                    map.insert(segment.to_owned(), child);
                    Err((Payload::Mapping(map), err))
                }
            }
        }
        Payload::Sequence(mut seq) => {
            let Some(index) = parse_index(segment) else {
                return Err((Payload::Sequence(seq), PathError::NoSuchField));
            };
            if index >= seq.len() {
                return Err((Payload::Sequence(seq), PathError::NoSuchField));
            }
            if rest.is_empty() {
                seq.remove(index);
                return Ok(Payload::Sequence(seq));
            }
            let child = std::mem::take(&mut seq[index]);
            match delete_node(child, rest) {
                Ok(child) => {
                    seq[index] = child;
                    Ok(Payload::Sequence(seq))
                }
                Err((child, err)) => {
                    seq[index] = child;
                    Err((Payload::Sequence(seq), err))
                }
            }
        }
        other => Err((other, PathError::NoSuchField)),
    }
}

#[cfg(test)]
#[path = "path_test.rs"]
mod tests;
