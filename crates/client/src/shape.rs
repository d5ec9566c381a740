//! Response shape normalization.
//!
//! Dokploy answers the same logical operation with one of three shapes
//! depending on endpoint and platform version: a keyed wrapper object
//! (`{"application": {...}}`), a bare entity object, or the literal `true`.
//! All shape detection lives here so call sites only handle the resolved
//! entity or the ack case.

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Entities with a primary identifier field. The normalizer accepts a decoded
/// entity only when this is non-empty, since Dokploy error payloads often
/// decode cleanly into an all-default struct.
pub(crate) trait Identified {
    fn primary_id(&self) -> &str;
}

/// Outcome of normalizing a response body.
#[derive(Debug)]
pub(crate) enum Parsed<T> {
    /// A usable entity was resolved.
    Entity(T),
    /// The API acknowledged success without returning the entity; the caller
    /// must re-resolve it out of band (list or parent re-fetch).
    Ack,
}

/// Resolves `raw` into `T`, trying the wrapper key first, then a bare object,
/// then the literal `true`. Order matters: every shape has been observed in
/// the wild and the wrapper form also decodes as an (empty) bare entity.
pub(crate) fn parse_entity<T>(raw: &str, wrapper_key: &'static str) -> Result<Parsed<T>>
where
    T: DeserializeOwned + Identified,
{
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
        if let Some(inner) = value.get(wrapper_key) {
            if let Ok(entity) = serde_json::from_value::<T>(inner.clone()) {
                if !entity.primary_id().is_empty() {
                    return Ok(Parsed::Entity(entity));
                }
            }
        }
        if let Ok(entity) = serde_json::from_value::<T>(value) {
            if !entity.primary_id().is_empty() {
                return Ok(Parsed::Entity(entity));
            }
        }
    }

    if raw.trim() == "true" {
        return Ok(Parsed::Ack);
    }

    Err(Error::Parse {
        wrapper_key,
        detail: format!("no known shape matched: {}", truncate(raw)),
    })
}

/// List variant of [`parse_entity`]: `{"<key>": [...]}` or a bare array.
pub(crate) fn parse_list<T>(raw: &str, wrapper_key: &'static str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
        if let Some(inner) = value.get(wrapper_key) {
            if let Ok(list) = serde_json::from_value::<Vec<T>>(inner.clone()) {
                return Ok(list);
            }
        }
        if let Ok(list) = serde_json::from_value::<Vec<T>>(value) {
            return Ok(list);
        }
    }
    Err(Error::Parse {
        wrapper_key,
        detail: format!("expected a list: {}", truncate(raw)),
    })
}

/// For endpoints where an ack-only body is not an acceptable answer (reads,
/// updates that must echo the entity).
pub(crate) fn require_entity<T>(parsed: Parsed<T>, wrapper_key: &'static str) -> Result<T> {
    match parsed {
        Parsed::Entity(entity) => Ok(entity),
        Parsed::Ack => Err(Error::Parse {
            wrapper_key,
            detail: "ack-only response where an entity was expected".to_string(),
        }),
    }
}

fn truncate(raw: &str) -> String {
    const LIMIT: usize = 200;
    if raw.len() <= LIMIT {
        return raw.to_string();
    }
    // The cut may land inside a multibyte character; back up to a boundary.
    let mut end = LIMIT;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &raw[..end])
}
