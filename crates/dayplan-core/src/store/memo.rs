//! Schedule memoization signatures.
//!
//! A signature is the SHA-256 of the canonical JSON of every pure input the
//! engine reads for one date. Matching signatures mean the memoized result
//! is still valid; mutation paths additionally drop entries eagerly so a
//! torn read is impossible even if a signature collision existed.

use chrono::NaiveDate;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::{Instance, Settings, Template};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignatureInput<'a> {
    settings: &'a Settings,
    templates: Vec<&'a Template>,
    instances: Vec<&'a Instance>,
    date: NaiveDate,
}

/// Stable signature over the engine's inputs for one date.
///
/// Templates and instances are sorted by id so insertion order never leaks
/// into the key.
pub fn schedule_signature(
    settings: &Settings,
    templates: &[Template],
    instances: &[Instance],
    date: NaiveDate,
) -> String {
    let mut sorted_templates: Vec<&Template> = templates.iter().collect();
    sorted_templates.sort_by(|a, b| a.id.cmp(&b.id));
    let mut sorted_instances: Vec<&Instance> = instances.iter().collect();
    sorted_instances.sort_by(|a, b| a.id.cmp(&b.id));

    let input = SignatureInput {
        settings,
        templates: sorted_templates,
        instances: sorted_instances,
        date,
    };
    let bytes = match serde_json::to_vec(&input) {
        Ok(bytes) => bytes,
        // unreachable for these plain data types; an unkeyable signature
        // must still never collide with a real one
        Err(_) => return format!("unserializable-{date}"),
    };
    hex::encode(Sha256::digest(&bytes))
}
