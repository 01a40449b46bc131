//! Extraction wire format parsing and feedback payload construction.
//!
//! The extractions endpoint returns two sections: `candidates` (entity name
//! to ordered list of alternative values) and `extractions` (field name to
//! the primary value, which references its candidate group by name). Table
//! shaped results arrive in a third `compoundExtractions` section. Parsing
//! is pure; the HTTP gateway hands the deserialized response here.

use serde::Deserialize;
use std::collections::HashMap;
use tracing::trace;

use docside_core::{
    BoundingBox, CompoundExtraction, Extraction, ExtractionBundle, SpecificExtraction,
};

/// Wire shape of `GET documents/{id}/extractions`.
#[derive(Debug, Deserialize)]
pub struct ExtractionsResponse {
    /// Entity name → ordered alternative values.
    #[serde(default)]
    pub candidates: HashMap<String, Vec<ExtractionWire>>,
    /// Field name → primary extraction.
    #[serde(default)]
    pub extractions: HashMap<String, SpecificWire>,
    /// Compound name → ordered rows of field name → extraction.
    #[serde(default, rename = "compoundExtractions")]
    pub compound_extractions: HashMap<String, Vec<HashMap<String, SpecificWire>>>,
}

/// A bare extraction value on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionWire {
    pub entity: String,
    pub value: String,
    #[serde(rename = "box")]
    pub bounding_box: Option<BoundingBox>,
}

/// A named extraction on the wire; `candidates` references a group in the
/// response's candidates section by name.
#[derive(Debug, Clone, Deserialize)]
pub struct SpecificWire {
    pub entity: String,
    pub value: String,
    #[serde(rename = "box")]
    pub bounding_box: Option<BoundingBox>,
    pub candidates: Option<String>,
    /// Nested sub-fields, e.g. the parts of a payment recipient.
    #[serde(default)]
    pub extractions: HashMap<String, SpecificWire>,
}

/// Turn a wire response into the caller-facing extraction bundle.
///
/// Every named extraction appears in the result: one whose declared
/// candidate group is missing from the candidates section gets an empty
/// candidate list rather than being dropped.
pub fn parse_extractions(response: ExtractionsResponse) -> ExtractionBundle {
    let candidates = response.candidates;

    let specific = response
        .extractions
        .into_iter()
        .map(|(name, wire)| {
            let parsed = to_specific(&name, wire, &candidates);
            (name, parsed)
        })
        .collect();

    let compound = response
        .compound_extractions
        .into_iter()
        .map(|(name, rows)| {
            let rows = rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|(field, wire)| {
                            let parsed = to_specific(&field, wire, &candidates);
                            (field, parsed)
                        })
                        .collect()
                })
                .collect();
            let compound = CompoundExtraction {
                name: name.clone(),
                rows,
            };
            (name, compound)
        })
        .collect();

    ExtractionBundle { specific, compound }
}

fn to_extraction(wire: ExtractionWire) -> Extraction {
    Extraction::new(wire.entity, wire.value, wire.bounding_box)
}

fn to_specific(
    name: &str,
    wire: SpecificWire,
    candidates: &HashMap<String, Vec<ExtractionWire>>,
) -> SpecificExtraction {
    let candidate_list = wire
        .candidates
        .as_deref()
        .and_then(|group| candidates.get(group))
        .map(|group| group.iter().cloned().map(to_extraction).collect())
        .unwrap_or_default();

    let nested = wire
        .extractions
        .into_iter()
        .map(|(nested_name, nested_wire)| to_specific(&nested_name, nested_wire, candidates))
        .collect();

    trace!(name, entity = %wire.entity, "Parsed extraction");

    SpecificExtraction {
        name: name.to_string(),
        extraction: Extraction::new(wire.entity, wire.value, wire.bounding_box),
        candidates: candidate_list,
        nested,
    }
}

fn feedback_entry(specific: &SpecificExtraction) -> serde_json::Value {
    let mut entry = serde_json::Map::new();
    entry.insert("entity".into(), specific.entity().into());
    entry.insert("value".into(), specific.value().into());
    if let Some(bounding_box) = specific.extraction.bounding_box() {
        entry.insert(
            "box".into(),
            serde_json::to_value(bounding_box).unwrap_or(serde_json::Value::Null),
        );
    }
    serde_json::Value::Object(entry)
}

/// Build the `PUT .../extractions` feedback body from the current values of
/// the submitted extractions.
pub fn feedback_payload(extractions: &HashMap<String, SpecificExtraction>) -> serde_json::Value {
    let feedback: serde_json::Map<String, serde_json::Value> = extractions
        .iter()
        .map(|(name, specific)| (name.clone(), feedback_entry(specific)))
        .collect();

    serde_json::json!({ "feedback": feedback })
}

/// Build a feedback body covering named and compound extractions together.
///
/// Compound rows keep their order; the `compoundFeedback` section is omitted
/// when the bundle carries no compound extractions.
pub fn bundle_feedback_payload(bundle: &ExtractionBundle) -> serde_json::Value {
    let mut payload = feedback_payload(&bundle.specific);

    if !bundle.compound.is_empty() {
        let compound: serde_json::Map<String, serde_json::Value> = bundle
            .compound
            .iter()
            .map(|(name, table)| {
                let rows: Vec<serde_json::Value> = table
                    .rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|(field, specific)| (field.clone(), feedback_entry(specific)))
                            .collect::<serde_json::Map<_, _>>()
                            .into()
                    })
                    .collect();
                (name.clone(), serde_json::Value::Array(rows))
            })
            .collect();
        payload["compoundFeedback"] = serde_json::Value::Object(compound);
    }

    payload
}
