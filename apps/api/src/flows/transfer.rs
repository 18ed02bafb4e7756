//! JSON export and import of flow definitions.
//!
//! The exported document is exactly the in-memory flow list. Import accepts
//! either that list or a single flow object, and is all-or-nothing: every
//! flow must parse and validate before any of them is handed to the store.

use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::flows::store::validate_definition;
use crate::models::flow::FollowUpFlow;

pub const IMPORT_SUFFIX: &str = "(Imported)";

/// Parses an uploaded document into flows ready to append: fresh ids and
/// suffixed names, everything else kept as written.
pub fn parse_import(bytes: &[u8]) -> Result<Vec<FollowUpFlow>, AppError> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|e| AppError::Import(format!("file is not valid JSON: {e}")))?;

    let flows: Vec<FollowUpFlow> = match document {
        Value::Array(_) => serde_json::from_value(document),
        Value::Object(_) => serde_json::from_value::<FollowUpFlow>(document).map(|flow| vec![flow]),
        _ => {
            return Err(AppError::Import(
                "expected a flow object or a list of flows".to_string(),
            ))
        }
    }
    .map_err(|e| AppError::Import(format!("document does not match the flow shape: {e}")))?;

    if flows.is_empty() {
        return Err(AppError::Import("document contains no flows".to_string()));
    }

    flows
        .into_iter()
        .enumerate()
        .map(|(idx, flow)| {
            validate_definition(&flow.name, &flow.actions)
                .map_err(|e| AppError::Import(format!("flow {}: {e}", idx + 1)))?;
            flow.analytics
                .check_ranges()
                .map_err(|e| AppError::Import(format!("flow {}: {e}", idx + 1)))?;
            Ok(rebrand(flow))
        })
        .collect()
}

fn rebrand(mut flow: FollowUpFlow) -> FollowUpFlow {
    flow.id = Uuid::new_v4();
    flow.name = format!("{} {}", flow.name, IMPORT_SUFFIX);
    flow
}
