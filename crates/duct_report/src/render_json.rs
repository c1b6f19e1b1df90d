//! JSON renderer. Section order is cover → skipped → variants → integrity;
//! artifacts are canonicalized by the writer, so key order here is cosmetic.

use serde_json::Value;

use crate::{ReportError, ReportModel};

pub fn render_json(model: &ReportModel) -> Result<Value, ReportError> {
    serde_json::to_value(model).map_err(|e| ReportError::Serialize(e.to_string()))
}
