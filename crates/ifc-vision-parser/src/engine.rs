// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP engine: header, element catalog and units in one streaming pass

use crate::header::{parse_header, validate_envelope};
use crate::scanner::EntityScanner;
use crate::tokenizer::parse_instance;
use crate::units::UnitTable;
use ifc_vision_model::{
    has_geometry_by_name, ElementInfo, EngineError, EngineSettings, EntityId, GeometryEngine,
    ModelGeometry, ProgressCallback, Result,
};
use std::borrow::Cow;

/// Share of the progress range spent before the entity scan starts
const SCAN_START: f32 = 5.0;
/// Share of the progress range covered by the entity scan
const SCAN_SPAN: f32 = 90.0;

/// Engine that reads IFC (STEP) payloads without tessellating them
///
/// Produces the header metadata, a catalog of geometry-bearing elements and the
/// project length unit. `meshes` is left empty; a tessellating engine can be
/// plugged in through [`GeometryEngine`] instead.
#[derive(Clone, Debug, Default)]
pub struct StepEngine;

impl StepEngine {
    pub fn new() -> Self {
        Self
    }
}

/// Decode an element's GlobalId (attribute 0) and Name (attribute 2)
fn catalog_element(id: u32, type_name: &str, instance: &str) -> Result<ElementInfo> {
    let params =
        parse_instance(instance).map_err(|e| EngineError::entity_parse(EntityId(id), e))?;
    let text = |index: usize| {
        params
            .get(index)
            .and_then(|t| t.as_str())
            .map(Cow::into_owned)
    };
    Ok(ElementInfo {
        id: EntityId(id),
        ifc_type: type_name.to_ascii_uppercase(),
        global_id: text(0),
        name: text(2),
    })
}

impl GeometryEngine for StepEngine {
    fn name(&self) -> &str {
        "step"
    }

    fn build(
        &self,
        payload: &[u8],
        settings: &EngineSettings,
        on_progress: ProgressCallback,
    ) -> Result<ModelGeometry> {
        on_progress("Reading header", 0.0);

        // STEP files are ASCII; stray Latin-1 bytes in strings must not abort the load
        let content = String::from_utf8_lossy(payload);
        validate_envelope(&content)?;
        let mut metadata = parse_header(&content)?;

        log::debug!(
            "[StepEngine] {} bytes, schema {}, settings {:?}",
            payload.len(),
            metadata.schema,
            settings
        );
        on_progress("Scanning entities", SCAN_START);

        let mut scanner = EntityScanner::new(&content);
        let total = scanner.len().max(1) as f32;
        let mut units = UnitTable::new();
        let mut elements = Vec::new();
        let mut entity_count = 0usize;
        let mut skipped = 0usize;
        let mut last_reported = SCAN_START as u32;

        while let Some(span) = scanner.next_entity() {
            entity_count += 1;
            let instance = &content[span.start..span.end];

            if has_geometry_by_name(span.type_name) {
                match catalog_element(span.id, span.type_name, instance) {
                    Ok(info) => elements.push(info),
                    Err(e) => {
                        skipped += 1;
                        log::debug!("[StepEngine] Skipping element: {}", e);
                    }
                }
            } else {
                units.insert(span.id, span.type_name, instance);
            }

            let percent = SCAN_START + SCAN_SPAN * (span.end as f32 / total);
            // Throttle to whole-percent steps
            if percent as u32 > last_reported {
                last_reported = percent as u32;
                on_progress("Scanning entities", percent);
            }
        }

        if entity_count == 0 {
            return Err(EngineError::format("DATA section contains no entities"));
        }
        if skipped > 0 {
            log::warn!("[StepEngine] {} malformed elements skipped", skipped);
        }

        metadata.entity_count = entity_count;
        let unit_scale = units.length_scale();

        on_progress("Complete", 100.0);
        log::info!(
            "[StepEngine] {} entities, {} elements, unit scale {}",
            entity_count,
            elements.len(),
            unit_scale
        );

        Ok(ModelGeometry {
            metadata,
            elements,
            meshes: Vec::new(),
            unit_scale,
        })
    }
}
