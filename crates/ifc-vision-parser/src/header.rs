// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP envelope validation and HEADER section parsing

use crate::tokenizer::{parse_parameters, Token};
use ifc_vision_model::{EngineError, IfcSchema, ModelMetadata, Result};

/// Check that the content is a complete STEP physical file
///
/// Requires the `ISO-10303-21;` magic, a HEADER and a DATA section, and the
/// `END-ISO-10303-21` trailer. A missing trailer means a truncated download.
pub fn validate_envelope(content: &str) -> Result<()> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    if !trimmed.starts_with("ISO-10303-21;") {
        return Err(EngineError::format("missing ISO-10303-21 signature"));
    }
    if !content.contains("HEADER;") {
        return Err(EngineError::format("missing HEADER section"));
    }
    if !content.contains("DATA;") {
        return Err(EngineError::format("missing DATA section"));
    }
    if !content.contains("END-ISO-10303-21") {
        return Err(EngineError::format("file is truncated"));
    }
    Ok(())
}

/// Text of the HEADER section, between `HEADER;` and the first `ENDSEC;`
fn header_section(content: &str) -> Result<&str> {
    let start = content
        .find("HEADER;")
        .ok_or_else(|| EngineError::header("missing HEADER section"))?
        + "HEADER;".len();
    let len = content[start..]
        .find("ENDSEC;")
        .ok_or_else(|| EngineError::header("unterminated HEADER section"))?;
    Ok(&content[start..start + len])
}

/// Parameters of a header record such as `FILE_NAME(...)`
fn record<'a>(header: &'a str, keyword: &str) -> Option<Vec<Token<'a>>> {
    let mut from = 0;
    while let Some(offset) = header[from..].find(keyword) {
        let at = from + offset;
        let rest = header[at + keyword.len()..].trim_start();
        // FILE_NAME must not match FILE_NAME_EXTENSION and the like
        if rest.starts_with('(') {
            return parse_parameters(rest).ok();
        }
        from = at + keyword.len();
    }
    None
}

fn text(tokens: &[Token<'_>], index: usize) -> Option<String> {
    let value = match tokens.get(index)? {
        Token::List(items) => items.first()?.as_str()?,
        other => other.as_str()?,
    };
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Parse FILE_NAME and FILE_SCHEMA from the HEADER section
///
/// Unsupported schemas are rejected so the caller never catalogs a file the
/// viewer cannot display.
pub fn parse_header(content: &str) -> Result<ModelMetadata> {
    let header = header_section(content)?;

    let schema_tokens = record(header, "FILE_SCHEMA")
        .ok_or_else(|| EngineError::header("missing FILE_SCHEMA"))?;
    let schema_name = schema_tokens
        .first()
        .and_then(Token::as_list)
        .and_then(|list| list.first())
        .and_then(Token::as_str)
        .ok_or_else(|| EngineError::header("empty FILE_SCHEMA"))?;
    let schema = IfcSchema::parse(&schema_name)
        .ok_or_else(|| EngineError::UnsupportedSchema(schema_name.to_string()))?;

    let mut metadata = ModelMetadata {
        schema,
        ..Default::default()
    };

    // FILE_NAME(name, time_stamp, (author), (organization), preprocessor, originating_system, authorization)
    if let Some(file_name) = record(header, "FILE_NAME") {
        metadata.file_name = text(&file_name, 0);
        metadata.timestamp = text(&file_name, 1);
        metadata.author = text(&file_name, 2);
        metadata.organization = text(&file_name, 3);
        metadata.preprocessor_version = text(&file_name, 4);
        metadata.originating_system = text(&file_name, 5);
    } else {
        log::debug!("[Header] No FILE_NAME record");
    }

    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER_IFC: &str = "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('tower.ifc','2024-01-01T00:00:00',('Jane'),('ACME'),'IfcOpenShell','Revit','');
FILE_SCHEMA(('IFC4X3_ADD2'));
ENDSEC;
DATA;
ENDSEC;
END-ISO-10303-21;
";

    #[test]
    fn test_validate_envelope() {
        assert!(validate_envelope(HEADER_IFC).is_ok());
    }

    #[test]
    fn test_rejects_non_step_content() {
        let err = validate_envelope("PK\u{3}\u{4} not a step file").unwrap_err();
        assert!(matches!(err, EngineError::InvalidFormat(_)));
    }

    #[test]
    fn test_rejects_truncated_file() {
        let truncated = &HEADER_IFC[..HEADER_IFC.find("END-ISO").unwrap()];
        let err = validate_envelope(truncated).unwrap_err();
        assert_eq!(err, EngineError::format("file is truncated"));
    }

    #[test]
    fn test_parse_header_metadata() {
        let metadata = parse_header(HEADER_IFC).unwrap();
        assert_eq!(metadata.schema, IfcSchema::Ifc4x3);
        assert_eq!(metadata.file_name.as_deref(), Some("tower.ifc"));
        assert_eq!(metadata.author.as_deref(), Some("Jane"));
        assert_eq!(metadata.organization.as_deref(), Some("ACME"));
        assert_eq!(metadata.originating_system.as_deref(), Some("Revit"));
    }

    #[test]
    fn test_unsupported_schema() {
        let content = HEADER_IFC.replace("IFC4X3_ADD2", "IFC5");
        let err = parse_header(&content).unwrap_err();
        assert_eq!(err, EngineError::UnsupportedSchema("IFC5".to_string()));
    }

    #[test]
    fn test_missing_schema() {
        let content = HEADER_IFC.replace("FILE_SCHEMA(('IFC4X3_ADD2'));", "");
        assert!(matches!(
            parse_header(&content),
            Err(EngineError::InvalidHeader(_))
        ));
    }
}
