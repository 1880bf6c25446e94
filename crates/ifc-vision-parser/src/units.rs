// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit scale extraction from IFC files

use crate::tokenizer::{parse_instance, Token};
use std::collections::HashMap;

/// Entity types needed to resolve the project length unit
pub(crate) const UNIT_TYPES: &[&str] = &[
    "IFCPROJECT",
    "IFCUNITASSIGNMENT",
    "IFCSIUNIT",
    "IFCCONVERSIONBASEDUNIT",
    "IFCMEASUREWITHUNIT",
];

/// Decoded unit-related entities, keyed by instance id
#[derive(Default)]
pub struct UnitTable<'a> {
    entities: HashMap<u32, (&'a str, Vec<Token<'a>>)>,
    project: Option<u32>,
}

impl<'a> UnitTable<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entity instance if it takes part in unit resolution
    ///
    /// Type names match case-insensitively and are stored upper-case.
    pub fn insert(&mut self, id: u32, type_name: &'a str, instance: &'a str) {
        let Some(&type_name) = UNIT_TYPES
            .iter()
            .find(|t| t.eq_ignore_ascii_case(type_name))
        else {
            return;
        };
        let Ok(params) = parse_instance(instance) else {
            log::debug!("[Units] Skipping malformed #{} {}", id, type_name);
            return;
        };
        if type_name == "IFCPROJECT" && self.project.is_none() {
            self.project = Some(id);
        }
        self.entities.insert(id, (type_name, params));
    }

    fn get(&self, id: u32) -> Option<&(&'a str, Vec<Token<'a>>)> {
        self.entities.get(&id)
    }

    /// Length unit to metres
    ///
    /// Follows IFCPROJECT.UnitsInContext to the length unit. Returns 1.0 if no
    /// unit information is found.
    pub fn length_scale(&self) -> f64 {
        let Some(project) = self.project.and_then(|id| self.get(id)) else {
            return 1.0;
        };

        // IFCPROJECT has UnitsInContext at index 8
        let Some(Token::EntityRef(units_ref)) = project.1.get(8) else {
            return 1.0;
        };
        let Some((_, assignment)) = self.get(*units_ref) else {
            return 1.0;
        };

        // IFCUNITASSIGNMENT has Units list at index 0
        let Some(units) = assignment.first().and_then(Token::as_list) else {
            return 1.0;
        };

        units
            .iter()
            .filter_map(|unit| match unit {
                Token::EntityRef(id) => self.length_unit_scale(*id, 0),
                _ => None,
            })
            .next()
            .unwrap_or(1.0)
    }

    fn length_unit_scale(&self, id: u32, depth: usize) -> Option<f64> {
        // Conversion chains are short; bail out on cycles
        if depth > 4 {
            return None;
        }
        let (type_name, params) = self.get(id)?;
        if !params.get(1)?.as_enum()?.eq_ignore_ascii_case("LENGTHUNIT") {
            return None;
        }
        match *type_name {
            "IFCSIUNIT" => si_unit_scale(params),
            "IFCCONVERSIONBASEDUNIT" => self.conversion_unit_scale(params, depth),
            _ => None,
        }
    }

    /// IFCCONVERSIONBASEDUNIT(Dimensions, UnitType, Name, ConversionFactor)
    fn conversion_unit_scale(&self, params: &[Token<'a>], depth: usize) -> Option<f64> {
        let Token::EntityRef(factor_ref) = params.get(3)? else {
            return None;
        };
        let (factor_type, factor) = self.get(*factor_ref)?;
        if *factor_type != "IFCMEASUREWITHUNIT" {
            return None;
        }

        // IFCMEASUREWITHUNIT(ValueComponent, UnitComponent)
        let value = factor.first()?.as_float()?;
        let base_scale = match factor.get(1) {
            Some(Token::EntityRef(unit_ref)) => {
                self.length_unit_scale(*unit_ref, depth + 1).unwrap_or(1.0)
            }
            _ => 1.0,
        };

        Some(value * base_scale)
    }
}

/// IFCSIUNIT(*, UnitType, Prefix, Name)
fn si_unit_scale(params: &[Token<'_>]) -> Option<f64> {
    if !params.get(3)?.as_enum()?.eq_ignore_ascii_case("METRE") {
        return None;
    }
    let prefix = params.get(2).and_then(Token::as_enum);
    Some(prefix.map(prefix_scale).unwrap_or(1.0))
}

fn prefix_scale(prefix: &str) -> f64 {
    match prefix.to_ascii_uppercase().as_str() {
        "EXA" => 1e18,
        "PETA" => 1e15,
        "TERA" => 1e12,
        "GIGA" => 1e9,
        "MEGA" => 1e6,
        "KILO" => 1e3,
        "HECTO" => 1e2,
        "DECA" => 1e1,
        "DECI" => 1e-1,
        "CENTI" => 1e-2,
        "MILLI" => 1e-3,
        "MICRO" => 1e-6,
        "NANO" => 1e-9,
        "PICO" => 1e-12,
        "FEMTO" => 1e-15,
        "ATTO" => 1e-18,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRE: f64 = 1.0;
    const MILLIMETRE: f64 = 0.001;
    const FOOT: f64 = 0.3048;

    fn table(lines: &[(u32, &'static str, &'static str)]) -> UnitTable<'static> {
        let mut t = UnitTable::new();
        for (id, ty, text) in lines {
            t.insert(*id, *ty, *text);
        }
        t
    }

    #[test]
    fn test_millimetre_project() {
        let t = table(&[
            (1, "IFCPROJECT", "#1=IFCPROJECT('g',$,'P',$,$,$,$,$,#2);"),
            (2, "IFCUNITASSIGNMENT", "#2=IFCUNITASSIGNMENT((#4,#3));"),
            (3, "IFCSIUNIT", "#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);"),
            (4, "IFCSIUNIT", "#4=IFCSIUNIT(*,.AREAUNIT.,$,.SQUARE_METRE.);"),
        ]);
        assert!((t.length_scale() - MILLIMETRE).abs() < 1e-12);
    }

    #[test]
    fn test_foot_project() {
        let t = table(&[
            (1, "IFCPROJECT", "#1=IFCPROJECT('g',$,'P',$,$,$,$,$,#2);"),
            (2, "IFCUNITASSIGNMENT", "#2=IFCUNITASSIGNMENT((#3));"),
            (3, "IFCCONVERSIONBASEDUNIT", "#3=IFCCONVERSIONBASEDUNIT(#9,.LENGTHUNIT.,'FOOT',#4);"),
            (4, "IFCMEASUREWITHUNIT", "#4=IFCMEASUREWITHUNIT(IFCRATIOMEASURE(0.3048),#5);"),
            (5, "IFCSIUNIT", "#5=IFCSIUNIT(*,.LENGTHUNIT.,$,.METRE.);"),
        ]);
        assert!((t.length_scale() - FOOT).abs() < 1e-12);
    }

    #[test]
    fn test_missing_units_default_to_metre() {
        assert_eq!(UnitTable::new().length_scale(), METRE);

        let t = table(&[(1, "IFCPROJECT", "#1=IFCPROJECT('g',$,'P',$,$,$,$,$,$);")]);
        assert_eq!(t.length_scale(), METRE);
    }

    #[test]
    fn test_type_names_match_case_insensitively() {
        let t = table(&[
            (1, "IfcProject", "#1=IfcProject('g',$,'P',$,$,$,$,$,#2);"),
            (2, "IfcUnitAssignment", "#2=IfcUnitAssignment((#3));"),
            (3, "ifcsiunit", "#3=ifcsiunit(*,.LENGTHUNIT.,.MILLI.,.METRE.);"),
        ]);
        assert_eq!(t.project, Some(1));
        assert!((t.length_scale() - MILLIMETRE).abs() < 1e-12);
    }

    #[test]
    fn test_ignores_unrelated_types() {
        let t = table(&[(1, "IFCWALL", "#1=IFCWALL('g',$,'W',$,$,$,$,$);")]);
        assert!(t.entities.is_empty());
    }
}
