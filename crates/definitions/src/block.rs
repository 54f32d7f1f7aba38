use std::collections::HashSet;

use serde::Serialize;
use shared::domain::{Block, SectionType};

use crate::{error::DefinitionError, field::FieldDefinition};

/// Routing and layout hints for whatever renders the block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub title: &'static str,
    pub route_name: String,
    pub path: &'static str,
    pub list_route: String,
    pub form_route: String,
    pub icon: &'static str,
    pub segment_grid: bool,
    pub grid_cols: Option<u8>,
    pub settings_title: Option<&'static str>,
}

impl Navigation {
    /// `device-leds` yields `device-leds-list` and `device-leds-form`.
    pub fn new(title: &'static str, route_name: &str, path: &'static str, icon: &'static str) -> Self {
        Self {
            title,
            route_name: route_name.to_string(),
            path,
            list_route: format!("{route_name}-list"),
            form_route: format!("{route_name}-form"),
            icon,
            segment_grid: false,
            grid_cols: None,
            settings_title: None,
        }
    }

    pub fn segment_grid(mut self) -> Self {
        self.segment_grid = true;
        self
    }

    pub fn grid_cols(mut self, cols: u8) -> Self {
        self.grid_cols = Some(cols);
        self
    }

    pub fn settings_title(mut self, title: &'static str) -> Self {
        self.settings_title = Some(title);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockDefinition {
    pub block: Block,
    pub navigation: Navigation,
    /// Position of this block's instance count in the device's component-count reply. Blocks
    /// without one only carry settings.
    pub component_count_index: Option<usize>,
    pub fields: Vec<FieldDefinition>,
}

impl BlockDefinition {
    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn fields_of(&self, section_type: SectionType) -> impl Iterator<Item = &FieldDefinition> {
        self.fields
            .iter()
            .filter(move |field| field.section_type == section_type)
    }

    pub fn has(&self, section_type: SectionType) -> bool {
        self.fields_of(section_type).next().is_some()
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.key) {
                return Err(DefinitionError::DuplicateKey {
                    block: self.block,
                    key: field.key.to_string(),
                });
            }
            field.check(self.block)?;
        }

        // Predicates only ever see the form their field is rendered in.
        for field in &self.fields {
            let Some(rule) = &field.show_if else {
                continue;
            };
            for referenced in rule.referenced_keys() {
                let known = self
                    .fields_of(field.section_type)
                    .any(|candidate| candidate.key == referenced);
                if !known {
                    return Err(DefinitionError::UnknownPredicateField {
                        block: self.block,
                        key: field.key.to_string(),
                        missing: referenced.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}
