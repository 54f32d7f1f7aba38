use serde::Serialize;
use shared::domain::{
    Block, FieldAddress, FieldValue, FormInputComponent, FormState, SectionType, MAX_FIELD_VALUE,
};

use crate::{
    error::{DefinitionError, ValueError},
    visibility::ShowIf,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: FieldValue,
    pub text: &'static str,
}

/// One configurable value of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDefinition {
    pub block: Block,
    pub key: &'static str,
    pub section_type: SectionType,
    pub section: u8,
    /// Position of a setting inside its section; values use the instance index instead.
    pub setting_index: Option<u16>,
    pub component: FormInputComponent,
    pub min: Option<FieldValue>,
    pub max: Option<FieldValue>,
    pub options: Vec<SelectOption>,
    pub label: &'static str,
    pub help_text: &'static str,
    pub show_if: Option<ShowIf>,
}

impl FieldDefinition {
    pub fn setting(block: Block, key: &'static str, section: u8, setting_index: u16) -> Self {
        Self::new(block, key, SectionType::Setting, section, Some(setting_index))
    }

    pub fn value(block: Block, key: &'static str, section: u8) -> Self {
        Self::new(block, key, SectionType::Value, section, None)
    }

    fn new(
        block: Block,
        key: &'static str,
        section_type: SectionType,
        section: u8,
        setting_index: Option<u16>,
    ) -> Self {
        Self {
            block,
            key,
            section_type,
            section,
            setting_index,
            component: FormInputComponent::Input,
            min: None,
            max: None,
            options: Vec::new(),
            label: key,
            help_text: "",
            show_if: None,
        }
    }

    pub fn toggle(mut self) -> Self {
        self.component = FormInputComponent::Toggle;
        self
    }

    pub fn select(mut self, options: &[(FieldValue, &'static str)]) -> Self {
        self.component = FormInputComponent::Select;
        self.options = options
            .iter()
            .map(|&(value, text)| SelectOption { value, text })
            .collect();
        self
    }

    pub fn input(mut self, min: FieldValue, max: FieldValue) -> Self {
        self.component = FormInputComponent::Input;
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn help(mut self, help_text: &'static str) -> Self {
        self.help_text = help_text;
        self
    }

    pub fn show_if(mut self, rule: ShowIf) -> Self {
        self.show_if = Some(rule);
        self
    }

    pub fn address(&self, instance: u16) -> FieldAddress {
        let index = match self.section_type {
            SectionType::Setting => self.setting_index.unwrap_or(instance),
            SectionType::Value => instance,
        };
        FieldAddress::new(self.block, self.section, index)
    }

    pub fn option_text(&self, value: FieldValue) -> Option<&'static str> {
        self.options
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.text)
    }

    /// Lowest and highest value the field accepts, whatever its widget.
    pub fn bounds(&self) -> (FieldValue, FieldValue) {
        match self.component {
            FormInputComponent::Toggle => (0, 1),
            FormInputComponent::Select => (
                self.options.iter().map(|o| o.value).min().unwrap_or(0),
                self.options.iter().map(|o| o.value).max().unwrap_or(0),
            ),
            FormInputComponent::Input => (
                self.min.unwrap_or(0),
                self.max.unwrap_or(MAX_FIELD_VALUE),
            ),
        }
    }

    pub fn validate_value(&self, value: FieldValue) -> Result<(), ValueError> {
        match self.component {
            FormInputComponent::Toggle if value > 1 => Err(ValueError::NotAToggle {
                key: self.key.to_string(),
                value,
            }),
            FormInputComponent::Toggle => Ok(()),
            FormInputComponent::Select if self.option_text(value).is_none() => {
                Err(ValueError::NotAnOption {
                    key: self.key.to_string(),
                    value,
                })
            }
            FormInputComponent::Select => Ok(()),
            FormInputComponent::Input => {
                let (min, max) = self.bounds();
                if (min..=max).contains(&value) {
                    Ok(())
                } else {
                    Err(ValueError::OutOfRange {
                        key: self.key.to_string(),
                        value,
                        min,
                        max,
                    })
                }
            }
        }
    }

    /// Fields without a rule are always visible.
    pub fn is_visible(&self, state: &FormState) -> Result<bool, DefinitionError> {
        let Some(rule) = &self.show_if else {
            return Ok(true);
        };
        rule.evaluate(state)
            .map_err(|missing| DefinitionError::UnknownPredicateField {
                block: self.block,
                key: self.key.to_string(),
                missing: missing.0.to_string(),
            })
    }

    pub(crate) fn check(&self, owner: Block) -> Result<(), DefinitionError> {
        let key = || self.key.to_string();

        if self.block != owner {
            return Err(DefinitionError::ForeignField {
                block: owner,
                key: key(),
                found: self.block,
            });
        }

        if self.section_type == SectionType::Setting && self.setting_index.is_none() {
            return Err(DefinitionError::MissingSettingIndex {
                block: owner,
                key: key(),
            });
        }

        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(DefinitionError::InvalidRange {
                    block: owner,
                    key: key(),
                    min,
                    max,
                });
            }
        }

        let exceeds_wire = [self.min, self.max]
            .into_iter()
            .flatten()
            .chain(self.options.iter().map(|option| option.value))
            .any(|value| value > MAX_FIELD_VALUE);
        if exceeds_wire {
            return Err(DefinitionError::BoundExceedsWire {
                block: owner,
                key: key(),
            });
        }

        if self.component == FormInputComponent::Select {
            if self.options.is_empty() {
                return Err(DefinitionError::MissingOptions {
                    block: owner,
                    key: key(),
                });
            }
            for (position, option) in self.options.iter().enumerate() {
                if self.options[..position]
                    .iter()
                    .any(|earlier| earlier.value == option.value)
                {
                    return Err(DefinitionError::DuplicateOption {
                        block: owner,
                        key: key(),
                        value: option.value,
                    });
                }
            }
        }

        Ok(())
    }
}
