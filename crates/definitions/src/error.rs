use shared::domain::{Block, FieldValue};
use thiserror::Error;

/// Schema problems found while registering a block. Any of these keeps the block out of the
/// registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("block {0} is already registered")]
    DuplicateBlock(Block),
    #[error("{block}: field '{key}' is declared more than once")]
    DuplicateKey { block: Block, key: String },
    #[error("{block}: field '{key}' belongs to block {found}")]
    ForeignField {
        block: Block,
        key: String,
        found: Block,
    },
    #[error("{block}: field '{key}' has min {min} above max {max}")]
    InvalidRange {
        block: Block,
        key: String,
        min: FieldValue,
        max: FieldValue,
    },
    #[error("{block}: field '{key}' has a bound above the 14-bit wire limit")]
    BoundExceedsWire { block: Block, key: String },
    #[error("{block}: select field '{key}' has no options")]
    MissingOptions { block: Block, key: String },
    #[error("{block}: field '{key}' lists option value {value} more than once")]
    DuplicateOption {
        block: Block,
        key: String,
        value: FieldValue,
    },
    #[error("{block}: setting '{key}' has no setting index")]
    MissingSettingIndex { block: Block, key: String },
    #[error("{block}: visibility of '{key}' depends on undefined field '{missing}'")]
    UnknownPredicateField {
        block: Block,
        key: String,
        missing: String,
    },
}

/// A value the user or the device proposed for a field that its definition does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("'{key}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: String,
        value: FieldValue,
        min: FieldValue,
        max: FieldValue,
    },
    #[error("'{key}' has no option with value {value}")]
    NotAnOption { key: String, value: FieldValue },
    #[error("'{key}' is a toggle and only accepts 0 or 1, got {value}")]
    NotAToggle { key: String, value: FieldValue },
}
