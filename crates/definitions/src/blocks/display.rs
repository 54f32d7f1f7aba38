use shared::domain::Block;

use crate::{
    block::{BlockDefinition, Navigation},
    field::FieldDefinition,
    visibility::ShowIf,
};

const FEATURES_SECTION: u8 = 0;
const SETUP_SECTION: u8 = 1;

pub fn display_block() -> BlockDefinition {
    let display = Block::Display;
    let enabled = || ShowIf::truthy("enableDisplay");
    BlockDefinition {
        block: display,
        navigation: Navigation::new("Display", "device-display", "display", "display"),
        component_count_index: None,
        fields: vec![
            FieldDefinition::setting(display, "enableDisplay", FEATURES_SECTION, 0)
                .toggle()
                .label("Enable"),
            FieldDefinition::setting(display, "controller", SETUP_SECTION, 0)
                .select(&[(1, "SSD1306")])
                .label("Display controller")
                .show_if(enabled()),
            FieldDefinition::setting(display, "resolution", SETUP_SECTION, 1)
                .select(&[(0, "128x64"), (1, "128x32")])
                .label("Display resolution")
                .show_if(enabled()),
            FieldDefinition::setting(display, "eventRetentionTime", SETUP_SECTION, 2)
                .input(0, 5)
                .label("Event retention time")
                .help("Seconds an incoming or outgoing MIDI event stays on screen; 0 keeps it.")
                .show_if(enabled()),
            FieldDefinition::setting(display, "octaveNormalization", SETUP_SECTION, 3)
                .toggle()
                .label("MIDI notes with octave normalization")
                .show_if(enabled()),
            FieldDefinition::setting(display, "alternateNoteDisplay", SETUP_SECTION, 4)
                .toggle()
                .label("Alternate MIDI note display")
                .help("Shows notes as a number instead of name and octave.")
                .show_if(enabled()),
        ],
    }
}
