use shared::domain::Block;

use super::{MIDI_CHANNEL_MAX, MIDI_CHANNEL_MIN};
use crate::{
    block::{BlockDefinition, Navigation},
    field::FieldDefinition,
    visibility::ShowIf,
};

const MIDI_SECTION: u8 = 0;
const PRESET_SECTION: u8 = 1;

pub fn global_block() -> BlockDefinition {
    let global = Block::Global;
    BlockDefinition {
        block: global,
        navigation: Navigation::new("Global", "device-global", "global", "global"),
        component_count_index: None,
        fields: vec![
            FieldDefinition::setting(global, "standardNoteOff", MIDI_SECTION, 0)
                .toggle()
                .label("Standard note off")
                .help(
                    "When enabled, note off is sent as a note off message. Otherwise, note on \
                     with velocity 0 is sent.",
                ),
            FieldDefinition::setting(global, "runningStatus", MIDI_SECTION, 1)
                .toggle()
                .label("Running status")
                .help("Omits repeated status bytes on the DIN MIDI output."),
            FieldDefinition::setting(global, "dinMidiEnable", MIDI_SECTION, 2)
                .toggle()
                .label("DIN MIDI")
                .help("Enables or disables the DIN MIDI port."),
            FieldDefinition::setting(global, "useGlobalChannel", MIDI_SECTION, 3)
                .toggle()
                .label("Use global MIDI channel")
                .help("When enabled, every component uses the channel below instead of its own."),
            FieldDefinition::setting(global, "globalMidiChannel", MIDI_SECTION, 4)
                .input(MIDI_CHANNEL_MIN, MIDI_CHANNEL_MAX)
                .label("Global MIDI channel")
                .show_if(ShowIf::truthy("useGlobalChannel")),
            FieldDefinition::setting(global, "activePreset", PRESET_SECTION, 0)
                .input(0, 9)
                .label("Active preset"),
            FieldDefinition::setting(global, "presetPreservation", PRESET_SECTION, 1)
                .toggle()
                .label("Preset preservation")
                .help("Keeps the active preset across power cycles."),
        ],
    }
}
