use shared::domain::{Block, MAX_FIELD_VALUE};

use super::{MIDI_CHANNEL_MAX, MIDI_CHANNEL_MIN};
use crate::{
    block::{BlockDefinition, Navigation},
    field::FieldDefinition,
};

pub fn analog_block() -> BlockDefinition {
    let analog = Block::Analog;
    BlockDefinition {
        block: analog,
        navigation: Navigation::new("Analog", "device-analog", "analog", "analog"),
        component_count_index: Some(2),
        fields: vec![
            FieldDefinition::value(analog, "enabled", 0)
                .toggle()
                .label("Enabled"),
            FieldDefinition::value(analog, "invertState", 1)
                .toggle()
                .label("Invert"),
            FieldDefinition::value(analog, "type", 2)
                .select(&[
                    (0, "Potentiometer (control change)"),
                    (1, "Potentiometer (note)"),
                    (2, "FSR (note)"),
                    (3, "Button"),
                    (4, "NRPN (7-bit)"),
                    (5, "NRPN (14-bit)"),
                    (6, "Pitch bend"),
                    (7, "Control change (14-bit)"),
                ])
                .label("Type"),
            FieldDefinition::value(analog, "midiId", 3)
                .input(0, MAX_FIELD_VALUE)
                .label("MIDI ID")
                .help("14-bit types use the full range; the rest only the lowest 7 bits."),
            FieldDefinition::value(analog, "lowerLimit", 4)
                .input(0, MAX_FIELD_VALUE)
                .label("Lower CC limit"),
            FieldDefinition::value(analog, "upperLimit", 5)
                .input(0, MAX_FIELD_VALUE)
                .label("Upper CC limit"),
            FieldDefinition::value(analog, "midiChannel", 6)
                .input(MIDI_CHANNEL_MIN, MIDI_CHANNEL_MAX)
                .label("MIDI channel"),
        ],
    }
}
