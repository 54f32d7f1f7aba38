use shared::domain::Block;

use super::{MIDI_CHANNEL_MAX, MIDI_CHANNEL_MIN, MIDI_ID_MAX};
use crate::{
    block::{BlockDefinition, Navigation},
    field::FieldDefinition,
};

pub fn encoder_block() -> BlockDefinition {
    let encoder = Block::Encoder;
    BlockDefinition {
        block: encoder,
        navigation: Navigation::new("Encoder", "device-encoders", "encoders", "encoder"),
        component_count_index: Some(1),
        fields: vec![
            FieldDefinition::value(encoder, "enabled", 0)
                .toggle()
                .label("Enabled"),
            FieldDefinition::value(encoder, "invertState", 1)
                .toggle()
                .label("Invert direction"),
            FieldDefinition::value(encoder, "mode", 2)
                .select(&[
                    (0, "Control change / 7Fh01h"),
                    (1, "Control change / 3Fh41h"),
                    (2, "Program change"),
                    (3, "Control change"),
                    (4, "Preset change"),
                    (5, "Pitch bend"),
                ])
                .label("Encoding mode"),
            FieldDefinition::value(encoder, "midiId", 3)
                .input(0, MIDI_ID_MAX)
                .label("MIDI ID"),
            FieldDefinition::value(encoder, "midiChannel", 4)
                .input(MIDI_CHANNEL_MIN, MIDI_CHANNEL_MAX)
                .label("MIDI channel"),
            FieldDefinition::value(encoder, "pulsesPerStep", 5)
                .input(2, 4)
                .label("Pulses per step")
                .help("Number of pulses the encoder produces per detent."),
            FieldDefinition::value(encoder, "acceleration", 6)
                .select(&[(0, "None"), (1, "Slow"), (2, "Medium"), (3, "Fast")])
                .label("Acceleration"),
        ],
    }
}
