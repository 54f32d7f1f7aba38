use shared::domain::Block;

use super::{MIDI_CHANNEL_MAX, MIDI_CHANNEL_MIN, MIDI_ID_MAX};
use crate::{
    block::{BlockDefinition, Navigation},
    field::FieldDefinition,
};

pub fn button_block() -> BlockDefinition {
    let button = Block::Button;
    BlockDefinition {
        block: button,
        navigation: Navigation::new("Button", "device-buttons", "buttons", "button"),
        component_count_index: Some(0),
        fields: vec![
            FieldDefinition::value(button, "type", 0)
                .select(&[(0, "Momentary"), (1, "Latching")])
                .label("Type")
                .help(
                    "Momentary buttons send a message on press and another on release. \
                     Latching buttons toggle their state on every press.",
                ),
            FieldDefinition::value(button, "messageType", 1)
                .select(&[
                    (0, "Note"),
                    (1, "Program change"),
                    (2, "Control change"),
                    (3, "Control change / reset"),
                    (4, "MMC stop"),
                    (5, "MMC play"),
                    (6, "MMC record"),
                    (7, "MMC pause"),
                    (8, "Real time clock"),
                    (9, "Real time start"),
                    (10, "Real time continue"),
                    (11, "Real time stop"),
                ])
                .label("Message type"),
            FieldDefinition::value(button, "midiId", 2)
                .input(0, MIDI_ID_MAX)
                .label("MIDI ID"),
            FieldDefinition::value(button, "value", 3)
                .input(1, MIDI_ID_MAX)
                .label("Value")
                .help("Velocity for notes, value for control change messages."),
            FieldDefinition::value(button, "midiChannel", 4)
                .input(MIDI_CHANNEL_MIN, MIDI_CHANNEL_MAX)
                .label("MIDI channel"),
        ],
    }
}
