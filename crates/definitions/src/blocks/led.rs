use shared::domain::Block;

use super::{MIDI_CHANNEL_MAX, MIDI_CHANNEL_MIN, MIDI_ID_MAX};
use crate::{
    block::{BlockDefinition, Navigation},
    field::FieldDefinition,
};

const SETTINGS_SECTION: u8 = 2;

pub fn led_block() -> BlockDefinition {
    let led = Block::Led;
    BlockDefinition {
        block: led,
        navigation: Navigation::new("LED", "device-leds", "leds", "led").segment_grid(),
        component_count_index: Some(3),
        fields: vec![
            FieldDefinition::setting(led, "blinkWithMidiClock", SETTINGS_SECTION, 0)
                .toggle()
                .label("Blink with MIDI clock")
                .help(
                    "Enables or disables LED blinking via MIDI clock. When enabled, MIDI clock \
                     is used to toggle LED state. Otherwise, internal timer is used.",
                ),
            FieldDefinition::setting(led, "startupAnimation", SETTINGS_SECTION, 2)
                .toggle()
                .label("Start-up animation")
                .help("Enables or disables LED animation when the device is powered on."),
            FieldDefinition::value(led, "ledColorTesting", 0)
                .select(&[
                    (0, "Off (no color)"),
                    (1, "Red"),
                    (2, "Green"),
                    (3, "Yellow"),
                    (4, "Blue"),
                    (5, "Magenta"),
                    (6, "Cyan"),
                    (7, "White"),
                ])
                .label("LED color testing"),
            FieldDefinition::value(led, "activationNote", 3)
                .input(0, MIDI_ID_MAX)
                .label("Activation ID"),
            FieldDefinition::value(led, "rgbEnable", 4)
                .toggle()
                .label("RGB Enable"),
            FieldDefinition::value(led, "controlType", 5)
                .select(&[
                    (6, "MIDI in / Note (Multi value)"),
                    (8, "MIDI in / CC (Multi value)"),
                    (0, "MIDI in / Note (Single value)"),
                    (2, "MIDI in / CC (Single value)"),
                    (7, "Local / Note (Multi value)"),
                    (9, "Local / CC (Multi value)"),
                    (1, "Local / Note (Single value)"),
                    (3, "Local / CC (Single value)"),
                    (4, "Program change (Single value)"),
                ])
                .label("Control type"),
            FieldDefinition::value(led, "activationVelocity", 6)
                .input(1, MIDI_ID_MAX)
                .label("Activation Velocity"),
            FieldDefinition::value(led, "midiChannel", 7)
                .input(MIDI_CHANNEL_MIN, MIDI_CHANNEL_MAX)
                .label("MIDI channel"),
        ],
    }
}
