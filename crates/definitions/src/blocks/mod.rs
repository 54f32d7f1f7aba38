//! Built-in block tables, one module per device subsystem.

mod analog;
mod button;
mod display;
mod encoder;
mod global;
mod led;
mod touchscreen;

pub use analog::analog_block;
pub use button::button_block;
pub use display::display_block;
pub use encoder::encoder_block;
pub use global::global_block;
pub use led::led_block;
pub use touchscreen::touchscreen_block;

use shared::domain::FieldValue;

use crate::block::BlockDefinition;

pub(crate) const MIDI_ID_MAX: FieldValue = 127;
pub(crate) const MIDI_CHANNEL_MIN: FieldValue = 1;
pub(crate) const MIDI_CHANNEL_MAX: FieldValue = 16;

pub fn builtin_blocks() -> Vec<BlockDefinition> {
    vec![
        global_block(),
        button_block(),
        encoder_block(),
        analog_block(),
        led_block(),
        display_block(),
        touchscreen_block(),
    ]
}
