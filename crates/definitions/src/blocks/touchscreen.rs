use shared::domain::{Block, FieldValue};

use crate::{
    block::{BlockDefinition, Navigation},
    field::FieldDefinition,
    visibility::ShowIf,
};

const SCREEN_MAX: FieldValue = 15;
const COORDINATE_MAX: FieldValue = 16383;
const WIDTH_MAX: FieldValue = 1023;
const HEIGHT_MAX: FieldValue = 639;

pub fn touchscreen_block() -> BlockDefinition {
    let ts = Block::Touchscreen;
    BlockDefinition {
        block: ts,
        navigation: Navigation::new("Touchscreen", "device-touchscreens", "touchscreens", "touchscreen")
            .grid_cols(4)
            .settings_title(""),
        component_count_index: Some(4),
        fields: vec![
            FieldDefinition::setting(ts, "enableTouchscreen", 0, 0)
                .toggle()
                .label("Enable")
                .help("Enables or disables the usage of touchscreen."),
            FieldDefinition::setting(ts, "touchscreenManufacturer", 0, 1)
                .select(&[(0, "Nextion"), (1, "Viewtech/Stone HMI")])
                .label("Touchscreen manufacturer")
                .show_if(ShowIf::truthy("enableTouchscreen")),
            FieldDefinition::setting(ts, "touchscreenBrightness", 0, 2)
                .select(&[
                    (0, "10%"),
                    (1, "25%"),
                    (2, "50%"),
                    (3, "75%"),
                    (4, "80%"),
                    (5, "90%"),
                    (6, "100%"),
                ])
                .label("Touchscreen brightness")
                .show_if(ShowIf::truthy("enableTouchscreen")),
            FieldDefinition::setting(ts, "initialScreen", 0, 3)
                .input(0, SCREEN_MAX)
                .label("Initial screen")
                .help("This will set the screen index which will be loaded on startup."),
            FieldDefinition::value(ts, "xPosition", 1)
                .input(0, COORDINATE_MAX)
                .label("X position of this icon")
                .help(
                    "Specifies X coordinate on touchscreen where this icon is located. \
                     Touchscreen resolution needs to be taken into account here. On \
                     Viewtech/Stone touchscreens, this parameter is actually icon address.",
                ),
            FieldDefinition::value(ts, "yPosition", 2)
                .input(0, COORDINATE_MAX)
                .label("Y position of this icon")
                .help(
                    "Specifies Y coordinate on touchscreen where this icon is located. \
                     Touchscreen resolution needs to be taken into account here. On \
                     Viewtech/Stone touchscreens, this parameter is ignored.",
                ),
            FieldDefinition::value(ts, "width", 3)
                .input(0, WIDTH_MAX)
                .label("Width of this icon")
                .help(
                    "Specifies width of this icon. Touchscreen resolution needs to be taken \
                     into account here. On Viewtech/Stone touchscreens, this parameter is ignored.",
                ),
            FieldDefinition::value(ts, "height", 4)
                .input(0, HEIGHT_MAX)
                .label("Height of this icon")
                .help(
                    "Specifies height of this icon. Touchscreen resolution needs to be taken \
                     into account here. On Viewtech/Stone touchscreens, this parameter is ignored.",
                ),
            FieldDefinition::value(ts, "screenOn", 5)
                .input(0, SCREEN_MAX)
                .label("Screen index of this icon in on state")
                .help("Specifies screen on which this icon in on state is located."),
            FieldDefinition::value(ts, "screenOff", 6)
                .input(0, SCREEN_MAX)
                .label("Screen index of this icon in off state")
                .help("Specifies screen on which this icon in off state is located."),
            FieldDefinition::value(ts, "buttonChangesScreen", 7)
                .toggle()
                .label("Button changes screen")
                .help("Specifies whether this button is used to switch to another screen."),
            FieldDefinition::value(ts, "screenToSwitchTo", 8)
                .input(0, SCREEN_MAX)
                .label("Screen to switch to")
                .help("Screen to which this button switches to.")
                .show_if(ShowIf::truthy("buttonChangesScreen")),
            FieldDefinition::value(ts, "analogPage", 9)
                .input(0, SCREEN_MAX)
                .label("Analog page")
                .help("Touchscreen page where the analog component is located."),
            FieldDefinition::value(ts, "analogStartX", 10)
                .input(0, WIDTH_MAX)
                .label("Analog component start (X)")
                .help("Starting coordinate of analog component on X axis"),
            FieldDefinition::value(ts, "analogEndX", 11)
                .input(0, WIDTH_MAX)
                .label("Analog component end (X)")
                .help("Ending coordinate of analog component on X axis"),
            FieldDefinition::value(ts, "analogStartY", 12)
                .input(0, HEIGHT_MAX)
                .label("Analog component start (Y)")
                .help("Starting coordinate of analog component on Y axis"),
            FieldDefinition::value(ts, "analogEndY", 13)
                .input(0, HEIGHT_MAX)
                .label("Analog component end (Y)")
                .help("Ending coordinate of analog component on Y axis"),
            FieldDefinition::value(ts, "analogComponentType", 14)
                .select(&[(0, "Horizontal"), (1, "Vertical")])
                .label("Analog component type"),
            FieldDefinition::value(ts, "analogResetOnRelease", 15)
                .select(&[(0, "Disabled"), (1, "Enabled")])
                .label("Reset analog value to 0 on release"),
        ],
    }
}
