use definitions::{blocks::builtin_blocks, BlockRegistry};
use shared::domain::{Block, FormInputComponent, FormState};

#[test]
fn every_builtin_block_registers() {
    let (registry, failures) = BlockRegistry::from_definitions(builtin_blocks());
    assert!(failures.is_empty(), "unexpected failures: {failures:?}");
    assert_eq!(registry.len(), Block::ALL.len());

    let order = registry.iter().map(|def| def.block).collect::<Vec<_>>();
    assert_eq!(order, Block::ALL.to_vec());
}

#[test]
fn ranges_are_never_inverted() {
    for block in builtin_blocks() {
        for field in &block.fields {
            if let (Some(min), Some(max)) = (field.min, field.max) {
                assert!(min <= max, "{}.{} has min {min} > max {max}", block.block, field.key);
            }
        }
    }
}

#[test]
fn select_options_are_unique() {
    for block in builtin_blocks() {
        for field in block
            .fields
            .iter()
            .filter(|field| field.component == FormInputComponent::Select)
        {
            let mut values = field.options.iter().map(|o| o.value).collect::<Vec<_>>();
            let total = values.len();
            values.sort_unstable();
            values.dedup();
            assert_eq!(values.len(), total, "{}.{} repeats an option", block.block, field.key);
        }
    }
}

#[test]
fn component_count_indices_are_distinct() {
    let mut indices = builtin_blocks()
        .iter()
        .filter_map(|block| block.component_count_index)
        .collect::<Vec<_>>();
    let total = indices.len();
    indices.sort_unstable();
    indices.dedup();
    assert_eq!(indices.len(), total);
}

#[test]
fn touchscreen_settings_follow_enable_toggle() {
    let registry = BlockRegistry::builtin();
    let touchscreen = registry.get(Block::Touchscreen).expect("touchscreen");
    let manufacturer = touchscreen.field("touchscreenManufacturer").expect("field");
    let brightness = touchscreen.field("touchscreenBrightness").expect("field");

    let mut state: FormState = [("enableTouchscreen", 0)].into_iter().collect();
    assert_eq!(manufacturer.is_visible(&state), Ok(false));
    assert_eq!(brightness.is_visible(&state), Ok(false));

    state.set("enableTouchscreen", 1);
    assert_eq!(manufacturer.is_visible(&state), Ok(true));
    assert_eq!(brightness.is_visible(&state), Ok(true));
}

#[test]
fn screen_to_switch_to_follows_button_changes_screen() {
    let registry = BlockRegistry::builtin();
    let touchscreen = registry.get(Block::Touchscreen).expect("touchscreen");
    let target = touchscreen.field("screenToSwitchTo").expect("field");

    let mut state: FormState = [("buttonChangesScreen", 0)].into_iter().collect();
    assert_eq!(target.is_visible(&state), Ok(false));

    state.set("buttonChangesScreen", 1);
    assert_eq!(target.is_visible(&state), Ok(true));
}

#[test]
fn led_block_matches_device_layout() {
    let registry = BlockRegistry::builtin();
    let led = registry.get(Block::Led).expect("led");
    assert_eq!(led.component_count_index, Some(3));
    assert_eq!(led.navigation.route_name, "device-leds");
    assert!(led.navigation.segment_grid);

    let velocity = led.field("activationVelocity").expect("field");
    assert_eq!((velocity.section, velocity.min, velocity.max), (6, Some(1), Some(127)));

    let control = led.field("controlType").expect("field");
    assert_eq!(control.option_text(4), Some("Program change (Single value)"));
}
