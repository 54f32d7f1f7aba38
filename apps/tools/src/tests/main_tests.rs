use super::*;

use clap::CommandFactory;

fn help_of(path: &[&str]) -> String {
    let mut command = Cli::command();
    for name in path {
        command = command
            .find_subcommand(name)
            .cloned()
            .unwrap_or_else(|| panic!("missing subcommand {name}"));
    }
    command
        .get_long_about()
        .or_else(|| command.get_about())
        .map(ToString::to_string)
        .unwrap_or_default()
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn writing_commands_say_the_simulated_device_forgets() {
    assert!(help_of(&["set"]).contains("does not keep it after this run"));
    assert!(help_of(&["backup", "restore"]).contains("does not keep it after this run"));
    assert!(help_of(&[]).contains("last only for that run"));
}

#[test]
fn parses_set_with_instance() {
    let cli = Cli::try_parse_from(["deckconf", "set", "leds", "midiChannel", "5", "--instance", "1"])
        .expect("parse");

    let Command::Set {
        block,
        key,
        value,
        instance,
    } = cli.command
    else {
        panic!("expected set");
    };
    assert_eq!(block, Block::Led);
    assert_eq!(key, "midiChannel");
    assert_eq!(value, 5);
    assert_eq!(instance, Some(1));
}
