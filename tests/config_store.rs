//! Config store behaviour against documents on disk

use esp_build_flags::{ConfigError, ConfigStore, RawDocument};
use std::io::Write;
use tempfile::NamedTempFile;

const LAMPS: &str = r#"
_null_if_empty = ["extra", "mqtt_password"]
_not_a_string = ["RANGE_LOW", "RANGE_HIGH"]

[_defaults]
board = "esp32"
label = "{board}-dev"
extra = ""
RANGE_LOW = "0"
RANGE_HIGH = "PWM_RANGE"
mqtt_topic = "home/{name}/set"
mqtt_password = ""
name = "unnamed"

["AA:BB:CC:DD:EE:FF"]

["5c:cf:7f:12:34:56"]
name = "kitchen"
board = "d1_mini"
RANGE_HIGH = "PWM_RANGE - 24"
mqtt_password = "hunter2"
"#;

fn write_config(contents: &str) -> NamedTempFile {
    let mut temp = NamedTempFile::new().unwrap();
    temp.write_all(contents.as_bytes()).unwrap();
    temp
}

#[test]
fn test_end_to_end_defaults_only() {
    let file = write_config(
        r#"
        _null_if_empty = ["extra"]

        [_defaults]
        board = "esp32"
        label = "{board}-dev"
        extra = ""

        ["AA:BB:CC:DD:EE:FF"]
        "#,
    );

    let store = ConfigStore::load(file.path()).unwrap();
    let config = store.get_for("AA:BB:CC:DD:EE:FF").unwrap();

    assert_eq!(config.get("board").unwrap(), "esp32");
    assert_eq!(config.get("label").unwrap(), "esp32-dev");
    assert!(config.get("extra").unwrap().is_null());

    let flags = store.render_flags(config);
    let lines: Vec<&str> = flags.lines().collect();
    assert!(lines.contains(&r#"-D__board__='"esp32"'"#));
    assert!(lines.contains(&r#"-D__label__='"esp32-dev"'"#));
    assert!(lines.contains(&"-D__extra__='NULL'"));
    assert_eq!(lines.len(), 3);
}

#[test]
fn test_lamp_fleet() {
    let file = write_config(LAMPS);
    let store = ConfigStore::load(file.path()).unwrap();
    assert_eq!(store.len(), 2);

    let kitchen = store.get_for("5C:CF:7F:12:34:56").unwrap();
    let flags = store.render_flags(kitchen);

    assert_eq!(
        flags,
        [
            r#"-D__board__='"d1_mini"'"#,
            r#"-D__label__='"d1_mini-dev"'"#,
            "-D__extra__='NULL'",
            "-D__RANGE_LOW__='0'",
            "-D__RANGE_HIGH__='PWM_RANGE - 24'",
            r#"-D__mqtt_topic__='"home/kitchen/set"'"#,
            r#"-D__mqtt_password__='"hunter2"'"#,
            r#"-D__name__='"kitchen"'"#,
        ]
        .join("\n")
    );

    let other = store.get_for("aa:bb:cc:dd:ee:ff").unwrap();
    assert_eq!(other.get("mqtt_topic").unwrap(), "home/unnamed/set");
    assert!(other.get("mqtt_password").unwrap().is_null());
}

#[test]
fn test_nested_tables_merge() {
    let store = ConfigStore::parse(
        r#"
        [_defaults.wifi]
        ssid = "home"
        channel = 6

        ["AA:BB".wifi]
        channel = 11
        "#,
    )
    .unwrap();

    let config = store.get_for("aa:bb").unwrap();
    let wifi = config.get("wifi").unwrap();
    assert_eq!(wifi["ssid"], "home");
    assert_eq!(wifi["channel"], 11);
}

#[test]
fn test_one_bad_record_fails_whole_store() {
    let file = write_config(
        r#"
        [_defaults]
        ssid = ""

        ["AA:BB"]
        ssid = "home"

        ["CC:DD"]
        "#,
    );

    let err = ConfigStore::load(file.path()).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Validation { ref key, ref identifier } if key == "ssid" && identifier == "CC:DD"
    ));
}

#[test]
fn test_malformed_document() {
    let file = write_config("[AA:BB\nname = ");
    let err = ConfigStore::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_dump_skips_resolution() {
    // Invalid for resolution, still dumps
    let file = write_config("[\"AA:BB\"]\nname = \"\"\nlabel = \"{missing}\"\n");

    assert!(ConfigStore::load(file.path()).is_err());

    let dump = RawDocument::load(file.path()).unwrap().to_pretty().unwrap();
    assert!(dump.contains("\"AA:BB\""));
    assert!(dump.contains("\"{missing}\""));
}
