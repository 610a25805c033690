use super::{parse_address, DriverConfig, LoadError, DEFAULT_BUS, MAX_SCALING};

#[test]
fn test_defaults() {
    let config = DriverConfig::default();
    assert_eq!(config.bus, DEFAULT_BUS);
    assert_eq!(config.address, 0x5D);
    assert_eq!(config.scaling, 1);
    assert!(!config.flip_x);
    assert!(!config.flip_y);
    assert!(!config.swap_xy);
}

#[test]
fn test_load_yaml() {
    let content = "
bus: /dev/i2c-3
address: 0x14
scaling: 2
flip_y: true
swap_xy: true
";
    let config = DriverConfig::from_yaml(content).unwrap();
    assert_eq!(config.bus, "/dev/i2c-3");
    assert_eq!(config.address, 0x14);
    assert_eq!(config.scaling, 2);
    assert!(!config.flip_x);
    assert!(config.flip_y);
    assert!(config.swap_xy);
}

#[test]
fn test_partial_yaml_keeps_defaults() {
    let config = DriverConfig::from_yaml("scaling: 3").unwrap();
    assert_eq!(config.bus, DEFAULT_BUS);
    assert_eq!(config.address, 0x5D);
    assert_eq!(config.scaling, 3);
}

#[test]
fn test_rejects_zero_scaling() {
    let result = DriverConfig::from_yaml("scaling: 0");
    assert!(matches!(result, Err(LoadError::InvalidScaling)));
}

#[test]
fn test_rejects_oversized_scaling() {
    // 16-bit coordinates times anything past this bound would leave the
    // i32 range of an input event.
    let config = DriverConfig::from_yaml("scaling: 32768").unwrap();
    assert_eq!(config.scaling, MAX_SCALING);

    let result = DriverConfig::from_yaml("scaling: 70000");
    assert!(matches!(result, Err(LoadError::InvalidScaling)));
}

#[test]
fn test_rejects_unknown_fields() {
    let result = DriverConfig::from_yaml("buss: /dev/i2c-3");
    assert!(matches!(result, Err(LoadError::DeserializeError(_))));
}

#[test]
fn test_axis_projection() {
    let config = DriverConfig {
        scaling: 2,
        flip_x: true,
        swap_xy: true,
        ..DriverConfig::default()
    };
    let axis = config.axis();
    assert_eq!(axis.scaling, 2);
    assert!(axis.flip_x);
    assert!(!axis.flip_y);
    assert!(axis.swap_xy);
}

#[test]
fn test_parse_address() {
    assert_eq!(parse_address("0x5d"), Ok(0x5D));
    assert_eq!(parse_address("0X14"), Ok(0x14));
    assert_eq!(parse_address("93"), Ok(93));
    assert!(parse_address("touch").is_err());
    assert!(parse_address("0x1ff").is_err());
}
