//! Build script for pdbox-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates device.toml at compile time
//! - Generates the `DEVICE_CONFIG` constant the firmware includes

use std::collections::HashMap;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// (section, key, default, min, max)
const INTEGER_KEYS: &[(&str, &str, i64, i64, i64)] = &[
    ("ui", "debounce_ms", 50, 1, 1_000),
    ("ui", "long_press_ms", 1_000, 100, 10_000),
    ("ui", "double_click_ms", 1_000, 100, 5_000),
    ("ui", "fast_rotation_ms", 75, 1, 1_000),
    ("ui", "large_step_multiplier", 10, 1, 100),
    ("ui", "blink_ms", 500, 50, 5_000),
    ("ui", "measure_ms", 200, 10, 10_000),
    ("pd", "min_selectable_mv", 5_000, 3_300, 48_000),
    ("ntc", "r25", 10_000, 1, 65_535),
    ("ntc", "r50", 4_161, 1, 65_535),
    ("ntc", "r75", 1_928, 1, 65_535),
    ("ntc", "r100", 974, 1, 65_535),
    ("sensor", "shunt_micro_ohm", 10_000, 1_000, 1_000_000),
    ("sensor", "current_lsb_ua", 250, 1, 100_000),
];

/// (section, key, default)
const BOOL_KEYS: &[(&str, &str, bool)] = &[("pd", "probe_min_voltage", true)];

/// Resolved device.toml values
struct DeviceValues {
    integers: HashMap<(&'static str, &'static str), i64>,
    bools: HashMap<(&'static str, &'static str), bool>,
}

impl DeviceValues {
    fn int(&self, section: &'static str, key: &'static str) -> i64 {
        self.integers[&(section, key)]
    }

    fn flag(&self, section: &'static str, key: &'static str) -> bool {
        self.bools[&(section, key)]
    }
}

fn main() {
    setup_linker();
    let values = validate_config();
    generate_config(&values);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    if env::var_os("CARGO_FEATURE_DEFMT").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Print a boxed error report and abort the build
fn fail(title: &str, errors: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> Vec<String> {
    msg.lines()
        .map(|line| {
            if line.len() > 61 {
                format!("{}...", &line[..58])
            } else {
                line.to_string()
            }
        })
        .collect()
}

/// Validate device.toml and resolve every key to a value
fn validate_config() -> DeviceValues {
    println!("cargo:rerun-if-changed=device.toml");

    let config_path = Path::new("device.toml");

    let config: toml::Value = if config_path.exists() {
        let content = match fs::read_to_string(config_path) {
            Ok(content) => content,
            Err(e) => fail("Failed to read device.toml", &[e.to_string()]),
        };
        match toml::from_str(&content) {
            Ok(value) => value,
            Err(e) => fail(
                "Invalid TOML syntax in device.toml",
                &format_error_lines(&e.to_string()),
            ),
        }
    } else {
        println!("cargo:warning=device.toml not found, using defaults");
        toml::Value::Table(toml::map::Map::new())
    };

    let mut errors = Vec::new();
    check_unknown_keys(&config, &mut errors);

    let mut integers = HashMap::new();
    for &(section, key, default, min, max) in INTEGER_KEYS {
        let value = match config.get(section).and_then(|s| s.get(key)) {
            None => default,
            Some(toml::Value::Integer(v)) => *v,
            Some(_) => {
                errors.push(format!("[{}] {} must be an integer", section, key));
                default
            }
        };
        if value < min || value > max {
            errors.push(format!("[{}] {} must be {}-{}", section, key, min, max));
        }
        integers.insert((section, key), value);
    }

    let mut bools = HashMap::new();
    for &(section, key, default) in BOOL_KEYS {
        let value = match config.get(section).and_then(|s| s.get(key)) {
            None => default,
            Some(toml::Value::Boolean(v)) => *v,
            Some(_) => {
                errors.push(format!("[{}] {} must be true or false", section, key));
                default
            }
        };
        bools.insert((section, key), value);
    }

    let values = DeviceValues { integers, bools };
    check_relations(&values, &mut errors);

    if !errors.is_empty() {
        fail("Invalid configuration in device.toml", &errors);
    }

    println!("cargo:warning=device.toml validated successfully");
    values
}

/// Reject sections and keys the firmware does not know
fn check_unknown_keys(config: &toml::Value, errors: &mut Vec<String>) {
    let table = match config.as_table() {
        Some(t) => t,
        None => return,
    };

    for (section, body) in table {
        let section = section.as_str();
        let known_section = INTEGER_KEYS.iter().any(|k| k.0 == section)
            || BOOL_KEYS.iter().any(|k| k.0 == section);
        if !known_section {
            errors.push(format!("unknown section [{}]", section));
            continue;
        }
        let body = match body.as_table() {
            Some(t) => t,
            None => {
                errors.push(format!("[{}] must be a table", section));
                continue;
            }
        };
        for key in body.keys() {
            let key = key.as_str();
            let known = INTEGER_KEYS.iter().any(|k| k.0 == section && k.1 == key)
                || BOOL_KEYS.iter().any(|k| k.0 == section && k.1 == key);
            if !known {
                errors.push(format!("[{}] unknown key '{}'", section, key));
            }
        }
    }
}

/// Cross-field checks
fn check_relations(values: &DeviceValues, errors: &mut Vec<String>) {
    if values.int("ui", "long_press_ms") <= values.int("ui", "debounce_ms") {
        errors.push("[ui] long_press_ms must exceed debounce_ms".to_string());
    }

    // INA226 calibration register is 15 bits
    let shunt = values.int("sensor", "shunt_micro_ohm");
    let lsb = values.int("sensor", "current_lsb_ua");
    if shunt > 0 && lsb > 0 {
        let cal = 5_120_000_000i64 / (shunt * lsb);
        if !(1..=0x7FFF).contains(&cal) {
            errors.push(format!(
                "[sensor] calibration value {} out of range 1-32767",
                cal
            ));
        }
    }
}

/// Write `device_config.rs` into OUT_DIR
fn generate_config(values: &DeviceValues) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let code = format!(
        "pub const DEVICE_CONFIG: DeviceConfig = DeviceConfig {{\n\
        \x20   ui: UiTiming {{\n\
        \x20       debounce_ms: {},\n\
        \x20       long_press_ms: {},\n\
        \x20       double_click_ms: {},\n\
        \x20       fast_rotation_ms: {},\n\
        \x20       large_step_multiplier: {},\n\
        \x20       blink_ms: {},\n\
        \x20       measure_ms: {},\n\
        \x20   }},\n\
        \x20   ntc: NtcCalibration {{ r25: {}, r50: {}, r75: {}, r100: {} }},\n\
        \x20   sensor: SensorCalibration {{ shunt_micro_ohm: {}, current_lsb_ua: {} }},\n\
        \x20   min_selectable_mv: {},\n\
        \x20   probe_min_voltage: {},\n\
        }};\n",
        values.int("ui", "debounce_ms"),
        values.int("ui", "long_press_ms"),
        values.int("ui", "double_click_ms"),
        values.int("ui", "fast_rotation_ms"),
        values.int("ui", "large_step_multiplier"),
        values.int("ui", "blink_ms"),
        values.int("ui", "measure_ms"),
        values.int("ntc", "r25"),
        values.int("ntc", "r50"),
        values.int("ntc", "r75"),
        values.int("ntc", "r100"),
        values.int("sensor", "shunt_micro_ohm"),
        values.int("sensor", "current_lsb_ua"),
        values.int("pd", "min_selectable_mv"),
        values.flag("pd", "probe_min_voltage"),
    );

    fs::write(out_dir.join("device_config.rs"), code).unwrap();
}
