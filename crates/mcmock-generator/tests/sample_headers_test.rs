//! Integration tests with realistic sample headers
//!
//! Runs the whole pipeline on headers written to a temporary directory and
//! checks the generated files on disk.

use mcmock_generator::{BatchGenerator, FixedClock, MockGenerator};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ABC_H: &str = r#"
/**
 * Sample header with an include
 */

#include "abc_types.h"

/**
 * A method that requires an `abc_int_t` and returns an `abc_int_t`
 */
extern abc_int_t abc_method(abc_int_t arg);

/**
 * Method to register an abc handler
 */
extern void register_handler(abc_message_handler_t handler);
"#;

const ABC_TYPES_H: &str = r#"
/* Define an abc integer type */
typedef int abc_int_t;

/* Define a boolean */
typedef enum
{
    ABC_FALSE,
    ABC_TRUE
} abc_bool_t;

typedef abc_bool_t (*abc_message_handler_t)(abc_int_t id);
"#;

const SENSOR_CONFIG_H: &str = r#"
#define SENSOR_HAS_IRQ 1
"#;

const SENSOR_H: &str = r#"
#ifndef SENSOR_H
#define SENSOR_H

#include "sensor_config.h"
#include <stdint.h>

#define SENSOR_API extern
#define DECLARE_READ(kind) SENSOR_API int sensor_read_##kind(uint8_t channel, int32_t * out_value);

typedef void (*sensor_ready_callback_t)(uint8_t channel);

DECLARE_READ(temperature)
DECLARE_READ(pressure)

#if defined(SENSOR_HAS_IRQ) && !defined(SENSOR_POLLING)
SENSOR_API void sensor_enable_irq(sensor_ready_callback_t on_ready);
#elif defined(SENSOR_POLLING)
SENSOR_API void sensor_poll(void);
#else
SENSOR_API void sensor_disabled(void);
#endif

#if 0
SENSOR_API void sensor_legacy(void);
#endif

/* Load a calibration table */
SENSOR_API int sensor_calibrate(const uint8_t * table,
                                size_t length);

#endif /* SENSOR_H */
"#;

struct Workspace {
    _dir: TempDir,
    src: PathBuf,
    include: PathBuf,
    out: PathBuf,
}

fn workspace() -> Workspace {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    let include = dir.path().join("include");
    let out = dir.path().join("out");
    for path in [&src, &include, &out] {
        fs::create_dir(path).unwrap();
    }

    fs::write(src.join("abc.h"), ABC_H).unwrap();
    fs::write(include.join("abc_types.h"), ABC_TYPES_H).unwrap();
    fs::write(src.join("sensor.h"), SENSOR_H).unwrap();
    fs::write(include.join("sensor_config.h"), SENSOR_CONFIG_H).unwrap();

    Workspace {
        _dir: dir,
        src,
        include,
        out,
    }
}

fn generator(ws: &Workspace, out: &Path) -> MockGenerator {
    MockGenerator::new(vec![ws.include.clone()], out)
        .with_clock(FixedClock::from_ymd(2023, 11, 2).unwrap())
}

fn declarations(text: &str) -> Vec<&str> {
    text.lines().filter(|l| l.starts_with("extern ")).collect()
}

#[test]
fn test_abc_sample() {
    let ws = workspace();
    let files = generator(&ws, &ws.out).generate(&ws.src.join("abc.h")).unwrap();

    assert_eq!(files.header_path, ws.out.join("mock_abc.h"));
    assert_eq!(files.source_path, ws.out.join("mock_abc.c"));
    assert!(files.warnings.is_empty());

    let header = fs::read_to_string(&files.header_path).unwrap();
    assert_eq!(
        declarations(&header),
        vec![
            "extern void mock_abc_method_expect_and_return( abc_int_t arg, abc_int_t retval );",
            "extern void mock_abc_method_ignore_arg_arg( void );",
            "extern void mock_register_handler_expect( abc_message_handler_t handler );",
            "extern void mock_register_handler_ignore_arg_handler( void );",
        ]
    );
    assert!(header.contains("#include \"abc_types.h\"\n"));

    let source = fs::read_to_string(&files.source_path).unwrap();
    assert!(source.contains("abc_int_t abc_method( abc_int_t arg )\n"));
    assert!(source.contains("void mock_register_handler_ignore_arg_handler( void )\n"));
    assert!(source.contains("Generated by mcmock on 02/11/2023."));
}

#[test]
fn test_guards_conditionals_macros_and_pointers() {
    let ws = workspace();
    let files = generator(&ws, &ws.out).generate(&ws.src.join("sensor.h")).unwrap();
    let header = fs::read_to_string(&files.header_path).unwrap();

    assert_eq!(
        declarations(&header),
        vec![
            "extern void mock_sensor_read_temperature_expect_and_return\
             ( uint8_t channel, int32_t* out_value, int retval );",
            "extern void mock_sensor_read_temperature_ignore_arg_channel( void );",
            "extern void mock_sensor_read_temperature_ignore_arg_out_value( void );",
            "extern void mock_sensor_read_pressure_expect_and_return\
             ( uint8_t channel, int32_t* out_value, int retval );",
            "extern void mock_sensor_read_pressure_ignore_arg_channel( void );",
            "extern void mock_sensor_read_pressure_ignore_arg_out_value( void );",
            "extern void mock_sensor_enable_irq_expect\
             ( mock_sensor_enable_irq_on_ready_callback_t callback );",
            "extern void mock_sensor_calibrate_expect_and_return\
             ( const uint8_t* table, size_t length, int retval );",
            "extern void mock_sensor_calibrate_ignore_arg_table( void );",
            "extern void mock_sensor_calibrate_ignore_arg_length( void );",
            "extern void mock_sensor_calibrate_verify_pointer_data_table( size_t buffer_size );",
            "extern void mock_sensor_calibrate_catch_parameter_table\
             ( mock_sensor_calibrate_catch_parameter_table_callback_t callback );",
        ]
    );
    assert!(header.contains(
        "typedef void ( *mock_sensor_enable_irq_on_ready_callback_t )\
         ( sensor_ready_callback_t on_ready );\n"
    ));
    assert!(header.contains("#include \"sensor_config.h\"\n"));
    assert!(header.contains("#include <stdint.h>\n"));

    let source = fs::read_to_string(&files.source_path).unwrap();
    for absent in ["sensor_poll", "sensor_disabled", "sensor_legacy"] {
        assert!(!source.contains(absent), "{} should be stripped", absent);
    }
    assert!(source.contains("    const uint8_t* table;\n"));
}

#[test]
fn test_regeneration_is_byte_identical() {
    let ws = workspace();
    let header = ws.src.join("sensor.h");

    let first = generator(&ws, &ws.out).generate(&header).unwrap();
    let first_header = fs::read(&first.header_path).unwrap();
    let first_source = fs::read(&first.source_path).unwrap();

    let second = generator(&ws, &ws.out).generate(&header).unwrap();
    assert_eq!(fs::read(&second.header_path).unwrap(), first_header);
    assert_eq!(fs::read(&second.source_path).unwrap(), first_source);
}

#[test]
fn test_batch_output_is_isolated() {
    let ws = workspace();
    let alone = ws.out.join("alone");
    let together = ws.out.join("together");
    fs::create_dir(&alone).unwrap();
    fs::create_dir(&together).unwrap();

    generator(&ws, &alone).generate(&ws.src.join("abc.h")).unwrap();
    let results = BatchGenerator::new(generator(&ws, &together))
        .generate_all(&[ws.src.join("abc.h"), ws.src.join("sensor.h")])
        .unwrap();
    assert!(results.iter().all(|(_, result)| result.is_ok()));

    for name in ["mock_abc.h", "mock_abc.c"] {
        assert_eq!(
            fs::read_to_string(alone.join(name)).unwrap(),
            fs::read_to_string(together.join(name)).unwrap()
        );
    }
}
