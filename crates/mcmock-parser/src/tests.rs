//! Extended tests for the mcmock parser
//!
//! These tests run whole headers through [`HeaderParser`] with headers held
//! in memory.

use super::*;
use mcmock_core::{ParameterKind, TypedefKind};
use pretty_assertions::assert_eq;

const ABC_TYPES: &str = r#"
/* Define an abc integer type */
typedef int abc_int_t;

typedef enum
{
    ABC_FALSE,
    ABC_TRUE
} abc_bool_t;

typedef abc_bool_t (*abc_message_handler_t)(abc_int_t id);
"#;

const ABC: &str = r#"
/**
 * Sample header with an include
 */
#include "abc_types.h"

extern abc_int_t abc_method(abc_int_t arg);

extern void register_handler(abc_message_handler_t handler);
"#;

fn names(functions: &[Function]) -> Vec<&str> {
    functions.iter().map(|f| f.name.as_str()).collect()
}

fn abc_parser() -> HeaderParser<MemoryReader> {
    let reader = MemoryReader::new()
        .with_file("samples/abc/abc.h", ABC)
        .with_file("samples/abc/abc_types.h", ABC_TYPES);
    HeaderParser::with_reader(reader, vec![])
}

/// Test a header whose types live in an included header
#[test]
fn test_sample_with_include() {
    let parsed = abc_parser().parse_file(Path::new("samples/abc/abc.h")).unwrap();

    assert_eq!(parsed.mock_name(), "abc");
    assert_eq!(names(&parsed.functions), vec!["abc_method", "register_handler"]);
    assert!(parsed.warnings.is_empty());
    assert_eq!(parsed.header.application_includes(), &["abc_types.h".to_string()]);

    assert_eq!(parsed.includes.len(), 1);
    let kinds: Vec<_> = parsed.includes[0].typedefs().iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![TypedefKind::Custom, TypedefKind::Enum, TypedefKind::Callback]
    );

    let method = &parsed.functions[0];
    assert_eq!(method.return_type, "abc_int_t");
    assert_eq!(method.params[0].name, "arg");
    assert_eq!(method.params[0].kind, ParameterKind::Value);
}

/// Test that a missing include only produces a warning
#[test]
fn test_missing_include_is_a_warning() {
    let source = "#include \"nowhere.h\"\n#include <stdint.h>\nvoid tick(void);";
    let parsed = HeaderParser::with_reader(MemoryReader::new(), vec![])
        .parse_source(Path::new("tick.h"), source)
        .unwrap();

    assert_eq!(names(&parsed.functions), vec!["tick"]);
    assert_eq!(
        parsed.warnings,
        vec![Warning::MissingInclude {
            header: "nowhere.h".into()
        }]
    );
    assert_eq!(parsed.header.system_includes(), &["stdint.h".to_string()]);
}

/// Test that conditionals see symbols from included headers
#[test]
fn test_conditionals_use_included_symbols() {
    let config = "#define HAS_DISPLAY 1\n";
    let device = r#"
#ifndef DEVICE_H
#define DEVICE_H
#include "config.h"

#ifdef HAS_DISPLAY
void display_on(void);
#else
void display_unavailable(void);
#endif

#if defined(HAS_DISPLAY) && defined(HAS_TOUCH)
void touch_calibrate(int x, int y);
#elif defined(HAS_DISPLAY)
void keypad_scan(void);
#endif

#if 0
void never(void);
#endif
#endif
"#;
    let reader = MemoryReader::new()
        .with_file("inc/config.h", config)
        .with_file("src/device.h", device);
    let parsed = HeaderParser::with_reader(reader, vec![PathBuf::from("inc")])
        .parse_file(Path::new("src/device.h"))
        .unwrap();

    assert_eq!(names(&parsed.functions), vec!["display_on", "keypad_scan"]);
}

/// Test that transitive includes are visited depth-first and cycles end
#[test]
fn test_transitive_includes() {
    let reader = MemoryReader::new()
        .with_file(
            "a.h",
            "#include \"b.h\"\n#include \"d.h\"\n#ifdef FROM_C\nvoid a(void);\n#endif",
        )
        .with_file("b.h", "#include \"c.h\"\n#define FROM_B")
        .with_file("c.h", "#include \"a.h\"\n#define FROM_C")
        .with_file("d.h", "#include \"b.h\"\n#define FROM_D");
    let parser = HeaderParser::with_reader(reader, vec![PathBuf::from(".")]);
    let parsed = parser.parse_file(Path::new("a.h")).unwrap();

    let order: Vec<_> = parsed.includes.iter().map(|h| h.name().to_string()).collect();
    assert_eq!(order, vec!["b.h", "c.h", "d.h"]);
    assert_eq!(names(&parsed.functions), vec!["a"]);
}

/// Test that two parsers sharing a cache pre-parse shared includes once
#[test]
fn test_shared_include_cache() {
    let reader = MemoryReader::new()
        .with_file("types.h", "typedef int id_t;")
        .with_file("one.h", "#include \"types.h\"\nvoid one(id_t id);")
        .with_file("two.h", "#include \"types.h\"\nvoid two(id_t id);");
    let parser = HeaderParser::with_reader(reader, vec![]);

    let one = parser.parse_file(Path::new("one.h")).unwrap();
    let two = parser.parse_file(Path::new("two.h")).unwrap();

    assert!(Arc::ptr_eq(&one.includes[0], &two.includes[0]));
    assert_eq!(parser.cache().stats().entries, 1);
}

/// Test macro expansion feeding the declaration parser
#[test]
fn test_macro_declared_functions() {
    let source = r#"
#define API extern
#define DECLARE_SETTER(field) void set_##field(int field);
#define DECLARE_PAIR(type, name) type get_##name(void); void reset_##name(void);

API int version(void);
DECLARE_SETTER(speed)
DECLARE_PAIR(long, distance)
"#;
    let parsed = HeaderParser::with_reader(MemoryReader::new(), vec![])
        .parse_source(Path::new("macros.h"), source)
        .unwrap();

    assert_eq!(
        names(&parsed.functions),
        vec!["version", "set_speed", "get_distance", "reset_distance"]
    );
    assert_eq!(parsed.functions[1].params[0].name, "speed");
    assert_eq!(parsed.functions[2].return_type, "long");
}

/// Test that a malformed conditional fails only this header
#[test]
fn test_unterminated_conditional_is_fatal() {
    let result = HeaderParser::with_reader(MemoryReader::new(), vec![])
        .parse_source(Path::new("bad.h"), "#ifdef FOO\nvoid f(void);\n");
    assert!(matches!(result, Err(mcmock_core::Error::Conditional(_))));
}

/// Test typedefs and struct definitions mixed with declarations
#[test]
fn test_struct_definitions_are_not_functions() {
    let source = r#"
struct point;
struct rect
{
    int x;
    int y;
    int (*area)(struct rect * self);
};
typedef struct { int code; } status_t;
status_t rect_status(const struct rect * r);
void rect_draw(const struct rect * r, abc_callback_t done);
"#;
    let parsed = HeaderParser::with_reader(MemoryReader::new(), vec![])
        .parse_source(Path::new("rect.h"), source)
        .unwrap();

    assert_eq!(names(&parsed.functions), vec!["rect_status", "rect_draw"]);
    let draw = &parsed.functions[1];
    assert_eq!(draw.params[0].kind, ParameterKind::InPointer);
    assert_eq!(draw.params[0].type_name, "const struct rect*");
    assert_eq!(draw.params[1].kind, ParameterKind::Callback);
}

/// Test a header without directives keeps its statements
#[test]
fn test_header_without_directives() {
    let source = "int a(void); int b(int x);\n\nvoid c(void);";
    let header = PreParsedHeader::parse("plain.h", source).unwrap();
    assert!(header.symbols().is_empty());
    assert!(header.application_includes().is_empty());
    assert!(header.system_includes().is_empty());
    assert_eq!(
        header.lines(),
        &["int a(void);", "int b(int x);", "void c(void);"].map(String::from)
    );
}
