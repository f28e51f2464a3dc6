//! `mock_<name>.h` emitter

use mcmock_core::Result;
use std::fmt::Write;

use super::{include_guard, write_banner, write_cplusplus_close, write_cplusplus_open, MockUnit};

/// Render the mock header: includes, hook typedefs, then every mock API
/// declaration grouped per mocked function
pub fn render_header(unit: &MockUnit<'_>) -> Result<String> {
    let mut out = String::new();
    let guard = include_guard(&unit.parsed.mock_name());
    let brief = format!("Mock control APIs for {}", unit.mocked_header());

    write_banner(&mut out, &unit.header_file_name(), &brief, unit.date)?;
    writeln!(out, "#ifndef {}", guard)?;
    writeln!(out, "#define {}", guard)?;
    writeln!(out)?;

    writeln!(out, "#include \"{}\"", unit.mocked_header())?;
    writeln!(out)?;
    unit.write_forwarded_includes(&mut out)?;
    writeln!(out, "#include <stddef.h>")?;
    writeln!(out)?;

    write_cplusplus_open(&mut out)?;

    if !unit.data.typedefs.is_empty() {
        for typedef in &unit.data.typedefs {
            writeln!(
                out,
                "typedef void ( *{} )( {} {} );",
                typedef.typedef_name, typedef.callback_type, typedef.parameter_name
            )?;
        }
        writeln!(out)?;
    }

    let mut current: Option<&str> = None;
    for api in &unit.data.apis {
        if current != Some(api.mocked_function.as_str()) {
            if current.is_some() {
                writeln!(out)?;
            }
            writeln!(out, "/* Mock control APIs for {}() */", api.mocked_function)?;
            current = Some(&api.mocked_function);
        }
        writeln!(
            out,
            "extern {} {}( {} );",
            api.signature.return_type,
            api.name(),
            api.signature.parameter_list()
        )?;
    }
    if current.is_some() {
        writeln!(out)?;
    }

    write_cplusplus_close(&mut out)?;
    writeln!(out, "#endif /* {} */", guard)?;
    Ok(out)
}
