//! `mock_<name>.c` emitter
//!
//! Layout: banner, default includes, forwarded includes, the table of
//! mocked function names, one expectation structure per mocked function,
//! the mock implementations, then one implementation per mock API.
//!
//! Expectation structures start with the name of the API they expect so a
//! call made out of order is reported by the runtime instead of being
//! matched against the wrong data. Control APIs other than `expect` act on
//! the latest registered expectation.

use mcmock_core::{Function, MockApi, MockOperation, Parameter, ParameterKind, Result};
use std::fmt::{self, Write};

use super::{write_banner, MockUnit, API_NAMES_TABLE};
use crate::builder::{
    catch_typedef_name, expectation_struct_name, in_pointers, BUFFER_SIZE_PARAMETER,
    CALLBACK_PARAMETER,
};
use crate::runtime::RUNTIME_HEADER;

/// Local holding the expectation in mock and control API bodies
const EXPECTATION: &str = "mcmock_expectation";
/// Local and structure field holding the queued return value
const RETVAL: &str = "mcmock_retval";
/// Structure field holding the name of the expected API
const API_NAME_FIELD: &str = "mcmock_api_name";

pub fn render_source(unit: &MockUnit<'_>) -> Result<String> {
    let mut out = String::new();
    let brief = format!("Mock implementation of {}", unit.mocked_header());

    write_banner(&mut out, &unit.source_file_name(), &brief, unit.date)?;
    write_default_includes(&mut out, unit)?;
    unit.write_forwarded_includes(&mut out)?;
    write_api_names(&mut out, unit)?;

    for function in &unit.parsed.functions {
        write_expectation_struct(&mut out, unit, function)?;
    }
    for function in &unit.parsed.functions {
        write_mock(&mut out, unit, function)?;
    }
    for api in &unit.data.apis {
        write_control_api(&mut out, unit, api)?;
    }
    Ok(out)
}

fn write_default_includes(out: &mut String, unit: &MockUnit<'_>) -> fmt::Result {
    writeln!(out, "#include <stdlib.h>")?;
    writeln!(out, "#include <string.h>")?;
    writeln!(out, "#include <stdbool.h>")?;
    writeln!(out)?;
    writeln!(out, "#include \"{}\"", RUNTIME_HEADER)?;
    writeln!(out, "#include \"{}\"", unit.mocked_header())?;
    writeln!(out, "#include \"{}\"", unit.header_file_name())?;
    writeln!(out)
}

fn write_api_names(out: &mut String, unit: &MockUnit<'_>) -> fmt::Result {
    writeln!(out, "/* Names of the mocked APIs */")?;
    writeln!(out, "static const char * const {}[] =", API_NAMES_TABLE)?;
    writeln!(out, "{{")?;
    for function in &unit.parsed.functions {
        writeln!(out, "    \"{}\",", function.name)?;
    }
    writeln!(out, "    NULL")?;
    writeln!(out, "}};")?;
    writeln!(out)
}

fn write_expectation_struct(out: &mut String, unit: &MockUnit<'_>, function: &Function) -> fmt::Result {
    writeln!(out, "/* Expectation data for {}() */", function.name)?;
    writeln!(out, "typedef struct")?;
    writeln!(out, "{{")?;
    writeln!(out, "    const char * {};", API_NAME_FIELD)?;

    if let Some(expect) = unit.data.expectation_api(&function.name) {
        for param in &expect.signature.params {
            if param.kind != ParameterKind::ReturnValue {
                writeln!(out, "    {};", stored_field(param))?;
            }
        }
    }
    for param in &function.params {
        if param.kind != ParameterKind::Callback {
            writeln!(out, "    bool ignore_{};", param.name)?;
        }
    }
    for param in in_pointers(function) {
        writeln!(out, "    size_t verify_size_{};", param.name)?;
    }
    for param in in_pointers(function) {
        writeln!(
            out,
            "    {} catch_{};",
            catch_typedef_name(&function.name, &param.name),
            param.name
        )?;
    }
    if !function.returns_void() {
        writeln!(out, "    {} {};", return_storage(function), RETVAL)?;
    }

    writeln!(out, "}} {};", expectation_struct_name(&function.name))?;
    writeln!(out)
}

fn write_mock(out: &mut String, unit: &MockUnit<'_>, function: &Function) -> fmt::Result {
    let api_name = unit.api_name_ref(&function.name);
    let early_return = if function.returns_void() {
        "return;".to_string()
    } else {
        format!("return {};", RETVAL)
    };

    writeln!(out, "/* Mock implementation of {}() */", function.name)?;
    writeln!(
        out,
        "{} {}( {} )",
        function.return_type,
        function.name,
        function.parameter_list()
    )?;
    writeln!(out, "{{")?;
    writeln!(
        out,
        "    {} * {} = mcmock_get_next_expectation();",
        expectation_struct_name(&function.name),
        EXPECTATION
    )?;
    if !function.returns_void() {
        writeln!(out, "    {} {};", return_storage(function), RETVAL)?;
        writeln!(out)?;
        writeln!(out, "    memset( &{0}, 0, sizeof( {0} ) );", RETVAL)?;
    } else {
        writeln!(out)?;
    }

    writeln!(out, "    if ( {} == NULL )", EXPECTATION)?;
    writeln!(out, "    {{")?;
    writeln!(
        out,
        "        mcmock_assert_msg( false, \"unexpected call to %s\", {} );",
        api_name
    )?;
    writeln!(out, "        {}", early_return)?;
    writeln!(out, "    }}")?;
    writeln!(
        out,
        "    if ( strcmp( {}->{}, {} ) != 0 )",
        EXPECTATION, API_NAME_FIELD, api_name
    )?;
    writeln!(out, "    {{")?;
    writeln!(
        out,
        "        mcmock_assert_msg( false, \"expected a call to %s but %s was called\", \
         {}->{}, {} );",
        EXPECTATION, API_NAME_FIELD, api_name
    )?;
    writeln!(out, "        free( {} );", EXPECTATION)?;
    writeln!(out, "        {}", early_return)?;
    writeln!(out, "    }}")?;

    for param in &function.params {
        write_parameter_check(out, param, &api_name)?;
    }
    for param in in_pointers(function) {
        write_hook_call(out, &format!("catch_{}", param.name), &param.name)?;
    }
    if let Some(expect) = unit.data.expectation_api(&function.name) {
        for param in &expect.signature.params {
            if param.kind != ParameterKind::Callback {
                continue;
            }
            if let Some(typedef) = unit.data.typedef_named(&param.type_name) {
                write_hook_call(out, &param.name, &typedef.parameter_name)?;
            }
        }
    }

    if !function.returns_void() {
        writeln!(out, "    {0} = {1}->{0};", RETVAL, EXPECTATION)?;
    }
    writeln!(out, "    free( {} );", EXPECTATION)?;
    if !function.returns_void() {
        writeln!(out, "    return {};", RETVAL)?;
    }
    writeln!(out, "}}")?;
    writeln!(out)
}

/// Compare one argument against the expectation unless it is ignored
fn write_parameter_check(out: &mut String, param: &Parameter, api_name: &str) -> fmt::Result {
    let name = &param.name;
    let e = EXPECTATION;
    let condition = match param.kind {
        ParameterKind::Callback | ParameterKind::Variadic | ParameterKind::ReturnValue => {
            return Ok(())
        }
        ParameterKind::InPointer => {
            writeln!(out, "    if ( !{}->ignore_{} )", e, name)?;
            writeln!(out, "    {{")?;
            writeln!(out, "        if ( {}->verify_size_{} > 0 )", e, name)?;
            writeln!(out, "        {{")?;
            writeln!(
                out,
                "            mcmock_assert_msg( memcmp( {2}->{0}, {0}, \
                 {2}->verify_size_{0} ) == 0, \
                 \"%s: unexpected data pointed to by parameter {0}\", {1} );",
                name, api_name, e
            )?;
            writeln!(out, "        }}")?;
            writeln!(out, "        else")?;
            writeln!(out, "        {{")?;
            writeln!(
                out,
                "            mcmock_assert_msg( {2}->{0} == {0}, \
                 \"%s: unexpected value for parameter {0}\", {1} );",
                name, api_name, e
            )?;
            writeln!(out, "        }}")?;
            return writeln!(out, "    }}");
        }
        ParameterKind::OutPointer | ParameterKind::FunctionPointer => {
            format!("{1}->{0} == {0}", name, e)
        }
        ParameterKind::Value | ParameterKind::Unknown => {
            format!("memcmp( &{1}->{0}, &{0}, sizeof( {0} ) ) == 0", name, e)
        }
    };

    writeln!(out, "    if ( !{}->ignore_{} )", e, name)?;
    writeln!(out, "    {{")?;
    writeln!(
        out,
        "        mcmock_assert_msg( {}, \"%s: unexpected value for parameter {}\", {} );",
        condition, name, api_name
    )?;
    writeln!(out, "    }}")
}

fn write_hook_call(out: &mut String, field: &str, argument: &str) -> fmt::Result {
    writeln!(out, "    if ( {}->{} != NULL )", EXPECTATION, field)?;
    writeln!(out, "    {{")?;
    writeln!(out, "        {}->{}( {} );", EXPECTATION, field, argument)?;
    writeln!(out, "    }}")
}

fn write_control_api(out: &mut String, unit: &MockUnit<'_>, api: &MockApi) -> fmt::Result {
    writeln!(
        out,
        "{} {}( {} )",
        api.signature.return_type,
        api.name(),
        api.signature.parameter_list()
    )?;
    writeln!(out, "{{")?;
    let target = api.target.as_deref().unwrap_or_default();
    match api.operation {
        MockOperation::Expect | MockOperation::ExpectAndReturn => {
            write_expect_body(out, unit, api)?
        }
        MockOperation::IgnoreArg => {
            write_latest_body(out, unit, api, &format!("ignore_{} = true", target))?
        }
        MockOperation::VerifyInPointer => write_latest_body(
            out,
            unit,
            api,
            &format!("verify_size_{} = {}", target, BUFFER_SIZE_PARAMETER),
        )?,
        MockOperation::CatchParameter => write_latest_body(
            out,
            unit,
            api,
            &format!("catch_{} = {}", target, CALLBACK_PARAMETER),
        )?,
    }
    writeln!(out, "}}")?;
    writeln!(out)
}

/// Allocate an expectation, store every argument and queue it
fn write_expect_body(out: &mut String, unit: &MockUnit<'_>, api: &MockApi) -> fmt::Result {
    let api_name = unit.api_name_ref(&api.mocked_function);
    writeln!(
        out,
        "    {0} * {1} = calloc( 1, sizeof( *{1} ) );",
        expectation_struct_name(&api.mocked_function),
        EXPECTATION
    )?;
    writeln!(out)?;
    writeln!(out, "    if ( {} == NULL )", EXPECTATION)?;
    writeln!(out, "    {{")?;
    writeln!(
        out,
        "        mcmock_assert_msg( false, \"%s: failed to allocate an expectation\", {} );",
        api_name
    )?;
    writeln!(out, "        return;")?;
    writeln!(out, "    }}")?;
    writeln!(out, "    {}->{} = {};", EXPECTATION, API_NAME_FIELD, api_name)?;
    for param in &api.signature.params {
        let field = match param.kind {
            ParameterKind::ReturnValue => RETVAL,
            _ => param.name.as_str(),
        };
        writeln!(out, "    {}->{} = {};", EXPECTATION, field, param.name)?;
    }
    writeln!(
        out,
        "    mcmock_register_expectation( {}, {} );",
        EXPECTATION, api_name
    )
}

/// Apply `assignment` to the latest expectation, which must be for this API
fn write_latest_body(
    out: &mut String,
    unit: &MockUnit<'_>,
    api: &MockApi,
    assignment: &str,
) -> fmt::Result {
    let api_name = unit.api_name_ref(&api.mocked_function);
    writeln!(
        out,
        "    {} * {} = mcmock_peek_latest_expectation();",
        expectation_struct_name(&api.mocked_function),
        EXPECTATION
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "    if ( {0} == NULL || strcmp( {0}->{1}, {2} ) != 0 )",
        EXPECTATION, API_NAME_FIELD, api_name
    )?;
    writeln!(out, "    {{")?;
    writeln!(
        out,
        "        mcmock_assert_msg( false, \"%s: no expectation registered for %s\", \"{}\", {} );",
        api.name(),
        api_name
    )?;
    writeln!(out, "        return;")?;
    writeln!(out, "    }}")?;
    writeln!(out, "    {}->{};", EXPECTATION, assignment)
}

/// Field declaration storing an expectation API argument
fn stored_field(param: &Parameter) -> String {
    match param.kind {
        ParameterKind::FunctionPointer => param.type_name.clone(),
        ParameterKind::Callback => format!("{} {}", param.type_name, param.name),
        _ => format!("{} {}", param.storage_type(), param.name),
    }
}

fn return_storage(function: &Function) -> String {
    Parameter::new(ParameterKind::ReturnValue, function.return_type.clone(), RETVAL)
        .storage_type()
}
