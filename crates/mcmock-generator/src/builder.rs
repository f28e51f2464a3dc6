//! Mock data builder
//!
//! Derives the mock control APIs and hook typedefs for every parsed
//! function. The order of both lists is part of the generated output.

use mcmock_core::{
    CallbackTypedef, Function, MockApi, MockOperation, Parameter, ParameterKind, VOID,
};
use serde::Serialize;
use tracing::debug;

/// Name of the hook parameter of expectation and catch APIs
pub const CALLBACK_PARAMETER: &str = "callback";
/// Name of the trailing return value parameter of `expect_and_return` APIs
pub const RETVAL_PARAMETER: &str = "retval";
/// Name of the single parameter of verify APIs
pub const BUFFER_SIZE_PARAMETER: &str = "buffer_size";

pub fn expect_api_name(function: &Function) -> String {
    if function.returns_void() {
        format!("mock_{}_expect", function.name)
    } else {
        format!("mock_{}_expect_and_return", function.name)
    }
}

pub fn ignore_arg_api_name(function: &str, parameter: &str) -> String {
    format!("mock_{}_ignore_arg_{}", function, parameter)
}

pub fn verify_api_name(function: &str, parameter: &str) -> String {
    format!("mock_{}_verify_pointer_data_{}", function, parameter)
}

pub fn catch_api_name(function: &str, parameter: &str) -> String {
    format!("mock_{}_catch_parameter_{}", function, parameter)
}

pub fn callback_typedef_name(function: &str, parameter: &str) -> String {
    format!("mock_{}_{}_callback_t", function, parameter)
}

pub fn catch_typedef_name(function: &str, parameter: &str) -> String {
    format!("{}_callback_t", catch_api_name(function, parameter))
}

pub fn expectation_struct_name(function: &str) -> String {
    format!("mock_{}_expectation_t", function)
}

/// Everything the emitters need beyond the parsed functions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MockData {
    pub apis: Vec<MockApi>,
    pub typedefs: Vec<CallbackTypedef>,
}

impl MockData {
    /// Derive mock APIs for `functions`, in declaration order
    ///
    /// Per function: the expectation API, one ignore API per non-callback
    /// parameter, then one verify API per in-pointer followed by one catch
    /// API per in-pointer.
    pub fn build(functions: &[Function]) -> Self {
        let mut data = Self::default();
        for function in functions {
            data.add_expectation(function);
            data.add_ignore_args(function);
            data.add_verify_in_pointers(function);
            data.add_catch_parameters(function);
        }
        debug!(
            "Built {} mock APIs and {} typedefs for {} functions",
            data.apis.len(),
            data.typedefs.len(),
            functions.len()
        );
        data
    }

    /// APIs controlling `function`
    pub fn apis_for<'a>(&'a self, function: &'a str) -> impl Iterator<Item = &'a MockApi> + 'a {
        self.apis.iter().filter(move |api| api.mocked_function == function)
    }

    /// The `expect` or `expect_and_return` API of `function`
    pub fn expectation_api(&self, function: &str) -> Option<&MockApi> {
        self.apis.iter().find(|api| {
            api.mocked_function == function
                && matches!(
                    api.operation,
                    MockOperation::Expect | MockOperation::ExpectAndReturn
                )
        })
    }

    pub fn typedef_named(&self, typedef_name: &str) -> Option<&CallbackTypedef> {
        self.typedefs.iter().find(|t| t.typedef_name == typedef_name)
    }

    /// Hook typedef for a callback parameter of `function`
    pub fn callback_typedef(&self, function: &str, parameter: &str) -> Option<&CallbackTypedef> {
        self.typedef_named(&callback_typedef_name(function, parameter))
    }

    /// Hook typedef for catching an in-pointer parameter of `function`
    pub fn catch_typedef(&self, function: &str, parameter: &str) -> Option<&CallbackTypedef> {
        self.typedef_named(&catch_typedef_name(function, parameter))
    }

    fn add_expectation(&mut self, function: &Function) {
        let mut params = Vec::with_capacity(function.params.len() + 1);
        for param in &function.params {
            match param.kind {
                ParameterKind::Callback => {
                    let typedef = self.add_typedef(
                        callback_typedef_name(&function.name, &param.name),
                        function,
                        param,
                    );
                    let name = callback_parameter_name(function, &params, &param.name);
                    params.push(Parameter::new(ParameterKind::Callback, typedef, name));
                }
                // A variadic list cannot be stored, and `...` must stay last in C
                ParameterKind::Variadic => {}
                _ => params.push(param.clone()),
            }
        }
        if !function.returns_void() {
            params.push(Parameter::new(
                ParameterKind::ReturnValue,
                function.return_type.clone(),
                unclaimed_name(function, RETVAL_PARAMETER),
            ));
        }

        let operation = if function.returns_void() {
            MockOperation::Expect
        } else {
            MockOperation::ExpectAndReturn
        };
        self.push_api(expect_api_name(function), params, operation, function, None);
    }

    fn add_ignore_args(&mut self, function: &Function) {
        for param in &function.params {
            if param.kind == ParameterKind::Callback {
                continue;
            }
            self.push_api(
                ignore_arg_api_name(&function.name, &param.name),
                vec![],
                MockOperation::IgnoreArg,
                function,
                Some(&param.name),
            );
        }
    }

    fn add_verify_in_pointers(&mut self, function: &Function) {
        for param in in_pointers(function) {
            self.push_api(
                verify_api_name(&function.name, &param.name),
                vec![Parameter::new(
                    ParameterKind::Value,
                    "size_t",
                    BUFFER_SIZE_PARAMETER,
                )],
                MockOperation::VerifyInPointer,
                function,
                Some(&param.name),
            );
        }
    }

    fn add_catch_parameters(&mut self, function: &Function) {
        for param in in_pointers(function) {
            let typedef =
                self.add_typedef(catch_typedef_name(&function.name, &param.name), function, param);
            self.push_api(
                catch_api_name(&function.name, &param.name),
                vec![Parameter::new(
                    ParameterKind::Callback,
                    typedef,
                    CALLBACK_PARAMETER,
                )],
                MockOperation::CatchParameter,
                function,
                Some(&param.name),
            );
        }
    }

    fn add_typedef(&mut self, typedef_name: String, function: &Function, param: &Parameter) -> String {
        self.typedefs.push(CallbackTypedef {
            typedef_name: typedef_name.clone(),
            callback_type: param.type_name.clone(),
            parameter_name: param.name.clone(),
            function_name: function.name.clone(),
        });
        typedef_name
    }

    fn push_api(
        &mut self,
        name: String,
        params: Vec<Parameter>,
        operation: MockOperation,
        function: &Function,
        target: Option<&str>,
    ) {
        self.apis.push(MockApi {
            signature: Function::new(name, VOID, params),
            operation,
            mocked_function: function.name.clone(),
            target: target.map(String::from),
        });
    }
}

/// In-pointer parameters of `function`, in declaration order
pub(crate) fn in_pointers(function: &Function) -> impl Iterator<Item = &Parameter> {
    function
        .params
        .iter()
        .filter(|param| param.kind == ParameterKind::InPointer)
}

/// `callback` for the first hook of an expectation, `callback_<param>` after
fn callback_parameter_name(function: &Function, params: &[Parameter], parameter: &str) -> String {
    if params.iter().any(|p| p.kind == ParameterKind::Callback) {
        unclaimed_name(function, &format!("{}_{}", CALLBACK_PARAMETER, parameter))
    } else {
        unclaimed_name(function, CALLBACK_PARAMETER)
    }
}

/// `name`, or `mcmock_<name>` when a parameter of `function` already uses it
fn unclaimed_name(function: &Function, name: &str) -> String {
    if function.params.iter().any(|p| p.name == name) {
        format!("mcmock_{}", name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn param(kind: ParameterKind, type_name: &str, name: &str) -> Parameter {
        Parameter::new(kind, type_name, name)
    }

    fn operations(data: &MockData) -> Vec<(MockOperation, Option<String>)> {
        data.apis
            .iter()
            .map(|api| (api.operation, api.target.clone()))
            .collect()
    }

    #[test]
    fn test_fixed_order_for_non_void_function() {
        let function = Function::new(
            "write_block",
            "int",
            vec![
                param(ParameterKind::Value, "int", "fd"),
                param(ParameterKind::InPointer, "const char*", "data"),
                param(ParameterKind::InPointer, "const char*", "meta"),
                param(ParameterKind::OutPointer, "size_t*", "out_written"),
            ],
        );
        let data = MockData::build(&[function]);

        let target = |p: &str| Some(p.to_string());
        assert_eq!(
            operations(&data),
            vec![
                (MockOperation::ExpectAndReturn, None),
                (MockOperation::IgnoreArg, target("fd")),
                (MockOperation::IgnoreArg, target("data")),
                (MockOperation::IgnoreArg, target("meta")),
                (MockOperation::IgnoreArg, target("out_written")),
                (MockOperation::VerifyInPointer, target("data")),
                (MockOperation::VerifyInPointer, target("meta")),
                (MockOperation::CatchParameter, target("data")),
                (MockOperation::CatchParameter, target("meta")),
            ]
        );

        let expect = &data.apis[0];
        assert_eq!(expect.name(), "mock_write_block_expect_and_return");
        assert_eq!(expect.signature.return_type, "void");
        let last = expect.signature.params.last().unwrap();
        assert_eq!(last.kind, ParameterKind::ReturnValue);
        assert_eq!(last.type_name, "int");
        assert_eq!(last.name, "retval");

        assert_eq!(data.apis[5].name(), "mock_write_block_verify_pointer_data_data");
        assert_eq!(data.apis[5].signature.parameter_list(), "size_t buffer_size");
        assert_eq!(data.apis[7].name(), "mock_write_block_catch_parameter_data");
        assert_eq!(
            data.apis[7].signature.parameter_list(),
            "mock_write_block_catch_parameter_data_callback_t callback"
        );

        let typedefs: Vec<_> = data.typedefs.iter().map(|t| t.typedef_name.as_str()).collect();
        assert_eq!(
            typedefs,
            vec![
                "mock_write_block_catch_parameter_data_callback_t",
                "mock_write_block_catch_parameter_meta_callback_t",
            ]
        );
    }

    #[test]
    fn test_callback_parameters_are_replaced() {
        let function = Function::new(
            "subscribe",
            "void",
            vec![
                param(ParameterKind::Callback, "on_event_callback_t", "on_event"),
                param(ParameterKind::Value, "int", "mask"),
                param(ParameterKind::Callback, "on_error_callback_t", "on_error"),
            ],
        );
        let data = MockData::build(&[function]);

        let expect = &data.apis[0];
        assert_eq!(expect.name(), "mock_subscribe_expect");
        assert_eq!(
            expect.signature.parameter_list(),
            "mock_subscribe_on_event_callback_t callback, int mask, \
             mock_subscribe_on_error_callback_t callback_on_error"
        );
        // Callbacks get no ignore API
        assert_eq!(data.apis.len(), 2);
        assert_eq!(data.apis[1].name(), "mock_subscribe_ignore_arg_mask");

        let hook = data.callback_typedef("subscribe", "on_error").unwrap();
        assert_eq!(hook.callback_type, "on_error_callback_t");
        assert_eq!(hook.function_name, "subscribe");
    }

    #[test]
    fn test_variadic_gets_ignore_but_no_expectation_parameter() {
        let function = Function::new(
            "log_msg",
            "void",
            vec![
                param(ParameterKind::InPointer, "const char*", "fmt"),
                param(ParameterKind::Variadic, "...", "variable_list"),
            ],
        );
        let data = MockData::build(&[function]);
        assert_eq!(data.apis[0].signature.parameter_list(), "const char* fmt");
        assert_eq!(data.apis[2].name(), "mock_log_msg_ignore_arg_variable_list");
    }

    #[test]
    fn test_zero_parameter_void_function() {
        let data = MockData::build(&[Function::new("reset", "void", vec![])]);
        assert_eq!(data.apis.len(), 1);
        assert_eq!(data.apis[0].signature.parameter_list(), "void");
        assert!(data.typedefs.is_empty());
        assert_eq!(data.apis_for("reset").count(), 1);
        assert_eq!(data.apis_for("other").count(), 0);
    }

    #[test]
    fn test_generated_parameters_avoid_declared_names() {
        let function = Function::new(
            "compute",
            "int",
            vec![
                param(ParameterKind::Value, "int", "retval"),
                param(ParameterKind::Value, "int", "callback"),
                param(ParameterKind::Callback, "done_callback_t", "on_done"),
            ],
        );
        let data = MockData::build(&[function]);
        assert_eq!(
            data.apis[0].signature.parameter_list(),
            "int retval, int callback, \
             mock_compute_on_done_callback_t mcmock_callback, int mcmock_retval"
        );
    }

    #[test]
    fn test_expectation_api_lookup() {
        let data = MockData::build(&[
            Function::new("reset", "void", vec![]),
            Function::new(
                "read_id",
                "int",
                vec![param(ParameterKind::Value, "int", "bus")],
            ),
        ]);
        // The looked-up name only needs to live for the call
        let name = String::from("read_id");
        let api = data.expectation_api(&name).unwrap();
        drop(name);
        assert_eq!(api.name(), "mock_read_id_expect_and_return");
        assert_eq!(
            data.expectation_api("reset").map(|api| api.operation),
            Some(MockOperation::Expect)
        );
        assert!(data.expectation_api("missing").is_none());
    }
}
