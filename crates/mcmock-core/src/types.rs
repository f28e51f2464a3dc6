//! Core type definitions

use serde::{Deserialize, Serialize};

/// Return type text that marks a function returning nothing
pub const VOID: &str = "void";

/// One `#define`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinedSymbol {
    /// Macro name
    pub name: String,
    /// Raw replacement text (parameter list included for function-like macros)
    pub value: String,
    /// A `(` directly followed the name, opening a parameter list
    #[serde(default)]
    pub function_like: bool,
}

impl DefinedSymbol {
    /// Object-like symbol
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            function_like: false,
        }
    }

    /// Symbol for `#define <name><rest>`
    ///
    /// Only a `(` with no whitespace before it makes the macro function-like,
    /// so `#define TIMEOUT (100)` stays object-like.
    pub fn from_define(name: impl Into<String>, rest: &str) -> Self {
        Self {
            name: name.into(),
            value: rest.trim().to_string(),
            function_like: rest.starts_with('('),
        }
    }

    pub fn is_function_like(&self) -> bool {
        self.function_like
    }
}

/// Kind of a `typedef`, decided by keyword pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypedefKind {
    Struct,
    Enum,
    Callback,
    Custom,
}

/// One `typedef`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Typedef {
    pub kind: TypedefKind,
    /// Declared name, when it can be extracted
    pub name: Option<String>,
    /// Raw accumulated text
    pub text: String,
}

/// Classification of a parameter; decides which mock APIs are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKind {
    /// Plain value (`int age`)
    Value,
    /// Pointer to data read by the function
    InPointer,
    /// Pointer to data written by the function (`out_` naming convention)
    OutPointer,
    /// Inline function pointer declaration (`void (*cb)(int)`)
    FunctionPointer,
    /// Typedef'd callback (type text mentions `callback`)
    Callback,
    /// `...` or `va_list`
    Variadic,
    /// Return value slot, only used by mock APIs
    ReturnValue,
    Unknown,
}

impl ParameterKind {
    pub fn is_pointer(&self) -> bool {
        matches!(self, ParameterKind::InPointer | ParameterKind::OutPointer)
    }
}

/// A decomposed function pointer declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionPointer {
    pub return_type: String,
    pub name: String,
    /// Raw text of the pointer's own parameter list
    pub params: String,
}

/// Function or mock API parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub kind: ParameterKind,
    /// Type text; for function pointers the whole declaration
    pub type_name: String,
    pub name: String,
    /// Decomposed signature of a function pointer parameter
    pub signature: Option<FunctionPointer>,
}

impl Parameter {
    pub fn new(kind: ParameterKind, type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            type_name: type_name.into(),
            name: name.into(),
            signature: None,
        }
    }

    /// Create a function pointer parameter from its raw declaration
    pub fn function_pointer(declaration: impl Into<String>, signature: FunctionPointer) -> Self {
        Self {
            kind: ParameterKind::FunctionPointer,
            type_name: declaration.into(),
            name: signature.name.clone(),
            signature: Some(signature),
        }
    }

    /// Type used for the field that stores this parameter in a mock
    ///
    /// Drops `const` that would make the field unassignable: every `const`
    /// of a non-pointer type, and the ones after the last `*` of a pointer.
    pub fn storage_type(&self) -> String {
        match self.type_name.rfind('*') {
            None => self
                .type_name
                .split_whitespace()
                .filter(|word| *word != "const")
                .collect::<Vec<_>>()
                .join(" "),
            Some(idx) => {
                let (head, tail) = self.type_name.split_at(idx + 1);
                let tail: Vec<&str> = tail
                    .split_whitespace()
                    .filter(|word| *word != "const")
                    .collect();
                if tail.is_empty() {
                    head.trim_end().to_string()
                } else {
                    format!("{} {}", head.trim_end(), tail.join(" "))
                }
            }
        }
    }

    /// Text of this parameter inside a C parameter list
    pub fn declaration(&self) -> String {
        match self.kind {
            ParameterKind::FunctionPointer | ParameterKind::Variadic => self.type_name.clone(),
            _ => format!("{} {}", self.type_name, self.name),
        }
    }
}

/// Function declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// Function name
    pub name: String,
    /// Return type
    pub return_type: String,
    /// Parameters, in declaration order
    pub params: Vec<Parameter>,
}

impl Function {
    pub fn new(name: impl Into<String>, return_type: impl Into<String>, params: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            params,
        }
    }

    pub fn returns_void(&self) -> bool {
        self.return_type == VOID
    }

    /// Parameter list as C text; an empty list renders as `void`
    pub fn parameter_list(&self) -> String {
        if self.params.is_empty() {
            return VOID.to_string();
        }
        self.params
            .iter()
            .map(Parameter::declaration)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Kind of a synthesized mock control API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MockOperation {
    Expect,
    ExpectAndReturn,
    IgnoreArg,
    VerifyInPointer,
    CatchParameter,
}

/// A synthesized test-double control entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockApi {
    /// Name, return type and parameters of the control API itself
    pub signature: Function,
    pub operation: MockOperation,
    /// Name of the mocked function this API controls
    pub mocked_function: String,
    /// Parameter of the mocked function the API is scoped to, if any
    pub target: Option<String>,
}

impl MockApi {
    pub fn name(&self) -> &str {
        &self.signature.name
    }
}

/// Function pointer typedef exposing a callback or captured pointer to tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackTypedef {
    pub typedef_name: String,
    /// Type text of the parameter handed to the hook
    pub callback_type: String,
    /// Parameter of the mocked function the hook receives
    pub parameter_name: String,
    /// Mocked function owning the parameter
    pub function_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(type_name: &str) -> Parameter {
        Parameter::new(ParameterKind::Value, type_name, "p")
    }

    #[test]
    fn test_storage_type_strips_unassignable_const() {
        assert_eq!(param("const int").storage_type(), "int");
        assert_eq!(param("const char*").storage_type(), "const char*");
        assert_eq!(param("const char * const").storage_type(), "const char *");
        assert_eq!(param("unsigned long").storage_type(), "unsigned long");
    }

    #[test]
    fn test_parameter_list_rendering() {
        let empty = Function::new("f", VOID, vec![]);
        assert_eq!(empty.parameter_list(), "void");
        assert!(empty.returns_void());

        let f = Function::new(
            "g",
            "int",
            vec![
                Parameter::new(ParameterKind::Value, "int", "a"),
                Parameter::new(ParameterKind::Variadic, "...", "variable_list"),
            ],
        );
        assert_eq!(f.parameter_list(), "int a, ...");
        assert!(!f.returns_void());
    }

    #[test]
    fn test_function_like_symbol() {
        let square = DefinedSymbol::from_define("SQ", "(x) ((x)*(x))");
        assert!(square.is_function_like());
        assert_eq!(square.value, "(x) ((x)*(x))");
        assert!(!DefinedSymbol::from_define("MAX", " 10").is_function_like());
        assert!(!DefinedSymbol::new("MAX", "10").is_function_like());
    }

    #[test]
    fn test_parenthesised_value_is_object_like() {
        let timeout = DefinedSymbol::from_define("TIMEOUT", " (100)");
        assert!(!timeout.is_function_like());
        assert_eq!(timeout, DefinedSymbol::new("TIMEOUT", "(100)"));
    }
}
