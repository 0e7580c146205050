//! Schema error types
//!
//! Error codes:
//! - SQUEMA_ARGUMENT_SHAPE
//! - SQUEMA_TOO_MANY_ARGUMENTS
//! - SQUEMA_MISSING_FIELD
//! - SQUEMA_UNKNOWN_FIELD
//! - SQUEMA_NOT_AN_ATTRIBUTE / SQUEMA_NOT_A_KEY
//! - SQUEMA_TYPE_MISMATCH / SQUEMA_SHAPE_MISMATCH
//! - SQUEMA_NO_DECODER / SQUEMA_UNSUPPORTED_ENCODING
//! - SQUEMA_IMMUTABLE / SQUEMA_UPDATE_REJECTED
//! - SQUEMA_CONVERSION_FAILED
//! - SQUEMA_CLASS_ALREADY_REGISTERED / SQUEMA_UNKNOWN_TYPE / SQUEMA_MALFORMED_DECLARATION

use std::fmt;

use thiserror::Error;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaErrorCode {
    /// Positional and named values supplied together
    ArgumentShape,
    /// Strict mode, more positional values than declared fields
    TooManyArguments,
    /// Strict mode, fields still unset after construction
    MissingField,
    /// Strict mode, a name that is not a declared field
    UnknownField,
    /// Attribute-style access to something that is not there
    NotAnAttribute,
    /// Mapping-style access to a name that is not a declared field
    NotAKey,
    /// Constructing the declared type from the raw value failed
    TypeMismatch,
    /// Nested schema field given a value that is not a mapping
    ShapeMismatch,
    /// No coercion strategy applies to the declared type
    NoDecoderAvailable,
    /// Write or delete on an immutable instance
    Immutable,
    /// No encoder for a runtime type or any of its ancestors
    UnsupportedEncoding,
    /// Strict mode bulk update carrying non-field keys
    UpdateRejected,
    /// A decoder, encoder or converter function failed
    ConversionFailed,
    /// A class with the same name is already registered
    ClassAlreadyRegistered,
    /// A declaration names a type the registry cannot resolve
    UnknownType,
    /// A declaration could not be parsed
    MalformedDeclaration,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::ArgumentShape => "SQUEMA_ARGUMENT_SHAPE",
            SchemaErrorCode::TooManyArguments => "SQUEMA_TOO_MANY_ARGUMENTS",
            SchemaErrorCode::MissingField => "SQUEMA_MISSING_FIELD",
            SchemaErrorCode::UnknownField => "SQUEMA_UNKNOWN_FIELD",
            SchemaErrorCode::NotAnAttribute => "SQUEMA_NOT_AN_ATTRIBUTE",
            SchemaErrorCode::NotAKey => "SQUEMA_NOT_A_KEY",
            SchemaErrorCode::TypeMismatch => "SQUEMA_TYPE_MISMATCH",
            SchemaErrorCode::ShapeMismatch => "SQUEMA_SHAPE_MISMATCH",
            SchemaErrorCode::NoDecoderAvailable => "SQUEMA_NO_DECODER",
            SchemaErrorCode::Immutable => "SQUEMA_IMMUTABLE",
            SchemaErrorCode::UnsupportedEncoding => "SQUEMA_UNSUPPORTED_ENCODING",
            SchemaErrorCode::UpdateRejected => "SQUEMA_UPDATE_REJECTED",
            SchemaErrorCode::ConversionFailed => "SQUEMA_CONVERSION_FAILED",
            SchemaErrorCode::ClassAlreadyRegistered => "SQUEMA_CLASS_ALREADY_REGISTERED",
            SchemaErrorCode::UnknownType => "SQUEMA_UNKNOWN_TYPE",
            SchemaErrorCode::MalformedDeclaration => "SQUEMA_MALFORMED_DECLARATION",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failure raised by a decoder, encoder or converter function.
///
/// These are the collaborator-side errors; the coercion pipeline wraps them
/// into a [`SchemaError`] carrying the field and class they occurred on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("{0} is not a valid iso-formatted date/time")]
    InvalidIsoFormat(String),

    #[error("expected text, got <{0}>")]
    NotText(String),

    #[error("cannot convert <{from}> to <{to}>")]
    Unconvertible { from: String, to: String },

    #[error("invalid literal for <{to}>: {literal}")]
    InvalidLiteral { to: String, literal: String },

    #[error("{0}")]
    Custom(String),
}

impl ConversionError {
    /// Shorthand for an unconvertible pair of type names
    pub fn unconvertible(from: impl Into<String>, to: impl Into<String>) -> Self {
        ConversionError::Unconvertible {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Shorthand for a literal that does not parse as the target type
    pub fn invalid_literal(to: impl Into<String>, literal: impl Into<String>) -> Self {
        ConversionError::InvalidLiteral {
            to: to.into(),
            literal: literal.into(),
        }
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    /// Error code
    code: SchemaErrorCode,
    /// Human-readable message
    message: String,
    /// Class the error occurred on, if any
    class_name: Option<String>,
    /// Field names involved, if any
    fields: Vec<String>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            class_name: None,
            fields: Vec::new(),
        }
    }

    fn on_class(mut self, class_name: &str) -> Self {
        self.class_name = Some(class_name.to_string());
        self
    }

    fn on_field(mut self, field: &str) -> Self {
        self.fields.push(field.to_string());
        self
    }

    /// Positional and named values given to the same constructor
    pub fn argument_shape(class_name: &str) -> Self {
        Self::new(
            SchemaErrorCode::ArgumentShape,
            format!(
                "Cannot instantiate <{}> with positional and named values",
                class_name
            ),
        )
        .on_class(class_name)
    }

    /// Strict mode, positional values exceed the declared fields
    pub fn too_many_arguments(class_name: &str, given: usize, declared: usize) -> Self {
        Self::new(
            SchemaErrorCode::TooManyArguments,
            format!(
                "Too many arguments for <{}>: {} given, {} declared",
                class_name, given, declared
            ),
        )
        .on_class(class_name)
    }

    /// Strict mode, fields left unset
    pub fn missing_fields(class_name: &str, fields: &[&str]) -> Self {
        let mut err = Self::new(
            SchemaErrorCode::MissingField,
            format!("Missing value for {}", fields.join(", ")),
        )
        .on_class(class_name);
        err.fields = fields.iter().map(|f| f.to_string()).collect();
        err
    }

    /// Strict mode, a name that is not declared on the class
    pub fn unknown_field(class_name: &str, field: &str) -> Self {
        Self::new(
            SchemaErrorCode::UnknownField,
            format!("\"{}\" is not a field of <{}>", field, class_name),
        )
        .on_class(class_name)
        .on_field(field)
    }

    /// Attribute-style lookup miss
    pub fn not_an_attribute(class_name: &str, name: &str) -> Self {
        Self::new(
            SchemaErrorCode::NotAnAttribute,
            format!("\"{}\" is not an attribute of <{}>", name, class_name),
        )
        .on_class(class_name)
        .on_field(name)
    }

    /// Mapping-style lookup miss
    pub fn not_a_key(class_name: &str, key: &str) -> Self {
        Self::new(
            SchemaErrorCode::NotAKey,
            format!("\"{}\" is not a key of <{}>", key, class_name),
        )
        .on_class(class_name)
        .on_field(key)
    }

    /// Declared type could not be built from the raw value
    pub fn type_mismatch(class_name: &str, field: &str, expected: &str, actual: &str) -> Self {
        Self::new(
            SchemaErrorCode::TypeMismatch,
            format!(
                "Expected type <{}> for field \"{}\", but got <{}>",
                expected, field, actual
            ),
        )
        .on_class(class_name)
        .on_field(field)
    }

    /// Nested schema field given a non-mapping value
    pub fn shape_mismatch(class_name: &str, field: &str, actual: &str) -> Self {
        Self::new(
            SchemaErrorCode::ShapeMismatch,
            format!(
                "The value for \"{}\" must be a mapping, not <{}>",
                field, actual
            ),
        )
        .on_class(class_name)
        .on_field(field)
    }

    /// Coercion fell through every strategy
    pub fn no_decoder(class_name: &str, field: &str, declared: &str) -> Self {
        Self::new(
            SchemaErrorCode::NoDecoderAvailable,
            format!("No decoder defined for type <{}>", declared),
        )
        .on_class(class_name)
        .on_field(field)
    }

    /// Write or delete on an immutable instance
    pub fn immutable(class_name: &str) -> Self {
        Self::new(
            SchemaErrorCode::Immutable,
            format!("<{}> is immutable", class_name),
        )
        .on_class(class_name)
    }

    /// No encoder for a runtime type
    pub fn unsupported_encoding(type_name: &str) -> Self {
        Self::new(
            SchemaErrorCode::UnsupportedEncoding,
            format!("No encoder provided for type <{}>", type_name),
        )
    }

    /// Strict mode update with undeclared keys
    pub fn update_rejected(class_name: &str, keys: &[&str]) -> Self {
        let mut err = Self::new(
            SchemaErrorCode::UpdateRejected,
            format!(
                "Invalid fields for <{}>: {}",
                class_name,
                keys.join(", ")
            ),
        )
        .on_class(class_name);
        err.fields = keys.iter().map(|k| k.to_string()).collect();
        err
    }

    /// A decoder or converter failed while coercing a field
    pub fn decode_failed(class_name: &str, field: &str, source: &ConversionError) -> Self {
        Self::new(
            SchemaErrorCode::ConversionFailed,
            format!("Cannot decode field \"{}\": {}", field, source),
        )
        .on_class(class_name)
        .on_field(field)
    }

    /// An encoder failed while rendering a value
    pub fn encode_failed(type_name: &str, source: &ConversionError) -> Self {
        Self::new(
            SchemaErrorCode::ConversionFailed,
            format!("Cannot encode <{}>: {}", type_name, source),
        )
    }

    /// Class name taken in a registry
    pub fn class_already_registered(class_name: &str) -> Self {
        Self::new(
            SchemaErrorCode::ClassAlreadyRegistered,
            format!("Class <{}> is already registered", class_name),
        )
        .on_class(class_name)
    }

    /// Declaration references a type nobody registered
    pub fn unknown_type(class_name: &str, type_name: &str) -> Self {
        Self::new(
            SchemaErrorCode::UnknownType,
            format!("Unknown type <{}> in declaration of <{}>", type_name, class_name),
        )
        .on_class(class_name)
    }

    /// Declaration text could not be parsed
    pub fn malformed_declaration(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::MalformedDeclaration,
            format!("Malformed declaration '{}': {}", source.into(), reason.into()),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the class name if applicable
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// Returns the field names involved, in the order they were reported
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
