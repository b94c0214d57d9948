//! Diagnostics are plain data threaded through every pipeline stage.
//!
//! No stage returns `Err` for a problem in the analyzed program; it pushes a
//! [`Diagnostic`] and keeps going so one run reports as much as possible.
use std::fmt;
use std::path::{Path, PathBuf};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // extraction
    ParseError,
    UnsupportedSyntax,
    UnsupportedEnumType,
    ModuleResolutionError,
    InvalidDefineCall,
    InvalidOneOfMember,
    // scalars
    MultipleInputTypes,
    MissingInputType,
    MissingOutputType,
    // conversion
    ReservedTypeName,
    InvalidEnumMember,
    InvalidInputType,
    DuplicateTypeName,
    OutputOnlyScalarInInput,
    InputOnlyScalarInOutput,
    // integration
    UnknownTargetType,
    InvalidExtensionTarget,
    DuplicateFieldDefinition,
    // validation
    UnknownArgumentType,
    UnknownFieldType,
    OutputTypeInInput,
    CircularInputReference,
    // configuration
    ConfigInvalidType,
    ConfigMissingProperty,
    ConfigBuiltinOverride,
    ConfigDuplicateMapping,
    ConfigDuplicateType,
    ConfigInvalidPath,
    ConfigInvalidSourceDir,
    ConfigInvalidIgnoreGlobs,
    ConfigInvalidOutputType,
    ConfigInvalidOutputPath,
    ConfigInvalidHookType,
    ConfigInvalidHookCommand,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseError => "PARSE_ERROR",
            Self::UnsupportedSyntax => "UNSUPPORTED_SYNTAX",
            Self::UnsupportedEnumType => "UNSUPPORTED_ENUM_TYPE",
            Self::ModuleResolutionError => "MODULE_RESOLUTION_ERROR",
            Self::InvalidDefineCall => "INVALID_DEFINE_CALL",
            Self::InvalidOneOfMember => "INVALID_ONE_OF_MEMBER",
            Self::MultipleInputTypes => "MULTIPLE_INPUT_TYPES",
            Self::MissingInputType => "MISSING_INPUT_TYPE",
            Self::MissingOutputType => "MISSING_OUTPUT_TYPE",
            Self::ReservedTypeName => "RESERVED_TYPE_NAME",
            Self::InvalidEnumMember => "INVALID_ENUM_MEMBER",
            Self::InvalidInputType => "INVALID_INPUT_TYPE",
            Self::DuplicateTypeName => "DUPLICATE_TYPE_NAME",
            Self::OutputOnlyScalarInInput => "OUTPUT_ONLY_SCALAR_IN_INPUT",
            Self::InputOnlyScalarInOutput => "INPUT_ONLY_SCALAR_IN_OUTPUT",
            Self::UnknownTargetType => "UNKNOWN_TARGET_TYPE",
            Self::InvalidExtensionTarget => "INVALID_EXTENSION_TARGET",
            Self::DuplicateFieldDefinition => "DUPLICATE_FIELD_DEFINITION",
            Self::UnknownArgumentType => "UNKNOWN_ARGUMENT_TYPE",
            Self::UnknownFieldType => "UNKNOWN_FIELD_TYPE",
            Self::OutputTypeInInput => "OUTPUT_TYPE_IN_INPUT",
            Self::CircularInputReference => "CIRCULAR_INPUT_REFERENCE",
            Self::ConfigInvalidType => "CONFIG_INVALID_TYPE",
            Self::ConfigMissingProperty => "CONFIG_MISSING_PROPERTY",
            Self::ConfigBuiltinOverride => "CONFIG_BUILTIN_OVERRIDE",
            Self::ConfigDuplicateMapping => "CONFIG_DUPLICATE_MAPPING",
            Self::ConfigDuplicateType => "CONFIG_DUPLICATE_TYPE",
            Self::ConfigInvalidPath => "CONFIG_INVALID_PATH",
            Self::ConfigInvalidSourceDir => "CONFIG_INVALID_SOURCE_DIR",
            Self::ConfigInvalidIgnoreGlobs => "CONFIG_INVALID_IGNORE_GLOBS",
            Self::ConfigInvalidOutputType => "CONFIG_INVALID_OUTPUT_TYPE",
            Self::ConfigInvalidOutputPath => "CONFIG_INVALID_OUTPUT_PATH",
            Self::ConfigInvalidHookType => "CONFIG_INVALID_HOOK_TYPE",
            Self::ConfigInvalidHookCommand => "CONFIG_INVALID_HOOK_COMMAND",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1-based line and column.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self { file: file.into(), line, column }
    }

    /// Location with no line information, used for whole-file problems.
    pub fn file_only(file: &Path) -> Self {
        Self { file: file.to_path_buf(), line: 0, column: 0 }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.file.display())
        } else {
            write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
    pub severity: Severity,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), severity: Severity::Error, location: None }
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), severity: Severity::Warning, location: None }
    }

    pub fn at(mut self, location: Option<SourceLocation>) -> Self {
        self.location = location;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.location {
            Some(location) => write!(f, "{location}: {severity}[{}]: {}", self.code, self.message),
            None => write!(f, "{severity}[{}]: {}", self.code, self.message),
        }
    }
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_never_count_as_errors() {
        let ds = vec![
            Diagnostic::warning(DiagnosticCode::UnsupportedSyntax, "generic"),
            Diagnostic::warning(DiagnosticCode::UnsupportedSyntax, "generic again"),
        ];
        assert!(!has_errors(&ds));
        let mut ds = ds;
        ds.push(Diagnostic::error(DiagnosticCode::UnknownTargetType, "nope"));
        assert!(has_errors(&ds));
    }

    #[test]
    fn codes_serialize_as_screaming_snake() {
        let json = serde_json::to_string(&DiagnosticCode::CircularInputReference).unwrap();
        assert_eq!(json, "\"CIRCULAR_INPUT_REFERENCE\"");
        assert_eq!(DiagnosticCode::ConfigInvalidHookCommand.as_str(), "CONFIG_INVALID_HOOK_COMMAND");
    }

    #[test]
    fn display_includes_location() {
        let d = Diagnostic::error(DiagnosticCode::ParseError, "bad")
            .at(Some(SourceLocation::new("src/a.ts", 3, 7)));
        assert_eq!(d.to_string(), "src/a.ts:3:7: error[PARSE_ERROR]: bad");
    }
}
