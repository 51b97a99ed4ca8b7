use rowan::TextRange;

/// Diagnostic kinds ordered by priority (highest priority first).
///
/// Syntax errors come first because every later pass assumes a well-formed
/// tree. Name and structure errors precede analysis errors, which only make
/// sense once every reference resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    // Malformed input
    UnclosedDelimiter,
    ExpectedToken,
    UnexpectedToken,
    InvalidRepeatBounds,
    StrayCode,
    UnknownDirective,
    InvalidDirective,

    // Names and nesting
    DuplicateDefinition,
    DuplicateType,
    DuplicateGenerator,
    UndefinedReference,
    UnknownType,
    UnknownRoot,
    NoExpressions,
    MalformedNesting,
    UnknownBinding,
    ConflictingSlotType,
    UninferableSlotType,
    RecoveryWithoutSentinel,
    RootTypeMismatch,
    IncompleteLocations,
    InvalidKwargValue,

    // Fallback relation
    FallbackNotToken,
    FallbackMultipleParents,
    FallbackCycle,
    FallbackTypeMismatch,

    // LL(1) analysis
    LeftRecursion,
    EmptyRepeat,
    FirstFirstConflict,
    FirstFollowConflict,
    LoopConflict,

    // Harmless but suspicious
    UnknownKwarg,
    UnusedToken,
    MovedBinding,
}

impl DiagnosticKind {
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::UnknownKwarg | Self::UnusedToken | Self::MovedBinding => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Whether this kind hides `other` when both point at the same place.
    pub fn suppresses(&self, other: &DiagnosticKind) -> bool {
        self < other
    }

    pub fn default_hint(&self) -> Option<&'static str> {
        match self {
            Self::LeftRecursion => Some("move the recursive reference after a token"),
            Self::EmptyRepeat => Some("the repeated part must consume at least one token"),
            Self::RecoveryWithoutSentinel => {
                Some("tokens are discarded until the token after `>` arrives")
            }
            Self::IncompleteLocations => {
                Some("set `semloc_type`, `span_fn` and `zero_loc_fn` together")
            }
            Self::MovedBinding => Some("bind the earlier snippet's result to keep using the value"),
            _ => None,
        }
    }

    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::UnclosedDelimiter => "missing closing delimiter",
            Self::ExpectedToken => "unexpected input",
            Self::UnexpectedToken => "unexpected token",
            Self::InvalidRepeatBounds => "invalid repeat bounds",
            Self::StrayCode => "code blocks are only allowed before the first or after the last statement",
            Self::UnknownDirective => "unknown directive",
            Self::InvalidDirective => "malformed directive",

            Self::DuplicateDefinition => "duplicate definition",
            Self::DuplicateType => "duplicate type",
            Self::DuplicateGenerator => "generator is already set",
            Self::UndefinedReference => "undefined reference",
            Self::UnknownType => "unknown type",
            Self::UnknownRoot => "unknown root",
            Self::NoExpressions => "grammar defines no expressions",
            Self::MalformedNesting => "malformed nesting",
            Self::UnknownBinding => "unknown binding",
            Self::ConflictingSlotType => "conflicting binding types",
            Self::UninferableSlotType => "cannot infer binding type",
            Self::RecoveryWithoutSentinel => "recovery block must be followed by a token",
            Self::RootTypeMismatch => "root expressions have different types",
            Self::IncompleteLocations => "incomplete location configuration",
            Self::InvalidKwargValue => "kwarg value must be an identifier",

            Self::FallbackNotToken => "fallback names must be tokens",
            Self::FallbackMultipleParents => "token falls back to multiple other types",
            Self::FallbackCycle => "detected circular fallback",
            Self::FallbackTypeMismatch => "fallback changes the token type",

            Self::LeftRecursion => "left recursion",
            Self::EmptyRepeat => "repeated expression may match nothing",
            Self::FirstFirstConflict => "FIRST/FIRST conflict",
            Self::FirstFollowConflict => "FIRST/FOLLOW conflict",
            Self::LoopConflict => "repeat cannot decide whether to continue",

            Self::UnknownKwarg => "unknown kwarg",
            Self::UnusedToken => "unused token",
            Self::MovedBinding => "value was already moved",
        }
    }

    /// Template for custom messages. `{}` is replaced by the caller's detail.
    pub fn custom_message(&self) -> String {
        match self {
            Self::UnclosedDelimiter => "missing closing `{}`".to_string(),
            Self::ExpectedToken => "expected {}".to_string(),
            Self::UnknownDirective => "unknown directive `%{}`".to_string(),

            Self::DuplicateDefinition => "`{}` is already defined".to_string(),
            Self::DuplicateType => "type `{}` is already declared".to_string(),
            Self::UndefinedReference => "`{}` is not defined".to_string(),
            Self::UnknownType => "type `{}` is not declared".to_string(),
            Self::UnknownRoot => "root `{}` is not an expression".to_string(),
            Self::UnknownBinding => "`{}` is not bound here".to_string(),
            Self::ConflictingSlotType => "`{}` is bound to values of different types".to_string(),
            Self::UninferableSlotType => "cannot infer the type of `{}`".to_string(),
            Self::RootTypeMismatch => "root `{}` has a different type than the other roots".to_string(),
            Self::InvalidKwargValue => "kwarg `{}` must be an identifier".to_string(),

            Self::FallbackNotToken => "`{}` is an expression, fallbacks relate tokens".to_string(),
            Self::FallbackMultipleParents => "`{}` falls back to multiple other types".to_string(),

            Self::LeftRecursion => "left recursion: {}".to_string(),
            Self::FirstFirstConflict => "FIRST/FIRST conflict on {}".to_string(),
            Self::FirstFollowConflict => "FIRST/FOLLOW conflict on {}".to_string(),
            Self::LoopConflict => "repeat cannot decide whether to continue on {}".to_string(),

            Self::UnknownKwarg => "unknown kwarg `{}`".to_string(),
            Self::UnusedToken => "token `{}` is never used".to_string(),
            Self::MovedBinding => "`{}` was already moved into an earlier snippet".to_string(),

            _ => format!("{}: {{}}", self.fallback_message()),
        }
    }

    /// Render the final message: the fallback text, or the template with
    /// `detail` substituted.
    pub fn message(&self, detail: Option<&str>) -> String {
        match detail {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub(crate) range: TextRange,
    pub(crate) message: String,
}

impl RelatedInfo {
    pub fn new(range: TextRange, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    pub(crate) range: TextRange,
    pub(crate) message: String,
    pub(crate) related: Vec<RelatedInfo>,
    pub(crate) hints: Vec<String>,
}

impl DiagnosticMessage {
    pub(crate) fn new(kind: DiagnosticKind, range: TextRange, message: impl Into<String>) -> Self {
        let hints = kind.default_hint().map(str::to_string).into_iter().collect();
        Self {
            kind,
            range,
            message: message.into(),
            related: Vec::new(),
            hints,
        }
    }

    pub(crate) fn with_default_message(kind: DiagnosticKind, range: TextRange) -> Self {
        Self::new(kind, range, kind.fallback_message())
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.kind.default_severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.severity(),
            u32::from(self.range.start()),
            u32::from(self.range.end()),
            self.message
        )?;
        for related in &self.related {
            write!(
                f,
                " (related: {} at {}..{})",
                related.message,
                u32::from(related.range.start()),
                u32::from(related.range.end())
            )?;
        }
        for hint in &self.hints {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}
