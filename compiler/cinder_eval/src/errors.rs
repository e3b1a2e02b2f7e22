//! Error types for contract evaluation.
//!
//! `EvalErrorKind` carries the structured category; `EvalError` adds the
//! message, source location, the procedure backtrace and free-form notes.
//! Errors are built through the `#[cold]` factory functions below rather
//! than by hand so the message always matches the kind.

use std::fmt;

use cinder_ir::{Name, Span, Type};

use crate::state::BackendError;

/// Result of an evaluation step.
pub type EvalResult<T> = Result<T, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalErrorKind {
    // Resources
    #[error("out of gas: {required} required, {remaining} remaining")]
    OutOfGas { required: u64, remaining: u64 },
    #[error("maximum evaluation depth exceeded (limit: {depth})")]
    StackOverflow { depth: usize },

    // Names
    #[error("unbound identifier: {name}")]
    UnboundName { name: String },
    #[error("identifier {name} is reserved")]
    ReservedName { name: String },
    #[error("unknown field: {name}")]
    UnknownField { name: String },
    #[error("unknown constructor: {name}")]
    UnknownConstructor { name: String },

    // Application
    #[error("not a function: {found}")]
    NotAFunction { found: String },
    #[error("not a type function: {found}")]
    NotATypeClosure { found: String },
    #[error("{name} expects {expected} arguments, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },
    #[error("no clause matches the value of {scrutinee}")]
    NonExhaustiveMatch { scrutinee: String },

    // Arithmetic
    #[error("integer overflow in {operation}")]
    IntegerOverflow { operation: String },
    #[error("division by zero")]
    DivisionByZero,

    // Builtins
    #[error("{detail}")]
    Builtin { detail: String },

    // Contract boundary
    #[error("no transition named {tag}")]
    UnknownTransition { tag: String },
    #[error("parameter mismatch: {detail}")]
    ParameterMismatch { detail: String },
    #[error("value in {context} is not serializable")]
    NonSerializable { context: String },
    #[error("malformed message: {detail}")]
    MalformedMessage { detail: String },
    #[error("insufficient balance: {required} required, {available} available")]
    InsufficientBalance { required: u128, available: u128 },
    #[error("contract constraint does not hold")]
    ConstraintFailed,
    #[error("malformed blockchain context: {detail}")]
    MalformedBlockchainContext { detail: String },
    #[error("library error: {detail}")]
    LibraryRegistration { detail: String },
    #[error("exception thrown{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    UserAbort { message: Option<String> },

    // Collaborators
    #[error("state backend: {0}")]
    Backend(BackendError),
}

/// Secondary context attached to an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalNote {
    pub message: String,
    pub span: Option<Span>,
}

impl EvalNote {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }
}

/// One component on the call stack when an error was raised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    pub name: Name,
}

/// Snapshot of the component call stack, outermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    /// Build a backtrace from component names, outermost first.
    pub fn from_call_stack(stack: &[Name]) -> Self {
        Self::new(
            stack
                .iter()
                .map(|name| BacktraceFrame { name: name.clone() })
                .collect(),
        )
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "call stack:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            writeln!(f, "  {i}: {}", frame.name)?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()` for factory-built errors.
    pub message: String,
    /// Location of the innermost expression or statement that failed.
    pub span: Option<Span>,
    pub backtrace: Option<EvalBacktrace>,
    pub notes: Vec<EvalNote>,
}

impl EvalError {
    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            span: None,
            backtrace: None,
            notes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach `span` unless a more precise location is already recorded.
    #[must_use]
    pub fn or_span(mut self, span: Span) -> Self {
        if self.span.is_none() && !span.is_dummy() {
            self.span = Some(span);
        }
        self
    }

    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        self.backtrace = Some(backtrace);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: EvalNote) -> Self {
        self.notes.push(note);
        self
    }

    /// Whether the error was caused by gas exhaustion.
    #[inline]
    pub fn is_out_of_gas(&self) -> bool {
        matches!(self.kind, EvalErrorKind::OutOfGas { .. })
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(span) = self.span {
            write!(f, " at {span}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

impl From<BackendError> for EvalError {
    fn from(err: BackendError) -> Self {
        EvalError::from_kind(EvalErrorKind::Backend(err))
    }
}

/// A single reportable entry produced from a failed invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub span: Option<Span>,
}

/// A failed invocation: the error plus the gas left when it was raised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub error: EvalError,
    pub remaining_gas: u64,
}

impl Failure {
    pub fn new(error: EvalError, remaining_gas: u64) -> Self {
        Self {
            error,
            remaining_gas,
        }
    }

    /// The error followed by one entry per backtrace frame, outermost first.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut out = vec![Diagnostic {
            message: self.error.message.clone(),
            span: self.error.span,
        }];
        out.extend(self.error.notes.iter().map(|note| Diagnostic {
            message: note.message.clone(),
            span: note.span,
        }));
        if let Some(backtrace) = &self.error.backtrace {
            out.extend(backtrace.frames().iter().map(|frame| Diagnostic {
                message: format!("raised from {}", frame.name),
                span: None,
            }));
        }
        out
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (remaining gas: {})", self.error, self.remaining_gas)
    }
}

impl std::error::Error for Failure {}

// Resources

#[cold]
pub fn out_of_gas(required: u64, remaining: u64) -> EvalError {
    EvalError::from_kind(EvalErrorKind::OutOfGas {
        required,
        remaining,
    })
}

#[cold]
pub fn recursion_limit_exceeded(depth: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { depth })
}

// Names

#[cold]
pub fn unbound_name(name: &Name) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnboundName {
        name: name.to_string(),
    })
}

#[cold]
pub fn reserved_name(name: &Name) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ReservedName {
        name: name.to_string(),
    })
}

#[cold]
pub fn unknown_field(name: &Name) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownField {
        name: name.to_string(),
    })
}

#[cold]
pub fn unknown_constructor(name: &Name) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownConstructor {
        name: name.to_string(),
    })
}

#[cold]
pub fn unknown_procedure(name: &Name) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnboundName {
        name: format!("procedure {name}"),
    })
}

// Application

#[cold]
pub fn not_a_function(found: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotAFunction {
        found: found.to_string(),
    })
}

#[cold]
pub fn not_a_type_closure(found: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotATypeClosure {
        found: found.to_string(),
    })
}

#[cold]
pub fn arity_mismatch(name: &Name, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected,
        got,
    })
}

#[cold]
pub fn type_mismatch(expected: impl fmt::Display, got: impl fmt::Display) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

#[cold]
pub fn value_type_mismatch(expected: &Type, got: &Type) -> EvalError {
    type_mismatch(expected, got)
}

#[cold]
pub fn non_exhaustive_match(scrutinee: &Name) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NonExhaustiveMatch {
        scrutinee: scrutinee.to_string(),
    })
}

// Arithmetic

#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IntegerOverflow {
        operation: operation.to_string(),
    })
}

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn builtin_error(detail: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Builtin {
        detail: detail.into(),
    })
}

// Contract boundary

#[cold]
pub fn unknown_transition(tag: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownTransition {
        tag: tag.to_string(),
    })
}

#[cold]
pub fn parameter_mismatch(detail: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ParameterMismatch {
        detail: detail.into(),
    })
}

#[cold]
pub fn non_serializable(context: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NonSerializable {
        context: context.into(),
    })
}

#[cold]
pub fn malformed_message(detail: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MalformedMessage {
        detail: detail.into(),
    })
}

#[cold]
pub fn insufficient_balance(required: u128, available: u128) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InsufficientBalance {
        required,
        available,
    })
}

#[cold]
pub fn constraint_failed() -> EvalError {
    EvalError::from_kind(EvalErrorKind::ConstraintFailed)
}

#[cold]
pub fn malformed_blockchain_context(detail: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MalformedBlockchainContext {
        detail: detail.into(),
    })
}

#[cold]
pub fn library_error(detail: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::LibraryRegistration {
        detail: detail.into(),
    })
}

#[cold]
pub fn user_abort(message: Option<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UserAbort { message })
}
