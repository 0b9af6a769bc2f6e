use miette::Diagnostic;
use std::result;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("member `{segment}` not found on type `{type_name}` while resolving path `{path}`")]
    #[diagnostic(
        code(ferromap::unresolved_path_segment),
        help("check the spelling of the path; members are matched case-sensitively")
    )]
    UnresolvedPathSegment {
        segment: String,
        type_name: String,
        path: String,
    },

    #[error("ambiguous mapping `{source_type}` -> `{target_type}`: already declared by `{existing}`")]
    #[diagnostic(code(ferromap::ambiguous_mapping))]
    AmbiguousMapping {
        source_type: String,
        target_type: String,
        existing: String,
    },

    #[error("enum member `{enum_type}.{member}` ({value}) has no counterpart in `{target_enum}`")]
    #[diagnostic(code(ferromap::unmapped_enum_member))]
    UnmappedEnumMember {
        enum_type: String,
        member: String,
        value: i64,
        target_enum: String,
    },

    #[error("cannot map {source_type} to {target_type} as there is no known type mapping")]
    #[diagnostic(code(ferromap::unresolvable_dispatch))]
    UnresolvableDispatch {
        source_type: String,
        target_type: String,
    },

    #[error("unknown type `{0}`")]
    #[diagnostic(code(ferromap::unknown_type))]
    UnknownType(String),

    #[error("empty property path on type `{0}`")]
    #[diagnostic(code(ferromap::empty_path))]
    EmptyPropertyPath(String),

    #[error("type `{type_name}` is part of a cyclic base-type chain")]
    #[diagnostic(code(ferromap::cyclic_hierarchy))]
    CyclicHierarchy { type_name: String },

    #[error("type `{0}` is declared more than once")]
    #[diagnostic(code(ferromap::duplicate_type))]
    DuplicateType(String),

    #[error("member `{member}` is declared more than once on `{type_name}`")]
    #[diagnostic(code(ferromap::duplicate_member))]
    DuplicateMember { type_name: String, member: String },

    #[error("derived type `{derived}` is not assignable to `{declared}`")]
    #[diagnostic(
        code(ferromap::derived_type_not_assignable),
        help("a derived association must narrow the source and target of its entry point")
    )]
    DerivedTypeNotAssignable { derived: String, declared: String },

    #[error("unsupported mapping signature for `{mapping}`: {reason}")]
    #[diagnostic(code(ferromap::unsupported_signature))]
    UnsupportedSignature { mapping: String, reason: String },

    #[error("no handler registered for user-implemented mapping `{0}`")]
    #[diagnostic(code(ferromap::missing_handler))]
    MissingHandler(String),

    #[error("unknown mapping `{0}`")]
    #[diagnostic(code(ferromap::unknown_mapping))]
    UnknownMapping(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl Error {
    /// Raised while resolving declarations.
    ///
    /// `UnmappedEnumMember` belongs to both phases: the strict policy raises
    /// it during resolution and translating a gap raises it during a call.
    /// `Generic` is never classified.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Error::UnresolvedPathSegment { .. }
                | Error::AmbiguousMapping { .. }
                | Error::UnmappedEnumMember { .. }
                | Error::UnknownType(_)
                | Error::EmptyPropertyPath(_)
                | Error::CyclicHierarchy { .. }
                | Error::DuplicateType(_)
                | Error::DuplicateMember { .. }
                | Error::DerivedTypeNotAssignable { .. }
                | Error::UnsupportedSignature { .. }
        )
    }

    /// Raised while executing a built mapping.
    pub fn is_call_error(&self) -> bool {
        matches!(
            self,
            Error::UnresolvableDispatch { .. }
                | Error::UnmappedEnumMember { .. }
                | Error::MissingHandler(_)
                | Error::UnknownMapping(_)
        )
    }
}

pub type Result<T> = result::Result<T, Error>;

// Convert from eyre::Report to our Error type
impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(err.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
