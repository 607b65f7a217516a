//! Error types for aclass
//!
//! Two families of failure exist:
//! - definition-time errors raised while deriving or extending a type
//!   (unknown modifier tags, misuse of `static`, bad configuration)
//! - call-time errors raised when a member is invoked (missing base
//!   implementation, non-callable member, runaway augment recursion)
//!
//! All of them propagate synchronously to the direct caller.

/// Crate-wide result alias
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main aclass error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A `modifier$member` key named a modifier that was never registered
    #[error("unknown modifier `{modifier}` for member `{member}`")]
    UnknownModifier {
        /// Modifier part of the tag
        modifier: String,
        /// Member part of the tag
        member: String,
    },

    /// A delegation stub was called but nothing in the chain implements the member
    #[error("no implementation of `{member}` in the prototype chain")]
    MissingImplementation {
        /// Member that was looked up
        member: String,
    },

    /// A member was invoked but its value is not callable
    #[error("`{member}` is not callable (found {found})")]
    NotCallable {
        /// Member or argument that was invoked
        member: String,
        /// Kind of value found instead
        found: &'static str,
    },

    /// `static` was applied to an object that is not a type prototype
    #[error("static member `{member}` requires a type prototype as target")]
    NotAPrototype {
        /// Member being defined
        member: String,
    },

    /// Wrong argument passed to a built-in member
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Augment chain nested deeper than the configured bound
    #[error("augment chain for `{member}` exceeded depth {limit}")]
    AugmentDepthExceeded {
        /// Member whose chain overflowed
        member: String,
        /// Configured maximum depth
        limit: usize,
    },

    /// The realm an object belongs to no longer exists
    #[error("realm has been dropped")]
    RealmDropped,

    /// Configuration could not be parsed or failed validation
    #[error("configuration error: {0}")]
    Config(String),

    /// Error raised by user-supplied member code
    #[error("{0}")]
    Raised(String),
}

impl Error {
    /// Create error raised from member code
    #[inline]
    #[must_use]
    pub fn raise(message: impl Into<String>) -> Self {
        Self::Raised(message.into())
    }

    /// Create missing implementation error
    #[inline]
    #[must_use]
    pub fn missing(member: impl Into<String>) -> Self {
        Self::MissingImplementation {
            member: member.into(),
        }
    }

    /// Check if error is raised while defining members rather than calling them
    #[inline]
    #[must_use]
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownModifier { .. } | Self::NotAPrototype { .. } | Self::Config(_)
        )
    }
}
