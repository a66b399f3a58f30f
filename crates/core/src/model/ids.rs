use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for building an identifier from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} cannot be empty")]
pub struct IdError {
    kind: &'static str,
}

impl IdError {
    /// Name of the identifier type that failed to parse.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new `", stringify!($name), "` from a trimmed, non-empty string.")]
            ///
            /// # Errors
            ///
            /// Returns `IdError` if the value is empty after trimming.
            pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
                let raw = value.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(IdError {
                        kind: stringify!($name),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Returns the underlying string value
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a Course
    CourseId
);

string_id!(
    /// Identifier for a Chapter, unique within its course
    ChapterId
);

string_id!(
    /// Unique identifier for a Quiz
    QuizId
);

string_id!(
    /// Identifier for a Question, unique within its quiz
    QuestionId
);

string_id!(
    /// Unique identifier for a learner
    UserId
);

// ─── Tests ─────────────────────────────────────────────────────────────────────
