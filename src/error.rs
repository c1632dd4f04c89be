use std::fmt::{Display, Formatter};

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type Result<T> = std::result::Result<T, DynError>;

/// Text shown when a failed fetch carries no message of its own.
pub const FETCH_FALLBACK_MESSAGE: &str = "Failed to fetch users";

/// Failure reported by a [`crate::source::UserSource`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    Message(String),
    #[error("Failed to fetch users")]
    Unspecified,
}

impl FetchError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Display text for the error slot of the query state.
    ///
    /// Blank messages count as no message at all.
    pub fn user_message(&self) -> String {
        match self {
            Self::Message(m) if !m.trim().is_empty() => m.clone(),
            _ => FETCH_FALLBACK_MESSAGE.to_string(),
        }
    }
}

pub trait Context<T> {
    fn with_ctx<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

#[derive(Debug)]
pub struct WithContextError {
    pub context: String,
    pub source: DynError,
}

impl Display for WithContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.context, self.source)
    }
}

impl std::error::Error for WithContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl<T, E> Context<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_ctx<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            Box::new(WithContextError {
                context: f(),
                source: e.into(),
            }) as DynError
        })
    }
}
