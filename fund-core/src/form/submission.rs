use std::fmt;

/// Progress of an asynchronous form submission.
///
/// `Idle -> Submitting -> Succeeded | Failed`. A new submission may start
/// from any state except `Submitting`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Submission {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed(String),
}

impl Submission {
    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// The failure message of the last submission, if it failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Moves to `Submitting`. Returns `false` if a submission is already
    /// pending.
    pub(crate) fn begin(&mut self) -> bool {
        if self.is_submitting() {
            return false;
        }
        *self = Self::Submitting;
        true
    }

    pub(crate) fn finish<E: fmt::Display>(
        &mut self,
        result: Result<(), E>,
    ) {
        *self = match result {
            Ok(()) => Self::Succeeded,
            Err(e) => Self::Failed(e.to_string()),
        };
    }
}

impl fmt::Display for Submission {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Submitting => write!(f, "submitting"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}
