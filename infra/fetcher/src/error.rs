use std::borrow::Cow;

/// Errors produced while retrieving or normalizing external data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Network or HTTP level failure.
    #[error("Transport error{}: {message}", format_context(.context))]
    Transport { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The response did not have the expected shape.
    #[error("Parse error{}: {message}", format_context(.context))]
    Parse { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A required upstream value (e.g. a feed URL) is absent from the base settings.
    #[error("Config missing{}: {message}", format_context(.context))]
    ConfigMissing { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl FetchError {
    pub fn transport(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Transport { message: message.into(), context: None }
    }

    pub fn parse(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Parse { message: message.into(), context: None }
    }

    pub fn config_missing(message: impl Into<Cow<'static, str>>) -> Self {
        Self::ConfigMissing { message: message.into(), context: None }
    }

    /// Attaches (or replaces) the context shown in parentheses.
    #[must_use]
    pub fn context(mut self, value: impl Into<Cow<'static, str>>) -> Self {
        match &mut self {
            Self::Transport { context, .. }
            | Self::Parse { context, .. }
            | Self::ConfigMissing { context, .. } => *context = Some(value.into()),
        }
        self
    }

    #[must_use]
    pub const fn is_config_missing(&self) -> bool {
        matches!(self, Self::ConfigMissing { .. })
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
