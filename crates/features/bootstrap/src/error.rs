use portal_domain::subsystem::SubsystemId;
use std::borrow::Cow;

/// Errors raised while assembling or starting a bootstrap session.
///
/// The coordinator itself never fails; these only cover misuse of the API.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Two launchers were registered under the same id.
    #[error("Duplicate subsystem: {id}")]
    DuplicateSubsystem { id: SubsystemId },

    /// An id was referenced that no launcher provides.
    #[error("Unknown subsystem{}: {id}", format_context(.context))]
    UnknownSubsystem { id: SubsystemId, context: Option<Cow<'static, str>> },

    /// Launchers depend on base settings but no `settings` launcher is registered.
    #[error("Missing settings launcher: {message}")]
    MissingSettings { message: Cow<'static, str> },

    /// A launcher was registered in a stage it cannot run in.
    #[error("Invalid stage for {id}: {message}")]
    InvalidStage { id: SubsystemId, message: Cow<'static, str> },

    /// The call requires a Tokio runtime context.
    #[error("No async runtime{}: {message}", format_context(.context))]
    NoRuntime { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
