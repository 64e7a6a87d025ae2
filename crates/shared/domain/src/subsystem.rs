use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Identity of one independently startable unit of bootstrap work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubsystemId(Cow<'static, str>);

impl SubsystemId {
    pub const COMPATIBILITY: Self = Self::from_static("compatibility");
    pub const LOGGING: Self = Self::from_static("logging");
    pub const MODE: Self = Self::from_static("mode");
    pub const SETTINGS: Self = Self::from_static("settings");
    pub const QUOTA: Self = Self::from_static("quota");
    pub const CAPABILITIES: Self = Self::from_static("capabilities");
    pub const ASR_LANGUAGES: Self = Self::from_static("asr-languages");
    pub const MAUS_LANGUAGES: Self = Self::from_static("maus-languages");

    #[must_use]
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for SubsystemId {
    fn from(id: &'static str) -> Self {
        Self::from_static(id)
    }
}

impl From<String> for SubsystemId {
    fn from(id: String) -> Self {
        Self(Cow::Owned(id))
    }
}

impl fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a subsystem flag. Both `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "camelCase")]
pub enum FlagState {
    #[default]
    Pending,
    Succeeded,
    Failed(String),
}

impl FlagState {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    #[must_use]
    pub const fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsystemFlag {
    pub id: SubsystemId,
    pub required: bool,
    pub state: FlagState,
}

impl SubsystemFlag {
    #[must_use]
    pub const fn pending(id: SubsystemId, required: bool) -> Self {
        Self { id, required, state: FlagState::Pending }
    }

    /// A failed optional subsystem degrades the application without blocking it.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        !self.required && matches!(self.state, FlagState::Failed(_))
    }
}

/// How the portal is operated for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    Online,
    Local,
}

impl std::str::FromStr for AppMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "local" => Ok(Self::Local),
            other => Err(format!("unknown application mode '{other}'")),
        }
    }
}
