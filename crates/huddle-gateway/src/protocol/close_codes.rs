//! Application close codes in the 4000 range, sent when the gateway ends a
//! connection on its own initiative.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseCode {
    /// The client sent `logout`
    LoggedOut = 4000,
    /// No inbound traffic within the idle timeout
    SessionTimeout = 4009,
}

impl CloseCode {
    /// Parse a code received in a close frame
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            4000 => Some(Self::LoggedOut),
            4009 => Some(Self::SessionTimeout),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Reason text carried in the close frame
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::LoggedOut => "Logged out",
            Self::SessionTimeout => "Session timed out",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_u16())
    }
}
