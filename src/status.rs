use serde::Serialize;

/// Коды статуса миньпула, как их возвращает `getStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum StatusCode {
    Initialized = 0,
    Prelaunch = 1,
    Staking = 2,
    LoggedOut = 3,
    Withdrawn = 4,
    Closed = 5,
    TimedOut = 6,
}

impl StatusCode {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Initialized),
            1 => Some(Self::Prelaunch),
            2 => Some(Self::Staking),
            3 => Some(Self::LoggedOut),
            4 => Some(Self::Withdrawn),
            5 => Some(Self::Closed),
            6 => Some(Self::TimedOut),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Prelaunch => "pre-launch",
            Self::Staking => "staking",
            Self::LoggedOut => "logged out",
            Self::Withdrawn => "withdrawn",
            Self::Closed => "closed",
            Self::TimedOut => "timed out",
        }
    }
}

/// Текстовая метка статуса; для неизвестных кодов "unknown"
pub fn status_label(code: u8) -> &'static str {
    StatusCode::from_code(code).map_or("unknown", StatusCode::label)
}
