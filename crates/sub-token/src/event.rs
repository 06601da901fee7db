use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use sub_core::{u128_str, Address};

/// Events emitted by both token contracts. Indexed by the chain per
/// contract address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum TokenEvent {
    /// Every balance change. Mint uses `from = 0x0`, burn uses `to = 0x0`.
    Transfer {
        from: Address,
        to: Address,
        #[serde(with = "u128_str")]
        value: u128,
    },
    Approval {
        owner: Address,
        spender: Address,
        #[serde(with = "u128_str")]
        value: u128,
    },
}

impl TokenEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TokenEvent::Transfer { .. } => EventKind::Transfer,
            TokenEvent::Approval { .. } => EventKind::Approval,
        }
    }

    pub fn value(&self) -> u128 {
        match self {
            TokenEvent::Transfer { value, .. } | TokenEvent::Approval { value, .. } => *value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Transfer,
    Approval,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Transfer => f.write_str("Transfer"),
            EventKind::Approval => f.write_str("Approval"),
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "transfer" => Ok(EventKind::Transfer),
            "approval" => Ok(EventKind::Approval),
            other => Err(format!("unknown event kind '{}'", other)),
        }
    }
}
