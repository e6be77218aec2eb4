//! USSD session handling.
//!
//! A session carries no server-side state. Every request holds the full input
//! history and the position in the menu tree is rebuilt from it each time.

pub mod machine;
pub mod menus;
pub mod path;
pub mod render;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Wire marker for a reply that expects another input.
pub const CONTINUE_MARKER: &str = "CON ";
/// Wire marker for a reply that ends the session.
pub const END_MARKER: &str = "END ";

/// Callback parameters as sent by the gateway.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UssdRequest {
    pub session_id: String,
    pub service_code: String,
    pub phone_number: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UssdReply {
    Continue(String),
    End(String),
}

impl UssdReply {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End(_))
    }

    pub fn body(&self) -> &str {
        match self {
            Self::Continue(body) | Self::End(body) => body,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Continue(_) => "continue",
            Self::End(_) => "end",
        }
    }

    /// Marker plus body, exactly as the gateway expects it.
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for UssdReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue(body) => write!(f, "{CONTINUE_MARKER}{body}"),
            Self::End(body) => write!(f, "{END_MARKER}{body}"),
        }
    }
}
