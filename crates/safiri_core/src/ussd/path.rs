//! Session path parsing.
//!
//! The gateway sends the whole input history as one `*`-separated string.
//! [`SessionPath::parse`] splits it verbatim; [`SessionPath::effective`]
//! replays the history so that the state machine only sees the entries the
//! user is still standing on.

use crate::settings::UssdSettings;
use crate::types::{TRACKING_MIN_LEN, TRACKING_PREFIX};

pub const SEPARATOR: char = '*';

/// "Navigate back one step", reserved at every menu.
pub const BACK: &str = "0";

pub const REQUEST_TRANSPORT: &str = "1";
pub const TRACK_ORDER: &str = "2";
pub const CONTACT: &str = "3";
pub const EXIT: &str = "0";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionPath<'a> {
    tokens: Vec<&'a str>,
}

impl<'a> SessionPath<'a> {
    /// Split on the separator. The empty string is the root menu.
    pub fn parse(text: &'a str) -> Self {
        if text.is_empty() {
            return Self { tokens: Vec::new() };
        }
        Self {
            tokens: text.split(SEPARATOR).collect(),
        }
    }

    pub fn tokens(&self) -> &[&'a str] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Replay the history and return the tokens that still define the
    /// current position, followed by the latest input.
    ///
    /// Only earlier entries are rewritten; the latest token is always kept
    /// as-is so the state machine can answer it (including a final `0`).
    /// An earlier `0` pops the entry before it. An earlier entry that can
    /// never be valid for its slot regardless of reference data (a
    /// non-numeric index, an out-of-bounds quantity, a malformed tracking
    /// code) was answered with an error banner at the same step, so it is
    /// dropped. Out-of-range numeric indices are kept: whether they are
    /// valid depends on live data and is judged by the state machine.
    pub fn effective(&self, settings: &UssdSettings) -> Vec<&'a str> {
        let Some((last, history)) = self.tokens.split_last() else {
            return Vec::new();
        };

        let mut stack: Vec<&'a str> = Vec::with_capacity(self.tokens.len());
        for &token in history {
            if token == BACK && !stack.is_empty() {
                stack.pop();
                continue;
            }
            if is_rejected_entry(&stack, token, settings) {
                continue;
            }
            stack.push(token);
        }
        stack.push(last);
        stack
    }
}

/// Data-independent rejection of `token` at the slot following `stack`.
fn is_rejected_entry(stack: &[&str], token: &str, settings: &UssdSettings) -> bool {
    match stack {
        [REQUEST_TRANSPORT] | [REQUEST_TRANSPORT, _, _] | [REQUEST_TRANSPORT, _, _, _] => {
            !is_index_shaped(token)
        }
        [REQUEST_TRANSPORT, _] => parse_quantity(token, settings).is_none(),
        [TRACK_ORDER] => !is_tracking_code_shaped(&normalize_tracking_code(token)),
        _ => false,
    }
}

fn is_index_shaped(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// 1-based menu position to a 0-based index into a list of `len` entries.
pub fn parse_index(token: &str, len: usize) -> Option<usize> {
    if !is_index_shaped(token) {
        return None;
    }
    let position: usize = token.parse().ok()?;
    (1..=len).contains(&position).then(|| position - 1)
}

/// Integer quantity within the configured bounds.
pub fn parse_quantity(token: &str, settings: &UssdSettings) -> Option<i32> {
    let quantity: i64 = token.parse().ok()?;
    let quantity = i32::try_from(quantity).ok()?;
    settings.quantity_in_bounds(quantity).then_some(quantity)
}

pub fn normalize_tracking_code(token: &str) -> String {
    token.trim().to_uppercase()
}

pub fn is_tracking_code_shaped(code: &str) -> bool {
    code.starts_with(TRACKING_PREFIX) && code.len() >= TRACKING_MIN_LEN
}
