//! Engine error classification
//!
//! | class       | recovery                                             |
//! |-------------|------------------------------------------------------|
//! | `Transport` | restart the engine's network pipeline                |
//! | `Media`     | swap audio codec on the second occurrence, recover   |
//! | `License`   | invoke the session's license-error callback          |
//! | `Fatal`     | destroy the adapter                                  |
//! | `Ignored`   | forward only                                         |

#[cfg(feature = "dash")]
use crate::engine::DashError;
#[cfg(feature = "hls")]
use crate::engine::{HlsErrorData, HlsErrorType};

/// DASH error code raised when license acquisition fails
pub const DASH_LICENSE_ERROR_CODE: i64 = 111;

/// String error raised by dash.js when a key session cannot be created
pub const DASH_KEY_SESSION_ERROR: &str = "key_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Transport,
    Media,
    License,
    Fatal,
    Ignored,
}

/// Result of classifying one engine error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub class: ErrorClass,
    /// When set the adapter survives even though the class would tear it down
    pub suppress_teardown: bool,
}

impl Classification {
    pub fn new(class: ErrorClass) -> Self {
        Self {
            class,
            suppress_teardown: false,
        }
    }

    pub fn surviving(class: ErrorClass) -> Self {
        Self {
            class,
            suppress_teardown: true,
        }
    }

    /// Whether the adapter must destroy itself after handling the error
    pub fn tears_down(&self) -> bool {
        !self.suppress_teardown && matches!(self.class, ErrorClass::License | ErrorClass::Fatal)
    }
}

/// Every dash.js error is terminal except the `"key_session"` license error.
///
/// Code 111 and `"key_session"` both report a license failure, but only
/// code 111 goes on to tear the adapter down.
#[cfg(feature = "dash")]
pub fn classify_dash(error: &DashError) -> Classification {
    match error {
        DashError::Named(name) if name == DASH_KEY_SESSION_ERROR => {
            Classification::surviving(ErrorClass::License)
        }
        DashError::Code { code, .. } if *code == DASH_LICENSE_ERROR_CODE => {
            Classification::new(ErrorClass::License)
        }
        _ => Classification::new(ErrorClass::Fatal),
    }
}

/// Only fatal hls.js errors trigger recovery
#[cfg(feature = "hls")]
pub fn classify_hls(error: &HlsErrorData) -> Classification {
    if !error.fatal {
        return Classification::new(ErrorClass::Ignored);
    }

    match error.error_type {
        HlsErrorType::Network => Classification::new(ErrorClass::Transport),
        HlsErrorType::Media => Classification::new(ErrorClass::Media),
        HlsErrorType::KeySystem => Classification::new(ErrorClass::License),
        HlsErrorType::Mux | HlsErrorType::Other(_) => Classification::new(ErrorClass::Fatal),
    }
}
