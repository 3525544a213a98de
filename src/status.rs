//! Last-operation status, kept per thread.
//!
//! Text-surface operations report failures out of band: a failing call stores
//! its code and message here, a successful one clears the slot. The slot is
//! thread-local, so a thread only ever observes its own calls.

use std::cell::RefCell;

use tracing::error;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Status {
    code: u32,
    message: String,
}

thread_local! {
    static LAST_STATUS: RefCell<Option<Status>> = const { RefCell::new(None) };
}

/// Records a failed operation.
pub(crate) fn set_error(err: &Error) {
    error!("{err}");
    LAST_STATUS.with(|status| {
        *status.borrow_mut() = Some(Status {
            code: err.code(),
            message: err.to_string(),
        })
    });
}

/// Records a successful operation.
pub(crate) fn clear() {
    LAST_STATUS.with(|status| *status.borrow_mut() = None);
}

/// Stores the outcome of an operation and converts it for the text surface.
pub(crate) fn report<T>(result: Result<T, Error>) -> Option<T> {
    match result {
        Ok(value) => {
            clear();
            Some(value)
        }
        Err(err) => {
            set_error(&err);
            None
        }
    }
}

/// Code of the last failed operation on this thread, `0` after a success.
pub fn last_error_code() -> u32 {
    LAST_STATUS.with(|status| status.borrow().as_ref().map_or(0, |status| status.code))
}

/// Message of the last failed operation on this thread.
pub fn last_error_message() -> Option<String> {
    LAST_STATUS.with(|status| status.borrow().as_ref().map(|status| status.message.clone()))
}
