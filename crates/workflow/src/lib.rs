//! Per-session workflow coordination: the modal/staging session store and
//! the dispatcher that drains staged actions into REST calls.
//!
//! Session state is an explicit context object handed to handlers, not
//! ambient global storage; one logical thread of control mutates it per
//! session, so there is no locking here.

pub mod dispatcher;
pub mod session;

pub use dispatcher::{ActionOutcome, Api, Dispatcher};
pub use session::{ModalState, SessionStore, StatusUpdateRequest};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
