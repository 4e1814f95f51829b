//! Request extractors

pub mod session;

pub use session::{ApiError, ResultIndex, SessionId};
