pub mod poll;

pub use poll::{poll_until, PollConfig};
