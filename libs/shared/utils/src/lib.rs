pub mod clock;
pub mod poll;
pub mod test_utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use poll::{PollOutcome, Poller};
