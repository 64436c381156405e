pub mod resend;

pub use resend::{resend_events, ResendPolicy, ResendReport};
