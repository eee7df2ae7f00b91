pub mod bot;
pub mod change;
pub mod links;
pub mod truncate;

pub use bot::BotBurstAggregator;
pub use change::{reject_control_characters, ChangeFormatter, FormatError, FormatOutcome};
pub use links::LinkBuilder;
pub use truncate::truncate;
