pub mod adjustment;
pub mod calculator;
pub mod splitter;
pub mod votes;

pub use adjustment::{Adjustment, AdjustmentParseError};
pub use calculator::calculate_split;
pub use splitter::{SplitError, SplitService, VoteError, VoteInput};
pub use votes::{aggregate_votes, item_ids_at_positions, parse_vote_message};
