pub mod bill;
pub mod claim;
pub mod result;

pub use bill::{Bill, BillId, BillItem, ItemId, ParsedBill, ParsedBillItem};
pub use claim::{Claim, ItemVote, User, UserId, UserShare};
pub use result::{
    BillItemDetails, BillSplit, BillWithClaims, ItemWithProportion, SplitResult, UserSelection,
};
