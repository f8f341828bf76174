pub mod account;
pub mod chain;
pub mod ledger;

pub use account::{GuardianEntry, PioneerUser, Referral, User};
pub use chain::Chain;
pub use ledger::{AssetInfo, TvlLedger};
