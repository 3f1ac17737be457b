pub mod clock;
pub mod errors;
pub mod ledger_manager;
pub mod services;
pub mod utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::{BillingError, BillingResult, ErrorKind};
pub use ledger_manager::LedgerManager;
