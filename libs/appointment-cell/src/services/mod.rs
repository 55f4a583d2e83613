pub mod booking;
pub mod consistency;
pub mod ledger;
pub mod lifecycle;
pub mod validation;

pub use booking::BookingEngine;
pub use consistency::ConsistencyService;
pub use ledger::LedgerService;
