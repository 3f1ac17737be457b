#![doc(test(attr(deny(warnings))))]

//! Cardledger Core keeps a personal cash ledger and the credit cards settled
//! from it: monthly statements, installment purchases and imported history.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with the default filter and emits a startup log.
pub fn init() {
    init_with_filter(utils::DEFAULT_LOG_FILTER);
}

/// Like [`init`], with the fallback directive used when `RUST_LOG` is unset.
pub fn init_with_filter(filter: &str) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(filter);
        tracing::info!("Cardledger Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
