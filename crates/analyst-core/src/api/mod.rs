//! Clients for market data and exchange company lists

pub mod twse;
pub mod yahoo;

pub use twse::TwseCompanySource;
pub use yahoo::YahooFinanceClient;
