//! Company directory: records, lookup index, persistence and refresh

pub mod handle;
pub mod index;
pub mod record;
pub mod source;
pub mod store;

pub use handle::{DirectoryHandle, RefreshError, RefreshReport};
pub use index::{CompanyDirectory, DirectoryMatch, MatchKind, normalize};
pub use record::CompanyRecord;
pub use source::{CompanySource, ListedCompany};
pub use store::DirectoryStore;
