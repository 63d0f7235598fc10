//! Postgres persistence for the statement registry.
//!
//! Reference data (sectors, countries, companies, users, snapshots) follows the
//! model-with-queries style; statements go through [`StatementStore`], which
//! carries the link-check policy it was built with.

pub mod companies;
pub mod reference;
pub mod search;
pub mod snapshots;
pub mod statements;
pub mod users;

pub use companies::Company;
pub use reference::{Country, Sector};
pub use search::{Page, SearchCriteria};
pub use snapshots::{Attachment, Snapshot};
pub use statements::StatementStore;
pub use users::User;

/// Schema migrations shared by the server, the CLI and the integration tests.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
