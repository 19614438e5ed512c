pub mod db;
pub mod session;

pub use db::DbAdapter;
pub use session::{DatabaseSession, SessionSettings};
