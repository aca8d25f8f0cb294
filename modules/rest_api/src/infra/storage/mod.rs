pub mod entity;
pub mod mapper;
pub mod repo;

pub use repo::PgLedgerRepository;
