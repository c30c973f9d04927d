pub mod database;
pub mod repository;

pub use database::PgRepository;
pub use repository::QuestionRepository;
