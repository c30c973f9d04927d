pub mod category;
pub mod loaders;
pub mod question;

pub use category::{default_categories, Category, NewCategory};
pub use loaders::load_categories_toml;
pub use question::{Difficulty, QuestionRecord, UserScore, DEFAULT_SCORE};
