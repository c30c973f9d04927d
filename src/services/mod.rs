pub mod answer_randomizer;
pub mod block_parser;
pub mod llm_service;
pub mod prompt;

pub use answer_randomizer::{place, place_with, Placement};
pub use block_parser::{BlockParser, BlockRejection, CandidateFields, ParseOutcome, RejectedBlock};
pub use llm_service::LlmService;
pub use prompt::{format_existing_questions, PromptVariables, QuestionModel};
