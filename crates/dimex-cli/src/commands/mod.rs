//! Command implementations.

pub mod chunk;
pub mod evaluate;
pub mod export;
pub mod extract;
pub mod prompt;

pub use self::chunk::execute_chunk;
pub use self::evaluate::execute_evaluate;
pub use self::export::execute_export;
pub use self::extract::execute_extract;
pub use self::prompt::execute_prompt;
