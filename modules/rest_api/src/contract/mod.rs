pub mod model;

pub use model::{Account, Token, TokenType, TopicMessage};
