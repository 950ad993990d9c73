mod lexer;
mod token;

pub use lexer::{Lexer, Span};
pub use token::Token;
