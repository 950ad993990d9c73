use logos::{Lexer as LogosLexer, Logos};

use jsgf_core::ParseError;

use super::Token;

pub type Span = std::ops::Range<usize>;

/// Token stream over JSGF source text, tracking byte offsets for error
/// reporting.
pub struct Lexer<'a> {
    inner: LogosLexer<'a, Token>,
    pub input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: Token::lexer(input),
            input,
        }
    }

    pub fn next_token(&mut self) -> Result<Option<(Token, Span)>, ParseError> {
        match self.inner.next() {
            Some(Ok(token)) => Ok(Some((token, self.inner.span()))),
            Some(Err(_)) => {
                let span = self.inner.span();
                Err(ParseError {
                    offset: span.start,
                    line: self.line_at(span.start),
                    production: "token",
                    found: self.input[span.start..span.end].to_string(),
                })
            }
            None => Ok(None),
        }
    }

    pub fn peek(&self) -> Option<Token> {
        self.inner.clone().next().and_then(|r| r.ok())
    }

    /// 1-based line number of a byte offset.
    pub fn line_at(&self, offset: usize) -> usize {
        self.input[..offset.min(self.input.len())]
            .chars()
            .filter(|&c| c == '\n')
            .count()
            + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_and_lines() {
        let mut lexer = Lexer::new("hello\n<rule>");
        let (token, span) = lexer.next_token().unwrap().unwrap();
        assert_eq!(token, Token::Word("hello".to_string()));
        assert_eq!(span, 0..5);
        assert_eq!(lexer.line_at(span.start), 1);

        let (token, _) = lexer.next_token().unwrap().unwrap();
        assert_eq!(token, Token::Newline);

        let (token, span) = lexer.next_token().unwrap().unwrap();
        assert_eq!(token, Token::LAngle);
        assert_eq!(lexer.line_at(span.start), 2);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new("a b");
        assert_eq!(lexer.peek(), Some(Token::Word("a".to_string())));
        let (token, _) = lexer.next_token().unwrap().unwrap();
        assert_eq!(token, Token::Word("a".to_string()));
        assert_eq!(lexer.peek(), Some(Token::Word("b".to_string())));
    }
}
