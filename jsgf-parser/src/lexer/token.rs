use logos::Logos;

/// Unescapes the characters the tag compiler escapes: `\{`, `\}` and `\\`.
fn unescape_tag(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                result.push(escaped);
            }
        } else {
            result.push(c);
        }
    }
    result.trim().to_string()
}

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\f]+")]
pub enum Token {
    // Comments (skipped)
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"/\*([^*]|\*[^/])*\*/", logos::skip)]
    Comment,

    // Statements end at a semicolon or a line break, interchangeably.
    #[token("\n")]
    Newline,

    #[token(";")]
    Semicolon,

    // Keywords
    #[token("#JSGF")]
    HeaderStart,

    #[token("grammar")]
    GrammarKw,

    #[token("import")]
    ImportKw,

    #[token("public")]
    PublicKw,

    // Delimiters
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("<")]
    LAngle,

    #[token(">")]
    RAngle,

    // Operators
    #[token("|")]
    Pipe,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("=")]
    Equals,

    // Alternative weights: /0.5/
    #[regex(r"/(\d+\.\d*|\.\d+|\d+)/", |lex| {
        let s = lex.slice();
        s[1..s.len()-1].parse::<f64>().ok()
    })]
    Weight(Option<f64>),

    // Brace-delimited tags with escape handling
    #[regex(r"\{([^}\\]|\\.)*\}", |lex| unescape_tag(lex.slice()))]
    Tag(String),

    // Words: literal tokens, rule and grammar names
    #[regex(r"[^ \t\r\n\f()\[\]<>{}|*+;=/#]+", |lex| lex.slice().to_string())]
    Word(String),
}

impl Token {
    /// Keywords double as ordinary words inside rule expansions.
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Token::Word(w) => Some(w),
            Token::GrammarKw => Some("grammar"),
            Token::ImportKw => Some("import"),
            Token::PublicKw => Some("public"),
            _ => None,
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self, Token::Semicolon | Token::Newline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_definition_tokens() {
        let input = "public <greet> = hello world;";
        let tokens: Vec<Token> = Token::lexer(input).map(|t| t.unwrap()).collect();
        assert_eq!(
            tokens,
            vec![
                Token::PublicKw,
                Token::LAngle,
                Token::Word("greet".to_string()),
                Token::RAngle,
                Token::Equals,
                Token::Word("hello".to_string()),
                Token::Word("world".to_string()),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_weights_and_tags() {
        let input = "/0.2/ yes { affirm } | /0.8/ no";
        let tokens: Vec<Token> = Token::lexer(input).map(|t| t.unwrap()).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Weight(Some(0.2)),
                Token::Word("yes".to_string()),
                Token::Tag("affirm".to_string()),
                Token::Pipe,
                Token::Weight(Some(0.8)),
                Token::Word("no".to_string()),
            ]
        );
    }

    #[test]
    fn test_tag_escapes() {
        let input = r"{ open \{brace\} }";
        let mut lex = Token::lexer(input);
        assert_eq!(
            lex.next(),
            Some(Ok(Token::Tag("open {brace}".to_string())))
        );
    }

    #[test]
    fn test_comments_skipped() {
        let input = "// line comment\nhello /* block */ world";
        let tokens: Vec<Token> = Token::lexer(input).map(|t| t.unwrap()).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Newline,
                Token::Word("hello".to_string()),
                Token::Word("world".to_string()),
            ]
        );
    }

    #[test]
    fn test_header_line() {
        let input = "#JSGF V1.0 UTF-8 en;";
        let tokens: Vec<Token> = Token::lexer(input).map(|t| t.unwrap()).collect();
        assert_eq!(
            tokens,
            vec![
                Token::HeaderStart,
                Token::Word("V1.0".to_string()),
                Token::Word("UTF-8".to_string()),
                Token::Word("en".to_string()),
                Token::Semicolon,
            ]
        );
    }
}
