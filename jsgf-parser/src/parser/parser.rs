//! Recursive-descent parser for JSGF grammars, rules and expansions.
//!
//! Operator precedence, tightest first: rule references and quoted tokens;
//! `()` and `[]` grouping; the unary `*`, `+` and tag suffixes, which bind
//! to the immediately preceding atom; sequences; `|` alternative sets.
//! Semicolons and newlines terminate statements interchangeably.

use jsgf_core::{Expansion, Grammar, Import, ParseError, Rule};

use crate::lexer::{Lexer, Span, Token};
use crate::Error;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Option<(Token, Span)>,
    peek: Option<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        let peek = lexer.peek();
        Ok(Self {
            lexer,
            current,
            peek,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = self.lexer.next_token()?;
        self.peek = self.lexer.peek();
        Ok(())
    }

    fn error(&self, production: &'static str) -> ParseError {
        match &self.current {
            Some((_, span)) => ParseError {
                offset: span.start,
                line: self.lexer.line_at(span.start),
                production,
                found: self.lexer.input[span.clone()].to_string(),
            },
            None => ParseError {
                offset: self.lexer.input.len(),
                line: self.lexer.line_at(self.lexer.input.len()),
                production,
                found: "end of input".to_string(),
            },
        }
    }

    fn current_token(&self) -> Option<&Token> {
        self.current.as_ref().map(|(t, _)| t)
    }

    fn current_word(&self) -> Option<&str> {
        self.current_token().and_then(Token::as_word)
    }

    fn expect(&mut self, expected: Token, production: &'static str) -> Result<(), ParseError> {
        if self.current_token() == Some(&expected) {
            self.advance()
        } else {
            Err(self.error(production))
        }
    }

    fn at_end(&self) -> bool {
        self.current.is_none()
    }

    fn skip_terminators(&mut self) -> Result<(), ParseError> {
        while self.current_token().is_some_and(Token::is_terminator) {
            self.advance()?;
        }
        Ok(())
    }

    /// A statement ends at a semicolon, a newline, or the end of input.
    fn statement_end(&mut self, production: &'static str) -> Result<(), ParseError> {
        match self.current_token() {
            None => Ok(()),
            Some(t) if t.is_terminator() => self.skip_terminators(),
            Some(_) => Err(self.error(production)),
        }
    }

    /// Parses a whole grammar document: optional header, grammar
    /// declaration, imports, then rule definitions.
    pub fn parse_grammar_document(&mut self, require_header: bool) -> Result<Grammar, Error> {
        self.skip_terminators()?;

        let mut header = None;
        if self.current_token() == Some(&Token::HeaderStart) {
            header = Some(self.parse_header()?);
        } else if require_header {
            return Err(self.error("#JSGF header").into());
        }
        self.skip_terminators()?;

        self.expect(Token::GrammarKw, "grammar declaration")?;
        let name = self
            .current_word()
            .ok_or_else(|| self.error("grammar name"))?
            .to_string();
        self.advance()?;
        self.statement_end("grammar declaration")?;

        let mut grammar = Grammar::new(name)?;
        if let Some((version, charset, language)) = header {
            grammar.jsgf_version = version;
            if let Some(charset) = charset {
                grammar.charset_name = charset;
            }
            if let Some(language) = language {
                grammar.language_name = language;
            }
        }

        loop {
            self.skip_terminators()?;
            if self.at_end() {
                break;
            }
            if self.current_token() == Some(&Token::ImportKw) {
                let import = self.parse_import_statement()?;
                grammar.add_import(import);
            } else {
                let rule = self.parse_rule_definition()?;
                grammar.add_rule(rule)?;
            }
        }

        if grammar.rules().is_empty() {
            return Err(self.error("rule definition").into());
        }
        Ok(grammar)
    }

    /// Parses `#JSGF V<version> [charset [language]]`, returning the three
    /// header fields. Charset and language are optional.
    fn parse_header(&mut self) -> Result<(String, Option<String>, Option<String>), ParseError> {
        self.expect(Token::HeaderStart, "#JSGF header")?;
        let version = match self.current_word() {
            Some(word) if word.starts_with(['V', 'v']) && word.len() > 1 => {
                word[1..].to_string()
            }
            _ => return Err(self.error("JSGF version")),
        };
        self.advance()?;

        let mut charset = None;
        let mut language = None;
        if let Some(word) = self.current_word() {
            charset = Some(word.to_string());
            self.advance()?;
            if let Some(word) = self.current_word() {
                language = Some(word.to_string());
                self.advance()?;
            }
        }
        self.statement_end("grammar header")?;
        Ok((version, charset, language))
    }

    fn parse_import_statement(&mut self) -> Result<Import, Error> {
        self.expect(Token::ImportKw, "import statement")?;
        self.expect(Token::LAngle, "import name")?;
        let mut name = self
            .current_word()
            .ok_or_else(|| self.error("import name"))?
            .to_string();
        self.advance()?;
        // Wildcard imports lex as a dot-terminated word followed by `*`.
        if name.ends_with('.') && self.current_token() == Some(&Token::Star) {
            name.push('*');
            self.advance()?;
        }
        self.expect(Token::RAngle, "import name")?;
        self.statement_end("import statement")?;
        Ok(Import::new(name)?)
    }

    /// Parses `[public] <name> = expansion;`.
    pub fn parse_rule_definition(&mut self) -> Result<Rule, Error> {
        let visible = if self.current_token() == Some(&Token::PublicKw) {
            self.advance()?;
            true
        } else {
            false
        };
        self.expect(Token::LAngle, "rule name")?;
        let name = self
            .current_word()
            .ok_or_else(|| self.error("rule name"))?
            .to_string();
        self.advance()?;
        self.expect(Token::RAngle, "rule name")?;
        self.expect(Token::Equals, "rule definition")?;
        let expansion = self.parse_alternation()?;
        self.statement_end("rule definition")?;
        Ok(Rule::new(name, visible, expansion)?)
    }

    /// Parses a bare expansion up to the next statement terminator.
    pub fn parse_expansion_text(&mut self) -> Result<Expansion, Error> {
        let expansion = self.parse_alternation()?;
        self.statement_end("expansion")?;
        if !self.at_end() {
            return Err(self.error("end of input").into());
        }
        Ok(expansion)
    }

    pub fn ensure_consumed(&mut self) -> Result<(), ParseError> {
        self.skip_terminators()?;
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error("end of input"))
        }
    }

    fn parse_alternation(&mut self) -> Result<Expansion, Error> {
        let mut weights: Vec<Option<f64>> = Vec::new();
        let mut alternatives: Vec<Expansion> = Vec::new();
        loop {
            let weight = match self.current_token() {
                Some(Token::Weight(w)) => {
                    let w = (*w).ok_or_else(|| self.error("alternative weight"))?;
                    self.advance()?;
                    Some(w)
                }
                _ => None,
            };
            weights.push(weight);
            alternatives.push(self.parse_sequence()?);
            if self.current_token() == Some(&Token::Pipe) {
                self.advance()?;
            } else {
                break;
            }
        }

        if alternatives.len() == 1 && weights[0].is_none() {
            return Ok(alternatives.pop().expect("one alternative"));
        }
        if weights.iter().all(Option::is_some) {
            let weighted = weights
                .into_iter()
                .map(|w| w.expect("all weights present"))
                .zip(alternatives)
                .collect();
            Ok(Expansion::weighted_alternatives(weighted))
        } else if weights.iter().all(Option::is_none) {
            Ok(Expansion::alternatives(alternatives))
        } else {
            // Either every alternative is weighted or none is.
            Err(self.error("alternative weight").into())
        }
    }

    fn parse_sequence(&mut self) -> Result<Expansion, Error> {
        let mut items = Vec::new();
        while self.starts_atom() {
            items.push(self.parse_postfix()?);
        }
        match items.len() {
            0 => Err(self.error("expansion").into()),
            1 => Ok(items.pop().expect("one item")),
            _ => Ok(Expansion::sequence(items)),
        }
    }

    fn starts_atom(&self) -> bool {
        match self.current_token() {
            Some(Token::LParen | Token::LBracket | Token::LAngle) => true,
            Some(token) => token.as_word().is_some(),
            None => false,
        }
    }

    /// An atom followed by any run of `*`, `+` and tag suffixes, each
    /// binding to the expansion built so far.
    fn parse_postfix(&mut self) -> Result<Expansion, Error> {
        let mut expansion = self.parse_atom()?;
        loop {
            match self.current_token() {
                Some(Token::Star) => {
                    self.advance()?;
                    expansion = Expansion::kleene_star(expansion);
                }
                Some(Token::Plus) => {
                    self.advance()?;
                    expansion = Expansion::repeat(expansion);
                }
                Some(Token::Tag(tag)) => {
                    let tag = tag.clone();
                    self.advance()?;
                    let root = expansion.root();
                    expansion.add_tag(root, tag);
                }
                _ => break,
            }
        }
        Ok(expansion)
    }

    fn parse_atom(&mut self) -> Result<Expansion, Error> {
        match self.current_token() {
            Some(Token::LAngle) => {
                self.advance()?;
                let name = self
                    .current_word()
                    .ok_or_else(|| self.error("rule reference"))?
                    .to_string();
                self.advance()?;
                self.expect(Token::RAngle, "rule reference")?;
                Ok(match name.as_str() {
                    "NULL" => Expansion::null_ref(),
                    "VOID" => Expansion::void_ref(),
                    "DICTATION" => Expansion::dictation(),
                    _ => Expansion::named_rule_ref(name),
                })
            }
            Some(Token::LParen) => {
                self.advance()?;
                let inner = self.parse_alternation()?;
                self.expect(Token::RParen, "required grouping")?;
                Ok(Expansion::required(vec![inner]))
            }
            Some(Token::LBracket) => {
                self.advance()?;
                let inner = self.parse_alternation()?;
                self.expect(Token::RBracket, "optional grouping")?;
                Ok(Expansion::optional(inner))
            }
            Some(token) if token.as_word().is_some() => self.parse_literal(),
            _ => Err(self.error("expansion atom").into()),
        }
    }

    /// Consecutive words merge into one literal, except that a word about
    /// to take a `*` or `+` suffix starts its own atom: the unary operators
    /// bind to a single word, never a whole run.
    fn parse_literal(&mut self) -> Result<Expansion, Error> {
        let mut words = vec![self
            .current_word()
            .expect("caller checked for a word")
            .to_string()];
        self.advance()?;
        while let Some(word) = self.current_word() {
            if matches!(self.peek, Some(Token::Star | Token::Plus)) {
                break;
            }
            words.push(word.to_string());
            self.advance()?;
        }
        Ok(Expansion::literal(words.join(" ")))
    }
}
