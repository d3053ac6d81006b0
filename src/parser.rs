use crate::command::Call;
use crate::error::ParseError;
use crate::lexer::{self, Token};
use log::debug;

/// Ordered stages as written left to right, joined by `|`.
///
/// Never empty: parsing rejects a line without a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    calls: Vec<Call>,
}

impl Pipeline {
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// One line of front-end input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// `NAME=value`; the value keeps its `$` references unexpanded.
    Assignment { name: String, value: String },
    Pipeline(Pipeline),
}

struct PipelineBuilder {
    tokens: Vec<Token>,
    pos: usize,
}

impl PipelineBuilder {
    fn from(tokens: Vec<Token>) -> Self {
        PipelineBuilder { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Parse a pipeline: command ('|' command)*
    fn build(mut self) -> Result<Pipeline, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::EmptyPipeline);
        }

        let mut calls = vec![self.parse_command(0)?];
        while let Some(Token::PipeOp) = self.peek() {
            self.consume();
            calls.push(self.parse_command(calls.len())?);
        }

        Ok(Pipeline { calls })
    }

    /// Parse a command: name followed by arguments, up to the next `|`.
    fn parse_command(&mut self, stage: usize) -> Result<Call, ParseError> {
        let mut words = Vec::new();
        while let Some(Token::Word(_)) = self.peek() {
            if let Some(Token::Word(word)) = self.consume() {
                words.push(word);
            }
        }

        let mut words = words.into_iter();
        let name = words.next().ok_or(ParseError::EmptyStage(stage))?;
        Ok(Call::new(name, words.collect()))
    }
}

/// Parse raw text into a pipeline. `$` references stay unexpanded.
pub fn parse(raw: &str) -> Result<Pipeline, ParseError> {
    let tokens = lexer::split_into_tokens(raw)?;
    let pipeline = PipelineBuilder::from(tokens).build()?;
    debug!("parsed {:?} into {} stage(s)", raw, pipeline.len());
    Ok(pipeline)
}

fn is_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a front-end line: either an assignment or a pipeline.
pub fn parse_line(raw: &str) -> Result<Line, ParseError> {
    let tokens = lexer::split_into_tokens(raw)?;
    if let [Token::Word(word)] = tokens.as_slice() {
        if let Some((name, value)) = word.split_once('=') {
            if is_variable_name(name) {
                return Ok(Line::Assignment {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }
    PipelineBuilder::from(tokens).build().map(Line::Pipeline)
}
