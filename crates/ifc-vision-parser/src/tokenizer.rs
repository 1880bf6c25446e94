// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP parameter tokenizer using nom combinators
//!
//! Decodes the parenthesised parameter lists found in entity instances and
//! header records.

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{opt, recognize},
    multi::separated_list0,
    sequence::{delimited, pair},
    IResult, Parser,
};
use std::borrow::Cow;

/// Raw STEP parameter
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    /// Entity reference (#123)
    EntityRef(u32),
    /// String value, still escaped ('' for ')
    String(&'a str),
    Integer(i64),
    Float(f64),
    /// Enumeration (.VALUE.)
    Enum(&'a str),
    List(Vec<Token<'a>>),
    /// Typed value like IFCLABEL('text')
    Typed(&'a str, Vec<Token<'a>>),
    /// Null value ($)
    Null,
    /// Derived value (*)
    Derived,
}

impl<'a> Token<'a> {
    /// Unescaped string content
    pub fn as_str(&self) -> Option<Cow<'a, str>> {
        match self {
            Token::String(s) if s.contains("''") => Some(Cow::Owned(s.replace("''", "'"))),
            Token::String(s) => Some(Cow::Borrowed(*s)),
            Token::Typed(_, args) if args.len() == 1 => args[0].as_str(),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&'a str> {
        match self {
            Token::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Token::Float(f) => Some(*f),
            Token::Integer(i) => Some(*i as f64),
            Token::Typed(_, args) if args.len() == 1 => args[0].as_float(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Token<'a>]> {
        match self {
            Token::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Token::Null)
    }
}

fn ws(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    Ok((input, ()))
}

fn entity_ref(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('#')(input)?;
    let (input, digits) = take_while1(|c: char| c.is_ascii_digit())(input)?;
    let id = lexical_core::parse::<u32>(digits.as_bytes()).unwrap_or(0);
    Ok((input, Token::EntityRef(id)))
}

fn step_string(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('\'')(input)?;

    let bytes = input.as_bytes();
    let mut end = 0;
    while end < bytes.len() {
        if bytes[end] == b'\'' {
            if end + 1 < bytes.len() && bytes[end + 1] == b'\'' {
                end += 2;
                continue;
            }
            return Ok((&input[end + 1..], Token::String(&input[..end])));
        }
        end += 1;
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

fn number(input: &str) -> IResult<&str, Token<'_>> {
    let (input, text) = recognize((
        opt(alt((char('-'), char('+')))),
        take_while1(|c: char| c.is_ascii_digit()),
        opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt((
            alt((char('e'), char('E'))),
            opt(alt((char('+'), char('-')))),
            take_while1(|c: char| c.is_ascii_digit()),
        )),
    ))
    .parse(input)?;

    let token = if text.contains(['.', 'e', 'E']) {
        Token::Float(lexical_core::parse(text.as_bytes()).unwrap_or(0.0))
    } else {
        Token::Integer(lexical_core::parse(text.as_bytes()).unwrap_or(0))
    };
    Ok((input, token))
}

fn enumeration(input: &str) -> IResult<&str, Token<'_>> {
    let (input, name) = delimited(
        char('.'),
        take_while1(|c: char| c.is_alphanumeric() || c == '_'),
        char('.'),
    )
    .parse(input)?;
    Ok((input, Token::Enum(name)))
}

fn null_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('$')(input)?;
    Ok((input, Token::Null))
}

fn derived_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('*')(input)?;
    Ok((input, Token::Derived))
}

fn parameters(input: &str) -> IResult<&str, Vec<Token<'_>>> {
    delimited(
        pair(char('('), ws),
        separated_list0((ws, char(','), ws), token),
        pair(ws, char(')')),
    )
    .parse(input)
}

fn list(input: &str) -> IResult<&str, Token<'_>> {
    let (input, items) = parameters(input)?;
    Ok((input, Token::List(items)))
}

fn typed_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, type_name) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, _) = ws(input)?;
    let (input, args) = parameters(input)?;
    Ok((input, Token::Typed(type_name, args)))
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        entity_ref,
        step_string,
        null_value,
        derived_value,
        enumeration,
        number,
        list,
        typed_value,
    ))
    .parse(input)
}

/// Parse a parenthesised parameter list such as `('a',$,#3)`
///
/// Trailing content after the closing parenthesis is ignored.
pub fn parse_parameters(input: &str) -> Result<Vec<Token<'_>>, String> {
    let input = input.trim_start();
    parameters(input)
        .map(|(_, tokens)| tokens)
        .map_err(|e| format!("Failed to parse parameters: {:?}", e))
}

/// Parse the parameters of an entity instance `#12=IFCWALL(...);`
pub fn parse_instance(input: &str) -> Result<Vec<Token<'_>>, String> {
    let open = input
        .find('(')
        .ok_or_else(|| "Expected parameter list".to_string())?;
    parse_parameters(&input[open..])
}
