//! Parser for the index query language.
//!
//! Queries are whitespace/hyphen separated terms. Each term may carry:
//! - a `field:` qualifier restricting it to one indexed field,
//! - a leading `+` (required) or `-` (prohibited) presence marker,
//! - a trailing `^N` boost and/or `~N` edit distance,
//! - `*` wildcards.
//!
//! A backslash escapes the next character.

use super::index::Field;
use crate::error::QueryParseError;

/// Whether a clause must, may or must not match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Presence {
    #[default]
    Optional,
    Required,
    Prohibited,
}

/// One term of a parsed query.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Raw term text, not yet analyzed.
    pub term: String,
    /// `None` searches every field.
    pub field: Option<Field>,
    pub presence: Presence,
    pub boost: f64,
    pub edit_distance: u32,
}

impl Clause {
    fn new(term: String, field: Option<Field>, presence: Presence) -> Self {
        Self {
            term,
            field,
            presence,
            boost: 1.0,
            edit_distance: 0,
        }
    }

    pub fn has_wildcard(&self) -> bool {
        self.term.contains('*')
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Field(String),
    Term(String),
    Presence(char),
    Boost(String),
    EditDistance(String),
}

/// Splits a query into lexemes, tracking the char position each starts at.
fn lex(query: &str) -> Vec<(usize, Lexeme)> {
    let mut lexemes = vec![];
    let mut buffer = String::new();
    let mut buffer_start = 0;
    let mut chars = query.chars().enumerate().peekable();

    let flush = |buffer: &mut String, start: usize, lexemes: &mut Vec<(usize, Lexeme)>| {
        if !buffer.is_empty() {
            lexemes.push((start, Lexeme::Term(std::mem::take(buffer))));
        }
    };

    while let Some((position, c)) = chars.next() {
        if buffer.is_empty() {
            buffer_start = position;
        }

        match c {
            '\\' => {
                if let Some((_, escaped)) = chars.next() {
                    buffer.push(escaped);
                }
            }
            ':' => {
                lexemes.push((buffer_start, Lexeme::Field(std::mem::take(&mut buffer))));
            }
            '^' | '~' => {
                flush(&mut buffer, buffer_start, &mut lexemes);
                let mut value = String::new();
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_whitespace() || matches!(next, '^' | '~' | ':') {
                        break;
                    }
                    value.push(next);
                    chars.next();
                }
                let lexeme = if c == '^' {
                    Lexeme::Boost(value)
                } else {
                    Lexeme::EditDistance(value)
                };
                lexemes.push((position, lexeme));
            }
            '+' | '-' if buffer.is_empty() => {
                lexemes.push((position, Lexeme::Presence(c)));
            }
            c if c.is_whitespace() || c == '-' => {
                flush(&mut buffer, buffer_start, &mut lexemes);
            }
            c => buffer.push(c),
        }
    }
    flush(&mut buffer, buffer_start, &mut lexemes);

    lexemes
}

/// Parses a query string into clauses.
///
/// Fails on unknown `field:` qualifiers, modifiers with nothing attached, and
/// non-numeric boosts or edit distances.
pub fn parse_query(query: &str) -> Result<Vec<Clause>, QueryParseError> {
    let mut clauses: Vec<Clause> = vec![];
    let mut presence = Presence::Optional;
    let mut field: Option<Field> = None;
    // Boost and edit distance only attach to the clause directly before them.
    let mut can_modify = false;

    for (position, lexeme) in lex(query) {
        match lexeme {
            Lexeme::Presence(marker) => {
                presence = if marker == '+' {
                    Presence::Required
                } else {
                    Presence::Prohibited
                };
                can_modify = false;
            }
            Lexeme::Field(name) => {
                if field.is_some() {
                    return Err(QueryParseError::DanglingModifier {
                        modifier: ':',
                        expected: "a term",
                        position,
                    });
                }
                field = Some(name.parse().map_err(|_| QueryParseError::UnknownField {
                    field: name.clone(),
                    allowed: Field::ALL.map(|f| f.name()).join(", "),
                })?);
                can_modify = false;
            }
            Lexeme::Term(term) => {
                clauses.push(Clause::new(term, field.take(), presence));
                presence = Presence::Optional;
                can_modify = true;
            }
            Lexeme::Boost(value) => {
                let clause = modifiable(&mut clauses, can_modify, '^', position)?;
                let boost: f64 = parse_modifier('^', &value, position)?;
                if !boost.is_finite() || boost < 0.0 {
                    return Err(QueryParseError::NonNumericModifier {
                        modifier: '^',
                        value,
                    });
                }
                clause.boost = boost;
            }
            Lexeme::EditDistance(value) => {
                let clause = modifiable(&mut clauses, can_modify, '~', position)?;
                clause.edit_distance = parse_modifier('~', &value, position)?;
            }
        }
    }

    if presence != Presence::Optional {
        return Err(QueryParseError::DanglingModifier {
            modifier: if presence == Presence::Required { '+' } else { '-' },
            expected: "a term or field",
            position: query.chars().count(),
        });
    }
    if field.is_some() {
        return Err(QueryParseError::DanglingModifier {
            modifier: ':',
            expected: "a term",
            position: query.chars().count(),
        });
    }

    Ok(clauses)
}

/// The clause a `^`/`~` modifier attaches to.
fn modifiable(
    clauses: &mut [Clause],
    can_modify: bool,
    modifier: char,
    position: usize,
) -> Result<&mut Clause, QueryParseError> {
    match clauses.last_mut() {
        Some(clause) if can_modify => Ok(clause),
        _ => Err(QueryParseError::DanglingModifier {
            modifier,
            expected: "a term",
            position,
        }),
    }
}

fn parse_modifier<T: std::str::FromStr>(
    modifier: char,
    value: &str,
    position: usize,
) -> Result<T, QueryParseError> {
    if value.is_empty() {
        return Err(QueryParseError::DanglingModifier {
            modifier,
            expected: "a number",
            position,
        });
    }
    value
        .parse()
        .map_err(|_| QueryParseError::NonNumericModifier {
            modifier,
            value: value.to_string(),
        })
}
