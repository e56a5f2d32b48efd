//! Type expressions used in entity definitions.
//!
//! ```text
//! expr  := term ('|' term)*
//! term  := IDENT [ '[' expr (',' expr)* ']' | '(' IDENT ['.' IDENT] ')' ] ['?']
//! ```
//!
//! Builtins: `str`, `text`, `int`, `float`, `decimal`, `bool`, `datetime`,
//! `date`, `time`, `json`, `none`, `intenum`, `list`, `set`, `optional[T]`,
//! `union[A, B]`, `ref(Entity)`, `rev(Entity.column)`. Declared enum names
//! resolve to their enum; any other identifier is kept as an opaque type.

use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::form::{CollectionKind, EnumType, Primitive, Relation, SemanticType};

pub type EnumTable = IndexMap<String, Arc<EnumType>>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeExprError {
    #[error("Empty type expression")]
    Empty,

    #[error("Unexpected character '{ch}' at {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("Unexpected end of type expression")]
    UnexpectedEnd,

    #[error("Expected identifier at {pos}")]
    ExpectedIdent { pos: usize },

    #[error("'{name}' takes {expected} type argument(s), got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },

    #[error("'{name}' does not take type arguments")]
    NotGeneric { name: String },

    #[error("Invalid relation '{name}': expected {expected}")]
    BadRelation { name: String, expected: &'static str },
}

pub fn parse_type(input: &str, enums: &EnumTable) -> Result<SemanticType, TypeExprError> {
    let mut parser = Parser {
        chars: input.char_indices().collect(),
        index: 0,
        len: input.len(),
        enums,
    };

    parser.skip_ws();
    if parser.peek().is_none() {
        return Err(TypeExprError::Empty);
    }

    let ty = parser.expr()?;
    parser.skip_ws();
    match parser.peek() {
        Some(ch) => Err(TypeExprError::UnexpectedChar {
            ch,
            pos: parser.pos(),
        }),
        None => Ok(ty),
    }
}

struct Parser<'a> {
    chars: Vec<(usize, char)>,
    index: usize,
    len: usize,
    enums: &'a EnumTable,
}

impl<'a> Parser<'a> {
    fn expr(&mut self) -> Result<SemanticType, TypeExprError> {
        let mut members = vec![self.term()?];
        loop {
            self.skip_ws();
            if !self.eat('|') {
                break;
            }
            members.push(self.term()?);
        }
        if members.len() == 1 {
            return Ok(members.remove(0));
        }
        Ok(union_of(members))
    }

    fn term(&mut self) -> Result<SemanticType, TypeExprError> {
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();

        let ty = if self.eat('[') {
            let args = self.args()?;
            self.generic(&name, args)?
        } else if self.eat('(') {
            let path = self.path()?;
            self.expect(')')?;
            self.relation(&name, path)?
        } else {
            self.simple(&name)?
        };

        self.skip_ws();
        if self.eat('?') {
            Ok(SemanticType::optional(ty))
        } else {
            Ok(ty)
        }
    }

    fn args(&mut self) -> Result<Vec<SemanticType>, TypeExprError> {
        let mut args = vec![self.expr()?];
        loop {
            self.skip_ws();
            if self.eat(',') {
                args.push(self.expr()?);
                continue;
            }
            self.expect(']')?;
            return Ok(args);
        }
    }

    fn path(&mut self) -> Result<Vec<String>, TypeExprError> {
        self.skip_ws();
        let mut parts = vec![self.ident()?];
        while self.eat('.') {
            parts.push(self.ident()?);
        }
        self.skip_ws();
        Ok(parts)
    }

    fn simple(&self, name: &str) -> Result<SemanticType, TypeExprError> {
        if let Some(enum_type) = self.enums.get(name) {
            return Ok(SemanticType::Enum(enum_type.clone()));
        }

        let ty = match name.to_ascii_lowercase().as_str() {
            "str" | "string" => SemanticType::Primitive(Primitive::String),
            "text" => SemanticType::Primitive(Primitive::Text),
            "int" | "integer" => SemanticType::Primitive(Primitive::Integer),
            "float" => SemanticType::Primitive(Primitive::Float),
            "decimal" => SemanticType::Primitive(Primitive::Decimal),
            "bool" | "boolean" => SemanticType::Primitive(Primitive::Boolean),
            "datetime" => SemanticType::Primitive(Primitive::DateTime),
            "date" => SemanticType::Primitive(Primitive::Date),
            "time" => SemanticType::Primitive(Primitive::Time),
            "json" | "dict" | "map" => SemanticType::Primitive(Primitive::Json),
            "none" | "null" => SemanticType::Null,
            "intenum" => SemanticType::IntEnum,
            "list" => SemanticType::Collection {
                kind: CollectionKind::List,
                item: None,
            },
            "set" => SemanticType::Collection {
                kind: CollectionKind::Set,
                item: None,
            },
            "optional" | "union" => {
                return Err(TypeExprError::Arity {
                    name: name.to_string(),
                    expected: "at least 1",
                    got: 0,
                })
            }
            _ => SemanticType::Opaque(name.to_string()),
        };
        Ok(ty)
    }

    fn generic(&self, name: &str, mut args: Vec<SemanticType>) -> Result<SemanticType, TypeExprError> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "list" | "set" | "optional" if args.len() != 1 => Err(TypeExprError::Arity {
                name: name.to_string(),
                expected: "1",
                got: args.len(),
            }),
            "list" | "set" => {
                let kind = if lower == "list" {
                    CollectionKind::List
                } else {
                    CollectionKind::Set
                };
                Ok(SemanticType::Collection {
                    kind,
                    item: args.pop().map(Box::new),
                })
            }
            "optional" => match args.pop() {
                Some(inner) => Ok(SemanticType::optional(inner)),
                None => Err(TypeExprError::UnexpectedEnd),
            },
            "union" => Ok(union_of(args)),
            _ => Err(TypeExprError::NotGeneric {
                name: name.to_string(),
            }),
        }
    }

    fn relation(&self, name: &str, path: Vec<String>) -> Result<SemanticType, TypeExprError> {
        match (name, path.as_slice()) {
            ("ref", [target]) => Ok(SemanticType::Relation(Relation::Forward {
                target: target.clone(),
            })),
            ("rev", [target, column]) => Ok(SemanticType::Relation(Relation::Reverse {
                target: target.clone(),
                column: column.clone(),
            })),
            ("ref", _) => Err(TypeExprError::BadRelation {
                name: name.to_string(),
                expected: "ref(Entity)",
            }),
            ("rev", _) => Err(TypeExprError::BadRelation {
                name: name.to_string(),
                expected: "rev(Entity.column)",
            }),
            _ => Err(TypeExprError::BadRelation {
                name: name.to_string(),
                expected: "ref(..) or rev(..)",
            }),
        }
    }

    fn ident(&mut self) -> Result<String, TypeExprError> {
        let pos = self.pos();
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            let valid = if out.is_empty() {
                ch.is_alphabetic() || ch == '_'
            } else {
                ch.is_alphanumeric() || ch == '_'
            };
            if !valid {
                break;
            }
            out.push(ch);
            self.index += 1;
        }
        if out.is_empty() {
            return match self.peek() {
                Some(_) => Err(TypeExprError::ExpectedIdent { pos }),
                None => Err(TypeExprError::UnexpectedEnd),
            };
        }
        Ok(out)
    }

    fn expect(&mut self, expected: char) -> Result<(), TypeExprError> {
        self.skip_ws();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.index += 1;
                Ok(())
            }
            Some(ch) => Err(TypeExprError::UnexpectedChar { ch, pos: self.pos() }),
            None => Err(TypeExprError::UnexpectedEnd),
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.index += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).map(|(_, ch)| *ch)
    }

    /// Byte offset of the current character
    fn pos(&self) -> usize {
        self.chars.get(self.index).map(|(pos, _)| *pos).unwrap_or(self.len)
    }
}

/// Flatten nested unions and drop duplicate members
///
/// The result stays a `Union` even when a single member survives, so that
/// `union[none]` still reaches the deriver as a union with no usable member.
fn union_of(members: Vec<SemanticType>) -> SemanticType {
    let mut flat: Vec<SemanticType> = Vec::new();
    for member in members {
        let parts = match member {
            SemanticType::Union(inner) => inner,
            other => vec![other],
        };
        for part in parts {
            if !flat.contains(&part) {
                flat.push(part);
            }
        }
    }
    SemanticType::Union(flat)
}
