//! Parser for the compact text form of type expressions.
//!
//! ```text
//! expr    := name | name "[" args "]"
//! args    := expr ("," expr)* ["," "..."]
//! literal := "literal[" json ("," json)* "]"
//! ```

use super::TypeExpr;
use crate::error::{SchemaError, SchemaResult};
use serde_json::Value;

pub(super) fn parse(text: &str) -> SchemaResult<TypeExpr> {
    let mut parser = Parser {
        source: text,
        chars: text.char_indices().collect(),
        pos: 0,
    };
    let expr = parser.expr()?;
    parser.skip_ws();
    if parser.pos < parser.chars.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: &str) -> SchemaError {
        SchemaError::invalid_type_expr(self.source, format!("{message} at offset {}", self.offset()))
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.source.len(), |(offset, _)| *offset)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> SchemaResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{expected}'")))
        }
    }

    fn ident(&mut self) -> SchemaResult<String> {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a type name"));
        }
        Ok(self.chars[start..self.pos].iter().map(|(_, c)| c).collect())
    }

    fn ellipsis(&mut self) -> bool {
        self.skip_ws();
        let dots = self.chars[self.pos..]
            .iter()
            .take(3)
            .filter(|(_, c)| *c == '.')
            .count();
        if dots == 3 {
            self.pos += 3;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> SchemaResult<TypeExpr> {
        let name = self.ident()?;
        let lowered = name.to_ascii_lowercase();
        let simple = match lowered.as_str() {
            "any" => Some(TypeExpr::Any),
            "str" | "string" => Some(TypeExpr::Str),
            "int" | "integer" => Some(TypeExpr::Int),
            "float" => Some(TypeExpr::Float),
            "bool" | "boolean" => Some(TypeExpr::Bool),
            "none" | "null" => Some(TypeExpr::Null),
            _ => None,
        };
        if let Some(expr) = simple {
            return Ok(expr);
        }

        self.expect('[')?;
        let expr = match lowered.as_str() {
            "list" => TypeExpr::list(self.expr()?),
            "set" => TypeExpr::set(self.expr()?),
            "sequence" => TypeExpr::sequence(self.expr()?),
            "optional" => TypeExpr::optional(self.expr()?),
            "dict" => {
                let key = self.expr()?;
                self.expect(',')?;
                TypeExpr::dict(key, self.expr()?)
            }
            "union" => TypeExpr::union(self.expr_list()?),
            "tuple" => self.tuple()?,
            "literal" => TypeExpr::Literal(self.literal_values()?),
            _ => return Err(self.error(&format!("unknown type '{name}'"))),
        };
        self.expect(']')?;
        Ok(expr)
    }

    fn expr_list(&mut self) -> SchemaResult<Vec<TypeExpr>> {
        let mut items = vec![self.expr()?];
        while self.eat(',') {
            items.push(self.expr()?);
        }
        Ok(items)
    }

    fn tuple(&mut self) -> SchemaResult<TypeExpr> {
        self.skip_ws();
        if self.peek() == Some(']') {
            return Ok(TypeExpr::tuple(Vec::new()));
        }
        let first = self.expr()?;
        let mut items = vec![first];
        while self.eat(',') {
            if self.ellipsis() {
                if items.len() != 1 {
                    return Err(self.error("'...' is only allowed after a single tuple item"));
                }
                return Ok(TypeExpr::tuple_of(items.remove(0)));
            }
            items.push(self.expr()?);
        }
        Ok(TypeExpr::tuple(items))
    }

    fn literal_values(&mut self) -> SchemaResult<Vec<Value>> {
        let mut values = vec![self.literal_value()?];
        while self.eat(',') {
            values.push(self.literal_value()?);
        }
        Ok(values)
    }

    fn literal_value(&mut self) -> SchemaResult<Value> {
        self.skip_ws();
        match self.peek() {
            Some('\'') => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != '\'') {
                    self.pos += 1;
                }
                if self.peek().is_none() {
                    return Err(self.error("unterminated string"));
                }
                let text: String = self.chars[start..self.pos].iter().map(|(_, c)| c).collect();
                self.pos += 1;
                Ok(Value::String(text))
            }
            Some('"') => {
                let start = self.pos;
                self.pos += 1;
                let mut escaped = false;
                loop {
                    match self.peek() {
                        None => return Err(self.error("unterminated string")),
                        Some('\\') if !escaped => escaped = true,
                        Some('"') if !escaped => break,
                        Some(_) => escaped = false,
                    }
                    self.pos += 1;
                }
                self.pos += 1;
                let token: String = self.chars[start..self.pos].iter().map(|(_, c)| c).collect();
                serde_json::from_str(&token).map_err(|e| self.error(&e.to_string()))
            }
            _ => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c != ',' && c != ']') {
                    self.pos += 1;
                }
                let token: String = self.chars[start..self.pos].iter().map(|(_, c)| c).collect();
                let token = token.trim();
                let value: Value = serde_json::from_str(token)
                    .map_err(|_| self.error(&format!("invalid literal '{token}'")))?;
                if value.is_array() || value.is_object() {
                    return Err(self.error("literal values must be scalars"));
                }
                Ok(value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_nested_generics() {
        let expr = parse("dict[str, union[int, list[str]]]").unwrap();
        assert_eq!(
            expr,
            TypeExpr::dict(
                TypeExpr::Str,
                TypeExpr::union(vec![TypeExpr::Int, TypeExpr::list(TypeExpr::Str)])
            )
        );
    }

    #[test]
    fn test_parse_tuple_forms() {
        assert_eq!(
            parse("tuple[int, ...]").unwrap(),
            TypeExpr::tuple_of(TypeExpr::Int)
        );
        assert_eq!(
            parse("tuple[int, str]").unwrap(),
            TypeExpr::tuple(vec![TypeExpr::Int, TypeExpr::Str])
        );
        assert!(parse("tuple[int, str, ...]").is_err());
    }

    #[test]
    fn test_parse_literals() {
        let expr = parse(r#"literal["a", 'b', 1, true, null]"#).unwrap();
        assert_eq!(
            expr,
            TypeExpr::Literal(vec![json!("a"), json!("b"), json!(1), json!(true), json!(null)])
        );
    }

    #[test]
    fn test_display_parses_back() {
        for text in [
            "list[int]",
            "dict[str, optional[float]]",
            "tuple[int, ...]",
            "union[str, None]",
            r#"literal["x", 2]"#,
        ] {
            let expr = parse(text).unwrap();
            assert_eq!(parse(&expr.to_string()).unwrap(), expr);
        }
    }

    #[test]
    fn test_rejects_unknown_names_and_trailing_input() {
        assert!(matches!(
            parse("frozenset[int]"),
            Err(SchemaError::InvalidTypeExpr { .. })
        ));
        assert!(parse("int]").is_err());
        assert!(parse("list[int").is_err());
    }
}
