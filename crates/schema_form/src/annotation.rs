//! Parser for type annotation strings.
//!
//! Schema documents spell field types the way the data-modeling layer writes
//! its annotations:
//!
//! ```text
//! int                       str | None                Optional[Address]
//! list[int]                 dict[str, list[float]]    Union[int, str]
//! Literal['a', 1, 2.5, True, None]                    set[int]   list
//! ```
//!
//! Parsing is purely syntactic. `set[int]` and a bare `list` parse fine and are
//! rejected later by the classifier, exactly like any other type nobody can edit.

use std::str::FromStr;

use crate::error::FormError;
use crate::schema::{Origin, TypeExpr};
use crate::value::Value;

/// Deepest `[...]` nesting accepted. Parsing recurses once per level.
pub const MAX_NESTING: usize = 128;

impl FromStr for TypeExpr {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parse a full annotation string.
pub fn parse(input: &str) -> Result<TypeExpr, FormError> {
    let mut parser = Parser {
        input,
        pos: 0,
        depth: 0,
    };
    let expr = parser.union_expr()?;
    parser.skip_ws();
    if parser.pos < input.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), FormError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{expected}`")))
        }
    }

    fn error(&self, message: &str) -> FormError {
        FormError::Annotation {
            input: self.input.to_string(),
            position: self.pos,
            message: message.to_string(),
        }
    }

    // expr := term ('|' term)*
    fn union_expr(&mut self) -> Result<TypeExpr, FormError> {
        let first = self.term()?;
        let mut branches = vec![first];
        while self.eat('|') {
            branches.push(self.term()?);
        }
        if branches.len() == 1 {
            Ok(branches.remove(0))
        } else {
            Ok(TypeExpr::union(branches))
        }
    }

    // term := IDENT ('[' args ']')?
    fn term(&mut self) -> Result<TypeExpr, FormError> {
        let ident = self.ident()?;
        // `typing.List` and friends: only the last segment matters.
        let name = ident.rsplit('.').next().unwrap_or(ident);
        if !self.eat('[') {
            return Ok(TypeExpr::named(name));
        }
        if self.depth == MAX_NESTING {
            return Err(self.error("annotation nests too deeply"));
        }
        self.depth += 1;
        let expr = self.apply(name);
        self.depth -= 1;
        expr
    }

    // Everything after `name[`.
    fn apply(&mut self, name: &str) -> Result<TypeExpr, FormError> {
        if name == "Literal" {
            let values = self.literal_args()?;
            self.expect(']')?;
            return Ok(TypeExpr::literal(values));
        }
        let mut args = Vec::new();
        self.skip_ws();
        if self.peek() != Some(']') {
            loop {
                args.push(self.union_expr()?);
                if !self.eat(',') {
                    break;
                }
            }
        }
        self.expect(']')?;
        let origin = match name {
            "list" | "List" | "Sequence" => Origin::List,
            "dict" | "Dict" | "Mapping" => Origin::Dict,
            "Union" => Origin::Union,
            "Optional" => Origin::Optional,
            other => Origin::Other(other.to_string()),
        };
        Ok(TypeExpr::Apply { origin, args })
    }

    fn ident(&mut self) -> Result<&'a str, FormError> {
        self.skip_ws();
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => {}
            _ => return Err(self.error("expected a type name")),
        }
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            self.bump();
        }
        Ok(&self.input[start..self.pos])
    }

    fn literal_args(&mut self) -> Result<Vec<Value>, FormError> {
        let mut values = Vec::new();
        self.skip_ws();
        if self.peek() == Some(']') {
            return Ok(values);
        }
        loop {
            values.push(self.literal_value()?);
            if !self.eat(',') {
                break;
            }
        }
        Ok(values)
    }

    fn literal_value(&mut self) -> Result<Value, FormError> {
        self.skip_ws();
        match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.bump();
                self.quoted(quote).map(Value::Str)
            }
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(_) => match self.ident()? {
                "True" => Ok(Value::Bool(true)),
                "False" => Ok(Value::Bool(false)),
                "None" => Ok(Value::Null),
                _ => Err(self.error("literal values must be strings, numbers, booleans or None")),
            },
            None => Err(self.error("expected a literal value")),
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, FormError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => return Err(self.error("unterminated escape")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string literal")),
            }
        }
    }

    fn number(&mut self) -> Result<Value, FormError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '_'))
        {
            self.bump();
        }
        let text = self.input[start..self.pos].replace('_', "");
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Int(i));
        }
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|_| self.error("malformed number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PrimitiveKind;
    use pretty_assertions::assert_eq;

    fn int() -> TypeExpr {
        TypeExpr::primitive(PrimitiveKind::Int)
    }

    fn str_() -> TypeExpr {
        TypeExpr::primitive(PrimitiveKind::Str)
    }

    #[test]
    fn parses_generics() {
        assert_eq!(parse("list[int]").unwrap(), TypeExpr::list(int()));
        assert_eq!(
            parse("dict[str, list[int]]").unwrap(),
            TypeExpr::dict(str_(), TypeExpr::list(int()))
        );
        assert_eq!(
            parse("typing.Optional[ int ]").unwrap(),
            TypeExpr::optional(int())
        );
    }

    #[test]
    fn pipe_builds_a_union() {
        assert_eq!(
            parse("int | str | None").unwrap(),
            TypeExpr::union(vec![int(), str_(), TypeExpr::null()])
        );
    }

    #[test]
    fn parses_literals() {
        assert_eq!(
            parse("Literal['a', \"b\", -3, 2.5, True, None]").unwrap(),
            TypeExpr::literal(vec![
                Value::from("a"),
                Value::from("b"),
                Value::Int(-3),
                Value::Float(2.5),
                Value::Bool(true),
                Value::Null,
            ])
        );
    }

    #[test]
    fn bare_and_foreign_containers_still_parse() {
        assert_eq!(parse("list").unwrap(), TypeExpr::named("list"));
        assert_eq!(
            parse("set[int]").unwrap(),
            TypeExpr::Apply {
                origin: Origin::Other("set".into()),
                args: vec![int()],
            }
        );
    }

    #[test]
    fn display_round_trips() {
        for src in ["list[int]", "dict[str, Optional[float]]", "Literal['x', 1]"] {
            assert_eq!(parse(src).unwrap().to_string(), src);
        }
    }

    #[test]
    fn reports_position_of_syntax_errors() {
        let err = parse("list[int").unwrap_err();
        match err {
            FormError::Annotation { position, .. } => assert_eq!(position, 8),
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse("int str").is_err());
        assert!(parse("Literal[foo]").is_err());
        assert!(parse("Literal['open").is_err());
    }

    #[test]
    fn deep_nesting_is_an_error_not_a_crash() {
        let nested = |n: usize| format!("{}int{}", "list[".repeat(n), "]".repeat(n));
        assert!(parse(&nested(MAX_NESTING)).is_ok());
        match parse(&nested(200_000)) {
            Err(FormError::Annotation { message, .. }) => {
                assert_eq!(message, "annotation nests too deeply")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
