use sea_orm::Condition;

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Contains,
}

/// Parsed predicate tree for the `=`/`~`/`&&`/`||` filter-query language
/// (§6). `&&` binds tighter than `||`, matching ordinary SQL precedence;
/// there is no parenthesis support since the language has no grouping
/// operator to express it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Compare { field: String, op: Comparison, value: String },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        while self.rest().starts_with(' ') {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Predicate, DomainError> {
        let mut left = self.parse_and()?;
        loop {
            self.skip_ws();
            if self.eat("||") {
                let right = self.parse_and()?;
                left = Predicate::Or(Box::new(left), Box::new(right));
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Predicate, DomainError> {
        let mut left = self.parse_compare()?;
        loop {
            self.skip_ws();
            if self.eat("&&") {
                let right = self.parse_compare()?;
                left = Predicate::And(Box::new(left), Box::new(right));
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_compare(&mut self) -> Result<Predicate, DomainError> {
        self.skip_ws();
        let field = self.parse_identifier()?;
        self.skip_ws();
        let op = if self.eat("~") {
            Comparison::Contains
        } else if self.eat("=") {
            Comparison::Eq
        } else {
            return Err(DomainError::Validation(format!("expected '=' or '~' after field '{field}'")));
        };
        let value = self.parse_value()?;
        Ok(Predicate::Compare { field, op, value })
    }

    fn parse_identifier(&mut self) -> Result<String, DomainError> {
        self.skip_ws();
        let start = self.pos;
        while self
            .rest()
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(DomainError::Validation("expected a field name".to_string()));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// Values may be bare tokens (up to the next operator/whitespace) or
    /// double-quoted, with `\"` and `\\` recognized as escapes inside quotes.
    fn parse_value(&mut self) -> Result<String, DomainError> {
        self.skip_ws();
        if self.rest().starts_with('"') {
            self.pos += 1;
            let mut value = String::new();
            let mut chars = self.rest().chars();
            loop {
                match chars.next() {
                    Some('\\') => {
                        self.pos += 1;
                        match chars.next() {
                            Some(escaped) => {
                                value.push(escaped);
                                self.pos += escaped.len_utf8();
                            }
                            None => return Err(DomainError::Validation("unterminated escape in value".to_string())),
                        }
                    }
                    Some('"') => {
                        self.pos += 1;
                        return Ok(value);
                    }
                    Some(c) => {
                        value.push(c);
                        self.pos += c.len_utf8();
                    }
                    None => return Err(DomainError::Validation("unterminated quoted value".to_string())),
                }
            }
        } else {
            let start = self.pos;
            while self
                .rest()
                .chars()
                .next()
                .is_some_and(|c| c != ' ' && !self.rest().starts_with("&&") && !self.rest().starts_with("||"))
            {
                self.pos += 1;
            }
            if self.pos == start {
                return Err(DomainError::Validation("expected a value".to_string()));
            }
            Ok(self.input[start..self.pos].to_string())
        }
    }
}

pub fn parse(input: &str) -> Result<Predicate, DomainError> {
    let mut parser = Parser::new(input);
    let predicate = parser.parse_or()?;
    parser.skip_ws();
    if !parser.rest().is_empty() {
        return Err(DomainError::Validation(format!("unexpected trailing input: '{}'", parser.rest())));
    }
    Ok(predicate)
}

/// Compiles a parsed predicate into a sea-orm `Condition`, delegating
/// field/value → column comparison to a caller-supplied resolver so this
/// module stays entity-agnostic (`Inquiry::list`, admin order search, and
/// any future filterable entity each supply their own field map).
pub fn compile<F>(predicate: &Predicate, resolve: &F) -> Result<Condition, DomainError>
where
    F: Fn(&str, Comparison, &str) -> Result<Condition, DomainError>,
{
    match predicate {
        Predicate::Compare { field, op, value } => resolve(field, *op, value),
        Predicate::And(left, right) => Ok(Condition::all().add(compile(left, resolve)?).add(compile(right, resolve)?)),
        Predicate::Or(left, right) => Ok(Condition::any().add(compile(left, resolve)?).add(compile(right, resolve)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_equality() {
        let predicate = parse("status=open").unwrap();
        assert_eq!(
            predicate,
            Predicate::Compare {
                field: "status".to_string(),
                op: Comparison::Eq,
                value: "open".to_string()
            }
        );
    }

    #[test]
    fn parses_substring_operator() {
        let predicate = parse("subject~roaming").unwrap();
        assert!(matches!(predicate, Predicate::Compare { op: Comparison::Contains, .. }));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let predicate = parse("channel=kakao && status=open || priority=urgent").unwrap();
        match predicate {
            Predicate::Or(left, right) => {
                assert!(matches!(*left, Predicate::And(_, _)));
                assert!(matches!(*right, Predicate::Compare { .. }));
            }
            other => panic!("expected top-level Or, got {other:?}"),
        }
    }

    #[test]
    fn quoted_values_support_escaped_quotes_and_spaces() {
        let predicate = parse(r#"content="says \"hello\" there""#).unwrap();
        assert_eq!(
            predicate,
            Predicate::Compare {
                field: "content".to_string(),
                op: Comparison::Eq,
                value: r#"says "hello" there"#.to_string()
            }
        );
    }

    #[test]
    fn rejects_missing_operator() {
        assert!(parse("status").is_err());
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("status=open extra").is_err());
    }

    #[test]
    fn compile_invokes_resolver_once_per_leaf() {
        let predicate = parse("a=1 && b~2 || c=3").unwrap();
        let mut seen = Vec::new();
        let condition = compile(&predicate, &|field, op, value| {
            seen.push((field.to_string(), op, value.to_string()));
            Ok(Condition::all())
        })
        .unwrap();
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), Comparison::Eq, "1".to_string()),
                ("b".to_string(), Comparison::Contains, "2".to_string()),
                ("c".to_string(), Comparison::Eq, "3".to_string()),
            ]
        );
        let _ = condition;
    }
}
