// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event evaluation (§4.5.3): a pure expression language over a JSON
//! payload — property access, comparisons, boolean operators, optional
//! chaining. There is no assignment, call, or global-lookup production in
//! the grammar, so `eval`/`Function`/constructor/environment/process access
//! are denied by construction rather than by a blocklist. A malformed or
//! type-mismatched expression evaluates to `false`, never errors out to the
//! caller.

use serde_json::Value;

#[derive(Debug, Clone)]
enum Expr {
    Literal(Value),
    Path(Vec<PathSegment>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone)]
enum PathSegment {
    Field(String),
    OptionalField(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Evaluates `condition` against `payload`. Returns `false` for any parse
/// or evaluation failure, per §4.5.3 ("a failing or malformed expression
/// evaluates to false").
pub fn evaluate(condition: &str, payload: &Value) -> bool {
    match Parser::new(condition).parse_expr_to_end() {
        Ok(expr) => eval(&expr, payload).and_then(as_bool).unwrap_or(false),
        Err(_) => false,
    }
}

fn as_bool(v: Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(b),
        Value::Null => Some(false),
        _ => Some(!matches!(v, Value::Null)),
    }
}

fn eval(expr: &Expr, payload: &Value) -> Option<Value> {
    match expr {
        Expr::Literal(v) => Some(v.clone()),
        Expr::Path(segments) => {
            let mut current = payload.clone();
            for seg in segments {
                match seg {
                    PathSegment::Field(name) => match current.get(name) {
                        Some(v) => current = v.clone(),
                        None => return None,
                    },
                    PathSegment::OptionalField(name) => match current.get(name) {
                        Some(v) => current = v.clone(),
                        None => return Some(Value::Null),
                    },
                }
            }
            Some(current)
        }
        Expr::Not(inner) => {
            let v = eval(inner, payload)?;
            Some(Value::Bool(!as_bool(v)?))
        }
        Expr::And(lhs, rhs) => {
            let l = eval(lhs, payload).and_then(as_bool).unwrap_or(false);
            if !l {
                return Some(Value::Bool(false));
            }
            let r = eval(rhs, payload).and_then(as_bool).unwrap_or(false);
            Some(Value::Bool(r))
        }
        Expr::Or(lhs, rhs) => {
            let l = eval(lhs, payload).and_then(as_bool).unwrap_or(false);
            if l {
                return Some(Value::Bool(true));
            }
            let r = eval(rhs, payload).and_then(as_bool).unwrap_or(false);
            Some(Value::Bool(r))
        }
        Expr::Cmp(op, lhs, rhs) => {
            let l = eval(lhs, payload)?;
            let r = eval(rhs, payload)?;
            Some(Value::Bool(compare(*op, &l, &r)))
        }
    }
}

fn compare(op: CmpOp, l: &Value, r: &Value) -> bool {
    if let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) {
        return match op {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
        };
    }
    if let (Some(a), Some(b)) = (l.as_str(), r.as_str()) {
        return match op {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
        };
    }
    match op {
        CmpOp::Eq => l == r,
        CmpOp::Ne => l != r,
        _ => false,
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input: input.as_bytes(), pos: 0 }
    }

    fn parse_expr_to_end(&mut self) -> Result<Expr, String> {
        let expr = self.parse_or()?;
        self.skip_ws();
        if self.pos != self.input.len() {
            return Err(format!("trailing input at byte {}", self.pos));
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_and()?;
        loop {
            self.skip_ws();
            if self.consume_str("||") {
                let rhs = self.parse_and()?;
                lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_cmp()?;
        loop {
            self.skip_ws();
            if self.consume_str("&&") {
                let rhs = self.parse_cmp()?;
                lhs = Expr::And(Box::new(lhs), Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expr, String> {
        let lhs = self.parse_unary()?;
        self.skip_ws();
        let op = if self.consume_str("==") {
            Some(CmpOp::Eq)
        } else if self.consume_str("!=") {
            Some(CmpOp::Ne)
        } else if self.consume_str(">=") {
            Some(CmpOp::Ge)
        } else if self.consume_str("<=") {
            Some(CmpOp::Le)
        } else if self.consume_str(">") {
            Some(CmpOp::Gt)
        } else if self.consume_str("<") {
            Some(CmpOp::Lt)
        } else {
            None
        };
        match op {
            Some(op) => {
                let rhs = self.parse_unary()?;
                Ok(Expr::Cmp(op, Box::new(lhs), Box::new(rhs)))
            }
            None => Ok(lhs),
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        self.skip_ws();
        if self.consume_str("!") {
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        self.skip_ws();
        if self.consume_str("(") {
            let expr = self.parse_or()?;
            self.skip_ws();
            if !self.consume_str(")") {
                return Err("expected ')'".into());
            }
            return Ok(expr);
        }
        if self.consume_str("true") {
            return Ok(Expr::Literal(Value::Bool(true)));
        }
        if self.consume_str("false") {
            return Ok(Expr::Literal(Value::Bool(false)));
        }
        if self.consume_str("null") {
            return Ok(Expr::Literal(Value::Null));
        }
        if self.peek() == Some(b'"') {
            return self.parse_string_literal();
        }
        if self.peek().is_some_and(|c| c.is_ascii_digit() || c == b'-') {
            return self.parse_number_literal();
        }
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == b'_') {
            return self.parse_path();
        }
        Err(format!("unexpected input at byte {}", self.pos))
    }

    fn parse_string_literal(&mut self) -> Result<Expr, String> {
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(|c| c != b'"') {
            self.pos += 1;
        }
        if self.peek() != Some(b'"') {
            return Err("unterminated string literal".into());
        }
        let s = std::str::from_utf8(&self.input[start..self.pos]).map_err(|e| e.to_string())?.to_string();
        self.pos += 1;
        Ok(Expr::Literal(Value::String(s)))
    }

    fn parse_number_literal(&mut self) -> Result<Expr, String> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == b'.') {
            self.pos += 1;
        }
        let s = std::str::from_utf8(&self.input[start..self.pos]).map_err(|e| e.to_string())?;
        let n: f64 = s.parse().map_err(|_| format!("bad number literal {s:?}"))?;
        Ok(Expr::Literal(serde_json::json!(n)))
    }

    fn parse_path(&mut self) -> Result<Expr, String> {
        let mut segments = vec![PathSegment::Field(self.parse_ident()?)];
        loop {
            if self.consume_str("?.") {
                segments.push(PathSegment::OptionalField(self.parse_ident()?));
            } else if self.consume_str(".") {
                segments.push(PathSegment::Field(self.parse_ident()?));
            } else {
                break;
            }
        }
        Ok(Expr::Path(segments))
    }

    fn parse_ident(&mut self) -> Result<String, String> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err("expected identifier".into());
        }
        Ok(std::str::from_utf8(&self.input[start..self.pos]).map_err(|e| e.to_string())?.to_string())
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn consume_str(&mut self, s: &str) -> bool {
        self.skip_ws();
        if self.input[self.pos..].starts_with(s.as_bytes()) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
