//! CPLEX LP text format.
//!
//! The writer emits every column in the `Bounds` section so that a model
//! always declares all of its columns. The reader accepts the common subset
//! of the format: objective, `Subject To`, `Bounds`, `Generals`, `Binaries`
//! and `End`, with `\` comments. Section keywords are only recognised as the
//! first token of a line.

use super::expr::LinearExpr;
use super::model::{Column, NativeModel, Objective, Row};
use crate::domain::solver_service::{Result, SolverError};
use crate::domain::value_objects::{ColumnKind, ObjectiveSense, RowSense};
use std::collections::HashMap;

/// Serialize a native model to LP text.
pub fn write_lp(model: &NativeModel) -> Result<String> {
    let mut out = String::new();
    out.push_str("\\ Model exported by milpkit\n");

    match &model.objective {
        Some(objective) => {
            out.push_str(match objective.sense {
                ObjectiveSense::Maximize => "Maximize\n",
                ObjectiveSense::Minimize => "Minimize\n",
            });
            out.push_str(" obj:");
            let body = format_expr(model, &objective.expr)?;
            if !body.is_empty() {
                out.push(' ');
                out.push_str(&body);
            }
            out.push('\n');
        }
        None => out.push_str("Minimize\n obj:\n"),
    }

    out.push_str("Subject To\n");
    for row in &model.rows {
        let lhs = if row.is_constant() {
            // The format has no column-free rows
            let first = model.columns.first().ok_or_else(|| {
                SolverError::InvalidProblem(format!(
                    "Row '{}' has no columns and the model declares none",
                    row.name
                ))
            })?;
            format!("0 {}", first.name)
        } else {
            format_expr(model, &row.expr)?
        };
        out.push_str(&format!(
            " {}: {} {} {}\n",
            row.name,
            lhs,
            row.sense.symbol(),
            format_number(row.rhs)
        ));
    }

    out.push_str("Bounds\n");
    for column in &model.columns {
        out.push_str(&format!(" {}\n", format_bounds(column)));
    }

    let generals: Vec<&str> = model
        .columns
        .iter()
        .filter(|c| c.kind == ColumnKind::Integer)
        .map(|c| c.name.as_str())
        .collect();
    if !generals.is_empty() {
        out.push_str("Generals\n");
        for name in generals {
            out.push_str(&format!(" {name}\n"));
        }
    }

    let binaries: Vec<&str> = model
        .columns
        .iter()
        .filter(|c| c.kind == ColumnKind::Binary)
        .map(|c| c.name.as_str())
        .collect();
    if !binaries.is_empty() {
        out.push_str("Binaries\n");
        for name in binaries {
            out.push_str(&format!(" {name}\n"));
        }
    }

    out.push_str("End\n");
    Ok(out)
}

/// Parse LP text into a native model.
///
/// The objective section is mandatory in the format, so the returned model
/// always carries an objective, possibly with an empty expression.
pub fn read_lp(source: &str) -> Result<NativeModel> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse()
}

fn format_expr(model: &NativeModel, expr: &LinearExpr) -> Result<String> {
    let mut out = String::new();
    for (index, coef) in expr.terms() {
        let column = model.columns.get(index).ok_or_else(|| {
            SolverError::InvalidProblem(format!("Expression references unknown column {index}"))
        })?;
        push_signed(&mut out, coef);
        out.push_str(&format!(" {}", column.name));
    }
    if expr.constant() != 0.0 {
        push_signed(&mut out, expr.constant());
    }
    Ok(out)
}

fn push_signed(out: &mut String, value: f64) {
    if out.is_empty() {
        if value < 0.0 {
            out.push_str("- ");
        }
    } else if value < 0.0 {
        out.push_str(" - ");
    } else {
        out.push_str(" + ");
    }
    out.push_str(&format_number(value.abs()));
}

fn format_number(value: f64) -> String {
    if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{value}")
    }
}

fn format_bounds(column: &Column) -> String {
    let (lower, upper) = (column.lower_bound, column.upper_bound);
    match (lower.is_finite(), upper.is_finite()) {
        (false, false) => format!("{} free", column.name),
        (true, false) => format!("{} >= {}", column.name, format_number(lower)),
        (false, true) => format!("-inf <= {} <= {}", column.name, format_number(upper)),
        (true, true) if lower == upper => format!("{} = {}", column.name, format_number(lower)),
        (true, true) => format!(
            "{} <= {} <= {}",
            format_number(lower),
            column.name,
            format_number(upper)
        ),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f64),
    Word(String),
    Sense(RowSense),
    Plus,
    Minus,
    Colon,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    line: usize,
    line_start: bool,
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();

    for (line_index, raw_line) in source.lines().enumerate() {
        let line = line_index + 1;
        let text = match raw_line.find('\\') {
            Some(comment) => &raw_line[..comment],
            None => raw_line,
        };
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;
        let mut line_start = true;

        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                i += 1;
                continue;
            }

            let kind = match c {
                '+' => {
                    i += 1;
                    TokenKind::Plus
                }
                '-' => {
                    i += 1;
                    TokenKind::Minus
                }
                ':' => {
                    i += 1;
                    TokenKind::Colon
                }
                '<' => {
                    i += 1;
                    if chars.get(i) == Some(&'=') {
                        i += 1;
                    }
                    TokenKind::Sense(RowSense::LessOrEqual)
                }
                '>' => {
                    i += 1;
                    if chars.get(i) == Some(&'=') {
                        i += 1;
                    }
                    TokenKind::Sense(RowSense::GreaterOrEqual)
                }
                '=' => {
                    i += 1;
                    match chars.get(i) {
                        Some('<') => {
                            i += 1;
                            TokenKind::Sense(RowSense::LessOrEqual)
                        }
                        Some('>') => {
                            i += 1;
                            TokenKind::Sense(RowSense::GreaterOrEqual)
                        }
                        _ => TokenKind::Sense(RowSense::Equal),
                    }
                }
                c if c.is_ascii_digit() || c == '.' => {
                    let start = i;
                    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                        i += 1;
                    }
                    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                        let mut j = i + 1;
                        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                            j += 1;
                        }
                        if j < chars.len() && chars[j].is_ascii_digit() {
                            i = j;
                            while i < chars.len() && chars[i].is_ascii_digit() {
                                i += 1;
                            }
                        }
                    }
                    let literal: String = chars[start..i].iter().collect();
                    let value = literal.parse::<f64>().map_err(|_| SolverError::ModelFormat {
                        line,
                        message: format!("invalid number '{literal}'"),
                    })?;
                    TokenKind::Number(value)
                }
                _ => {
                    let start = i;
                    while i < chars.len()
                        && !chars[i].is_whitespace()
                        && !matches!(chars[i], '+' | '-' | ':' | '<' | '>' | '=')
                    {
                        i += 1;
                    }
                    TokenKind::Word(chars[start..i].iter().collect())
                }
            };

            tokens.push(Token {
                kind,
                line,
                line_start,
            });
            line_start = false;
        }
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Objective(ObjectiveSense),
    Constraints,
    Bounds,
    Generals,
    Binaries,
    End,
}

fn is_infinity(word: &str) -> bool {
    word.eq_ignore_ascii_case("inf") || word.eq_ignore_ascii_case("infinity")
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            columns: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn parse(mut self) -> Result<NativeModel> {
        let sense = match self.section_at(self.pos) {
            Some((Section::Objective(sense), used)) => {
                self.pos += used;
                sense
            }
            _ => return Err(self.error("expected Maximize or Minimize section")),
        };
        let expr = self.parse_objective()?;
        let mut rows = Vec::new();

        while self.pos < self.tokens.len() {
            let (section, used) = self
                .section_at(self.pos)
                .ok_or_else(|| self.error("expected a section keyword"))?;
            self.pos += used;
            match section {
                Section::Constraints => self.parse_rows(&mut rows)?,
                Section::Bounds => self.parse_bounds()?,
                Section::Generals => self.parse_kinds(ColumnKind::Integer)?,
                Section::Binaries => self.parse_kinds(ColumnKind::Binary)?,
                Section::End => break,
                Section::Objective(_) => return Err(self.error("duplicate objective section")),
            }
        }

        Ok(NativeModel {
            columns: self.columns,
            rows,
            objective: Some(Objective { sense, expr }),
        })
    }

    fn section_at(&self, pos: usize) -> Option<(Section, usize)> {
        let token = self.tokens.get(pos)?;
        let TokenKind::Word(word) = &token.kind else {
            return None;
        };
        if !token.line_start {
            return None;
        }
        let next_is = |expected: &str| {
            matches!(
                self.tokens.get(pos + 1).map(|t| &t.kind),
                Some(TokenKind::Word(w)) if w.eq_ignore_ascii_case(expected)
            )
        };

        let section = match word.to_ascii_lowercase().as_str() {
            "maximize" | "maximise" | "maximum" | "max" => {
                (Section::Objective(ObjectiveSense::Maximize), 1)
            }
            "minimize" | "minimise" | "minimum" | "min" => {
                (Section::Objective(ObjectiveSense::Minimize), 1)
            }
            "subject" if next_is("to") => (Section::Constraints, 2),
            "such" if next_is("that") => (Section::Constraints, 2),
            "st" | "s.t." | "st." => (Section::Constraints, 1),
            "bounds" | "bound" => (Section::Bounds, 1),
            "generals" | "general" | "gen" => (Section::Generals, 1),
            "binaries" | "binary" | "bin" => (Section::Binaries, 1),
            "end" => (Section::End, 1),
            _ => return None,
        };
        Some(section)
    }

    fn at_section_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.section_at(self.pos).is_some()
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn error(&self, message: impl Into<String>) -> SolverError {
        let line = self
            .tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.line);
        SolverError::ModelFormat {
            line,
            message: message.into(),
        }
    }

    fn column(&mut self, name: &str) -> usize {
        if let Some(&index) = self.index.get(name) {
            return index;
        }
        let index = self.columns.len();
        self.columns
            .push(Column::new(name, ColumnKind::Continuous, 0.0, f64::INFINITY));
        self.index.insert(name.to_string(), index);
        index
    }

    /// `name:` prefix of an objective or row
    fn take_label(&mut self) -> Option<String> {
        let name = match (self.peek(), self.peek_at(1)) {
            (Some(TokenKind::Word(name)), Some(TokenKind::Colon)) => name.clone(),
            _ => return None,
        };
        self.pos += 2;
        Some(name)
    }

    fn parse_objective(&mut self) -> Result<LinearExpr> {
        let _ = self.take_label();
        self.parse_expr()
    }

    fn parse_expr(&mut self) -> Result<LinearExpr> {
        let mut terms = Vec::new();
        let mut constant = 0.0;

        while !self.at_section_end() {
            if matches!(self.peek(), Some(TokenKind::Sense(_))) {
                break;
            }

            let mut sign = 1.0;
            while let Some(kind) = self.peek() {
                match kind {
                    TokenKind::Plus => {}
                    TokenKind::Minus => sign = -sign,
                    _ => break,
                }
                self.pos += 1;
            }

            match self.peek().cloned() {
                Some(TokenKind::Number(value)) => {
                    self.pos += 1;
                    match self.peek().cloned() {
                        Some(TokenKind::Word(name))
                            if !self.at_section_end()
                                && self.peek_at(1) != Some(&TokenKind::Colon) =>
                        {
                            self.pos += 1;
                            terms.push((self.column(&name), sign * value));
                        }
                        _ => constant += sign * value,
                    }
                }
                Some(TokenKind::Word(name)) if !self.at_section_end() => {
                    self.pos += 1;
                    terms.push((self.column(&name), sign));
                }
                _ => return Err(self.error("expected a term")),
            }
        }

        Ok(LinearExpr::from_terms(terms, constant))
    }

    /// Signed number or infinity
    fn parse_value(&mut self) -> Result<f64> {
        let mut sign = 1.0;
        while let Some(kind) = self.peek() {
            match kind {
                TokenKind::Plus => {}
                TokenKind::Minus => sign = -sign,
                _ => break,
            }
            self.pos += 1;
        }
        let value = match self.peek() {
            Some(TokenKind::Number(value)) => *value,
            Some(TokenKind::Word(word)) if is_infinity(word) => f64::INFINITY,
            _ => return Err(self.error("expected a number")),
        };
        self.pos += 1;
        Ok(sign * value)
    }

    fn expect_sense(&mut self) -> Result<RowSense> {
        match self.peek() {
            Some(TokenKind::Sense(sense)) => {
                let sense = *sense;
                self.pos += 1;
                Ok(sense)
            }
            _ => Err(self.error("expected <=, >= or =")),
        }
    }

    fn parse_rows(&mut self, rows: &mut Vec<Row>) -> Result<()> {
        while !self.at_section_end() {
            let name = self
                .take_label()
                .unwrap_or_else(|| format!("c{}", rows.len()));
            let lhs = self.parse_expr()?;
            let sense = self.expect_sense()?;
            let rhs = self.parse_value()?;
            rows.push(Row::between(
                name,
                &lhs,
                sense,
                &LinearExpr::constant_value(rhs),
            ));
        }
        Ok(())
    }

    fn parse_bounds(&mut self) -> Result<()> {
        while !self.at_section_end() {
            match self.peek().cloned() {
                Some(TokenKind::Word(name)) if !is_infinity(&name) => {
                    self.pos += 1;
                    let index = self.column(&name);
                    let free = matches!(
                        self.peek(),
                        Some(TokenKind::Word(word)) if word.eq_ignore_ascii_case("free")
                    );
                    if free {
                        self.pos += 1;
                        self.columns[index].lower_bound = f64::NEG_INFINITY;
                        self.columns[index].upper_bound = f64::INFINITY;
                    } else {
                        let sense = self.expect_sense()?;
                        let value = self.parse_value()?;
                        self.apply_bound(index, sense, value);
                    }
                }
                _ => {
                    let value = self.parse_value()?;
                    let sense = self.expect_sense()?;
                    let name = match self.peek() {
                        Some(TokenKind::Word(name)) => name.clone(),
                        _ => return Err(self.error("expected a column name")),
                    };
                    self.pos += 1;
                    let index = self.column(&name);
                    // `value <= x` bounds x from below
                    let mirrored = match sense {
                        RowSense::LessOrEqual => RowSense::GreaterOrEqual,
                        RowSense::GreaterOrEqual => RowSense::LessOrEqual,
                        RowSense::Equal => RowSense::Equal,
                    };
                    self.apply_bound(index, mirrored, value);
                    if matches!(self.peek(), Some(TokenKind::Sense(_))) {
                        let sense = self.expect_sense()?;
                        let value = self.parse_value()?;
                        self.apply_bound(index, sense, value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply `column sense value`
    fn apply_bound(&mut self, index: usize, sense: RowSense, value: f64) {
        let column = &mut self.columns[index];
        match sense {
            RowSense::LessOrEqual => column.upper_bound = value,
            RowSense::GreaterOrEqual => column.lower_bound = value,
            RowSense::Equal => {
                column.lower_bound = value;
                column.upper_bound = value;
            }
        }
    }

    fn parse_kinds(&mut self, kind: ColumnKind) -> Result<()> {
        while !self.at_section_end() {
            let name = match self.peek() {
                Some(TokenKind::Word(name)) => name.clone(),
                _ => return Err(self.error("expected a column name")),
            };
            self.pos += 1;
            let index = self.column(&name);
            let column = &mut self.columns[index];
            column.kind = kind;
            if kind == ColumnKind::Binary {
                column.lower_bound = 0.0;
                column.upper_bound = 1.0;
            }
        }
        Ok(())
    }
}
