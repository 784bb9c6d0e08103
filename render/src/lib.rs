//! SQL text for ordered-aggregate calls.
//!
//! The aggregation core never sees SQL; this crate is the translator that
//! turns a registered aggregate name plus column identifiers into the
//! database's native ordered-aggregate syntax, e.g.
//! `linear_fit("x", "y" ORDER BY "t" ASC)` and the grouped select around
//! it. Rendering only builds text, it executes nothing.

use itertools::Itertools;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("invalid SQL identifier `{0}`")]
    InvalidIdentifier(String),

    #[error("ORDER BY requires at least one aggregate argument")]
    OrderedCallWithoutArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// An aggregate call with optional in-aggregate ordering.
///
/// Column identifiers are validated and double-quoted; the aggregate name
/// is validated but emitted bare, the way custom aggregates are normally
/// invoked.
#[derive(Debug, Clone)]
pub struct OrderedCall<'a> {
    name: &'a str,
    args: Vec<&'a str>,
    order_by: Option<(&'a str, Direction)>,
}

impl<'a> OrderedCall<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            args: Vec::new(),
            order_by: None,
        }
    }

    pub fn arg(mut self, column: &'a str) -> Self {
        self.args.push(column);
        self
    }

    pub fn order_by(mut self, column: &'a str, direction: Direction) -> Self {
        self.order_by = Some((column, direction));
        self
    }

    pub fn to_sql(&self) -> Result<String, RenderError> {
        check_identifier(self.name)?;
        if self.order_by.is_some() && self.args.is_empty() {
            return Err(RenderError::OrderedCallWithoutArgs);
        }

        let args = self
            .args
            .iter()
            .map(|col| quote_identifier(col))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .join(", ");

        let mut sql = format!("{}({args}", self.name);
        if let Some((column, direction)) = self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(&quote_identifier(column)?);
            sql.push(' ');
            sql.push_str(direction.keyword());
        }
        sql.push(')');
        Ok(sql)
    }
}

/// `SELECT <group>, <call> FROM <table> GROUP BY <group>` around an
/// ordered call, mirroring how an application would materialize one
/// result row per group key.
#[derive(Debug, Clone)]
pub struct GroupedSelect<'a> {
    table: &'a str,
    group: &'a str,
    call: OrderedCall<'a>,
}

impl<'a> GroupedSelect<'a> {
    pub fn new(table: &'a str, group: &'a str, call: OrderedCall<'a>) -> Self {
        Self { table, group, call }
    }

    pub fn to_sql(&self) -> Result<String, RenderError> {
        let group = quote_identifier(self.group)?;
        let table = quote_identifier(self.table)?;
        let call = self.call.to_sql()?;
        Ok(format!("SELECT {group}, {call} FROM {table} GROUP BY {group}"))
    }
}

fn check_identifier(ident: &str) -> Result<(), RenderError> {
    let mut chars = ident.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(RenderError::InvalidIdentifier(ident.to_owned()))
    }
}

fn quote_identifier(ident: &str) -> Result<String, RenderError> {
    check_identifier(ident)?;
    Ok(format!("\"{ident}\""))
}
