use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use itertools::Itertools;
use tracing::info;

use aggregate::{InputRow, OrderedGroupedAggregator, Registry, Value};
use render::{Direction, GroupedSelect, OrderedCall};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a registered aggregate over `group,sort,value` lines.
    Run {
        #[arg(short, long)]
        aggregate: String,

        #[arg(short, long)]
        input: PathBuf,
    },
    /// Print the SQL an ordered-aggregate call would render to.
    Render {
        #[arg(short, long)]
        aggregate: String,

        #[arg(short, long)]
        column: Vec<String>,

        #[arg(short, long)]
        order_by: Option<String>,

        #[arg(long)]
        #[clap(value_enum, default_value_t = OrderDirection::Asc)]
        direction: OrderDirection,

        #[arg(short, long, requires = "group_by")]
        table: Option<String>,

        #[arg(short, long, requires = "table")]
        group_by: Option<String>,
    },
    /// List the registered aggregates.
    List,
}

#[derive(ValueEnum, Debug, Copy, Clone)]
enum OrderDirection {
    Asc,
    Desc,
}

impl From<OrderDirection> for Direction {
    fn from(direction: OrderDirection) -> Self {
        match direction {
            OrderDirection::Asc => Direction::Asc,
            OrderDirection::Desc => Direction::Desc,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let registry = Registry::with_builtins();

    match args.command {
        Commands::Run { aggregate, input } => {
            let rows = parse_rows(&fs::read_to_string(&input)?)?;
            info!(rows = rows.len(), input = %input.display(), "loaded input");

            let results = OrderedGroupedAggregator::new(&registry).run(&aggregate, &rows)?;
            for row in results {
                println!("{}\t{}", row.group, row.value);
            }
        }
        Commands::Render {
            aggregate,
            column,
            order_by,
            direction,
            table,
            group_by,
        } => {
            let mut call = OrderedCall::new(&aggregate);
            for col in &column {
                call = call.arg(col);
            }
            if let Some(order_col) = &order_by {
                call = call.order_by(order_col, direction.into());
            }

            let sql = match (&table, &group_by) {
                (Some(table), Some(group_by)) => {
                    GroupedSelect::new(table, group_by, call).to_sql()?
                }
                _ => call.to_sql()?,
            };
            println!("{sql}");
        }
        Commands::List => {
            registry.names().sorted().for_each(|name| println!("{name}"));
        }
    }

    Ok(())
}

/// One row per line, `group,sort,value`. Fields parse as int, then float,
/// and fall back to strings, so `a,1,2.5` reads as str/int/float.
fn parse_rows(text: &str) -> Result<Vec<InputRow>, Box<dyn Error>> {
    let mut rows = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((group, sort, value)) = line.splitn(3, ',').collect_tuple() else {
            return Err(format!("line {}: expected `group,sort,value`", number + 1).into());
        };
        rows.push(InputRow::new(
            parse_value(group),
            parse_value(sort),
            parse_value(value),
        ));
    }
    Ok(rows)
}

fn parse_value(field: &str) -> Value {
    let field = field.trim();
    if let Ok(v) = field.parse::<i64>() {
        return Value::Int(v);
    }
    if let Ok(v) = field.parse::<f64>() {
        return Value::Float(v);
    }
    Value::from(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_parse_with_type_fallback() {
        let rows = parse_rows("a,1,2.5\n\nb, 2, word\n").unwrap();
        assert_eq!(
            rows,
            vec![
                InputRow::new("a", 1, 2.5),
                InputRow::new("b", 2, "word"),
            ]
        );
    }

    #[test]
    fn short_lines_are_an_error() {
        assert!(parse_rows("a,1").is_err());
    }
}
