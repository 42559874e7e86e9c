//! Command-line definition.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use quarry::BoolKind;

use crate::condition::CliCondition;

/// Run queries against documents loaded from a JSON seed file.
///
/// Conditions are applied in the order they appear on the command line, so
/// `--where a = 1 --or-where b = 2` behaves like
/// `.where_("a", 1).or_where("b", 2)`.
#[derive(Debug, Parser)]
#[command(name = "quarry", version)]
pub struct Cli {
    /// JSON file mapping table names to arrays of documents
    #[arg(long, value_name = "FILE")]
    pub seed: Option<PathBuf>,

    /// Database name (defaults to QUARRY_DB_NAME)
    #[arg(long, value_name = "NAME")]
    pub db: Option<String>,

    /// Table to query
    #[arg(long, value_name = "NAME")]
    pub table: Option<String>,

    /// Condition joined with AND: "<field> <op> <value>"
    #[arg(long = "where", value_name = "COND")]
    pub wheres: Vec<String>,

    /// Condition joined with OR: "<field> <op> <value>"
    #[arg(long = "or-where", value_name = "COND")]
    pub or_wheres: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List matching documents
    Find {
        /// Maximum number of documents (0 for all)
        #[arg(long, default_value_t = 0)]
        limit: usize,

        #[command(flatten)]
        shape: Shape,
    },

    /// Show the first matching document
    First {
        #[command(flatten)]
        shape: Shape,
    },

    /// Count matching documents
    Count,

    /// Delete matching documents
    Delete,

    /// Set fields on matching documents
    Update {
        /// JSON object of fields to set
        #[arg(value_name = "JSON")]
        fields: String,
    },

    /// Insert a document, or an array of documents
    Insert {
        #[arg(value_name = "JSON")]
        documents: String,
    },

    /// Print the filter, projection and sort without running the query
    Explain {
        #[command(flatten)]
        shape: Shape,
    },
}

/// Projection and sort options.
#[derive(Debug, Clone, Default, Args)]
pub struct Shape {
    /// Fields to return, comma separated
    #[arg(long, value_delimiter = ',', value_name = "FIELDS")]
    pub select: Vec<String>,

    /// Fields to sort by, comma separated
    #[arg(long = "order-by", value_delimiter = ',', value_name = "FIELDS")]
    pub order_by: Vec<String>,

    /// Sort descending instead of ascending
    #[arg(long)]
    pub desc: bool,
}

/// A parsed command line with its conditions in order.
#[derive(Debug)]
pub struct Invocation {
    pub cli: Cli,
    pub conditions: Vec<CliCondition>,
}

impl Invocation {
    /// Parses the process arguments; usage errors exit the process.
    pub fn parse() -> anyhow::Result<Invocation> {
        Invocation::from_matches(&Cli::command().get_matches())
    }

    /// Parses arguments, keeping `--where` / `--or-where` interleaving.
    pub fn try_parse_from<I, T>(args: I) -> anyhow::Result<Invocation>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Invocation::from_matches(&Cli::command().try_get_matches_from(args)?)
    }

    fn from_matches(matches: &ArgMatches) -> anyhow::Result<Invocation> {
        let cli = Cli::from_arg_matches(matches)?;
        let conditions = ordered_conditions(matches)?;
        Ok(Invocation { cli, conditions })
    }
}

fn ordered_conditions(matches: &ArgMatches) -> anyhow::Result<Vec<CliCondition>> {
    let mut indexed: Vec<(usize, BoolKind, &String)> = Vec::new();
    for (id, kind) in [("wheres", BoolKind::And), ("or_wheres", BoolKind::Or)] {
        if let (Some(indices), Some(values)) =
            (matches.indices_of(id), matches.get_many::<String>(id))
        {
            indexed.extend(indices.zip(values).map(|(i, v)| (i, kind, v)));
        }
    }
    indexed.sort_by_key(|(index, _, _)| *index);
    indexed
        .into_iter()
        .map(|(_, kind, expr)| CliCondition::parse(kind, expr))
        .collect()
}
