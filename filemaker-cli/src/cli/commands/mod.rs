//! Subcommand definitions

pub mod handler;

use clap::{Args, Subcommand};
use filemaker_odata::{OrderBy, Query};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the OData service metadata document
    Metadata,

    /// List records of a table
    Records(RecordsArgs),

    /// Fetch one record by ID
    Record {
        table: String,
        id: String,
    },

    /// Fetch the raw value of a single field (containers included)
    Value {
        table: String,
        id: String,
        field: String,
        /// Write the bytes to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a FileMaker script
    Script {
        name: String,
        /// Script parameter as JSON
        #[arg(long)]
        params: Option<String>,
    },

    /// Run a JSON file of create/update/delete operations as one transaction
    Batch {
        /// JSON array, e.g. `[{"delete": {"table": "people", "id": "1"}}]`
        file: PathBuf,
    },

    /// List the authentication providers the server accepts
    AuthTypes,
}

#[derive(Args, Debug, Default)]
pub struct RecordsArgs {
    pub table: String,

    /// Fields to return, comma separated
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,

    #[arg(long)]
    pub top: Option<u64>,

    #[arg(long)]
    pub skip: Option<u64>,

    /// OData filter expression, e.g. "name eq 'Ann'"
    #[arg(long)]
    pub filter: Option<String>,

    #[arg(long)]
    pub expand: Option<String>,

    /// Sort key, "field" or "field desc"; repeat for more keys
    #[arg(long)]
    pub orderby: Vec<OrderBy>,

    /// Also report the total number of matching records
    #[arg(long)]
    pub with_count: bool,
}

impl RecordsArgs {
    pub fn to_query(&self) -> Query {
        let mut builder = Query::builder();
        if !self.select.is_empty() {
            builder = builder.select(self.select.iter().cloned());
        }
        if let Some(top) = self.top {
            builder = builder.top(top);
        }
        if let Some(skip) = self.skip {
            builder = builder.skip(skip);
        }
        if let Some(filter) = &self.filter {
            builder = builder.filter(filter.clone());
        }
        if let Some(expand) = &self.expand {
            builder = builder.expand(expand.clone());
        }
        for key in &self.orderby {
            builder = builder.orderby(key.field.clone(), key.direction);
        }
        builder.build()
    }
}
