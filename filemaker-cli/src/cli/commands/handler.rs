//! Command handlers

use anyhow::{Context, Result};
use colored::*;
use filemaker_odata::{FileMaker, Operation};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Instant;

use super::{Commands, RecordsArgs};
use crate::cli::output::{self, OutputFormat, format_output};
use crate::cli::Session;

pub async fn handle_command(command: Commands, session: &Session) -> Result<()> {
    match command {
        Commands::AuthTypes => handle_auth_types(session).await,
        Commands::Metadata => {
            let fm = session.connect()?;
            let metadata = fm.metadata().await.context("Failed to fetch metadata")?;
            println!("{}", metadata);
            Ok(())
        }
        Commands::Records(args) => handle_records(&session.connect()?, args, session.format).await,
        Commands::Record { table, id } => {
            let fm = session.connect()?;
            let record: Value = fm
                .get_record(&table, &id)
                .await
                .with_context(|| format!("Failed to fetch {}('{}')", table, id))?;
            println!("{}", format_output(&record, session.format)?);
            Ok(())
        }
        Commands::Value {
            table,
            id,
            field,
            output,
        } => {
            let fm = session.connect()?;
            let bytes = fm
                .get_value(&table, &id, &field)
                .await
                .with_context(|| format!("Failed to fetch {} of {}('{}')", field, table, id))?;
            match output {
                Some(path) => {
                    fs::write(&path, &bytes)
                        .with_context(|| format!("Failed to write output to: {}", path.display()))?;
                    output::success(&format!(
                        "Wrote {} bytes to {}",
                        bytes.len(),
                        path.display().to_string().bright_green()
                    ));
                }
                None => println!("{}", String::from_utf8_lossy(&bytes)),
            }
            Ok(())
        }
        Commands::Script { name, params } => {
            handle_script(&session.connect()?, &name, params.as_deref(), session.format).await
        }
        Commands::Batch { file } => handle_batch(&session.connect()?, &file, session.format).await,
    }
}

async fn handle_auth_types(session: &Session) -> Result<()> {
    let client = session.client()?;
    let types = client
        .auth_types()
        .await
        .context("Failed to fetch authentication providers")?;
    println!("{}", format_output(&types, session.format)?);
    Ok(())
}

async fn handle_records(fm: &FileMaker, args: RecordsArgs, format: OutputFormat) -> Result<()> {
    let query = args.to_query();
    let start = Instant::now();

    if args.with_count {
        let result = fm
            .get_records_with_count::<Value>(&args.table, &query)
            .await
            .with_context(|| format!("Failed to query {}", args.table))?;
        output::status(&format!(
            "{} of {} records in {:.2}ms",
            result.value.len(),
            result.count,
            start.elapsed().as_secs_f64() * 1000.0
        ));
        println!("{}", format_output(&result, format)?);
    } else {
        let records = fm
            .get_records::<Value>(&args.table, &query)
            .await
            .with_context(|| format!("Failed to query {}", args.table))?;
        output::status(&format!(
            "{} records in {:.2}ms",
            records.len(),
            start.elapsed().as_secs_f64() * 1000.0
        ));
        println!("{}", format_output(&records, format)?);
    }
    Ok(())
}

async fn handle_script(
    fm: &FileMaker,
    name: &str,
    params: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let params = params
        .map(|raw| serde_json::from_str::<Value>(raw).context("--params is not valid JSON"))
        .transpose()?;

    let result = fm
        .script::<Value>(name, params)
        .await
        .with_context(|| format!("Failed to run script {}", name))?;

    if result.success {
        output::success(&format!("Script {} succeeded", name.cyan()));
        if let Some(data) = result.data {
            println!("{}", format_output(&data, format)?);
        }
        Ok(())
    } else {
        output::failure(&format!("Script {} reported an error", name.cyan()));
        anyhow::bail!("Script {} did not succeed", name)
    }
}

pub fn load_operations(path: &Path) -> Result<Vec<Operation>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
    parse_operations(&content).with_context(|| format!("Invalid batch file: {}", path.display()))
}

fn parse_operations(content: &str) -> Result<Vec<Operation>> {
    let operations: Vec<Operation> = serde_json::from_str(content)?;
    for operation in &operations {
        operation.validate()?;
    }
    Ok(operations)
}

async fn handle_batch(fm: &FileMaker, path: &Path, format: OutputFormat) -> Result<()> {
    let operations = load_operations(path)?;
    if operations.is_empty() {
        output::status("Batch file contains no operations");
    }

    let start = Instant::now();
    match fm.execute_batch(&operations).await {
        Ok(results) => {
            output::success(&format!(
                "Committed {} operations in {:.2}ms",
                results.len(),
                start.elapsed().as_secs_f64() * 1000.0
            ));
            println!("{}", format_output(&results, format)?);
            Ok(())
        }
        Err(err) => {
            output::failure("Batch rolled back");
            Err(err).context("Batch failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filemaker_odata::OperationKind;

    #[test]
    fn test_parse_operations() {
        let operations = parse_operations(
            r#"[
                {"create": {"table": "people", "record": {"name": "Ann"}}},
                {"update": {"table": "people", "record": {"ID": "7", "name": "Bo"}}},
                {"delete": {"table": "people", "id": "9"}}
            ]"#,
        )
        .unwrap();

        let kinds: Vec<OperationKind> = operations.iter().map(Operation::kind).collect();
        assert_eq!(
            kinds,
            vec![OperationKind::Create, OperationKind::Update, OperationKind::Delete]
        );
        assert_eq!(operations[2].table(), "people");
    }

    #[test]
    fn test_parse_operations_rejects_update_without_id() {
        let result =
            parse_operations(r#"[{"update": {"table": "people", "record": {"name": "Bo"}}}]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_operations_rejects_unknown_kind() {
        assert!(parse_operations(r#"[{"upsert": {"table": "people"}}]"#).is_err());
    }

    #[test]
    fn test_load_operations_missing_file() {
        let path = std::env::temp_dir().join("filemaker-cli-no-such-batch.json");
        let err = load_operations(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to read batch file"));
    }
}
