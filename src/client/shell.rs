use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    errors::DbError,
    explorer::Explorer,
    export::{self, write_delimited},
    models::query::{CellValue, QueryResult},
};

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Open(String),
    Tables,
    Schema,
    Browse(String),
    Search(String),
    Sort(String),
    Page(u32),
    Next,
    Prev,
    Edit {
        row: usize,
        column: String,
        value: CellValue,
    },
    Row(usize),
    Log,
    Export(String),
    Csv(String),
    Sql(String),
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if !line.starts_with('.') {
            return Ok(Some(Command::Sql(line.to_string())));
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let required = |what: &str| -> Result<String, String> {
            if rest.is_empty() {
                Err(format!("{} expects {}", name, what))
            } else {
                Ok(rest.to_string())
            }
        };

        let command = match name {
            ".open" => Command::Open(required("a file path")?),
            ".tables" => Command::Tables,
            ".schema" => Command::Schema,
            ".browse" => Command::Browse(required("a table name")?),
            // An empty term clears the search.
            ".search" => Command::Search(rest.to_string()),
            ".sort" => Command::Sort(required("a column name")?),
            ".page" => {
                let raw = required("a page number")?;
                Command::Page(parse_number(name, &raw, "a page number")?)
            }
            ".next" => Command::Next,
            ".prev" => Command::Prev,
            ".edit" => {
                let mut parts = rest.splitn(3, char::is_whitespace);
                let usage = || ".edit expects <row> <column> <value|NULL>".to_string();
                let row = parts
                    .next()
                    .and_then(|r| r.parse().ok())
                    .ok_or_else(usage)?;
                let column = parts.next().filter(|c| !c.is_empty()).ok_or_else(usage)?;
                let value = match parts.next().map(str::trim) {
                    None | Some("NULL") => CellValue::Null,
                    Some(text) => CellValue::Text(text.to_string()),
                };
                Command::Edit {
                    row,
                    column: column.to_string(),
                    value,
                }
            }
            ".row" => {
                let raw = required("a row index")?;
                Command::Row(parse_number(name, &raw, "a row index")?)
            }
            ".log" => Command::Log,
            ".export" => Command::Export(required("a file path")?),
            ".csv" => Command::Csv(required("a file path")?),
            ".help" => Command::Help,
            ".quit" | ".exit" => Command::Quit,
            other => return Err(format!("unknown command {}", other)),
        };
        Ok(Some(command))
    }
}

fn parse_number<T: FromStr>(command: &str, raw: &str, what: &str) -> Result<T, String> {
    raw.parse()
        .map_err(|_| format!("{} expects {}", command, what))
}

const HELP: &str = "\
.open <path>                 load a database file
.tables                      list tables with row counts
.schema                      print every table's DDL
.browse <table>              show the first page of a table
.search [term]               filter the current table on every column
.sort <column>               sort ascending, again for descending
.page <n> | .next | .prev    move between pages
.edit <row> <column> <value|NULL>
                             write one cell of the displayed page
.row <n>                     print a displayed row as JSON
.log                         print executed edits as SQL
.export <path>               write the database to a file
.csv <path>                  write the current table to CSV
.quit                        leave
anything else is run as SQL";

/// Reads commands from stdin until EOF or `.quit`.
pub async fn run(explorer: &mut Explorer) -> Result<(), DbError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => {
                if let Err(e) = dispatch(explorer, command).await {
                    eprintln!("error: {}", e);
                }
            }
            Ok(None) => {}
            Err(message) => eprintln!("{}", message),
        }
        prompt()?;
    }
    Ok(())
}

fn prompt() -> Result<(), DbError> {
    let mut stdout = io::stdout();
    write!(stdout, "dlens> ")?;
    stdout.flush()?;
    Ok(())
}

pub async fn open_file(explorer: &mut Explorer, path: &Path) -> Result<(), DbError> {
    let image = tokio::fs::read(path)
        .await
        .map_err(|e| DbError::Load(format!("{}: {}", path.display(), e)))?;
    explorer.load(&image).await?;
    println!(
        "opened {} ({} tables)",
        path.display(),
        explorer.tables().len()
    );
    Ok(())
}

async fn dispatch(explorer: &mut Explorer, command: Command) -> Result<(), DbError> {
    match command {
        Command::Open(path) => {
            open_file(explorer, Path::new(&path)).await?;
            print_view(explorer)?;
        }
        Command::Tables => {
            for table in explorer.tables() {
                println!("{}\t{} rows", table.name, table.row_count);
            }
        }
        Command::Schema => println!("{}", explorer.schema_script().await?),
        Command::Browse(table) => {
            explorer.select_table(&table).await?;
            print_view(explorer)?;
        }
        Command::Search(term) => {
            explorer.search(&term).await?;
            print_view(explorer)?;
        }
        Command::Sort(column) => {
            explorer.sort(&column).await?;
            print_view(explorer)?;
        }
        Command::Page(page) => {
            explorer.goto_page(page).await?;
            print_view(explorer)?;
        }
        Command::Next => {
            explorer.next_page().await?;
            print_view(explorer)?;
        }
        Command::Prev => {
            explorer.prev_page().await?;
            print_view(explorer)?;
        }
        Command::Edit { row, column, value } => {
            let statement = explorer.edit_displayed_cell(row, &column, value).await?;
            println!("{}", statement);
            print_view(explorer)?;
        }
        Command::Row(index) => match explorer.row_as_json(index) {
            Some(json) => println!("{}", json),
            None => eprintln!("no row {} on this page", index),
        },
        Command::Log => print!("{}", explorer.edit_log().to_script()),
        Command::Export(path) => {
            let bytes = explorer.export().await?.ok_or(DbError::NotReady)?;
            tokio::fs::write(&path, &bytes)
                .await
                .map_err(|e| DbError::Export(e.to_string()))?;
            println!("wrote {} bytes to {}", bytes.len(), path);
        }
        Command::Csv(path) => {
            let table = explorer
                .view()
                .map(|v| v.table.clone())
                .ok_or(DbError::NotReady)?;
            export::export_table_csv(explorer.session(), &table, &path).await?;
            println!("wrote {} to {}", table, path);
        }
        Command::Sql(sql) => {
            let result = explorer.run_query(&sql).await?;
            print_result(&result)?;
            if let Some(elapsed) = result.execution_time {
                println!("({} rows, {:.2?})", result.values.len(), elapsed);
            }
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}

fn print_view(explorer: &Explorer) -> Result<(), DbError> {
    let Some(view) = explorer.view() else {
        println!("no table selected");
        return Ok(());
    };
    if let Some(result) = &view.result {
        print_result(result)?;
    }
    println!(
        "{}: page {} of {} ({} rows)",
        view.table,
        view.page,
        view.total_pages().max(1),
        view.total_rows
    );
    Ok(())
}

fn print_result(result: &QueryResult) -> Result<(), DbError> {
    write_delimited(result, io::stdout().lock(), b'\t')
}
