use serde::Serialize;

use crate::{
    errors::DbError,
    introspect::{self, first_count},
    models::{browse::BrowseIntent, query::QueryResult, schema::ColumnInfo},
    session::Session,
};

use super::{contains_predicate, escape_like, quote_ident};

/// The data query and its matching count query for one browse intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseQuery {
    pub data_query: String,
    pub count_query: String,
}

/// One page of a table plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowsePage {
    pub columns: Vec<ColumnInfo>,
    pub result: QueryResult,
    pub total_rows: u64,
}

pub fn build(intent: &BrowseIntent, columns: &[ColumnInfo]) -> BrowseQuery {
    let table = quote_ident(&intent.table);
    let mut data_query = format!("SELECT * FROM {}", table);
    let mut count_query = format!("SELECT COUNT(*) AS count FROM {}", table);

    if let Some(filter) = search_filter(&intent.search_term, columns) {
        data_query.push_str(&filter);
        count_query.push_str(&filter);
    }

    if let Some(sort) = &intent.sort {
        data_query.push_str(&format!(
            " ORDER BY {} {}",
            quote_ident(&sort.column),
            sort.direction
        ));
    }

    data_query.push_str(&format!(" LIMIT {} OFFSET {}", intent.limit, intent.offset));

    BrowseQuery {
        data_query,
        count_query,
    }
}

/// ` WHERE ...` matching the term against every column, or `None` when there
/// is nothing to filter on.
fn search_filter(term: &str, columns: &[ColumnInfo]) -> Option<String> {
    let term = term.trim();
    if term.is_empty() || columns.is_empty() {
        return None;
    }
    let escaped = escape_like(term);
    let clause = columns
        .iter()
        .map(|c| contains_predicate(&c.name, &escaped))
        .collect::<Vec<_>>()
        .join(" OR ");
    Some(format!(" WHERE {}", clause))
}

/// Runs the count query, then the data query. A failed count degrades to 0
/// so the table stays browsable.
pub async fn fetch(session: &Session, intent: &BrowseIntent) -> Result<BrowsePage, DbError> {
    let columns = introspect::get_columns(session, &intent.table).await;
    let query = build(intent, &columns);

    let total_rows = match session.execute(&query.count_query).await {
        Ok(result) => first_count(&result),
        Err(e) => {
            log::warn!("count query failed for {}: {}", intent.table, e);
            0
        }
    };

    let result = session.execute(&query.data_query).await?;

    Ok(BrowsePage {
        columns,
        result,
        total_rows,
    })
}
