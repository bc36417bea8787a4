use std::time::Duration;

use tokio::sync::mpsc;

use crate::{
    config::{Config, DEFAULT_SEARCH_DEBOUNCE_MS},
    debounce::Debouncer,
    edit_log::EditLog,
    errors::DbError,
    export::row_to_json,
    introspect,
    models::{
        browse::{BrowseIntent, Sort},
        query::{CellValue, QueryResult},
        schema::{ColumnInfo, TableInfo},
    },
    session::Session,
    sql::{
        browse::{self, BrowsePage},
        update::{build_update, CellEdit},
    },
};

/// What is currently shown for the selected table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    pub search_term: String,
    pub sort: Option<Sort>,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
    pub result: Option<QueryResult>,
    pub total_rows: u64,
}

impl TableView {
    fn new(table: &str, page_size: u32) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            search_term: String::new(),
            sort: None,
            page: 1,
            page_size,
            result: None,
            total_rows: 0,
        }
    }

    pub fn intent(&self) -> BrowseIntent {
        BrowseIntent {
            table: self.table.clone(),
            limit: self.page_size,
            offset: 0,
            search_term: self.search_term.clone(),
            sort: self.sort.clone(),
        }
        .with_page(self.page)
    }

    pub fn total_pages(&self) -> u32 {
        let pages = self.total_rows.div_ceil(u64::from(self.page_size.max(1)));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }
}

/// Identifies one issued browse fetch. Only the most recent ticket may write
/// its result into the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// Browse state for one loaded database: table list, current view, edit log.
pub struct Explorer {
    session: Session,
    page_size: u32,
    search_debounce: Duration,
    tables: Vec<TableInfo>,
    view: Option<TableView>,
    edit_log: EditLog,
    last_ticket: u64,
}

impl Explorer {
    pub fn new(config: &Config) -> Self {
        let mut explorer =
            Self::with_session(Session::new(config.engine.clone()), config.page_size);
        explorer.search_debounce = config.search_debounce();
        explorer
    }

    pub fn with_session(session: Session, page_size: u32) -> Self {
        Explorer {
            session,
            page_size: page_size.max(1),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            tables: Vec::new(),
            view: None,
            edit_log: EditLog::new(),
            last_ticket: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn tables(&self) -> &[TableInfo] {
        &self.tables
    }

    pub fn view(&self) -> Option<&TableView> {
        self.view.as_ref()
    }

    pub fn edit_log(&self) -> &EditLog {
        &self.edit_log
    }

    /// A debouncer for search keystrokes using the configured quiet period.
    /// Feed each received term to [`Self::search`].
    pub fn search_debouncer(&self) -> (Debouncer<String>, mpsc::UnboundedReceiver<String>) {
        Debouncer::new(self.search_debounce)
    }

    pub fn clear_edit_log(&mut self) {
        self.edit_log.clear();
    }

    /// Replaces the open database. Nothing from the previous database is
    /// carried over; on failure no new state is adopted.
    ///
    /// A failure to fetch the first table does not fail the load; the view is
    /// left selected with no rows.
    pub async fn load(&mut self, image: &[u8]) -> Result<(), DbError> {
        self.session.load(image).await?;

        self.edit_log.clear();
        self.view = None;
        self.tables = introspect::list_tables(&self.session).await?;

        if let Some(first) = self.tables.first().map(|t| t.name.clone()) {
            if let Err(e) = self.select_table(&first).await {
                log::warn!("loaded database but could not browse {}: {}", first, e);
            }
        }
        Ok(())
    }

    /// Re-scans the catalog, e.g. after DDL run through [`Self::run_query`].
    pub async fn refresh_tables(&mut self) -> Result<(), DbError> {
        self.tables = introspect::list_tables(&self.session).await?;
        Ok(())
    }

    pub async fn select_table(&mut self, table: &str) -> Result<(), DbError> {
        self.view = Some(TableView::new(table, self.page_size));
        self.refresh().await
    }

    pub async fn search(&mut self, term: &str) -> Result<(), DbError> {
        let view = self.view.as_mut().ok_or(DbError::NotReady)?;
        view.search_term = term.to_string();
        view.page = 1;
        self.refresh().await
    }

    pub async fn sort(&mut self, column: &str) -> Result<(), DbError> {
        let view = self.view.as_mut().ok_or(DbError::NotReady)?;
        view.sort = Some(Sort::toggle(view.sort.as_ref(), column));
        view.page = 1;
        self.refresh().await
    }

    /// Moves to `page`, clamped to the pages that exist.
    pub async fn goto_page(&mut self, page: u32) -> Result<(), DbError> {
        let view = self.view.as_mut().ok_or(DbError::NotReady)?;
        view.page = page.clamp(1, view.total_pages().max(1));
        self.refresh().await
    }

    pub async fn next_page(&mut self) -> Result<(), DbError> {
        let page = self.current_page()?;
        self.goto_page(page.saturating_add(1)).await
    }

    pub async fn prev_page(&mut self) -> Result<(), DbError> {
        let page = self.current_page()?;
        self.goto_page(page.saturating_sub(1)).await
    }

    fn current_page(&self) -> Result<u32, DbError> {
        self.view.as_ref().map(|v| v.page).ok_or(DbError::NotReady)
    }

    /// Re-runs the current intent.
    pub async fn refresh(&mut self) -> Result<(), DbError> {
        let (ticket, intent) = self.begin_fetch()?;
        let outcome = browse::fetch(&self.session, &intent).await;
        self.complete_fetch(ticket, outcome).map(|_| ())
    }

    /// Issues a new ticket for the current intent. Any ticket issued earlier
    /// becomes stale.
    pub fn begin_fetch(&mut self) -> Result<(FetchTicket, BrowseIntent), DbError> {
        let view = self.view.as_ref().ok_or(DbError::NotReady)?;
        self.last_ticket += 1;
        Ok((FetchTicket(self.last_ticket), view.intent()))
    }

    /// Applies a finished fetch if `ticket` is still the latest. Returns
    /// whether the view was updated; stale outcomes are dropped, errors
    /// included.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<BrowsePage, DbError>,
    ) -> Result<bool, DbError> {
        if ticket.0 != self.last_ticket {
            log::debug!("discarding stale fetch {:?}", ticket);
            return Ok(false);
        }
        let view = self.view.as_mut().ok_or(DbError::NotReady)?;

        match outcome {
            Ok(page) => {
                view.columns = page.columns;
                view.result = Some(page.result);
                view.total_rows = page.total_rows;
                Ok(true)
            }
            Err(e) => {
                log::error!("failed to fetch {}: {}", view.table, e);
                view.result = None;
                view.total_rows = 0;
                Err(e)
            }
        }
    }

    /// Writes one cell. On success the statement is logged and the view is
    /// refetched with unchanged search, sort and page. On failure nothing is
    /// logged and the view keeps its pre-edit rows.
    pub async fn edit_cell(&mut self, edit: &CellEdit) -> Result<String, DbError> {
        let statement = {
            let table = self.table_info(&edit.table).await?;
            build_update(
                &table,
                &edit.column,
                &edit.new_value,
                &edit.row,
                &edit.row_columns,
            )?
        };

        self.session.execute(&statement).await.map_err(|e| match e {
            DbError::Query(message) => DbError::Edit(message),
            other => other,
        })?;

        log::info!("applied edit: {}", statement);
        self.edit_log.append(statement.clone());

        // The edit is committed; a failed refetch only leaves the view empty.
        if self.view.is_some() {
            if let Err(e) = self.refresh().await {
                log::warn!("edit applied but refetch failed: {}", e);
            }
        }
        Ok(statement)
    }

    /// Edits cell `column` of the displayed row at `row_index`.
    pub async fn edit_displayed_cell(
        &mut self,
        row_index: usize,
        column: &str,
        new_value: CellValue,
    ) -> Result<String, DbError> {
        let view = self.view.as_ref().ok_or(DbError::NotReady)?;
        let result = view.result.as_ref().ok_or(DbError::NotReady)?;
        let row = result
            .values
            .get(row_index)
            .ok_or_else(|| DbError::Edit(format!("no row {} on this page", row_index)))?;

        let edit = CellEdit {
            table: view.table.clone(),
            column: column.to_string(),
            new_value,
            row: row.clone(),
            row_columns: result.columns.clone(),
        };
        self.edit_cell(&edit).await
    }

    /// The scanned metadata for `table`, falling back to a fresh column
    /// lookup when the table is not in the last scan.
    async fn table_info(&self, table: &str) -> Result<TableInfo, DbError> {
        if let Some(info) = self.tables.iter().find(|t| t.name == table) {
            return Ok(info.clone());
        }
        if !self.session.is_loaded() {
            return Err(DbError::NotReady);
        }
        Ok(TableInfo {
            name: table.to_string(),
            schema: String::new(),
            row_count: 0,
            columns: introspect::get_columns(&self.session, table).await,
            foreign_keys: Vec::new(),
        })
    }

    /// Ad-hoc SQL; not recorded in the edit log.
    pub async fn run_query(&self, sql: &str) -> Result<QueryResult, DbError> {
        self.session.execute(sql).await
    }

    pub async fn export(&self) -> Result<Option<Vec<u8>>, DbError> {
        self.session.export().await
    }

    pub async fn schema_script(&self) -> Result<String, DbError> {
        introspect::schema_script(&self.session).await
    }

    /// A displayed row as pretty-printed JSON.
    pub fn row_as_json(&self, row_index: usize) -> Option<String> {
        let result = self.view.as_ref()?.result.as_ref()?;
        let row = result.values.get(row_index)?;
        serde_json::to_string_pretty(&row_to_json(&result.columns, row)).ok()
    }
}
