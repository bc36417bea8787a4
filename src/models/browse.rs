use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub column: String,
    pub direction: SortDirection,
}

impl Sort {
    /// Clicking the ascending column flips it to descending; anything else
    /// starts over ascending on `column`.
    pub fn toggle(current: Option<&Sort>, column: &str) -> Sort {
        let direction = match current {
            Some(sort) if sort.column == column && sort.direction == SortDirection::Asc => {
                SortDirection::Desc
            }
            _ => SortDirection::Asc,
        };
        Sort {
            column: column.to_string(),
            direction,
        }
    }
}

/// What a table view should currently display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseIntent {
    pub table: String,
    pub limit: u32,
    pub offset: u64,
    pub search_term: String,
    pub sort: Option<Sort>,
}

impl BrowseIntent {
    pub fn new(table: impl Into<String>, limit: u32) -> Self {
        Self {
            table: table.into(),
            limit,
            offset: 0,
            search_term: String::new(),
            sort: None,
        }
    }

    /// Pages are 1-based; page N starts at (N-1) * limit.
    pub fn with_page(mut self, page: u32) -> Self {
        self.offset = u64::from(page.saturating_sub(1)) * u64::from(self.limit);
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(Sort {
            column: column.into(),
            direction,
        });
        self
    }
}
