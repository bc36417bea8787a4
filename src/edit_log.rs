use serde::{Deserialize, Serialize};

/// Append-only record of every mutation executed in this session, in
/// execution order. Purely observational.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditLog {
    statements: Vec<String>,
}

impl EditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, statement: impl Into<String>) {
        self.statements.push(statement.into());
    }

    pub fn all(&self) -> &[String] {
        &self.statements
    }

    pub fn clear(&mut self) {
        self.statements.clear();
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// The log as a SQL script, one statement per line.
    pub fn to_script(&self) -> String {
        let mut script = self.statements.join("\n");
        if !script.is_empty() {
            script.push('\n');
        }
        script
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_order_and_duplicates() {
        let mut log = EditLog::new();
        log.append("UPDATE \"t\" SET \"a\" = '1' WHERE \"id\" = '1';");
        log.append("UPDATE \"t\" SET \"a\" = '2' WHERE \"id\" = '1';");
        log.append("UPDATE \"t\" SET \"a\" = '1' WHERE \"id\" = '1';");

        assert_eq!(log.len(), 3);
        assert_eq!(log.all()[0], log.all()[2]);
        assert!(log.all()[1].contains("'2'"));
    }

    #[test]
    fn test_clear() {
        let mut log = EditLog::new();
        log.append("UPDATE x;");
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.to_script(), "");
    }

    #[test]
    fn test_script() {
        let mut log = EditLog::new();
        log.append("UPDATE a;");
        log.append("UPDATE b;");
        assert_eq!(log.to_script(), "UPDATE a;\nUPDATE b;\n");
    }
}
