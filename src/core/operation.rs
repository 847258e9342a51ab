//! Operation Model
//!
//! Every statement a session runs becomes an [`Operation`]: the raw text
//! plus the command tag interceptors match on (`SELECT`, `DROP TABLE`,
//! `START TRANSACTION`, ...).

use serde::Serialize;

use super::error::{CoreError, CoreResult};

/// Tags that open a transaction block
const TRANSACTION_START_TAGS: [&str; 2] = ["BEGIN", "START TRANSACTION"];

/// Words between CREATE/DROP/ALTER and the object kind
const OBJECT_MODIFIERS: [&str; 6] = ["OR", "REPLACE", "UNIQUE", "TEMP", "TEMPORARY", "UNLOGGED"];

/// Transaction-control statements the session acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionControl {
    Begin,
    Commit,
    Rollback,
}

/// One unit the host is about to execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    tag: String,
    statement: String,
}

impl Operation {
    /// Derive the command tag from statement text
    pub fn parse(statement: &str) -> CoreResult<Self> {
        let words: Vec<String> = statement
            .split_whitespace()
            .map(|w| w.trim_end_matches(';').to_ascii_uppercase())
            .filter(|w| !w.is_empty())
            .collect();

        let first = words
            .first()
            .ok_or_else(|| CoreError::validation("empty statement"))?;
        let second = words.get(1).map(String::as_str);

        let tag = match first.as_str() {
            "CREATE" | "DROP" | "ALTER" => {
                let mut rest = words[1..]
                    .iter()
                    .map(String::as_str)
                    .skip_while(|w| OBJECT_MODIFIERS.contains(w));
                match (rest.next(), rest.next()) {
                    (Some("MATERIALIZED"), Some("VIEW")) => format!("{} MATERIALIZED VIEW", first),
                    (Some(object), _) => format!("{} {}", first, object),
                    (None, _) => first.clone(),
                }
            }
            "START" if second == Some("TRANSACTION") => "START TRANSACTION".to_string(),
            "TRUNCATE" => "TRUNCATE TABLE".to_string(),
            "END" => "COMMIT".to_string(),
            "ABORT" => "ROLLBACK".to_string(),
            _ => first.clone(),
        };

        Ok(Self {
            tag,
            statement: statement.trim().to_string(),
        })
    }

    /// Command tag, upper case
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Statement text as submitted
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Whether this statement opens a transaction block
    pub fn is_transaction_start(&self) -> bool {
        TRANSACTION_START_TAGS
            .iter()
            .any(|t| self.tag.eq_ignore_ascii_case(t))
    }

    /// Transaction control carried by this statement, if any
    pub fn transaction_control(&self) -> Option<TransactionControl> {
        if self.is_transaction_start() {
            return Some(TransactionControl::Begin);
        }
        match self.tag.as_str() {
            "COMMIT" => Some(TransactionControl::Commit),
            "ROLLBACK" => Some(TransactionControl::Rollback),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(statement: &str) -> String {
        Operation::parse(statement).unwrap().tag().to_string()
    }

    #[test]
    fn test_single_word_tags() {
        assert_eq!(tag("SELECT 1"), "SELECT");
        assert_eq!(tag("  insert into t values (1)"), "INSERT");
        assert_eq!(tag("commit;"), "COMMIT");
    }

    #[test]
    fn test_object_tags() {
        assert_eq!(tag("DROP TABLE x"), "DROP TABLE");
        assert_eq!(tag("create unique index i on t (a)"), "CREATE INDEX");
        assert_eq!(tag("CREATE OR REPLACE VIEW v AS SELECT 1"), "CREATE VIEW");
        assert_eq!(tag("drop materialized view mv"), "DROP MATERIALIZED VIEW");
        assert_eq!(tag("TRUNCATE t"), "TRUNCATE TABLE");
    }

    #[test]
    fn test_transaction_tags() {
        assert!(Operation::parse("begin").unwrap().is_transaction_start());
        assert!(Operation::parse("START TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .unwrap()
            .is_transaction_start());
        assert_eq!(tag("END"), "COMMIT");
        assert_eq!(tag("abort"), "ROLLBACK");
        assert_eq!(
            Operation::parse("ROLLBACK").unwrap().transaction_control(),
            Some(TransactionControl::Rollback)
        );
        assert_eq!(Operation::parse("SELECT 1").unwrap().transaction_control(), None);
    }

    #[test]
    fn test_empty_statement_rejected() {
        assert!(matches!(Operation::parse("   "), Err(CoreError::Validation(_))));
        assert!(matches!(Operation::parse(";"), Err(CoreError::Validation(_))));
    }
}
