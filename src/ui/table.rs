use tabled::{Table, Tabled, settings::Style};
use crate::storage::DbStats;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
pub struct DatabaseRow {
    #[tabled(rename = "Database")]
    pub name: String,
    #[tabled(rename = "Default")]
    pub default: String,
    #[tabled(rename = "File")]
    pub file: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: impl ToString) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &DbStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Molecules", stats.molecules);
    builder.add_row("Names", stats.names);
    builder.add_row("Retention times", stats.retention_times);
    builder.add_row("Storage units", stats.storage_units);
    builder.add_row("Stored molecules", stats.storage_links);
    builder.build()
}

pub fn databases_table(rows: Vec<DatabaseRow>) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_table_lists_every_relation() {
        let stats = DbStats {
            molecules: 3,
            names: 5,
            retention_times: 7,
            storage_units: 1,
            storage_links: 2,
        };
        let table = stats_table(&stats);
        assert!(table.contains("Molecules"));
        assert!(table.contains("Stored molecules"));
        assert!(table.contains('7'));
    }

    #[test]
    fn test_empty_tables() {
        assert!(TableBuilder::new().build().is_empty());
        assert!(databases_table(Vec::new()).is_empty());
    }
}
