use std::collections::HashSet;

use crate::domain::tables::{Column, ForeignKeyConstraint, Index, OnDelete, Table};

pub trait MigrationStep {
    fn ctx(&self) -> &'static str;
    fn ddls(self) -> Vec<String>;
}

pub struct CreateTableStep {
    ddls: Vec<String>,
}

impl CreateTableStep {
    fn new(database_schema: &str, table: &Table) -> Self {
        let ddls = create_table_ddl(database_schema, table);
        Self { ddls }
    }
}

impl MigrationStep for CreateTableStep {
    fn ctx(&self) -> &'static str {
        "CREATE TABLE"
    }

    fn ddls(self) -> Vec<String> {
        self.ddls
    }
}

/// Returns the steps needed to bring `actual_schema` up to `needed_schema`.
/// Existing tables are left untouched.
pub fn migration_steps(
    database_schema: &str,
    needed_schema: Vec<Table>,
    actual_schema: &HashSet<String>,
) -> Vec<CreateTableStep> {
    let mut result = Vec::new();

    for table in needed_schema {
        if !actual_schema.contains(&table.name) {
            result.push(CreateTableStep::new(database_schema, &table));
        }
    }

    result
}

fn create_table_ddl(schema: &str, table: &Table) -> Vec<String> {
    let mut columns = Vec::new();
    let mut pk_columns = Vec::new();

    for column in table.columns.iter() {
        columns.push(column_ddl(column));
        if column.primary_key {
            pk_columns.push(&column.name as &str);
        }
    }

    let columns_sql = columns.join(",\n    ");
    let pk_columns_sql = pk_columns.join(",");

    let table_ddl = format!(
        "CREATE TABLE \"{}\".\"{}\" (\n    {},\n    PRIMARY KEY({})\n)",
        schema, table.name, columns_sql, pk_columns_sql
    );

    let mut ddls = vec![table_ddl];

    for fk in table.foreign_keys.iter() {
        ddls.push(create_fk_ddl(schema, fk));
    }

    for index in table.indexes.iter() {
        ddls.push(create_index_ddl(schema, index));
    }

    ddls
}

fn column_ddl(column: &Column) -> String {
    let mut sql = format!("\"{}\" {}", column.name, column.column_type);
    if column.not_null {
        sql.push_str(" NOT NULL");
    }
    if let Some(default_value) = &column.default_value {
        sql.push_str(format!(" DEFAULT {}", default_value).as_str());
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    sql
}

fn create_fk_ddl(schema: &str, fk: &ForeignKeyConstraint) -> String {
    let on_delete = match fk.on_delete {
        OnDelete::Cascade => "CASCADE",
        OnDelete::SetNull => "SET NULL",
    };
    format!(
        "ALTER TABLE \"{}\".\"{}\" ADD CONSTRAINT \"{}_{}_fkey\" FOREIGN KEY (\"{}\") REFERENCES \"{}\".\"{}\" (\"{}\") ON DELETE {}",
        schema,
        fk.table_name,
        fk.table_name,
        fk.column_name,
        fk.column_name,
        schema,
        fk.referenced_table_name,
        fk.referenced_column_name,
        on_delete
    )
}

fn create_index_ddl(schema: &str, index: &Index) -> String {
    let columns_sql = index
        .columns
        .iter()
        .map(|column| format!("\"{}\"", column))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE{} INDEX \"{}_{}_idx\" ON \"{}\".\"{}\" ({})",
        if index.unique { " UNIQUE" } else { "" },
        index.table_name,
        index.columns.join("_"),
        schema,
        index.table_name,
        columns_sql
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tables::schema_tables;

    #[test]
    fn creates_only_missing_tables() {
        let mut existing = HashSet::new();
        existing.insert("policy_documents".to_string());
        existing.insert("policy_users".to_string());

        let steps = migration_steps("public", schema_tables(), &existing);

        assert_eq!(steps.len(), schema_tables().len() - 2);
    }

    #[test]
    fn version_table_ddl_has_unique_version_index() {
        let steps = migration_steps("public", schema_tables(), &HashSet::new());
        let ddls: Vec<String> = steps.into_iter().flat_map(|s| s.ddls()).collect();

        let unique_index = ddls.iter().find(|ddl| {
            ddl.contains("policy_versions_document_id_version_idx")
        });
        assert!(unique_index.unwrap().contains("CREATE UNIQUE INDEX"));
    }

    #[test]
    fn cascade_and_set_null_foreign_keys_render() {
        let steps = migration_steps("public", schema_tables(), &HashSet::new());
        let ddls: Vec<String> = steps.into_iter().flat_map(|s| s.ddls()).collect();

        assert!(ddls.iter().any(|ddl| {
            ddl.contains("policy_versions_document_id_fkey") && ddl.contains("ON DELETE CASCADE")
        }));
        assert!(ddls.iter().any(|ddl| {
            ddl.contains("org_control_assessments_owner_user_id_fkey")
                && ddl.contains("ON DELETE SET NULL")
        }));
    }
}
