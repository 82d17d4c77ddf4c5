/// Represents table in a database, used for ddl generation
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKeyConstraint>,
    pub indexes: Vec<Index>,
}

/// Represents one column in the database table
pub struct Column {
    pub name: String,
    pub column_type: String,
    pub not_null: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub default_value: Option<String>,
}

/// Represents foreign key constraint in the database table
pub struct ForeignKeyConstraint {
    pub table_name: String,
    pub column_name: String,
    pub referenced_table_name: String,
    pub referenced_column_name: String,
    pub on_delete: OnDelete,
}

#[derive(Clone, Copy)]
pub enum OnDelete {
    Cascade,
    SetNull,
}

/// Represents an index in the database table
pub struct Index {
    pub table_name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl Table {
    pub fn new(
        name: String,
        columns: Vec<Column>,
        foreign_keys: Vec<ForeignKeyConstraint>,
        indexes: Vec<Index>,
    ) -> Self {
        Self {
            name,
            columns,
            foreign_keys,
            indexes,
        }
    }
}

impl Column {
    pub fn new<T: Into<String>>(
        name: T,
        column_type: T,
        not_null: bool,
        unique: bool,
        default_value: Option<T>,
    ) -> Self {
        let primary_key = false;
        Self {
            name: name.into(),
            column_type: column_type.into(),
            not_null,
            unique,
            primary_key,
            default_value: default_value.map(T::into),
        }
    }

    pub fn primary_key<T: Into<String>>(name: T, column_type: T) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            not_null: false,
            unique: false,
            primary_key: true,
            default_value: None,
        }
    }
}

impl ForeignKeyConstraint {
    pub fn new<T: Into<String>>(
        table_name: T,
        column_name: T,
        referenced_table_name: T,
        referenced_column_name: T,
        on_delete: OnDelete,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            referenced_table_name: referenced_table_name.into(),
            referenced_column_name: referenced_column_name.into(),
            on_delete,
        }
    }
}

impl Index {
    pub fn new<T: Into<String>>(table_name: T, columns: Vec<T>, unique: bool) -> Self {
        Self {
            table_name: table_name.into(),
            columns: columns.into_iter().map(T::into).collect(),
            unique,
        }
    }
}

/// The fixed policyforge schema, sorted conform dependency order.
pub fn schema_tables() -> Vec<Table> {
    vec![
        policy_users(),
        policy_documents(),
        policy_versions(),
        policy_comments(),
        policy_approvals(),
        policy_document_owners(),
        policy_notifications(),
        policy_templates(),
        org_control_assessments(),
    ]
}

fn policy_users() -> Table {
    let columns = vec![
        Column::primary_key("id", "BIGSERIAL"),
        Column::new("email", "TEXT", true, true, None),
        Column::new("name", "TEXT", false, false, None),
        Column::new("org_id", "BIGINT", false, false, None),
        Column::new("role", "TEXT", true, false, Some("'viewer'")),
        Column::new("created_at", "TIMESTAMPTZ", true, false, Some("now()")),
    ];
    Table::new(
        "policy_users".to_string(),
        columns,
        Vec::new(),
        vec![Index::new("policy_users", vec!["email"], true)],
    )
}

fn policy_documents() -> Table {
    let columns = vec![
        Column::primary_key("id", "BIGSERIAL"),
        Column::new("org_id", "BIGINT", false, false, None),
        Column::new("template_key", "TEXT", true, false, None),
        Column::new("title", "TEXT", true, false, None),
        Column::new("status", "TEXT", true, false, Some("'draft'")),
        // high-water mark for version assignment; never decreases
        Column::new("last_version", "BIGINT", true, false, Some("0")),
        Column::new("created_at", "TIMESTAMPTZ", true, false, Some("now()")),
        Column::new("updated_at", "TIMESTAMPTZ", true, false, Some("now()")),
    ];
    Table::new(
        "policy_documents".to_string(),
        columns,
        Vec::new(),
        vec![
            Index::new("policy_documents", vec!["template_key"], false),
            Index::new("policy_documents", vec!["status"], false),
        ],
    )
}

fn policy_versions() -> Table {
    let columns = vec![
        Column::primary_key("id", "BIGSERIAL"),
        Column::new("document_id", "BIGINT", true, false, None),
        Column::new("version", "BIGINT", true, false, None),
        Column::new("html", "TEXT", true, false, None),
        Column::new("params", "JSONB", true, false, None),
        Column::new("created_at", "TIMESTAMPTZ", true, false, Some("now()")),
    ];
    Table::new(
        "policy_versions".to_string(),
        columns,
        vec![ForeignKeyConstraint::new(
            "policy_versions",
            "document_id",
            "policy_documents",
            "id",
            OnDelete::Cascade,
        )],
        vec![
            Index::new("policy_versions", vec!["document_id"], false),
            // version numbers are assigned once and never reused
            Index::new("policy_versions", vec!["document_id", "version"], true),
        ],
    )
}

fn policy_comments() -> Table {
    let columns = vec![
        Column::primary_key("id", "BIGSERIAL"),
        Column::new("document_id", "BIGINT", true, false, None),
        Column::new("version", "BIGINT", false, false, None),
        Column::new("author", "TEXT", true, false, None),
        Column::new("body", "TEXT", true, false, None),
        Column::new("created_at", "TIMESTAMPTZ", true, false, Some("now()")),
    ];
    Table::new(
        "policy_comments".to_string(),
        columns,
        vec![ForeignKeyConstraint::new(
            "policy_comments",
            "document_id",
            "policy_documents",
            "id",
            OnDelete::Cascade,
        )],
        vec![Index::new("policy_comments", vec!["document_id"], false)],
    )
}

fn policy_approvals() -> Table {
    let columns = vec![
        Column::primary_key("id", "BIGSERIAL"),
        Column::new("document_id", "BIGINT", true, false, None),
        Column::new("version", "BIGINT", false, false, None),
        Column::new("reviewer", "TEXT", true, false, None),
        Column::new("status", "TEXT", true, false, Some("'pending'")),
        Column::new("note", "TEXT", false, false, None),
        Column::new("requested_at", "TIMESTAMPTZ", true, false, Some("now()")),
        Column::new("decided_at", "TIMESTAMPTZ", false, false, None),
    ];
    Table::new(
        "policy_approvals".to_string(),
        columns,
        vec![ForeignKeyConstraint::new(
            "policy_approvals",
            "document_id",
            "policy_documents",
            "id",
            OnDelete::Cascade,
        )],
        vec![
            Index::new("policy_approvals", vec!["document_id"], false),
            Index::new("policy_approvals", vec!["status"], false),
        ],
    )
}

fn policy_document_owners() -> Table {
    let columns = vec![
        Column::primary_key("id", "BIGSERIAL"),
        Column::new("document_id", "BIGINT", true, false, None),
        Column::new("user_id", "BIGINT", true, false, None),
        Column::new("role", "TEXT", true, false, Some("'owner'")),
    ];
    Table::new(
        "policy_document_owners".to_string(),
        columns,
        vec![
            ForeignKeyConstraint::new(
                "policy_document_owners",
                "document_id",
                "policy_documents",
                "id",
                OnDelete::Cascade,
            ),
            ForeignKeyConstraint::new(
                "policy_document_owners",
                "user_id",
                "policy_users",
                "id",
                OnDelete::Cascade,
            ),
        ],
        vec![
            Index::new("policy_document_owners", vec!["document_id", "user_id"], true),
        ],
    )
}

fn policy_notifications() -> Table {
    let columns = vec![
        Column::primary_key("id", "BIGSERIAL"),
        Column::new("target_email", "TEXT", true, false, None),
        Column::new("type", "TEXT", true, false, None),
        Column::new("message", "TEXT", true, false, None),
        Column::new("document_id", "BIGINT", false, false, None),
        Column::new("version", "BIGINT", false, false, None),
        Column::new("approval_id", "BIGINT", false, false, None),
        Column::new("created_at", "TIMESTAMPTZ", true, false, Some("now()")),
        Column::new("read_at", "TIMESTAMPTZ", false, false, None),
    ];
    Table::new(
        "policy_notifications".to_string(),
        columns,
        Vec::new(),
        vec![Index::new("policy_notifications", vec!["target_email"], false)],
    )
}

fn policy_templates() -> Table {
    let columns = vec![
        Column::primary_key("key", "TEXT"),
        Column::new("title", "TEXT", true, false, None),
        Column::new("body", "TEXT", true, false, None),
        Column::new("parameters", "JSONB", true, false, None),
        Column::new("created_at", "TIMESTAMPTZ", true, false, Some("now()")),
        Column::new("updated_at", "TIMESTAMPTZ", true, false, Some("now()")),
    ];
    Table::new("policy_templates".to_string(), columns, Vec::new(), Vec::new())
}

fn org_control_assessments() -> Table {
    let columns = vec![
        Column::primary_key("id", "BIGSERIAL"),
        Column::new("org_id", "BIGINT", true, false, Some("1")),
        Column::new("framework_key", "TEXT", true, false, None),
        Column::new("control_id", "TEXT", true, false, None),
        Column::new("status", "TEXT", false, false, None),
        Column::new("owner_user_id", "BIGINT", false, false, None),
        Column::new("notes", "TEXT", false, false, None),
        Column::new("evidence_links", "JSONB", false, false, None),
        Column::new("last_reviewed_at", "TIMESTAMPTZ", false, false, None),
        Column::new("created_at", "TIMESTAMPTZ", true, false, Some("now()")),
        Column::new("updated_at", "TIMESTAMPTZ", true, false, Some("now()")),
    ];
    Table::new(
        "org_control_assessments".to_string(),
        columns,
        vec![ForeignKeyConstraint::new(
            "org_control_assessments",
            "owner_user_id",
            "policy_users",
            "id",
            OnDelete::SetNull,
        )],
        vec![
            Index::new("org_control_assessments", vec!["framework_key"], false),
            Index::new(
                "org_control_assessments",
                vec!["org_id", "framework_key", "control_id"],
                true,
            ),
        ],
    )
}
