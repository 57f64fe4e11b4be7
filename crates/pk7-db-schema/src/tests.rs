use super::*;

#[test]
fn test_pg_type_from_dsl_names() {
    assert_eq!("string".parse::<PgType>(), Ok(PgType::Varchar(None)));
    assert_eq!("uuid".parse::<PgType>(), Ok(PgType::Uuid));
    assert_eq!("UUID".parse::<PgType>(), Ok(PgType::Uuid));
    assert_eq!("integer".parse::<PgType>(), Ok(PgType::Integer));
    assert_eq!("bigint".parse::<PgType>(), Ok(PgType::BigInt));
    assert_eq!("datetime".parse::<PgType>(), Ok(PgType::Timestamptz));
    assert_eq!("varchar(36)".parse::<PgType>(), Ok(PgType::Varchar(Some(36))));
    assert_eq!("VARCHAR( 255 )".parse::<PgType>(), Ok(PgType::Varchar(Some(255))));
}

#[test]
fn test_pg_type_unknown() {
    assert_eq!(
        "geometry".parse::<PgType>(),
        Err(UnknownType("geometry".to_string()))
    );
    assert!("varchar(abc)".parse::<PgType>().is_err());
}

#[test]
fn test_pg_type_display() {
    assert_eq!(PgType::Varchar(Some(36)).to_string(), "VARCHAR(36)");
    assert_eq!(PgType::Varchar(None).to_string(), "VARCHAR");
    assert_eq!(PgType::Uuid.to_string(), "UUID");
    assert_eq!(PgType::DEFAULT_REFERENCE.to_string(), "BIGINT");
}

#[test]
fn test_column_to_sql() {
    assert_eq!(
        Column::new("id", PgType::Uuid).primary_key().to_sql(),
        "\"id\" UUID PRIMARY KEY"
    );
    assert_eq!(
        Column::new("bio", PgType::Text).nullable(true).to_sql(),
        "\"bio\" TEXT"
    );
    assert_eq!(
        Column::new("email", PgType::Text).to_sql(),
        "\"email\" TEXT NOT NULL"
    );
    assert_eq!(
        Column::new("created_at", PgType::Timestamptz)
            .default("now()")
            .to_sql(),
        "\"created_at\" TIMESTAMPTZ NOT NULL DEFAULT now()"
    );
}

#[test]
fn test_table_primary_key() {
    let users = Table::new("users")
        .with_column(Column::new("id", PgType::Uuid).primary_key())
        .with_column(Column::new("name", PgType::Text));
    assert_eq!(users.primary_key().map(|c| c.name.as_str()), Some("id"));

    let no_pk = Table::new("log_lines").with_column(Column::new("line", PgType::Text));
    assert!(no_pk.primary_key().is_none());

    let composite = Table::new("post_tags")
        .with_column(Column::new("post_id", PgType::BigInt).primary_key())
        .with_column(Column::new("tag_id", PgType::BigInt).primary_key());
    assert!(composite.primary_key().is_none());
}

#[test]
fn test_schema_lookup() {
    let schema = Schema::new()
        .with_table(Table::new("users"))
        .with_table(Table::new("posts"));
    assert!(schema.get_table("users").is_some());
    assert!(schema.get_table("comments").is_none());
    assert_eq!(schema.iter_tables().count(), 2);
}
