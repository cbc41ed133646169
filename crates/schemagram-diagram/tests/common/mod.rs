//! Shared catalog fixtures

use std::sync::Arc;

use schemagram_core::{
    ColumnInfo, ContainerInfo, ContainerKind, DataSourceInfo, EntityInfo, ForeignKeyInfo,
    IdentifierRules, MemoryCatalog, ObjectRef, PrimaryKeyInfo, TableType,
};

pub const DATA_SOURCE: &str = "shop-pg";
pub const PROJECT: &str = "shop";

pub fn object(schema: &str, name: &str) -> ObjectRef {
    ObjectRef::new(DATA_SOURCE, [schema, name])
}

pub fn schema(name: &str) -> ObjectRef {
    ObjectRef::new(DATA_SOURCE, [name])
}

/// Table with an `id` primary key followed by `columns`
pub fn table(schema: &str, name: &str, columns: &[&str]) -> EntityInfo {
    let mut info = EntityInfo::new(object(schema, name), TableType::Table);
    info.columns.push(ColumnInfo::new("id", 1, "int8").not_null());
    for (i, column) in columns.iter().enumerate() {
        info.columns.push(ColumnInfo::new(*column, i + 2, "text"));
    }
    info.primary_key = Some(PrimaryKeyInfo {
        name: Some(format!("{}_pkey", name)),
        columns: vec!["id".into()],
    });
    info
}

pub fn with_fk(mut info: EntityInfo, name: &str, column: &str, target: ObjectRef) -> EntityInfo {
    info.foreign_keys.push(ForeignKeyInfo::new(
        name,
        vec![column.into()],
        target,
        vec!["id".into()],
    ));
    info
}

/// `public` schema of a small shop:
/// customers <- orders <- order_lines -> products, plus a view
pub fn shop_catalog() -> Arc<MemoryCatalog> {
    let catalog = MemoryCatalog::new();
    catalog
        .add_data_source(
            DataSourceInfo::new(DATA_SOURCE, PROJECT).with_rules(IdentifierRules::postgres()),
        )
        .add_container(ContainerInfo::new(schema("public"), ContainerKind::Schema))
        .add_entity(table("public", "customers", &["name", "email"]))
        .add_entity(with_fk(
            table("public", "orders", &["customer_id", "placed_at"]),
            "fk_orders_customer",
            "customer_id",
            object("public", "customers"),
        ))
        .add_entity(with_fk(
            with_fk(
                table("public", "order_lines", &["order_id", "product_id", "quantity"]),
                "fk_lines_order",
                "order_id",
                object("public", "orders"),
            ),
            "fk_lines_product",
            "product_id",
            object("public", "products"),
        ))
        .add_entity(table("public", "products", &["title", "price"]))
        .add_entity(EntityInfo::new(
            object("public", "big_spenders"),
            TableType::View,
        ));
    Arc::new(catalog)
}
