//! Tests for diagram entities

use super::*;
use schemagram_core::{
    ColumnInfo, ConstraintInfo, ConstraintType, IndexInfo, NameFilter, PrimaryKeyInfo, TableType,
};

fn orders_info() -> EntityInfo {
    let object = ObjectRef::new("pg", ["public", "orders"]);
    let mut info = EntityInfo::new(object, TableType::Table);
    info.columns = vec![
        ColumnInfo::new("id", 1, "int8").not_null(),
        ColumnInfo::new("customer_id", 2, "int8"),
        ColumnInfo::new("note", 3, "text"),
        ColumnInfo::new("code", 4, "varchar(16)"),
        ColumnInfo::new("xmin", 5, "xid").hidden(),
        ColumnInfo::new("created_at", 6, "timestamptz").inherited(),
    ];
    info.primary_key = Some(PrimaryKeyInfo {
        name: Some("orders_pkey".into()),
        columns: vec!["id".into()],
    });
    info.constraints.push(ConstraintInfo {
        name: "orders_code_key".into(),
        constraint_type: ConstraintType::Unique,
        columns: vec!["code".into()],
    });
    info.foreign_keys.push(ForeignKeyInfo::new(
        "fk_orders_customer",
        vec!["customer_id".into()],
        ObjectRef::new("pg", ["public", "customers"]),
        vec!["id".into()],
    ));
    info
}

fn names(entity: &ErdEntity) -> Vec<&str> {
    entity.attributes().iter().map(|a| a.name.as_str()).collect()
}

mod construction_tests {
    use super::*;

    #[test]
    fn test_new_entity_queues_foreign_keys() {
        let entity = ErdEntity::new(orders_info());
        assert_eq!(entity.unresolved_keys().len(), 1);
        assert!(entity.associations().is_empty());
        assert!(!entity.attributes_loaded());
    }

    #[test]
    fn test_name_prefers_alias() {
        let entity = ErdEntity::new(orders_info());
        assert_eq!(entity.name(), "orders");
        let aliased = entity.with_alias(Some("o".into()));
        assert_eq!(aliased.name(), "o");
    }
}

mod attribute_tests {
    use super::*;

    #[test]
    fn test_duplicate_attribute_rejected() {
        let info = orders_info();
        let column = info.columns[0].clone();
        let mut entity = ErdEntity::new(info);
        entity
            .add_attribute(ErdAttribute::from_column(&column, true, false))
            .unwrap();
        let err = entity
            .add_attribute(ErdAttribute::from_column(&column, true, false))
            .unwrap_err();
        assert!(matches!(err, DiagramError::DuplicateAttribute { .. }));
        assert_eq!(entity.attributes().len(), 1);
    }

    #[test]
    fn test_remove_attribute() {
        let mut entity = ErdEntity::new(orders_info());
        entity.fill_attributes(AttributeVisibility::All, None);
        assert!(entity.remove_attribute("note").is_some());
        assert!(entity.remove_attribute("note").is_none());
        assert_eq!(names(&entity), vec!["id", "customer_id", "code"]);
    }
}

mod fill_tests {
    use super::*;

    #[test]
    fn test_fill_all_skips_hidden_and_inherited() {
        let mut entity = ErdEntity::new(orders_info());
        entity.fill_attributes(AttributeVisibility::All, None);
        assert_eq!(names(&entity), vec!["id", "customer_id", "note", "code"]);

        let id = entity.attribute("id").unwrap();
        assert!(id.is_primary_key);
        assert!(!id.is_foreign_key);
        let customer = entity.attribute("customer_id").unwrap();
        assert!(customer.is_foreign_key);
        assert!(!customer.is_primary_key);
    }

    #[test]
    fn test_fill_primary_only() {
        let mut entity = ErdEntity::new(orders_info());
        entity.fill_attributes(AttributeVisibility::Primary, None);
        assert_eq!(names(&entity), vec!["id"]);
    }

    #[test]
    fn test_fill_keys() {
        let mut entity = ErdEntity::new(orders_info());
        entity.fill_attributes(AttributeVisibility::Keys, None);
        assert_eq!(names(&entity), vec!["id", "customer_id", "code"]);
    }

    #[test]
    fn test_fill_none() {
        let mut entity = ErdEntity::new(orders_info());
        entity.fill_attributes(AttributeVisibility::None, None);
        assert!(entity.attributes().is_empty());
        assert!(entity.attributes_loaded());
    }

    #[test]
    fn test_filter_excludes_regardless_of_policy() {
        let filter = NameFilter::new().exclude("id").compile();
        let mut entity = ErdEntity::new(orders_info());
        entity.fill_attributes(AttributeVisibility::Keys, Some(&filter));
        assert_eq!(names(&entity), vec!["customer_id", "code"]);
    }

    #[test]
    fn test_unique_index_used_without_primary_key() {
        let mut info = orders_info();
        info.primary_key = None;
        info.constraints.clear();
        info.indexes.push(IndexInfo {
            name: "orders_code_idx".into(),
            columns: vec!["code".into()],
            is_unique: true,
            is_primary: false,
        });
        let mut entity = ErdEntity::new(info);
        entity.fill_attributes(AttributeVisibility::Primary, None);
        assert_eq!(names(&entity), vec!["code"]);
        assert!(entity.attribute("code").unwrap().is_primary_key);
    }

    #[test]
    fn test_refill_keeps_alias_and_checked() {
        let mut entity = ErdEntity::new(orders_info());
        entity.fill_attributes(AttributeVisibility::All, None);
        {
            let note = entity.attribute_mut("note").unwrap();
            note.alias = Some("comment".into());
            note.checked = true;
        }
        entity.fill_attributes(AttributeVisibility::All, None);
        let note = entity.attribute("note").unwrap();
        assert_eq!(note.display_name(), "comment");
        assert!(note.checked);
    }

    #[test]
    fn test_reorder_attributes() {
        let mut entity = ErdEntity::new(orders_info());
        entity.fill_attributes(AttributeVisibility::All, None);
        entity.reorder_attributes(&["code", "missing", "note"]);
        assert_eq!(names(&entity), vec!["code", "note", "id", "customer_id"]);
        let orders: Vec<usize> = entity.attributes().iter().map(|a| a.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }
}
