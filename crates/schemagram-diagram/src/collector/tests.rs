//! Tests for the object collector

use super::*;
use schemagram_core::{
    AliasInfo, CancellationMonitor, ColumnInfo, ContainerInfo, ContainerKind, DataSourceInfo,
    ForeignKeyInfo, MemoryCatalog, NameFilter, NullProgressMonitor, PrimaryKeyInfo, TableType,
};

fn entity(schema: &str, name: &str, kind: TableType) -> EntityInfo {
    let mut info = EntityInfo::new(ObjectRef::new("pg", [schema, name]), kind);
    info.columns = vec![ColumnInfo::new("id", 1, "int8").not_null()];
    info.primary_key = Some(PrimaryKeyInfo {
        name: None,
        columns: vec!["id".into()],
    });
    info
}

fn schema(name: &str) -> ObjectRef {
    ObjectRef::new("pg", [name])
}

fn catalog() -> Arc<MemoryCatalog> {
    let catalog = MemoryCatalog::new();
    catalog
        .add_data_source(DataSourceInfo::new("pg", "main"))
        .add_container(ContainerInfo::new(schema("public"), ContainerKind::Schema))
        .add_entity(entity("public", "customers", TableType::Table))
        .add_entity(entity("public", "active_customers", TableType::View))
        .add_entity({
            let mut orders = entity("public", "orders", TableType::Table);
            orders.columns.push(ColumnInfo::new("customer_id", 2, "int8"));
            orders.foreign_keys.push(ForeignKeyInfo::new(
                "fk_orders_customer",
                vec!["customer_id".into()],
                ObjectRef::new("pg", ["public", "customers"]),
                vec!["id".into()],
            ));
            orders
        })
        .add_entity({
            let mut partition = entity("public", "orders_2024", TableType::Table);
            partition.is_partition = true;
            partition
        })
        .add_entity({
            let mut system = entity("public", "pg_stat", TableType::System);
            system.is_system = true;
            system
        });
    Arc::new(catalog)
}

fn names(set: &IndexSet<ObjectRef>) -> Vec<&str> {
    set.iter().map(|o| o.name()).collect()
}

mod inclusion_tests {
    use super::*;

    #[tokio::test]
    async fn test_views_hidden_when_disabled() {
        let settings = CollectorSettings::new().with_views(false);
        let mut collector = DiagramObjectCollector::new(catalog(), settings);
        let tables = collector
            .collect_tables(&NullProgressMonitor, &[schema("public")])
            .await;
        assert_eq!(names(&tables), vec!["customers", "orders"]);
    }

    #[tokio::test]
    async fn test_views_shown_when_enabled() {
        let mut collector = DiagramObjectCollector::new(catalog(), CollectorSettings::new());
        let tables = collector
            .collect_tables(&NullProgressMonitor, &[schema("public")])
            .await;
        assert_eq!(names(&tables), vec!["customers", "active_customers", "orders"]);
    }

    #[tokio::test]
    async fn test_force_show_views_overrides() {
        let settings = CollectorSettings::new()
            .with_views(false)
            .with_force_show_views(true);
        let mut collector = DiagramObjectCollector::new(catalog(), settings);
        let tables = collector
            .collect_tables(&NullProgressMonitor, &[schema("public")])
            .await;
        assert!(tables.contains(&ObjectRef::new("pg", ["public", "active_customers"])));
    }

    #[tokio::test]
    async fn test_partitions_and_system_objects() {
        let settings = CollectorSettings::new()
            .with_partitions(true)
            .with_system(true);
        let mut collector = DiagramObjectCollector::new(catalog(), settings);
        let tables = collector
            .collect_tables(&NullProgressMonitor, &[schema("public")])
            .await;
        assert_eq!(tables.len(), 5);
    }

    #[tokio::test]
    async fn test_container_filter_applied() {
        let catalog = catalog();
        catalog.add_container(
            ContainerInfo::new(schema("public"), ContainerKind::Schema)
                .with_filter(NameFilter::new().include("cust%")),
        );
        let mut collector = DiagramObjectCollector::new(catalog, CollectorSettings::new());
        let tables = collector
            .collect_tables(&NullProgressMonitor, &[schema("public")])
            .await;
        assert_eq!(names(&tables), vec!["customers"]);
    }

    #[tokio::test]
    async fn test_duplicates_removed_in_order() {
        let mut collector = DiagramObjectCollector::new(catalog(), CollectorSettings::new());
        let orders = ObjectRef::new("pg", ["public", "orders"]);
        let tables = collector
            .collect_tables(&NullProgressMonitor, &[orders.clone(), schema("public"), orders])
            .await;
        assert_eq!(names(&tables), vec!["orders", "customers", "active_customers"]);
    }
}

mod alias_tests {
    use super::*;

    #[tokio::test]
    async fn test_alias_resolved_to_target() {
        let catalog = catalog();
        catalog.add_alias(AliasInfo {
            object: ObjectRef::new("pg", ["public", "clients"]),
            target: ObjectRef::new("pg", ["public", "customers"]),
        });
        let mut collector = DiagramObjectCollector::new(catalog, CollectorSettings::new());
        let tables = collector
            .collect_tables(
                &NullProgressMonitor,
                &[ObjectRef::new("pg", ["public", "clients"])],
            )
            .await;
        assert_eq!(names(&tables), vec!["customers"]);
    }

    #[tokio::test]
    async fn test_alias_cycle_stops_branch() {
        let catalog = catalog();
        catalog
            .add_alias(AliasInfo {
                object: ObjectRef::new("pg", ["public", "a"]),
                target: ObjectRef::new("pg", ["public", "b"]),
            })
            .add_alias(AliasInfo {
                object: ObjectRef::new("pg", ["public", "b"]),
                target: ObjectRef::new("pg", ["public", "a"]),
            });
        let mut collector = DiagramObjectCollector::new(catalog, CollectorSettings::new());
        let tables = collector
            .collect_tables(&NullProgressMonitor, &[ObjectRef::new("pg", ["public", "a"])])
            .await;
        assert!(tables.is_empty());
        assert!(collector.error_messages().is_empty());
    }

    #[tokio::test]
    async fn test_alias_to_schema_cycle() {
        let catalog = catalog();
        catalog.add_alias(AliasInfo {
            object: ObjectRef::new("pg", ["public", "self_ref"]),
            target: schema("public"),
        });
        let mut collector = DiagramObjectCollector::new(catalog, CollectorSettings::new());
        let tables = collector
            .collect_tables(&NullProgressMonitor, &[schema("public")])
            .await;
        assert_eq!(names(&tables), vec!["customers", "active_customers", "orders"]);
    }
}

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_cancelled_monitor_returns_partial_result() {
        let monitor = CancellationMonitor::new();
        monitor.cancel();
        let mut collector = DiagramObjectCollector::new(catalog(), CollectorSettings::new());
        let tables = collector.collect_tables(&monitor, &[schema("public")]).await;
        assert!(tables.is_empty());
    }

    #[tokio::test]
    async fn test_connection_failure_skips_root() {
        let catalog = catalog();
        catalog.fail_connection("pg", "connection refused");
        let diagram = ErdDiagram::new("d", "main");
        let mut collector = DiagramObjectCollector::new(catalog, CollectorSettings::new());
        let entities = collector
            .generate_entity_list(&NullProgressMonitor, &diagram, &[schema("public")])
            .await;
        assert!(entities.is_empty());
        assert_eq!(diagram.error_messages().len(), 1);
        assert!(diagram.error_messages()[0].contains("connection refused"));
    }

    #[tokio::test]
    async fn test_cache_failure_skips_only_that_root() {
        let catalog = catalog();
        catalog.fail_cache(schema("public"), "permission denied");
        let diagram = ErdDiagram::new("d", "main");
        let mut collector = DiagramObjectCollector::new(catalog, CollectorSettings::new());
        let customers = ObjectRef::new("pg", ["public", "customers"]);
        let entities = collector
            .generate_entity_list(
                &NullProgressMonitor,
                &diagram,
                &[schema("public"), customers.clone()],
            )
            .await;
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].object(), &customers);
        assert_eq!(collector.error_messages().len(), 1);
        assert!(diagram.error_messages()[0].contains("permission denied"));
    }

    #[tokio::test]
    async fn test_cross_project_root_rejected() {
        let catalog = catalog();
        catalog
            .add_data_source(DataSourceInfo::new("other", "P2"))
            .add_container(ContainerInfo::new(
                ObjectRef::new("other", ["public"]),
                ContainerKind::Schema,
            ))
            .add_entity(EntityInfo::new(
                ObjectRef::new("other", ["public", "invoices"]),
                TableType::Table,
            ));
        let diagram = ErdDiagram::new("d", "main");
        let mut collector = DiagramObjectCollector::new(catalog, CollectorSettings::new());
        let entities = collector
            .generate_entity_list(
                &NullProgressMonitor,
                &diagram,
                &[
                    ObjectRef::new("other", ["public", "invoices"]),
                    ObjectRef::new("pg", ["public", "customers"]),
                ],
            )
            .await;

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name(), "customers");
        let messages = diagram.error_messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("other:public.invoices"));
        assert!(messages[0].contains("P2"));
    }
}

mod populate_tests {
    use super::*;

    #[tokio::test]
    async fn test_populate_resolves_relations() {
        let diagram = ErdDiagram::new("d", "main");
        let mut collector = DiagramObjectCollector::new(catalog(), CollectorSettings::new());
        let ids = collector
            .populate(&NullProgressMonitor, &diagram, &[schema("public")], false)
            .await;
        assert_eq!(ids.len(), 3);
        assert_eq!(diagram.association_count(), 1);
        assert!(diagram.is_stable());
    }

    #[tokio::test]
    async fn test_include_related_adds_targets() {
        let settings = CollectorSettings::new().with_related(true);
        let diagram = ErdDiagram::new("d", "main");
        let mut collector = DiagramObjectCollector::new(catalog(), settings);
        let entities = collector
            .generate_entity_list(
                &NullProgressMonitor,
                &diagram,
                &[ObjectRef::new("pg", ["public", "orders"])],
            )
            .await;
        let names: Vec<&str> = entities.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["orders", "customers"]);
        assert!(entities[0].primary);
        assert!(!entities[1].primary);
    }
}
