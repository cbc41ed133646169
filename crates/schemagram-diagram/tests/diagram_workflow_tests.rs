//! End-to-end diagram workflows over an in-memory catalog

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use schemagram_core::{NullProgressMonitor, SchemaNavigator};
use schemagram_diagram::{
    AttributeVisibility, CollectorSettings, ContentProvider, DefaultContentProvider,
    DiagramDocument, DiagramObjectCollector, ErdDiagram, load_diagram,
};

use common::{PROJECT, object, schema, shop_catalog};

async fn collected_diagram(settings: CollectorSettings) -> ErdDiagram {
    let catalog = shop_catalog();
    let diagram = ErdDiagram::new("shop", PROJECT);
    let mut collector = DiagramObjectCollector::new(catalog, settings);
    collector
        .populate(&NullProgressMonitor, &diagram, &[schema("public")], false)
        .await;
    diagram
}

#[tokio::test]
async fn schema_collection_resolves_every_foreign_key() {
    let diagram = collected_diagram(CollectorSettings::new()).await;

    assert_eq!(diagram.entity_count(), 5);
    assert_eq!(diagram.association_count(), 3);
    assert!(diagram.is_stable());
    assert!(diagram.error_messages().is_empty());

    let lines = diagram.entity_by_object(&object("public", "order_lines")).unwrap();
    assert_eq!(diagram.associations_of(lines).len(), 2);
    let customers = diagram.entity_by_object(&object("public", "customers")).unwrap();
    assert_eq!(diagram.references_of(customers).len(), 1);
}

#[tokio::test]
async fn views_excluded_when_disabled() {
    let diagram = collected_diagram(CollectorSettings::new().with_views(false)).await;
    assert_eq!(diagram.entity_count(), 4);
    assert!(!diagram.contains_object(&object("public", "big_spenders")));
}

#[tokio::test]
async fn saved_diagram_reloads_against_catalog() {
    let diagram = collected_diagram(CollectorSettings::new()).await;
    let products = diagram.entity_by_object(&object("public", "products")).unwrap();
    diagram
        .update_entity(products, false, |e| e.alias = Some("catalog".into()))
        .unwrap();

    let json = DiagramDocument::from_diagram(&diagram, true)
        .to_json_pretty()
        .unwrap();
    let document = DiagramDocument::from_json(&json).unwrap();

    let catalog = shop_catalog();
    let loaded = load_diagram(
        &document,
        catalog.as_ref(),
        PROJECT,
        Arc::new(DefaultContentProvider::new()),
    )
    .await;

    assert!(loaded.warnings.is_empty(), "{:?}", loaded.warnings);
    let restored = loaded.diagram;
    assert_eq!(restored.entity_count(), diagram.entity_count());
    assert_eq!(restored.association_count(), diagram.association_count());

    let names = |d: &ErdDiagram| -> Vec<String> {
        d.entities()
            .into_iter()
            .map(|(_, e)| e.name().to_string())
            .collect()
    };
    assert_eq!(names(&restored), names(&diagram));
}

#[tokio::test]
async fn keys_visibility_limits_attributes() {
    let provider: Arc<dyn ContentProvider> =
        Arc::new(DefaultContentProvider::new().with_visibility(AttributeVisibility::Keys));
    let diagram = ErdDiagram::with_provider("shop", PROJECT, provider);
    let mut collector = DiagramObjectCollector::new(shop_catalog(), CollectorSettings::new());
    collector
        .populate(
            &NullProgressMonitor,
            &diagram,
            &[object("public", "order_lines")],
            false,
        )
        .await;

    let lines = diagram.entity_by_object(&object("public", "order_lines")).unwrap();
    let entity = diagram.entity(lines).unwrap();
    let attributes: Vec<&str> = entity.attributes().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(attributes, vec!["id", "order_id", "product_id"]);
}

#[tokio::test]
async fn concurrent_inserts_keep_indices_consistent() {
    let catalog = shop_catalog();
    let diagram = Arc::new(ErdDiagram::new("shop", PROJECT));
    diagram.register_data_source(
        catalog
            .data_source(&common::DATA_SOURCE.into())
            .await
            .unwrap(),
    );

    let mut handles = Vec::new();
    for name in ["customers", "orders", "order_lines", "products"] {
        let diagram = diagram.clone();
        let catalog = catalog.clone();
        handles.push(tokio::spawn(async move {
            let info = catalog.entity(&object("public", name)).await.unwrap().unwrap();
            diagram.add_entity(schemagram_diagram::ErdEntity::new(info), None, true)
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_some());
    }

    assert_eq!(diagram.entity_count(), 4);
    assert_eq!(diagram.association_count(), 3);
    assert!(diagram.is_stable());
    for (object, id) in diagram.entity_map() {
        assert_eq!(diagram.entity(id).unwrap().object(), &object);
    }
}
