//! Subcommand implementations

use anyhow::{Context, Result, bail};
use schemagram_core::{
    CancellationMonitor, DataSourceId, MemoryCatalog, ObjectRef, ProjectId, SchemaNavigator,
};
use schemagram_diagram::{
    AttributeVisibility, CollectorSettings, DefaultContentProvider, DiagramDocument,
    DiagramObjectCollector, DiagramSettings, ErdDiagram, legacy, load_diagram,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options of `schemagram collect`
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub catalog: PathBuf,
    pub project: String,
    pub name: String,
    pub roots: Vec<String>,
    pub force_views: bool,
    pub partitions: bool,
    pub related: bool,
    pub full: bool,
    pub visibility: Option<AttributeVisibility>,
    pub out: Option<PathBuf>,
}

pub fn load_catalog(path: &Path) -> Result<MemoryCatalog> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog snapshot from {:?}", path))?;
    MemoryCatalog::from_json(&json)
        .with_context(|| format!("Failed to parse catalog snapshot {:?}", path))
}

/// Parse `<data source>[:<qualified name>]` using the data source's
/// quoting rules
pub async fn parse_root(navigator: &dyn SchemaNavigator, root: &str) -> Result<ObjectRef> {
    let (data_source, name) = match root.split_once(':') {
        Some((data_source, name)) => (data_source, Some(name)),
        None => (root, None),
    };
    if data_source.is_empty() {
        bail!("Root '{}' has no data source", root);
    }
    let data_source = DataSourceId::new(data_source);
    let info = navigator
        .data_source(&data_source)
        .await
        .with_context(|| format!("Unknown data source in root '{}'", root))?;
    let path = name
        .map(|name| info.rules.split_qualified_name(name))
        .unwrap_or_default();
    Ok(ObjectRef::new(data_source, path))
}

fn write_output(out: Option<&Path>, content: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write diagram to {:?}", path))?;
            tracing::info!(path = ?path, "diagram written");
        }
        None => println!("{}", content),
    }
    Ok(())
}

pub async fn collect(options: CollectOptions, settings: DiagramSettings) -> Result<()> {
    let catalog = Arc::new(load_catalog(&options.catalog)?);

    let mut roots = Vec::with_capacity(options.roots.len());
    for root in &options.roots {
        roots.push(parse_root(catalog.as_ref(), root).await?);
    }

    let collector_settings = CollectorSettings::from_settings(&settings)
        .with_force_show_views(options.force_views)
        .with_partitions(settings.show_partitions || options.partitions)
        .with_related(settings.include_related || options.related);
    let mut provider = DefaultContentProvider::from_settings(&settings);
    if let Some(visibility) = options.visibility {
        provider = provider.with_visibility(visibility);
    }

    let diagram = ErdDiagram::with_provider(
        options.name.clone(),
        ProjectId::new(options.project.clone()),
        Arc::new(provider),
    );

    let monitor = CancellationMonitor::new();
    let cancel = monitor.handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, keeping what was collected so far");
            cancel.cancel();
        }
    });

    let mut collector = DiagramObjectCollector::new(catalog, collector_settings);
    let added = collector.populate(&monitor, &diagram, &roots, false).await;
    interrupt.abort();

    for message in diagram.error_messages() {
        eprintln!("warning: {}", message);
    }
    tracing::info!(
        entities = added.len(),
        associations = diagram.association_count(),
        "diagram collected"
    );

    let document =
        DiagramDocument::from_diagram(&diagram, options.full || settings.persist_full_info);
    write_output(options.out.as_deref(), &document.to_json_pretty()?)
}

pub async fn inspect(
    catalog: &Path,
    project: &str,
    diagram_path: &Path,
    settings: DiagramSettings,
) -> Result<()> {
    let catalog = load_catalog(catalog)?;
    let file = std::fs::File::open(diagram_path)
        .with_context(|| format!("Failed to open diagram {:?}", diagram_path))?;
    let document = DiagramDocument::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to read diagram {:?}", diagram_path))?;

    let provider = Arc::new(DefaultContentProvider::from_settings(&settings));
    let loaded = load_diagram(&document, &catalog, project, provider).await;
    let diagram = &loaded.diagram;

    println!(
        "{}: {} entities, {} associations, {} notes",
        diagram.name(),
        diagram.entity_count(),
        diagram.association_count(),
        diagram.notes().len()
    );
    for (id, entity) in diagram.entities() {
        println!(
            "  {} ({}) attributes={} outgoing={} incoming={}",
            entity.name(),
            entity.object(),
            entity.attributes().len(),
            diagram.associations_of(id).len(),
            diagram.references_of(id).len()
        );
    }
    for (_, association) in diagram.associations() {
        let source = diagram.entity(association.source());
        let target = diagram.entity(association.target());
        if let (Some(source), Some(target)) = (source, target) {
            println!(
                "  {} [{}] {} -> {}",
                association.name,
                association.kind.as_str(),
                source.name(),
                target.name()
            );
        }
    }
    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}

pub fn legacy_sources(path: &Path) -> Result<()> {
    let xml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read legacy diagram {:?}", path))?;
    let data_sources = legacy::referenced_data_sources(&xml)
        .with_context(|| format!("Failed to parse legacy diagram {:?}", path))?;
    for data_source in data_sources {
        println!("{}", data_source);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemagram_core::{DataSourceInfo, IdentifierRules};

    fn catalog() -> MemoryCatalog {
        let catalog = MemoryCatalog::new();
        catalog.add_data_source(
            DataSourceInfo::new("pg", "main").with_rules(IdentifierRules::postgres()),
        );
        catalog
    }

    #[tokio::test]
    async fn test_parse_root_with_name() {
        let root = parse_root(&catalog(), "pg:Public.\"Order Items\"")
            .await
            .unwrap();
        assert_eq!(root, ObjectRef::new("pg", ["public", "Order Items"]));
    }

    #[tokio::test]
    async fn test_parse_root_data_source_only() {
        let root = parse_root(&catalog(), "pg").await.unwrap();
        assert!(root.is_root());
    }

    #[tokio::test]
    async fn test_parse_root_unknown_data_source() {
        assert!(parse_root(&catalog(), "mysql:app.users").await.is_err());
        assert!(parse_root(&catalog(), ":app.users").await.is_err());
    }
}
