//! Legacy XML diagrams
//!
//! Older releases stored diagrams as XML:
//!
//! ```xml
//! <diagram version="1" name="sales">
//!   <entities>
//!     <data-source id="pg">
//!       <entity id="1" name="orders" fq-name="public.orders" x="10" y="20"/>
//!     </data-source>
//!   </entities>
//!   <relations>
//!     <relation name="fk_orders_customer" type="fk" pk-ref="2" fk-ref="1">
//!       <bend type="abs" x="40" y="60"/>
//!     </relation>
//!   </relations>
//!   <notes><note id="3" x="0" y="0" w="100" h="40">text</note></notes>
//! </diagram>
//! ```
//!
//! Only the referenced data sources are read back, so a caller can connect
//! them before converting the diagram.

use indexmap::IndexSet;
use quick_xml::Reader as XmlReader;
use quick_xml::events::Event;
use schemagram_core::DataSourceId;
use thiserror::Error;

pub const TAG_DIAGRAM: &str = "diagram";
pub const TAG_ENTITIES: &str = "entities";
pub const TAG_DATA_SOURCE: &str = "data-source";
pub const TAG_ENTITY: &str = "entity";
pub const TAG_PATH: &str = "path";
pub const TAG_COLUMN: &str = "column";
pub const TAG_RELATIONS: &str = "relations";
pub const TAG_RELATION: &str = "relation";
pub const TAG_BEND: &str = "bend";
pub const TAG_NOTES: &str = "notes";
pub const TAG_NOTE: &str = "note";

pub const ATTR_VERSION: &str = "version";
pub const ATTR_NAME: &str = "name";
pub const ATTR_TIME: &str = "time";
pub const ATTR_ID: &str = "id";
pub const ATTR_ORDER: &str = "order";
pub const ATTR_ALIAS: &str = "alias";
pub const ATTR_FQ_NAME: &str = "fq-name";
pub const ATTR_REF_NAME: &str = "ref-name";
pub const ATTR_TYPE: &str = "type";
pub const ATTR_PK_REF: &str = "pk-ref";
pub const ATTR_FK_REF: &str = "fk-ref";
pub const ATTR_X: &str = "x";
pub const ATTR_Y: &str = "y";
pub const ATTR_W: &str = "w";
pub const ATTR_H: &str = "h";
pub const ATTR_TRANSPARENT: &str = "transparent";
pub const ATTR_COLOR_BG: &str = "color-bg";
pub const ATTR_COLOR_FG: &str = "color-fg";
pub const ATTR_FONT: &str = "font";
pub const ATTR_BORDER_WIDTH: &str = "border-width";
pub const ATTR_ATTRIBUTE_VISIBILITY: &str = "attribute-visibility";

pub const BEND_ABSOLUTE: &str = "abs";
pub const BEND_RELATIVE: &str = "rel";

#[derive(Debug, Error)]
pub enum LegacyError {
    #[error("malformed legacy diagram: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute in legacy diagram: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("not a legacy diagram (root element is '{0}')")]
    NotADiagram(String),
}

/// Ids of the data sources a legacy diagram references, in document order
/// and without repeats.
pub fn referenced_data_sources(xml: &str) -> Result<Vec<DataSourceId>, LegacyError> {
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut ids: IndexSet<String> = IndexSet::new();
    let mut seen_root = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = e.name();
                let name = String::from_utf8_lossy(name.as_ref());
                if !seen_root {
                    if name != TAG_DIAGRAM {
                        return Err(LegacyError::NotADiagram(name.into_owned()));
                    }
                    seen_root = true;
                }
                if name == TAG_DATA_SOURCE {
                    for attribute in e.attributes() {
                        let attribute = attribute?;
                        if attribute.key.as_ref() == ATTR_ID.as_bytes() {
                            let id = attribute.unescape_value()?;
                            let id = id.trim();
                            if !id.is_empty() {
                                ids.insert(id.to_string());
                            }
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    tracing::debug!(data_sources = ids.len(), "read legacy diagram");
    Ok(ids.into_iter().map(DataSourceId::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<diagram version="1" name="sales" time="202401011200">
    <entities>
        <data-source id="postgres-jdbc-1">
            <entity id="1" name="orders" fq-name="public.orders" x="10" y="20">
                <path name="public"/>
            </entity>
            <entity id="2" name="customers" fq-name="public.customers"/>
        </data-source>
        <data-source id="mysql-8 &amp; co">
            <entity id="3" name="invoices" fq-name="billing.invoices"/>
        </data-source>
        <data-source id="postgres-jdbc-1"/>
    </entities>
    <relations>
        <relation name="fk_orders_customer" type="fk" pk-ref="2" fk-ref="1">
            <bend type="abs" x="40" y="60"/>
        </relation>
    </relations>
    <notes>
        <note id="4" x="0" y="0" w="100" h="40" color-bg="255,255,0">Draft</note>
    </notes>
</diagram>"#;

    #[test]
    fn test_data_sources_in_order_without_repeats() {
        let ids = referenced_data_sources(SAMPLE).unwrap();
        assert_eq!(
            ids,
            vec![
                DataSourceId::new("postgres-jdbc-1"),
                DataSourceId::new("mysql-8 & co"),
            ]
        );
    }

    #[test]
    fn test_empty_diagram() {
        let ids = referenced_data_sources(r#"<diagram version="1"/>"#).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_other_root_rejected() {
        let err =
            referenced_data_sources("<project><data-source id=\"x\"/></project>").unwrap_err();
        assert!(matches!(err, LegacyError::NotADiagram(name) if name == "project"));
    }
}
