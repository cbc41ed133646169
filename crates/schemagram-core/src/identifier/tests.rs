//! Tests for identifier rules

use super::*;

mod split_tests {
    use super::*;

    #[test]
    fn test_split_plain_name() {
        let rules = IdentifierRules::default();
        assert_eq!(
            rules.split_qualified_name("public.orders"),
            vec!["public".to_string(), "orders".to_string()]
        );
    }

    #[test]
    fn test_split_quoted_part_keeps_separator() {
        let rules = IdentifierRules::default();
        assert_eq!(
            rules.split_qualified_name("\"my.schema\".orders"),
            vec!["my.schema".to_string(), "orders".to_string()]
        );
    }

    #[test]
    fn test_split_doubled_quote() {
        let rules = IdentifierRules::default();
        assert_eq!(
            rules.split_qualified_name("\"a\"\"b\""),
            vec!["a\"b".to_string()]
        );
    }

    #[test]
    fn test_split_normalizes_unquoted_parts() {
        let rules = IdentifierRules::postgres();
        assert_eq!(
            rules.split_qualified_name("Sales.\"Order Lines\""),
            vec!["sales".to_string(), "Order Lines".to_string()]
        );
    }

    #[test]
    fn test_split_mysql_backticks() {
        let rules = IdentifierRules::mysql();
        assert_eq!(
            rules.split_qualified_name("`shop`.`order`"),
            vec!["shop".to_string(), "order".to_string()]
        );
    }

    #[test]
    fn test_split_drops_empty_parts() {
        let rules = IdentifierRules::default();
        assert_eq!(
            rules.split_qualified_name(" a .. b "),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}

mod quote_tests {
    use super::*;

    #[test]
    fn test_simple_names_are_not_quoted() {
        let rules = IdentifierRules::default();
        assert_eq!(rules.quote_if_needed("orders"), "orders");
        assert_eq!(rules.quote_if_needed("_tmp$1"), "_tmp$1");
    }

    #[test]
    fn test_special_names_are_quoted() {
        let rules = IdentifierRules::default();
        assert_eq!(rules.quote_if_needed("order lines"), "\"order lines\"");
        assert_eq!(rules.quote_if_needed("1st"), "\"1st\"");
        assert_eq!(rules.quote_if_needed("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_case_sensitive_names_are_quoted() {
        let rules = IdentifierRules::postgres();
        assert_eq!(rules.quote_if_needed("orders"), "orders");
        assert_eq!(rules.quote_if_needed("Orders"), "\"Orders\"");
    }

    #[test]
    fn test_qualified_name_round_trip() {
        let rules = IdentifierRules::postgres();
        let parts = vec!["sales".to_string(), "My Schema".to_string(), "Orders".to_string()];
        let fqn = rules.qualified_name(&parts);
        assert_eq!(fqn, "sales.\"My Schema\".\"Orders\"");
        assert_eq!(rules.split_qualified_name(&fqn), parts);
    }
}

mod resolve_tests {
    use super::*;

    #[test]
    fn test_resolve_single_part() {
        let rules = IdentifierRules::default();
        let qn = rules.parse_qualified_name("orders").unwrap();
        assert_eq!(qn, QualifiedName::new("orders"));
    }

    #[test]
    fn test_resolve_two_parts_with_schemas() {
        let rules = IdentifierRules::default();
        let qn = rules.parse_qualified_name("public.orders").unwrap();
        assert_eq!(qn.schema.as_deref(), Some("public"));
        assert!(qn.catalog.is_none());
    }

    #[test]
    fn test_resolve_two_parts_catalog_only() {
        let rules = IdentifierRules::mysql();
        let qn = rules.parse_qualified_name("shop.orders").unwrap();
        assert_eq!(qn.catalog.as_deref(), Some("shop"));
        assert!(qn.schema.is_none());
        assert_eq!(qn.path(), vec!["shop".to_string(), "orders".to_string()]);
    }

    #[test]
    fn test_resolve_three_parts() {
        let rules = IdentifierRules::postgres();
        let qn = rules.parse_qualified_name("sales.public.orders").unwrap();
        assert_eq!(
            qn.path(),
            vec!["sales".to_string(), "public".to_string(), "orders".to_string()]
        );
    }

    #[test]
    fn test_resolve_empty() {
        let rules = IdentifierRules::default();
        assert!(rules.parse_qualified_name("").is_none());
    }
}
