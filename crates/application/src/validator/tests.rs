use mailapi_core::AppError;
use mailapi_domain::{
    Parameter, ResourceDescriptionInput, ResourceGraph, ResourceGraphBuilder, ResourceQuery,
};

use crate::config::QueryValidationConfig;
use crate::repository_query::{JsonApiRepositoryQuery, RepositoryQuery};
use crate::rules::{ParameterRule, QueryRule};
use crate::validation::{ValidationError, ValidationErrors, ValidationSource};

use super::{
    CollectionQueryValidator, QueryValidator, ResourceQueryValidator, included_types,
    is_reserved_parameter,
};

fn mail_graph() -> ResourceGraph {
    ResourceGraphBuilder::new()
        .resource(
            ResourceDescriptionInput::new("MessageItem")
                .fields(["id", "subject", "date", "recent", "size"])
                .default_fields(["subject", "date"])
                .relationships(["MailFolder"]),
        )
        .resource(
            ResourceDescriptionInput::new("MailFolder")
                .fields(["name", "unreadMessages", "folderType"])
                .default_fields(["name"])
                .relationships(["MailAccount"]),
        )
        .resource(
            ResourceDescriptionInput::new("MailAccount")
                .fields(["name", "address", "inbox_server"])
                .default_fields(["name", "address"])
                .relationships(["MailFolder"]),
        )
        .build()
        .unwrap_or_else(|_| unreachable!())
}

fn query<'g>(graph: &'g ResourceGraph, pairs: &[(&str, &str)]) -> ResourceQuery<'g> {
    ResourceQuery::from_pairs(graph, "MessageItem", pairs.iter().copied())
        .unwrap_or_else(|_| unreachable!())
}

#[test]
fn included_fieldset_with_unknown_field_yields_one_error() {
    let graph = mail_graph();
    let query = query(
        &graph,
        &[("include", "MailFolder"), ("fields[MailFolder]", "name,unknownField")],
    );

    let errors = ResourceQueryValidator::default()
        .check(&query)
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        errors.details(),
        vec!["unknown fields for \"MailFolder\": unknownField"]
    );
}

#[test]
fn included_fieldset_with_known_fields_passes() {
    let graph = mail_graph();
    let query = query(
        &graph,
        &[("include", "MailFolder"), ("fields[MailFolder]", "name")],
    );

    let errors = ResourceQueryValidator::default()
        .check(&query)
        .unwrap_or_else(|_| unreachable!());

    assert!(!errors.has_error());
}

#[test]
fn independent_problems_are_all_reported() {
    let graph = mail_graph();
    let query = query(
        &graph,
        &[("bogus", "1"), ("fields[MessageItem]", "subject,nope")],
    );
    let mut errors = ValidationErrors::new();

    let result = ResourceQueryValidator::default().validate(&query, &mut errors);

    assert!(result.is_ok());
    assert!(errors.len() >= 2);
    assert!(matches!(
        errors.iter().next().map(|error| error.source()),
        Some(ValidationSource::Query { .. })
    ));
    assert!(
        errors
            .details()
            .iter()
            .any(|details| details.contains("nope"))
    );
}

#[test]
fn fieldset_for_related_type_requires_include() {
    let graph = mail_graph();
    let query = query(&graph, &[("fields[MailFolder]", "name")]);

    let errors = ResourceQueryValidator::default()
        .check(&query)
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(errors.len(), 1);
    assert!(errors.details()[0].contains("not part of the included resources"));
}

#[test]
fn deep_include_makes_intermediate_types_available() {
    let graph = mail_graph();
    let query = query(
        &graph,
        &[
            ("include", "MailFolder.MailAccount"),
            ("fields[MailFolder]", "name"),
            ("relfield:fields[MailAccount]", "-address,+inbox_server"),
        ],
    );

    assert_eq!(
        included_types(&query).into_iter().collect::<Vec<_>>(),
        vec!["MailAccount", "MailFolder", "MessageItem"]
    );

    let errors = ResourceQueryValidator::default()
        .check(&query)
        .unwrap_or_else(|_| unreachable!());
    assert!(!errors.has_error());
}

#[test]
fn unknown_include_is_reported() {
    let graph = mail_graph();
    let query = query(&graph, &[("include", "MailFolder,Attachment")]);

    let errors = ResourceQueryValidator::default()
        .check(&query)
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        errors.details(),
        vec!["\"include\" references unknown relationships: Attachment"]
    );
}

#[test]
fn allowed_names_cover_every_reachable_type() {
    let graph = mail_graph();
    let query = query(&graph, &[]);

    assert_eq!(
        ResourceQueryValidator::default().allowed_parameter_names(&query),
        vec![
            "include",
            "fields[MessageItem]",
            "relfield:fields[MessageItem]",
            "fields[MailFolder]",
            "relfield:fields[MailFolder]",
            "fields[MailAccount]",
            "relfield:fields[MailAccount]",
        ]
    );
}

#[test]
fn relative_wildcard_follows_configuration() {
    let graph = mail_graph();
    let query = query(&graph, &[("relfield:fields[MessageItem]", "*,-size")]);

    let lenient = ResourceQueryValidator::default()
        .check(&query)
        .unwrap_or_else(|_| unreachable!());
    assert!(!lenient.has_error());

    let strict = ResourceQueryValidator::new(QueryValidationConfig {
        relative_fieldset_wildcard: false,
        ..QueryValidationConfig::default()
    })
    .check(&query)
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(strict.len(), 1);
}

#[test]
fn collection_validator_checks_paging_sorting_and_filter() {
    let graph = mail_graph();
    let query = query(
        &graph,
        &[
            ("page[start]", "0"),
            ("page[limit]", "1000"),
            ("sort", "-date,bogus"),
            ("filter", r#"{"OR": [{"=": {"recent": true}}, {">=": {"uid": 4}}]}"#),
        ],
    );

    let errors = CollectionQueryValidator::new(QueryValidationConfig::default())
        .check(&query)
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        errors.details(),
        vec![
            "\"page[limit]\" must be an integer between 1 and 500",
            "\"sort\" contains values that are not allowed: bogus",
            "\">=\" needs a valid attribute argument, received \"uid\"",
        ]
    );
}

#[test]
fn collection_validator_accepts_valid_listing_query() {
    let graph = mail_graph();
    let query = query(
        &graph,
        &[
            ("page[start]", "25"),
            ("page[limit]", "25"),
            ("sort", "-date"),
            ("filter", r#"{"OR": [{"=": {"recent": true}}, {"IN": {"id": [1, 2]}}]}"#),
            ("include", "MailFolder"),
            ("fields[MessageItem]", "subject,date"),
            ("options", r#"{"previewText": {"length": 200}}"#),
        ],
    );

    let errors = CollectionQueryValidator::default()
        .json_parameters(["options"])
        .check(&query)
        .unwrap_or_else(|_| unreachable!());

    assert!(!errors.has_error(), "{:?}", errors.details());
}

#[test]
fn collection_validator_uses_explicit_filter_attributes() {
    let graph = mail_graph();
    let query = query(&graph, &[("filter", r#"{">=": {"UID": 4}}"#)]);

    let default_errors = CollectionQueryValidator::default()
        .check(&query)
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(default_errors.len(), 1);

    let errors = CollectionQueryValidator::default()
        .filter_attributes(["UID", "RECENT"])
        .check(&query)
        .unwrap_or_else(|_| unreachable!());
    assert!(!errors.has_error());
}

#[test]
fn accepted_filters_decode_for_repositories() {
    let graph = mail_graph();
    let validator = CollectionQueryValidator::default();

    for filter in [
        r#"{"=": {"recent": true}}"#,
        r#"{"IN": {"id": [1, 2]}}"#,
        r#"{"AND": [{"NOT IN": {"id": [3]}}, {">=": {"size": 10}}]}"#,
    ] {
        let query = query(&graph, &[("filter", filter)]);
        let errors = validator.check(&query).unwrap_or_else(|_| unreachable!());
        assert!(!errors.has_error(), "{filter}: {:?}", errors.details());

        let decoded = JsonApiRepositoryQuery::new(&query).filter();
        assert!(matches!(decoded, Ok(Some(_))), "{filter}");
    }
}

#[test]
fn functional_filter_without_value_list_is_rejected() {
    let graph = mail_graph();
    let validator = CollectionQueryValidator::default();

    for (filter, details) in [
        (
            r#"{"IN": {"id": 1}}"#,
            "\"IN\" expects an array of values for \"id\"",
        ),
        (
            r#"{"IN": {"id": []}}"#,
            "\"IN\" on \"id\" expects at least one value",
        ),
    ] {
        let query = query(&graph, &[("filter", filter)]);
        let errors = validator.check(&query).unwrap_or_else(|_| unreachable!());
        assert_eq!(errors.details(), vec![details]);

        let decoded = JsonApiRepositoryQuery::new(&query).filter();
        assert!(matches!(decoded, Err(AppError::Validation(_))));
    }
}

#[test]
fn reserved_names_are_not_rechecked_as_json_parameters() {
    let graph = mail_graph();
    let query = query(&graph, &[("filter", "{\"=\":"), ("options", "{")]);

    let validator = CollectionQueryValidator::default()
        .json_parameters(["filter", "relfield:fields[MessageItem]", "options"]);
    let errors = validator.check(&query).unwrap_or_else(|_| unreachable!());

    assert_eq!(errors.len(), 2, "{:?}", errors.details());
    assert!(errors.details()[0].starts_with("\"filter\" must be valid JSON"));
    assert!(errors.details()[1].starts_with("\"options\" must be valid JSON"));
}

#[test]
fn reserved_parameter_names() {
    for name in [
        "include",
        "filter",
        "sort",
        "page[start]",
        "page[limit]",
        "fields[MailFolder]",
        "relfield:fields[MailFolder]",
    ] {
        assert!(is_reserved_parameter(name), "{name}");
    }

    for name in [
        "options",
        "fields",
        "fieldsets[MailFolder]",
        "relfield:options",
    ] {
        assert!(!is_reserved_parameter(name), "{name}");
    }
}

#[test]
fn collection_only_parameters_are_rejected_for_single_resources() {
    let graph = mail_graph();
    let query = query(&graph, &[("page[limit]", "10")]);

    let errors = ResourceQueryValidator::default()
        .check(&query)
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(errors.len(), 1);
    assert!(errors.details()[0].starts_with("found additional parameters page[limit]"));
}

struct FoldersOnly;

impl QueryValidator for FoldersOnly {
    fn supports(&self, query: &ResourceQuery<'_>) -> bool {
        query.resource_target().type_name() == "MailFolder"
    }

    fn query_rules<'g>(&self, _query: &ResourceQuery<'g>) -> Vec<Box<dyn QueryRule + 'g>> {
        Vec::new()
    }

    fn parameter_rules<'g>(&self, _query: &ResourceQuery<'g>) -> Vec<Box<dyn ParameterRule + 'g>> {
        Vec::new()
    }
}

#[test]
fn unsupported_query_is_a_contract_violation() {
    let graph = mail_graph();
    let query = query(&graph, &[]);
    let mut errors = ValidationErrors::new();

    let result = FoldersOnly.validate(&query, &mut errors);

    assert!(matches!(result, Err(AppError::UnsupportedQuery(_))));
    assert!(!errors.has_error());
}

struct RecordingRule;

impl ParameterRule for RecordingRule {
    fn should_validate_parameter(&self, parameter: &Parameter) -> bool {
        parameter.name().starts_with('x')
    }

    fn validate(&self, parameter: &Parameter, errors: &mut ValidationErrors) -> bool {
        errors.push(ValidationError::bad_parameter(parameter, parameter.name()));
        false
    }
}

struct RecordingValidator;

impl QueryValidator for RecordingValidator {
    fn query_rules<'g>(&self, _query: &ResourceQuery<'g>) -> Vec<Box<dyn QueryRule + 'g>> {
        Vec::new()
    }

    fn parameter_rules<'g>(&self, _query: &ResourceQuery<'g>) -> Vec<Box<dyn ParameterRule + 'g>> {
        vec![Box::new(RecordingRule)]
    }
}

#[test]
fn parameter_rules_only_run_for_parameters_they_handle() {
    let graph = mail_graph();
    let query = query(&graph, &[("xa", "1"), ("include", ""), ("xb", "2")]);

    let errors = RecordingValidator
        .check(&query)
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(errors.details(), vec!["xa", "xb"]);
}
