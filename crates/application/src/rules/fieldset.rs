use std::collections::BTreeSet;

use mailapi_domain::{Parameter, RelationshipWalker, ResourceDescription};

use crate::rules::ParameterRule;
use crate::validation::{ValidationError, ValidationErrors};

/// Token selecting every field of a resource.
pub(crate) const WILDCARD: &str = "*";

/// Validates absolute sparse fieldsets (`fields[TYPE]=a,b`).
#[derive(Debug, Clone)]
pub struct FieldsetRule<'g> {
    walker: RelationshipWalker<'g>,
    included_types: BTreeSet<String>,
    wildcard: bool,
}

impl<'g> FieldsetRule<'g> {
    /// Creates the rule.
    ///
    /// `walker` is rooted at the query target and resolves field types.
    /// `included_types` lists the query target and every type it includes;
    /// `wildcard` controls whether a lone `*` is accepted.
    #[must_use]
    pub fn new<I, S>(walker: RelationshipWalker<'g>, included_types: I, wildcard: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            walker,
            included_types: included_types.into_iter().map(Into::into).collect(),
            wildcard,
        }
    }
}

impl ParameterRule for FieldsetRule<'_> {
    fn should_validate_parameter(&self, parameter: &Parameter) -> bool {
        !parameter.is_relative() && parameter.fieldset_type().is_some()
    }

    fn validate(&self, parameter: &Parameter, errors: &mut ValidationErrors) -> bool {
        let Some(description) =
            resolve_fieldset_target(self.walker, &self.included_types, parameter, errors)
        else {
            return false;
        };

        let value = parameter.value().unwrap_or_default().trim();
        if value.is_empty() || (self.wildcard && value == WILDCARD) {
            return true;
        }

        check_declared_fields(description, parameter, parameter.list_value(), errors)
    }
}

/// Validates fieldsets relative to the default fields
/// (`relfield:fields[TYPE]=+a,-b`).
#[derive(Debug, Clone)]
pub struct RelativeFieldsetRule<'g> {
    walker: RelationshipWalker<'g>,
    included_types: BTreeSet<String>,
    wildcard: bool,
}

impl<'g> RelativeFieldsetRule<'g> {
    /// Creates the rule; `wildcard` controls whether `*` may be used.
    #[must_use]
    pub fn new<I, S>(walker: RelationshipWalker<'g>, included_types: I, wildcard: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            walker,
            included_types: included_types.into_iter().map(Into::into).collect(),
            wildcard,
        }
    }
}

impl ParameterRule for RelativeFieldsetRule<'_> {
    fn should_validate_parameter(&self, parameter: &Parameter) -> bool {
        parameter.is_relative() && parameter.fieldset_type().is_some()
    }

    fn validate(&self, parameter: &Parameter, errors: &mut ValidationErrors) -> bool {
        let Some(description) =
            resolve_fieldset_target(self.walker, &self.included_types, parameter, errors)
        else {
            return false;
        };

        let entries = parameter.list_value();
        let wildcards = entries.iter().filter(|entry| **entry == WILDCARD).count();

        if wildcards > 1 {
            errors.push(ValidationError::bad_parameter(
                parameter,
                format!(
                    "\"{}\" must not contain more than one wildcard",
                    parameter.name()
                ),
            ));
            return false;
        }

        if wildcards == 1 && !self.wildcard {
            errors.push(ValidationError::bad_parameter(
                parameter,
                format!(
                    "wildcard \"{WILDCARD}\" is not allowed in \"{}\"",
                    parameter.name()
                ),
            ));
            return false;
        }

        let mut fields = Vec::with_capacity(entries.len());
        let mut unprefixed = Vec::new();
        for entry in entries.into_iter().filter(|entry| *entry != WILDCARD) {
            match entry.strip_prefix(['+', '-']) {
                Some(field) => fields.push(field),
                None => unprefixed.push(entry),
            }
        }

        if !unprefixed.is_empty() {
            errors.push(ValidationError::bad_parameter(
                parameter,
                format!(
                    "fields in \"{}\" must be prefixed with \"+\" or \"-\": {}",
                    parameter.name(),
                    unprefixed.join(", ")
                ),
            ));
            return false;
        }

        check_declared_fields(description, parameter, fields, errors)
    }
}

fn resolve_fieldset_target<'g>(
    walker: RelationshipWalker<'g>,
    included_types: &BTreeSet<String>,
    parameter: &Parameter,
    errors: &mut ValidationErrors,
) -> Option<&'g ResourceDescription> {
    let type_name = parameter.fieldset_type().unwrap_or_default();

    if !included_types.contains(type_name) {
        errors.push(ValidationError::bad_parameter(
            parameter,
            format!(
                "\"{type_name}\" is requested in \"{}\" but is not part of the included resources",
                parameter.name()
            ),
        ));
        return None;
    }

    let description = walker.find_by_type(type_name);
    if description.is_none() {
        errors.push(ValidationError::bad_parameter(
            parameter,
            format!("no resource description found for type \"{type_name}\""),
        ));
    }

    description
}

fn check_declared_fields(
    description: &ResourceDescription,
    parameter: &Parameter,
    fields: Vec<&str>,
    errors: &mut ValidationErrors,
) -> bool {
    let mut unknown = Vec::new();
    for field in fields {
        if !description.has_field(field) && !unknown.contains(&field) {
            unknown.push(field);
        }
    }

    if unknown.is_empty() {
        return true;
    }

    errors.push(ValidationError::bad_parameter(
        parameter,
        format!(
            "unknown fields for \"{}\": {}",
            description.type_name(),
            unknown.join(", ")
        ),
    ));
    false
}

#[cfg(test)]
mod tests {
    use mailapi_domain::{
        Parameter, RelationshipWalker, ResourceDescriptionInput, ResourceGraph,
        ResourceGraphBuilder,
    };

    use super::{FieldsetRule, RelativeFieldsetRule};
    use crate::rules::ParameterRule;
    use crate::validation::ValidationErrors;

    fn graph() -> ResourceGraph {
        ResourceGraphBuilder::new()
            .resource(
                ResourceDescriptionInput::new("MessageItem")
                    .fields(["subject", "date"])
                    .default_fields(["subject"])
                    .relationships(["MailFolder"]),
            )
            .resource(ResourceDescriptionInput::new("MailFolder").fields(["name"]))
            .resource(ResourceDescriptionInput::new("MailAccount").fields(["name"]))
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    fn walker(graph: &ResourceGraph) -> RelationshipWalker<'_> {
        let root = graph.lookup("MessageItem").unwrap_or_else(|| unreachable!());
        graph.walk(root)
    }

    fn parameter(name: &str, value: &str) -> Parameter {
        Parameter::with_value(name, value).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn unknown_field_is_named_exactly() {
        let graph = graph();
        let rule = FieldsetRule::new(walker(&graph), ["MessageItem"], true);
        let mut errors = ValidationErrors::new();

        let valid = rule.validate(
            &parameter("fields[MessageItem]", "subject,bogus"),
            &mut errors,
        );

        assert!(!valid);
        assert_eq!(
            errors.details(),
            vec!["unknown fields for \"MessageItem\": bogus"]
        );
    }

    #[test]
    fn empty_fieldset_is_valid() {
        let graph = graph();
        let rule = FieldsetRule::new(walker(&graph), ["MessageItem"], true);
        let mut errors = ValidationErrors::new();

        assert!(rule.validate(&parameter("fields[MessageItem]", ""), &mut errors));
        assert!(rule.validate(
            &parameter("fields[MessageItem]", "subject,date"),
            &mut errors
        ));
        assert!(!errors.has_error());
    }

    #[test]
    fn lone_wildcard_depends_on_configuration() {
        let graph = graph();
        let mut errors = ValidationErrors::new();

        let lenient = FieldsetRule::new(walker(&graph), ["MessageItem"], true);
        assert!(lenient.validate(&parameter("fields[MessageItem]", "*"), &mut errors));

        let strict = FieldsetRule::new(walker(&graph), ["MessageItem"], false);
        assert!(!strict.validate(&parameter("fields[MessageItem]", "*"), &mut errors));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn fieldset_for_type_that_is_not_included_fails() {
        let graph = graph();
        let rule = FieldsetRule::new(walker(&graph), ["MessageItem"], true);
        let mut errors = ValidationErrors::new();

        assert!(!rule.validate(&parameter("fields[MailFolder]", "name"), &mut errors));
        assert_eq!(
            errors.details(),
            vec![
                "\"MailFolder\" is requested in \"fields[MailFolder]\" but is not part of the included resources"
            ]
        );
    }

    #[test]
    fn fieldset_for_unknown_resource_fails() {
        let graph = graph();
        let rule = FieldsetRule::new(walker(&graph), ["MessageItem", "Attachment"], true);
        let mut errors = ValidationErrors::new();

        assert!(!rule.validate(&parameter("fields[Attachment]", "size"), &mut errors));
        assert_eq!(
            errors.details(),
            vec!["no resource description found for type \"Attachment\""]
        );
    }

    #[test]
    fn fieldset_for_unreachable_resource_fails() {
        let graph = graph();
        let rule = RelativeFieldsetRule::new(walker(&graph), ["MessageItem", "MailAccount"], true);
        let mut errors = ValidationErrors::new();

        assert!(!rule.validate(
            &parameter("relfield:fields[MailAccount]", "+name"),
            &mut errors
        ));
        assert_eq!(
            errors.details(),
            vec!["no resource description found for type \"MailAccount\""]
        );
    }

    #[test]
    fn relative_fields_require_prefix() {
        let graph = graph();
        let rule = RelativeFieldsetRule::new(walker(&graph), ["MessageItem"], true);
        let mut errors = ValidationErrors::new();

        assert!(!rule.validate(
            &parameter("relfield:fields[MessageItem]", "subject,date"),
            &mut errors
        ));
        assert!(rule.validate(
            &parameter("relfield:fields[MessageItem]", "+subject,-date"),
            &mut errors
        ));
        assert_eq!(
            errors.details(),
            vec![
                "fields in \"relfield:fields[MessageItem]\" must be prefixed with \"+\" or \"-\": subject, date"
            ]
        );
    }

    #[test]
    fn relative_fields_reject_multiple_wildcards() {
        let graph = graph();
        let rule = RelativeFieldsetRule::new(walker(&graph), ["MessageItem"], true);
        let mut errors = ValidationErrors::new();

        assert!(!rule.validate(
            &parameter("relfield:fields[MessageItem]", "*,+subject,*"),
            &mut errors
        ));
        assert!(errors.details()[0].contains("more than one wildcard"));
    }

    #[test]
    fn relative_wildcard_can_be_disabled() {
        let graph = graph();
        let mut errors = ValidationErrors::new();

        let enabled = RelativeFieldsetRule::new(walker(&graph), ["MessageItem"], true);
        assert!(enabled.validate(
            &parameter("relfield:fields[MessageItem]", "*,-date"),
            &mut errors
        ));

        let disabled = RelativeFieldsetRule::new(walker(&graph), ["MessageItem"], false);
        assert!(!disabled.validate(
            &parameter("relfield:fields[MessageItem]", "*,-date"),
            &mut errors
        ));
        assert_eq!(
            errors.details(),
            vec!["wildcard \"*\" is not allowed in \"relfield:fields[MessageItem]\""]
        );
    }

    #[test]
    fn relative_fields_must_be_declared() {
        let graph = graph();
        let rule = RelativeFieldsetRule::new(walker(&graph), ["MessageItem"], true);
        let mut errors = ValidationErrors::new();

        assert!(!rule.validate(
            &parameter("relfield:fields[MessageItem]", "+subject,-bogus"),
            &mut errors
        ));
        assert_eq!(
            errors.details(),
            vec!["unknown fields for \"MessageItem\": bogus"]
        );
    }

    #[test]
    fn rules_split_absolute_and_relative_parameters() {
        let graph = graph();
        let absolute = FieldsetRule::new(walker(&graph), ["MessageItem"], true);
        let relative = RelativeFieldsetRule::new(walker(&graph), ["MessageItem"], true);
        let plain = parameter("fields[MessageItem]", "subject");
        let relfield = parameter("relfield:fields[MessageItem]", "+date");

        assert!(absolute.should_validate_parameter(&plain));
        assert!(!absolute.should_validate_parameter(&relfield));
        assert!(relative.should_validate_parameter(&relfield));
        assert!(!relative.should_validate_parameter(&plain));
        assert!(!absolute.should_validate_parameter(&parameter("include", "")));
    }
}
