use std::str::FromStr;

use mailapi_core::{AppError, AppResult};
use serde_json::{Map, Value};

/// Comparison between one attribute and one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOperator {
    /// Equality.
    Equal,
    /// Inequality.
    NotEqual,
    /// Less than.
    LessThan,
    /// Less than or equal.
    LessThanOrEqual,
    /// Greater than.
    GreaterThan,
    /// Greater than or equal.
    GreaterThanOrEqual,
}

impl RelationalOperator {
    /// Returns the canonical token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "=" | "==" => Some(Self::Equal),
            "!=" => Some(Self::NotEqual),
            "<" => Some(Self::LessThan),
            "<=" => Some(Self::LessThanOrEqual),
            ">" => Some(Self::GreaterThan),
            ">=" => Some(Self::GreaterThanOrEqual),
            _ => None,
        }
    }
}

/// Test of one attribute against a list of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionalOperator {
    /// Attribute equals one of the values.
    In,
    /// Attribute equals none of the values.
    NotIn,
}

impl FunctionalOperator {
    /// Returns the canonical token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::NotIn => "NOT IN",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "IN" => Some(Self::In),
            "NOT IN" => Some(Self::NotIn),
            _ => None,
        }
    }
}

/// Boolean composition of expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    /// Every operand must hold.
    And,
    /// Any operand may hold.
    Or,
    /// Negation of exactly one operand.
    Not,
}

impl LogicalOperator {
    /// Returns the canonical token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }

    /// Returns whether the operator combines two or more operands.
    #[must_use]
    pub fn is_variadic(&self) -> bool {
        !matches!(self, Self::Not)
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "AND" | "&&" => Some(Self::And),
            "OR" | "||" => Some(Self::Or),
            "NOT" | "!" => Some(Self::Not),
            _ => None,
        }
    }
}

/// Any operator of the filter language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Relational operator.
    Relational(RelationalOperator),
    /// Functional operator.
    Functional(FunctionalOperator),
    /// Logical operator.
    Logical(LogicalOperator),
}

impl Operator {
    /// Returns the canonical token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relational(operator) => operator.as_str(),
            Self::Functional(operator) => operator.as_str(),
            Self::Logical(operator) => operator.as_str(),
        }
    }
}

impl FromStr for Operator {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        RelationalOperator::parse(value)
            .map(Self::Relational)
            .or_else(|| FunctionalOperator::parse(value).map(Self::Functional))
            .or_else(|| LogicalOperator::parse(value).map(Self::Logical))
            .ok_or_else(|| AppError::Validation(format!("\"{value}\" is not a valid operator")))
    }
}

/// Filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `attribute <operator> value`.
    Relational {
        /// Comparison operator.
        operator: RelationalOperator,
        /// Compared attribute.
        attribute: String,
        /// Compared value.
        value: Value,
    },
    /// `attribute <operator> (values...)`.
    Functional {
        /// Membership operator.
        operator: FunctionalOperator,
        /// Tested attribute.
        attribute: String,
        /// Candidate values, never empty.
        values: Vec<Value>,
    },
    /// Boolean composition.
    Logical {
        /// Logical operator.
        operator: LogicalOperator,
        /// Operands; two or more for AND/OR, exactly one for NOT.
        operands: Vec<Expression>,
    },
}

impl Expression {
    /// Creates a relational comparison.
    #[must_use]
    pub fn relational(
        operator: RelationalOperator,
        attribute: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self::Relational {
            operator,
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates a membership test.
    pub fn functional(
        operator: FunctionalOperator,
        attribute: impl Into<String>,
        values: Vec<Value>,
    ) -> AppResult<Self> {
        let attribute = attribute.into();
        if values.is_empty() {
            return Err(AppError::Validation(format!(
                "\"{}\" on \"{attribute}\" expects at least one value",
                operator.as_str()
            )));
        }

        Ok(Self::Functional {
            operator,
            attribute,
            values,
        })
    }

    /// Creates a logical composition, enforcing the operator's arity.
    pub fn logical(operator: LogicalOperator, operands: Vec<Expression>) -> AppResult<Self> {
        if operator.is_variadic() && operands.len() < 2 {
            return Err(AppError::Validation(format!(
                "Logical operator \"{}\" expects at least 2 operands, {} given",
                operator.as_str(),
                operands.len()
            )));
        }

        if !operator.is_variadic() && operands.len() != 1 {
            return Err(AppError::Validation(format!(
                "Logical operator \"{}\" expects exactly 1 operand, {} given",
                operator.as_str(),
                operands.len()
            )));
        }

        Ok(Self::Logical { operator, operands })
    }

    /// Negates `operand`.
    #[must_use]
    pub fn negate(operand: Expression) -> Self {
        Self::Logical {
            operator: LogicalOperator::Not,
            operands: vec![operand],
        }
    }

    /// Builds an expression from its JSON polish-notation form.
    ///
    /// A leaf naming several attributes becomes the conjunction of one
    /// comparison per attribute.
    pub fn from_polish_notation(node: &Value) -> AppResult<Self> {
        let (token, operand) = single_entry(node)?;

        match token.parse::<Operator>()? {
            Operator::Logical(LogicalOperator::Not) => {
                let operand = match operand {
                    Value::Array(items) if items.len() == 1 => &items[0],
                    Value::Array(items) => {
                        return Err(AppError::Validation(format!(
                            "Logical operator \"{token}\" expects exactly 1 operand, {} given",
                            items.len()
                        )));
                    }
                    other => other,
                };

                Ok(Self::negate(Self::from_polish_notation(operand)?))
            }
            Operator::Logical(operator) => {
                let items = operand.as_array().ok_or_else(|| {
                    AppError::Validation(format!(
                        "Logical operator \"{token}\" expects an array of operands"
                    ))
                })?;
                let operands = items
                    .iter()
                    .map(Self::from_polish_notation)
                    .collect::<AppResult<Vec<_>>>()?;

                Self::logical(operator, operands)
            }
            Operator::Relational(operator) => {
                let terms = leaf_arguments(token, operand)?
                    .iter()
                    .map(|(attribute, value)| {
                        Self::relational(operator, attribute.clone(), value.clone())
                    })
                    .collect();

                conjunction(token, terms)
            }
            Operator::Functional(operator) => {
                let terms = leaf_arguments(token, operand)?
                    .iter()
                    .map(|(attribute, value)| {
                        let values = value.as_array().cloned().ok_or_else(|| {
                            AppError::Validation(format!(
                                "\"{token}\" expects an array of values for \"{attribute}\""
                            ))
                        })?;
                        Self::functional(operator, attribute.clone(), values)
                    })
                    .collect::<AppResult<Vec<_>>>()?;

                conjunction(token, terms)
            }
        }
    }

    /// Renders the expression in JSON polish notation.
    #[must_use]
    pub fn to_polish_notation(&self) -> Value {
        match self {
            Self::Relational {
                operator,
                attribute,
                value,
            } => operator_node(
                operator.as_str(),
                operator_node(attribute.as_str(), value.clone()),
            ),
            Self::Functional {
                operator,
                attribute,
                values,
            } => operator_node(
                operator.as_str(),
                operator_node(attribute.as_str(), Value::Array(values.clone())),
            ),
            Self::Logical { operator, operands } => operator_node(
                operator.as_str(),
                Value::Array(operands.iter().map(Self::to_polish_notation).collect()),
            ),
        }
    }

    /// Returns every attribute referenced by the tree, depth first.
    #[must_use]
    pub fn attributes(&self) -> Vec<&str> {
        match self {
            Self::Relational { attribute, .. } | Self::Functional { attribute, .. } => {
                vec![attribute.as_str()]
            }
            Self::Logical { operands, .. } => operands.iter().flat_map(Self::attributes).collect(),
        }
    }
}

fn single_entry(node: &Value) -> AppResult<(&str, &Value)> {
    let object = node.as_object().filter(|object| object.len() == 1).ok_or_else(|| {
        AppError::Validation("filter node must be an object with exactly one operator".to_owned())
    })?;

    object
        .iter()
        .next()
        .map(|(token, operand)| (token.as_str(), operand))
        .ok_or_else(|| AppError::Internal("filter node lost its operator".to_owned()))
}

fn operator_node(key: &str, operand: Value) -> Value {
    let mut object = Map::new();
    object.insert(key.to_owned(), operand);
    Value::Object(object)
}

fn leaf_arguments<'a>(token: &str, operand: &'a Value) -> AppResult<&'a Map<String, Value>> {
    operand
        .as_object()
        .filter(|arguments| !arguments.is_empty())
        .ok_or_else(|| AppError::Validation(format!("\"{token}\" expects an object argument")))
}

fn conjunction(token: &str, mut terms: Vec<Expression>) -> AppResult<Expression> {
    match terms.len() {
        0 => Err(AppError::Validation(format!(
            "\"{token}\" expects an object argument"
        ))),
        1 => Ok(terms.remove(0)),
        _ => Expression::logical(LogicalOperator::And, terms),
    }
}
