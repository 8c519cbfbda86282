//! Translation of filter expressions into IMAP SEARCH criteria.
//!
//! Only the subset a mailbox listing needs is supported: UID lower bounds,
//! UID sets, the RECENT flag and a single level of OR over those.

use std::fmt::{Display, Formatter};

use mailapi_core::{AppError, AppResult};
use mailapi_domain::{Expression, FunctionalOperator, LogicalOperator, RelationalOperator};
use serde_json::Value;
use tracing::debug;

const UID_ATTRIBUTE: &str = "uid";
const RECENT_ATTRIBUTE: &str = "recent";

/// IMAP SEARCH criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImapSearchCriteria {
    /// Messages with a UID of at least `from`.
    UidRange {
        /// Smallest matching UID.
        from: u32,
    },
    /// Messages with one of the given UIDs.
    UidSet(Vec<u32>),
    /// Messages with the `\Recent` flag.
    Recent,
    /// Messages matching either criterion.
    Or(Box<Self>, Box<Self>),
}

impl Display for ImapSearchCriteria {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UidRange { from } => write!(formatter, "UID {from}:*"),
            Self::UidSet(uids) => {
                formatter.write_str("UID ")?;
                for (position, uid) in uids.iter().enumerate() {
                    if position > 0 {
                        formatter.write_str(",")?;
                    }
                    write!(formatter, "{uid}")?;
                }
                Ok(())
            }
            Self::Recent => formatter.write_str("RECENT"),
            Self::Or(left, right) => write!(formatter, "OR {left} {right}"),
        }
    }
}

/// Translates `expression` into IMAP search criteria.
///
/// Operands of an OR are folded to the right, so `OR(a, b, c)` becomes
/// `OR a OR b c`.
pub fn to_search_criteria(expression: &Expression) -> AppResult<ImapSearchCriteria> {
    let criteria = match expression {
        Expression::Logical {
            operator: LogicalOperator::Or,
            operands,
        } => {
            let mut leaves = operands
                .iter()
                .map(leaf_criteria)
                .collect::<AppResult<Vec<_>>>()?;

            let Some(mut folded) = leaves.pop() else {
                return Err(unsupported("OR without operands"));
            };
            while let Some(leaf) = leaves.pop() {
                folded = ImapSearchCriteria::Or(Box::new(leaf), Box::new(folded));
            }
            folded
        }
        Expression::Logical { operator, .. } => {
            return Err(unsupported(&format!(
                "logical operator \"{}\"",
                operator.as_str()
            )));
        }
        leaf => leaf_criteria(leaf)?,
    };

    debug!(criteria = %criteria, "translated filter to imap search");
    Ok(criteria)
}

fn leaf_criteria(expression: &Expression) -> AppResult<ImapSearchCriteria> {
    match expression {
        Expression::Relational {
            operator: RelationalOperator::GreaterThanOrEqual,
            attribute,
            value,
        } if attribute.eq_ignore_ascii_case(UID_ATTRIBUTE) => {
            Ok(ImapSearchCriteria::UidRange { from: uid(value)? })
        }
        Expression::Relational {
            operator: RelationalOperator::Equal,
            attribute,
            value: Value::Bool(true),
        } if attribute.eq_ignore_ascii_case(RECENT_ATTRIBUTE) => Ok(ImapSearchCriteria::Recent),
        Expression::Functional {
            operator: FunctionalOperator::In,
            attribute,
            values,
        } if attribute.eq_ignore_ascii_case(UID_ATTRIBUTE) => values
            .iter()
            .map(uid)
            .collect::<AppResult<Vec<_>>>()
            .map(ImapSearchCriteria::UidSet),
        Expression::Relational {
            operator,
            attribute,
            ..
        } => Err(unsupported(&format!(
            "\"{}\" on \"{attribute}\"",
            operator.as_str()
        ))),
        Expression::Functional {
            operator,
            attribute,
            ..
        } => Err(unsupported(&format!(
            "\"{}\" on \"{attribute}\"",
            operator.as_str()
        ))),
        Expression::Logical { operator, .. } => Err(unsupported(&format!(
            "nested logical operator \"{}\"",
            operator.as_str()
        ))),
    }
}

fn uid(value: &Value) -> AppResult<u32> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
        .and_then(|uid| u32::try_from(uid).ok())
        .ok_or_else(|| AppError::Validation(format!("{value} is not a valid uid")))
}

fn unsupported(what: &str) -> AppError {
    AppError::Unsupported(format!("{what} cannot be expressed as an imap search"))
}
