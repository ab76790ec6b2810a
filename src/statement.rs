use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use serde_json::Value;

/// Values bound to `:name` placeholders, keyed by the bare column name.
pub type Params = BTreeMap<String, Value>;

/// Column overrides for the merge statements, applied in the given order.
pub type Overrides = Vec<(String, Value)>;

/// Identifies which builder operation produced a statement. Executors may use
/// it to pick a fetch mode; it never changes the statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperationTag {
    DropStaging,
    CreateStaging,
    BulkLoad,
    ValidateAllFields,
    ValidateDuplicate,
    ValidateForeignKey,
    AssignSequence,
    AssignPrefixedSequence,
    MergeUpdate,
    MergeInsert,
}

impl OperationTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationTag::DropStaging => "create:drop",
            OperationTag::CreateStaging => "create",
            OperationTag::BulkLoad => "import",
            OperationTag::ValidateAllFields => "validateAllFields",
            OperationTag::ValidateDuplicate => "validateDuplicatedId",
            OperationTag::ValidateForeignKey => "validateNonExistForeignKey",
            OperationTag::AssignSequence => "updateFieldNumberByAutoCount",
            OperationTag::AssignPrefixedSequence => "updateFieldNumberByAutoCountWithPrefix",
            OperationTag::MergeUpdate => "updateExistingRecords",
            OperationTag::MergeInsert => "insertNonExistingRecords",
        }
    }

    /// True for statements whose result is a row set.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            OperationTag::ValidateAllFields
                | OperationTag::ValidateDuplicate
                | OperationTag::ValidateForeignKey
        )
    }
}

impl fmt::Display for OperationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rendered statement, ready to hand to an executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub tag: OperationTag,
    pub sql: String,
    pub params: Params,
}

impl Statement {
    pub(crate) fn new(tag: OperationTag, sql: String) -> Self {
        Self {
            tag,
            sql,
            params: Params::new(),
        }
    }

    pub(crate) fn with_params(tag: OperationTag, sql: String, params: Params) -> Self {
        Self { tag, sql, params }
    }

    /// Parameters to bind, or `None` when the statement has no placeholders.
    pub fn bindings(&self) -> Option<&Params> {
        if self.params.is_empty() {
            None
        } else {
            Some(&self.params)
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
