//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use docsync_codec::{Document, ObjectId, Value, ID_FIELD};
use proptest::prelude::*;

/// Strategy for generating object ids.
pub fn object_id_strategy() -> impl Strategy<Value = ObjectId> {
    prop::array::uniform12(any::<u8>()).prop_map(ObjectId::from_bytes)
}

/// Strategy for generating valid collection names.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,31}").expect("Invalid regex")
}

/// Strategy for generating field names other than `_id`.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-zA-Z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for scalar values.
///
/// Doubles are finite so generated documents compare equal after a
/// round trip.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-1.0e12f64..1.0e12).prop_map(Value::Double),
        ".{0,24}".prop_map(Value::String),
        (any::<u8>(), prop::collection::vec(any::<u8>(), 0..32))
            .prop_map(|(subtype, bytes)| Value::Binary { subtype, bytes }),
        object_id_strategy().prop_map(Value::ObjectId),
        any::<bool>().prop_map(Value::Boolean),
        any::<i64>().prop_map(Value::DateTime),
        Just(Value::Null),
        any::<i32>().prop_map(Value::Int32),
        any::<i64>().prop_map(Value::Int64),
    ]
}

/// Strategy for values, nesting documents and arrays up to a few levels.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_value_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((field_name_strategy(), inner), 0..4)
                .prop_map(|fields| Value::Document(fields.into_iter().collect())),
        ]
    })
}

/// Strategy for documents without an identifier.
pub fn document_strategy() -> impl Strategy<Value = Document> {
    prop::collection::vec((field_name_strategy(), value_strategy()), 0..6)
        .prop_map(|fields| fields.into_iter().collect())
}

/// Strategy for documents that carry an object id in `_id`.
pub fn identified_document_strategy() -> impl Strategy<Value = Document> {
    (object_id_strategy(), document_strategy()).prop_map(|(id, mut document)| {
        document.set_id(id);
        document
    })
}

/// A store operation for model-based tests.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Save a new document.
    Insert {
        /// Document to store.
        document: Document,
    },
    /// Overwrite the `index`-th inserted document, modulo the count.
    Update {
        /// Which inserted document to overwrite.
        index: usize,
        /// Replacement body.
        document: Document,
    },
    /// Delete the `index`-th inserted document, modulo the count.
    Delete {
        /// Which inserted document to remove.
        index: usize,
    },
}

/// Strategy for generating store operations.
pub fn store_operation_strategy() -> impl Strategy<Value = StoreOperation> {
    prop_oneof![
        3 => document_strategy().prop_map(|document| StoreOperation::Insert { document }),
        2 => (any::<usize>(), document_strategy())
            .prop_map(|(index, document)| StoreOperation::Update { index, document }),
        1 => any::<usize>().prop_map(|index| StoreOperation::Delete { index }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn collection_name_is_valid(name in collection_name_strategy()) {
            let first = name.chars().next();
            prop_assert!(first.map_or(false, |c| c.is_ascii_alphabetic()));
            prop_assert!(docsync_store::validate_collection(&name).is_ok());
        }

        #[test]
        fn documents_have_no_identifier(document in document_strategy()) {
            prop_assert!(!document.contains_key(ID_FIELD));
        }

        #[test]
        fn identified_documents_have_identifier(document in identified_document_strategy()) {
            prop_assert!(document.id().is_some());
        }
    }
}
