//! Per-type classification of members into pass-through and to-mask sets.
//!
//! Classification only looks at member names, so it is computed once per
//! concrete type and memoized. The memo belongs to one masking configuration;
//! a new configuration gets a new classifier.

use std::{any::TypeId, collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::{masking::MaskConfiguration, structured::Structured};

/// One declared member of a classified type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberRef {
    /// Index accepted by [`Structured::read_member`].
    pub index: usize,
    /// Declared member name.
    pub name: &'static str,
    /// Whether the member's name is listed for masking.
    pub masked: bool,
}

/// Partition of a type's members.
#[derive(Clone, Debug)]
pub struct TypeClassification {
    type_name: &'static str,
    members: Vec<MemberRef>,
}

impl TypeClassification {
    fn compute(value: &dyn Structured, config: &MaskConfiguration) -> Self {
        let members = value
            .member_names()
            .iter()
            .copied()
            .enumerate()
            .map(|(index, name)| MemberRef {
                index,
                name,
                masked: config.is_masked_name(name),
            })
            .collect();
        Self {
            type_name: value.type_name(),
            members,
        }
    }

    /// Name of the classified type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// All members in declaration order.
    pub fn members(&self) -> &[MemberRef] {
        &self.members
    }

    /// Members emitted as-is.
    pub fn pass_through(&self) -> impl Iterator<Item = &MemberRef> {
        self.members.iter().filter(|member| !member.masked)
    }

    /// Members replaced by the masking policy.
    pub fn to_mask(&self) -> impl Iterator<Item = &MemberRef> {
        self.members.iter().filter(|member| member.masked)
    }
}

/// Memoizing classifier bound to one [`MaskConfiguration`].
///
/// Concurrent first requests for the same type may both compute the
/// classification; both results are equivalent and the last insert wins.
#[derive(Debug)]
pub struct TypeClassifier {
    config: Arc<MaskConfiguration>,
    memo: RwLock<HashMap<TypeId, Arc<TypeClassification>>>,
}

impl TypeClassifier {
    /// Creates an empty classifier.
    pub fn new(config: Arc<MaskConfiguration>) -> Self {
        Self {
            config,
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Masking configuration the classifier partitions against.
    pub fn config(&self) -> &MaskConfiguration {
        &self.config
    }

    /// Returns the classification of `value`'s concrete type.
    pub fn classify(&self, value: &dyn Structured) -> Arc<TypeClassification> {
        let key = value.type_key();
        if let Some(found) = self.memo.read().get(&key) {
            return Arc::clone(found);
        }

        let computed = Arc::new(TypeClassification::compute(value, &self.config));
        self.memo.write().insert(key, Arc::clone(&computed));
        computed
    }

    /// Number of memoized types.
    pub fn len(&self) -> usize {
        self.memo.read().len()
    }

    /// Returns `true` if nothing has been classified yet.
    pub fn is_empty(&self) -> bool {
        self.memo.read().is_empty()
    }

    /// Drops every memoized classification.
    pub fn invalidate(&self) {
        self.memo.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::TypeClassifier;
    use crate::{
        masking::{MaskConfiguration, MaskPolicy},
        MemberAccessError, PropertyValue, Structured,
    };

    struct Login;

    impl Structured for Login {
        fn type_name(&self) -> &'static str {
            "Login"
        }

        fn member_names(&self) -> &'static [&'static str] {
            &["Name", "Password", "Pin"]
        }

        fn read_member(&self, index: usize) -> Result<PropertyValue, MemberAccessError> {
            Err(MemberAccessError::OutOfRange {
                type_name: "Login",
                index,
            })
        }
    }

    struct Other;

    impl Structured for Other {
        fn type_name(&self) -> &'static str {
            "Other"
        }

        fn member_names(&self) -> &'static [&'static str] {
            &["password"]
        }

        fn read_member(&self, index: usize) -> Result<PropertyValue, MemberAccessError> {
            Err(MemberAccessError::OutOfRange {
                type_name: "Other",
                index,
            })
        }
    }

    fn classifier(policy: MaskPolicy) -> TypeClassifier {
        TypeClassifier::new(Arc::new(
            MaskConfiguration::new(policy).with_masked_properties(["PASSWORD", "pin"]),
        ))
    }

    #[test]
    fn partitions_by_case_insensitive_name() {
        let classifier = classifier(MaskPolicy::MaskWithString);
        let classification = classifier.classify(&Login);
        let pass: Vec<_> = classification.pass_through().map(|m| m.name).collect();
        let masked: Vec<_> = classification.to_mask().map(|m| m.name).collect();
        assert_eq!(pass, ["Name"]);
        assert_eq!(masked, ["Password", "Pin"]);
    }

    #[test]
    fn partitions_even_without_policy() {
        let classifier = classifier(MaskPolicy::None);
        assert_eq!(classifier.classify(&Login).to_mask().count(), 2);
    }

    #[test]
    fn memoizes_per_type() {
        let classifier = classifier(MaskPolicy::MaskWithString);
        let first = classifier.classify(&Login);
        let second = classifier.classify(&Login);
        assert!(Arc::ptr_eq(&first, &second));
        classifier.classify(&Other);
        assert_eq!(classifier.len(), 2);
    }

    #[test]
    fn invalidate_clears_memo() {
        let classifier = classifier(MaskPolicy::MaskWithString);
        classifier.classify(&Login);
        classifier.invalidate();
        assert!(classifier.is_empty());
    }

    #[test]
    fn concurrent_classification_is_consistent() {
        let classifier = Arc::new(classifier(MaskPolicy::MaskWithString));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let classifier = Arc::clone(&classifier);
                thread::spawn(move || classifier.classify(&Login).to_mask().count())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
        assert_eq!(classifier.len(), 1);
    }
}
