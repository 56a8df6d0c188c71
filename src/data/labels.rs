//! Class labels
//!
//! Class buckets are directories; the bucket name decides the label of every
//! image inside it. The default rule is a case-sensitive substring test, so
//! a bucket called `catfish` is labelled cat.

use crate::core::{Label, Result, SVMError, CAT, DOG};

/// Symbolic name of a class label: 0 is "cat", any other value is "dog"
pub fn label_name(label: Label) -> &'static str {
    if label == CAT {
        "cat"
    } else {
        "dog"
    }
}

/// Inverse of [`label_name`] for the two canonical names
pub fn label_from_name(name: &str) -> Result<Label> {
    match name.trim() {
        "cat" => Ok(CAT),
        "dog" => Ok(DOG),
        other => Err(SVMError::ParseError(format!(
            "Unknown class name '{other}', expected 'cat' or 'dog'"
        ))),
    }
}

/// Derives the label of a class bucket from its directory name
pub trait LabelStrategy: Send + Sync {
    fn label_for(&self, bucket: &str) -> Label;
}

impl<F> LabelStrategy for F
where
    F: Fn(&str) -> Label + Send + Sync,
{
    fn label_for(&self, bucket: &str) -> Label {
        self(bucket)
    }
}

/// `matched` if the bucket name contains `needle`, `otherwise` if not
#[derive(Debug, Clone)]
pub struct SubstringLabel {
    needle: String,
    matched: Label,
    otherwise: Label,
}

impl SubstringLabel {
    pub fn new(needle: impl Into<String>, matched: Label, otherwise: Label) -> Self {
        Self {
            needle: needle.into(),
            matched,
            otherwise,
        }
    }
}

impl Default for SubstringLabel {
    fn default() -> Self {
        Self::new("cat", CAT, DOG)
    }
}

impl LabelStrategy for SubstringLabel {
    fn label_for(&self, bucket: &str) -> Label {
        if bucket.contains(&self.needle) {
            self.matched
        } else {
            self.otherwise
        }
    }
}
