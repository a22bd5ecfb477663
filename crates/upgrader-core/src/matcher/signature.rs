//! API change signatures.
//!
//! A signature names a callable and always ends in `()`:
//!
//! - `name()` matches the method on any receiver
//! - `Vendor\Class::name()` matches static-style calls resolved to the class
//! - `Vendor\Class->name()` matches instance calls made on `$this` inside the
//!   class
//!
//! Qualified signatures also match the method's declaration inside the class.

use std::fmt;

use crate::error::UpgradeError;
use crate::names::normalise_name;

/// What a signature targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureTarget {
    /// `name()`
    Bare {
        /// Method name.
        method: String,
    },
    /// `Class::name()`
    Static {
        /// Fully qualified class name without a leading `\`.
        class: String,
        /// Method name.
        method: String,
    },
    /// `Class->name()`
    Instance {
        /// Fully qualified class name without a leading `\`.
        class: String,
        /// Method name.
        method: String,
    },
}

impl SignatureTarget {
    /// Parses a signature string.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::InvalidSignature`] when the signature does not
    /// end in `()` or one of its sides is empty.
    pub fn parse(signature: &str) -> Result<Self, UpgradeError> {
        let trimmed = signature.trim();
        let callable = trimmed
            .strip_suffix("()")
            .ok_or_else(|| UpgradeError::invalid_signature(signature, "must end in '()'"))?;

        let (owner, member) = callable
            .split_once("::")
            .or_else(|| callable.split_once("->"))
            .map_or((None, callable), |(left, right)| (Some(left), right));
        let is_static = callable.contains("::");

        let method_name = member.trim();
        if !is_identifier(method_name) {
            return Err(UpgradeError::invalid_signature(
                signature,
                "method name must be a plain identifier",
            ));
        }

        let class_name = owner.map(normalise_name);
        if class_name.as_deref().is_some_and(str::is_empty) {
            return Err(UpgradeError::invalid_signature(
                signature,
                "class name must not be empty",
            ));
        }

        let method = method_name.to_owned();
        Ok(match class_name {
            None => Self::Bare { method },
            Some(class) if is_static => Self::Static { class, method },
            Some(class) => Self::Instance { class, method },
        })
    }

    /// Returns the method name.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Bare { method } | Self::Static { method, .. } | Self::Instance { method, .. } => {
                method
            }
        }
    }

    /// Returns the qualifying class, if any.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        match self {
            Self::Bare { .. } => None,
            Self::Static { class, .. } | Self::Instance { class, .. } => Some(class),
        }
    }

    /// Returns true for class-qualified signatures.
    #[must_use]
    pub const fn is_qualified(&self) -> bool {
        !matches!(self, Self::Bare { .. })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first == '_' || first.is_alphabetic())
        && chars.all(|ch| ch == '_' || ch.is_alphanumeric())
}

/// One configured API change: a signature, the message shown at each call
/// site, and optionally the new method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiChangeSpec {
    signature: String,
    target: SignatureTarget,
    message: String,
    replacement: Option<String>,
}

impl ApiChangeSpec {
    /// Builds a spec, validating the signature.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::InvalidSignature`] for malformed signatures or
    /// a replacement that is not a plain identifier.
    pub fn new(
        raw_signature: impl Into<String>,
        message: impl Into<String>,
        raw_replacement: Option<String>,
    ) -> Result<Self, UpgradeError> {
        let signature = raw_signature.into();
        let target = SignatureTarget::parse(&signature)?;
        let replacement = raw_replacement
            .map(|name| name.trim().trim_end_matches("()").to_owned())
            .filter(|name| !name.is_empty());
        if let Some(name) = replacement.as_deref().filter(|name| !is_identifier(name)) {
            return Err(UpgradeError::invalid_signature(
                &signature,
                format!("replacement '{name}' is not a plain identifier"),
            ));
        }

        Ok(Self {
            signature,
            target,
            message: message.into(),
            replacement,
        })
    }

    /// The signature as configured.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The parsed target.
    #[must_use]
    pub const fn target(&self) -> &SignatureTarget {
        &self.target
    }

    /// The message reported at each matched call site.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The new method name, when the change can be applied mechanically.
    #[must_use]
    pub fn replacement(&self) -> Option<&str> {
        self.replacement.as_deref()
    }
}

impl fmt::Display for ApiChangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("removedMethod()", SignatureTarget::Bare { method: "removedMethod".to_owned() })]
    #[case(
        "Ns\\C::foo()",
        SignatureTarget::Static { class: "Ns\\C".to_owned(), method: "foo".to_owned() }
    )]
    #[case(
        "\\Ns\\C->foo()",
        SignatureTarget::Instance { class: "Ns\\C".to_owned(), method: "foo".to_owned() }
    )]
    fn parses_signature_forms(#[case] signature: &str, #[case] expected: SignatureTarget) {
        assert_eq!(SignatureTarget::parse(signature), Ok(expected));
    }

    #[rstest]
    #[case("removedMethod")]
    #[case("::foo()")]
    #[case("Ns\\C::()")]
    #[case("$dynamic()")]
    fn rejects_malformed_signatures(#[case] signature: &str) {
        assert!(matches!(
            SignatureTarget::parse(signature),
            Err(UpgradeError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn replacement_drops_trailing_parentheses() {
        let spec = ApiChangeSpec::new("old()", "Renamed", Some("fresh()".to_owned()))
            .expect("valid spec");
        assert_eq!(spec.replacement(), Some("fresh"));
        assert!(!spec.target().is_qualified());
    }

    #[test]
    fn replacement_must_be_an_identifier() {
        let result = ApiChangeSpec::new("old()", "Renamed", Some("Other::fresh".to_owned()));
        assert!(result.is_err());
    }
}
