//! Variable binding: the (OID, value) pair every read and write moves.

use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::value::Value;

/// An OID paired with its value - the atomic unit of any read operation.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    /// Key addressing the value on the device.
    pub oid: Oid,
    /// The value itself (possibly an exception marker).
    pub value: Value,
}

impl VarBind {
    /// Create a new binding.
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }

    /// Create a binding with a NULL value (placeholder in read requests).
    pub fn null(oid: Oid) -> Self {
        Self {
            oid,
            value: Value::Null,
        }
    }

    /// Consume the binding, failing if the value is an exception marker.
    ///
    /// This is the explicit check callers perform before treating a reply
    /// value as real data.
    ///
    /// ```
    /// use snmpoll::{oid, Value, VarBind, Error, SyntaxErrorKind};
    ///
    /// let vb = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::NoSuchInstance);
    /// match vb.into_concrete() {
    ///     Err(e) => assert!(matches!(*e, Error::Syntax { kind: SyntaxErrorKind::NoSuchInstance, .. })),
    ///     Ok(_) => unreachable!(),
    /// }
    /// ```
    pub fn into_concrete(self) -> Result<Value> {
        match self.value.syntax_error() {
            Some(kind) => Err(Error::Syntax {
                oid: self.oid,
                kind,
            }
            .boxed()),
            None => Ok(self.value),
        }
    }

    /// Borrowing variant of [`into_concrete`](Self::into_concrete).
    pub fn check_concrete(&self) -> Result<&Value> {
        match self.value.syntax_error() {
            Some(kind) => Err(Error::Syntax {
                oid: self.oid.clone(),
                kind,
            }
            .boxed()),
            None => Ok(&self.value),
        }
    }
}

impl std::fmt::Display for VarBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.oid, self.value)
    }
}
