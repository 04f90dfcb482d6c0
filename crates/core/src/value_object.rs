//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** - they have no
/// identity, only attributes. Two value objects with the same attribute
/// values are the same value. To "modify" one, construct a new one.
///
/// `Money` and `ApprovalFlow` are the value objects of this workspace; an
/// `ApprovalStep` is *not* one (it has identity through its step number and
/// its status changes over time - that makes it an entity).
///
/// The trait bounds keep value objects cheap to copy, comparable, and
/// debuggable:
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Money(Decimal);
///
/// impl ValueObject for Money {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
