//! Native identifier types and their string form on the wire.
//!
//! JSON:API ids are always strings. [`ResourceId`] converts an identifier field
//! to and from that form; `Option<T>` models ids that are absent on create.

use thiserror::Error;

/// Why a wire id could not become a native identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The resource object carried no id.
    #[error("resource object has no id")]
    Missing,
    /// The id string does not parse into the native type.
    #[error("malformed id: {0}")]
    Malformed(String),
}

/// A native type usable as a resource identifier.
pub trait ResourceId: Sized {
    /// The wire id, or `None` when the identifier is unset.
    fn to_id(&self) -> Option<String>;

    /// Parse the wire id (`None` when the object has no `id` member).
    fn from_id(id: Option<&str>) -> Result<Self, IdError>;
}

impl ResourceId for String {
    fn to_id(&self) -> Option<String> {
        Some(self.clone())
    }

    fn from_id(id: Option<&str>) -> Result<Self, IdError> {
        id.map(str::to_string).ok_or(IdError::Missing)
    }
}

macro_rules! impl_integer_id {
    ($($ty:ty),*) => {$(
        impl ResourceId for $ty {
            fn to_id(&self) -> Option<String> {
                Some(self.to_string())
            }

            fn from_id(id: Option<&str>) -> Result<Self, IdError> {
                let id = id.ok_or(IdError::Missing)?;
                id.parse::<$ty>()
                    .map_err(|e| IdError::Malformed(format!("not a valid {}: {e}", stringify!($ty))))
            }
        }
    )*};
}

impl_integer_id!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, isize, usize);

impl<T: ResourceId> ResourceId for Option<T> {
    fn to_id(&self) -> Option<String> {
        self.as_ref().and_then(ResourceId::to_id)
    }

    fn from_id(id: Option<&str>) -> Result<Self, IdError> {
        match id {
            None => Ok(None),
            Some(id) => T::from_id(Some(id)).map(Some),
        }
    }
}
