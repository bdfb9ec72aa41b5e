//! The serializable contract and the handler output type.
//!
//! Any type can be an endpoint result as long as it implements
//! [`Serializable`]. Plain `serde` types get it for free through the [`Json`]
//! wrapper; types that need to await something while rendering (loading a
//! related record, signing a URL) implement the trait directly.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::errors::EndpointError;

/// Capability of turning a domain result into wire data.
#[async_trait]
pub trait Serializable: Send + Sync {
    /// Produces a JSON-compatible value (mapping, sequence, primitive, or null).
    async fn serialize(&self) -> Result<Value, EndpointError>;
}

/// Adapter giving any [`serde::Serialize`] type the [`Serializable`] capability.
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

#[async_trait]
impl<T> Serializable for Json<T>
where
    T: Serialize + Send + Sync,
{
    async fn serialize(&self) -> Result<Value, EndpointError> {
        Ok(serde_json::to_value(&self.0)?)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// What a handler returns on success.
pub enum Output {
    /// Nothing to report; the envelope carries neither `data` nor `errors`.
    Void,
    /// `data` becomes the serialized value.
    Single(Box<dyn Serializable>),
    /// `data` becomes an array of serialized values, in the same order.
    Sequence(Vec<Box<dyn Serializable>>),
}

impl Output {
    /// Wraps one result.
    pub fn single(result: impl Serializable + 'static) -> Self {
        Self::Single(Box::new(result))
    }

    /// Wraps an ordered collection of results.
    pub fn sequence<I, S>(results: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Serializable + 'static,
    {
        Self::Sequence(
            results
                .into_iter()
                .map(|r| Box::new(r) as Box<dyn Serializable>)
                .collect(),
        )
    }

    /// Wraps a `serde` value as a single result.
    pub fn json<T>(value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Self::single(Json(value))
    }

    /// Renders the output into the envelope's `data` slot.
    ///
    /// Sequence elements are awaited one after another, never concurrently.
    pub async fn render(&self) -> Result<Option<Value>, EndpointError> {
        match self {
            Output::Void => Ok(None),
            Output::Single(result) => Ok(Some(result.serialize().await?)),
            Output::Sequence(results) => {
                let mut data = Vec::with_capacity(results.len());
                for result in results {
                    data.push(result.serialize().await?);
                }
                Ok(Some(Value::Array(data)))
            }
        }
    }
}

impl From<()> for Output {
    fn from((): ()) -> Self {
        Output::Void
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Output::Void => f.write_str("Void"),
            Output::Single(_) => f.write_str("Single(..)"),
            Output::Sequence(results) => write!(f, "Sequence(len = {})", results.len()),
        }
    }
}
