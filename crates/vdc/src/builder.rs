//! # Property-Bag Builder
//!
//! Credentials are JSON-LD documents: issuers may attach any number of
//! extension properties the library knows nothing about. [`BasicBuilder`]
//! holds a document under construction as an ordered map of field name to
//! JSON value, with setters that overwrite by key and a [`BasicBuilder::build`]
//! step that validates the bag and freezes it into a concrete [`Document`].

use std::fmt::{self, Debug};
use std::marker::PhantomData;

use credo_core::json;
use serde_json::{Map, Value};

use crate::Result;

/// A document that can be materialized from, and rendered back to, an
/// ordered JSON object.
pub trait Document: Sized {
    /// Validate `properties` and freeze them into a document.
    ///
    /// # Errors
    ///
    /// Returns an error when a required field is missing or has the wrong
    /// shape.
    fn from_object(properties: Map<String, Value>) -> Result<Self>;

    /// Render the document as a JSON object. Every field held by the
    /// document is included, in its original order.
    fn to_object(&self) -> Map<String, Value>;
}

/// A generic builder over a bag of properties.
///
/// Setters perform no validation; that is deferred to [`BasicBuilder::build`].
pub struct BasicBuilder<D> {
    properties: Map<String, Value>,
    document: PhantomData<fn() -> D>,
}

impl<D> Default for BasicBuilder<D> {
    fn default() -> Self {
        Self {
            properties: Map::new(),
            document: PhantomData,
        }
    }
}

impl<D> Clone for BasicBuilder<D> {
    fn clone(&self) -> Self {
        Self {
            properties: self.properties.clone(),
            document: PhantomData,
        }
    }
}

impl<D> Debug for BasicBuilder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicBuilder").field("properties", &self.properties).finish()
    }
}

impl<D> BasicBuilder<D> {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing any previous value.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Overlay every member of `object` onto the bag, key by key.
    #[must_use]
    pub fn set_from_object(mut self, object: Map<String, Value>) -> Self {
        self.properties.extend(object);
        self
    }

    /// Parse `text` as a JSON object and overlay it onto the bag.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedInput`] when `text` is not a JSON
    /// object.
    pub fn set_from_json(self, text: &str) -> Result<Self> {
        let object = json::parse_object(text)?;
        Ok(self.set_from_object(object))
    }

    /// The properties set so far.
    #[must_use]
    pub const fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Returns `true` when no property has been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    /// The current value of `name`, if set.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.properties.get_mut(name)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Value> {
        self.properties.shift_remove(name)
    }
}

impl<D: Document> BasicBuilder<D> {
    /// Seed a builder with every field of an existing document.
    #[must_use]
    pub fn from_partial(document: &D) -> Self {
        Self::new().set_from_object(document.to_object())
    }

    /// Build the document from the current properties.
    ///
    /// The builder is left untouched, so repeated calls without intervening
    /// mutation produce equal documents, and later mutation does not affect a
    /// document already built.
    ///
    /// # Errors
    ///
    /// Returns an error when the document rejects the properties.
    pub fn build(&self) -> Result<D> {
        D::from_object(self.properties.clone())
    }
}
