//! # Schema-bearing handlers.
//!
//! [`SchemaHandle`] extends [`Handle`] with [`input_schemas`](SchemaHandle::input_schemas),
//! a list of schema descriptors (JSON values) advertising the payload shapes
//! the handler accepts. Discovery and validation tooling reads the schemas;
//! dispatch itself never looks at them.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::event::Event;
use crate::handler::handle::Handle;
use crate::handler::handler_fn::HandlerFn;

/// Handler advertising the schemas of the payloads it accepts.
pub trait SchemaHandle: Handle {
    /// Schema descriptors for the handler's accepted inputs.
    fn input_schemas(&self) -> Vec<serde_json::Value>;
}

/// Callback-adapted handler carrying schema descriptors.
#[derive(Debug)]
pub struct SchemaHandlerFn<F> {
    inner: HandlerFn<F>,
    schemas: Vec<serde_json::Value>,
}

impl<F, Fut> SchemaHandlerFn<F>
where
    F: Fn(String, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    /// Creates a schema-bearing handler from a callback and its schemas.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        schemas: Vec<serde_json::Value>,
        f: F,
    ) -> Self {
        Self {
            inner: HandlerFn::new(name, f),
            schemas,
        }
    }

    /// Creates the handler and returns it as a shared schema-aware handle.
    pub fn arc(
        name: impl Into<Cow<'static, str>>,
        schemas: Vec<serde_json::Value>,
        f: F,
    ) -> Arc<Self> {
        Arc::new(Self::new(name, schemas, f))
    }
}

#[async_trait]
impl<F, Fut> Handle for SchemaHandlerFn<F>
where
    F: Fn(String, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, topic: &str, event: &Event) -> Result<(), HandlerError> {
        self.inner.handle(topic, event).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

impl<F, Fut> SchemaHandle for SchemaHandlerFn<F>
where
    F: Fn(String, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn input_schemas(&self) -> Vec<serde_json::Value> {
        self.schemas.clone()
    }
}
