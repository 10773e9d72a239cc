//! Association configuration and merging.
//!
//! An [`AssociationConfig`] describes one directed binary relationship
//! between two registered types. "Parent" and "child" name the two ends of
//! the edge (the type that initiates the association plays parent), not an
//! ownership hierarchy. Configuration is captured as a thunk and
//! re-evaluated lazily at schema-compilation time, so it may reference
//! types that do not exist yet when the association is declared.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_graphql::dynamic::{InputValue, TypeRef};
use async_graphql::{Name, Value};
use futures_util::future::BoxFuture;
use indexmap::IndexMap;

use crate::naming::{FieldKind, NamingFn, NamingOverrides, NamingTable};
use crate::{GraphQLError, Result};

/// Arguments forwarded to a caller-supplied resolver.
pub type ArgumentMap = IndexMap<Name, Value>;

/// Caller-supplied fetch function for one side of an association.
///
/// Receives the opposing side's resolved value and the element field's
/// arguments, and produces this side's entity (or entities, for a plural
/// side). Execution context (database handles, loaders, ...) travels via
/// closure capture.
pub type ResolveFn =
    Arc<dyn Fn(Value, ArgumentMap) -> BoxFuture<'static, async_graphql::Result<Value>> + Send + Sync>;

/// Extracts the stable identifier from a singular resolved entity.
pub type GetIdFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Extracts stable identifiers from a resolved collection.
pub type GetIdsFn = Arc<dyn Fn(&Value) -> Option<Vec<String>> + Send + Sync>;

/// Lazy configuration thunk, invoked once per side per compilation.
pub type ConfigFn = Arc<dyn Fn() -> AssociationConfig + Send + Sync>;

/// Wrap an async closure into a [`ResolveFn`].
pub fn resolver<F, Fut>(f: F) -> ResolveFn
where
    F: Fn(Value, ArgumentMap) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = async_graphql::Result<Value>> + Send + 'static,
{
    Arc::new(move |obj, args| Box::pin(f(obj, args)))
}

/// One of the two sides of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Parent,
    Child,
}

impl ActorKind {
    pub fn opposite(self) -> Self {
        match self {
            ActorKind::Parent => ActorKind::Child,
            ActorKind::Child => ActorKind::Parent,
        }
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActorKind::Parent => "parent",
            ActorKind::Child => "child",
        })
    }
}

/// Relationship cardinality, derived from which sides declare a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl Relationship {
    fn derive(parent: &ActorConfig, child: &ActorConfig) -> Self {
        if parent.connection.is_some() {
            Relationship::ManyToMany
        } else if child.connection.is_some() {
            Relationship::OneToMany
        } else {
            Relationship::OneToOne
        }
    }
}

/// Configuration for one side of an association.
///
/// Declaring a `connection` marks this side as plural: the opposing side
/// sees many of this actor, the element field uses the connection type, and
/// `get_ids` becomes required. A side without a connection is singular and
/// requires `get_id` instead.
#[derive(Default)]
pub struct ActorConfig {
    pub(crate) connection: Option<TypeRef>,
    pub(crate) connection_args: Vec<InputValue>,
    pub(crate) resolve: Option<ResolveFn>,
    pub(crate) get_id: Option<GetIdFn>,
    pub(crate) get_ids: Option<GetIdsFn>,
    pub(crate) naming: NamingOverrides,
}

impl ActorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark this side plural, exposing `ty` as the element field type on
    /// the opposing side.
    pub fn connection(mut self, ty: TypeRef) -> Self {
        self.connection = Some(ty);
        self
    }

    /// Add an argument to the element field exposed to the opposing side.
    pub fn connection_arg(mut self, arg: InputValue) -> Self {
        self.connection_args.push(arg);
        self
    }

    /// Set the fetch function for this side.
    pub fn resolve<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Value, ArgumentMap) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = async_graphql::Result<Value>> + Send + 'static,
    {
        self.resolve = Some(resolver(f));
        self
    }

    /// Set a pre-built fetch function, useful when sharing one resolver
    /// across configurations.
    pub fn resolve_fn(mut self, f: ResolveFn) -> Self {
        self.resolve = Some(f);
        self
    }

    /// Identifier extractor for a singular side.
    pub fn get_id(mut self, f: impl Fn(&Value) -> Option<String> + Send + Sync + 'static) -> Self {
        self.get_id = Some(Arc::new(f));
        self
    }

    /// Identifier extractor for a plural side.
    pub fn get_ids(
        mut self,
        f: impl Fn(&Value) -> Option<Vec<String>> + Send + Sync + 'static,
    ) -> Self {
        self.get_ids = Some(Arc::new(f));
        self
    }

    /// Override the naming formula for one generated field kind.
    pub fn naming(
        mut self,
        kind: FieldKind,
        formula: impl Fn(&str, &str, &str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.naming.set(kind, Arc::new(formula) as NamingFn);
        self
    }
}

/// Caller-supplied association configuration, produced fresh by the
/// configuration thunk on every evaluation.
pub struct AssociationConfig {
    pub(crate) name: String,
    pub(crate) item_name: Option<String>,
    pub(crate) parent: ActorConfig,
    pub(crate) child: ActorConfig,
}

impl AssociationConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            item_name: None,
            parent: ActorConfig::default(),
            child: ActorConfig::default(),
        }
    }

    /// Singular form used in check-field names; defaults to the
    /// association name.
    pub fn item_name(mut self, item_name: impl Into<String>) -> Self {
        self.item_name = Some(item_name.into());
        self
    }

    pub fn parent(mut self, parent: ActorConfig) -> Self {
        self.parent = parent;
        self
    }

    pub fn child(mut self, child: ActorConfig) -> Self {
        self.child = child;
        self
    }

    /// Cardinality derived from which sides declare a connection.
    pub fn relationship(&self) -> Relationship {
        Relationship::derive(&self.parent, &self.child)
    }

    /// Merge defaults in and validate structure, producing a fully
    /// populated configuration.
    pub(crate) fn extract(self) -> Result<ExtractedConfig> {
        let relationship = self.relationship();
        let item_name = self.item_name.unwrap_or_else(|| self.name.clone());

        let parent = extract_actor(&self.name, ActorKind::Parent, self.parent)?;
        let child = extract_actor(&self.name, ActorKind::Child, self.child)?;

        Ok(ExtractedConfig {
            name: self.name,
            item_name,
            relationship,
            parent,
            child,
        })
    }
}

/// Identifier extraction, unified over cardinality.
#[derive(Clone)]
pub(crate) enum IdExtractor {
    Single(GetIdFn),
    Plural(GetIdsFn),
}

impl IdExtractor {
    /// Extract the identifier list to match membership checks against.
    pub(crate) fn ids(&self, resolved: &Value) -> async_graphql::Result<Vec<String>> {
        let ids = match self {
            IdExtractor::Single(get_id) => get_id(resolved).map(|id| vec![id]),
            IdExtractor::Plural(get_ids) => get_ids(resolved),
        };

        ids.ok_or_else(|| "could not extract identifiers from resolved value".into())
    }
}

/// Fully populated configuration for one side.
pub(crate) struct ExtractedActor {
    pub(crate) connection: Option<TypeRef>,
    pub(crate) connection_args: Vec<InputValue>,
    pub(crate) resolve: ResolveFn,
    pub(crate) ids: IdExtractor,
    pub(crate) naming: NamingTable,
}

/// Result of merging a caller configuration over the defaults.
pub(crate) struct ExtractedConfig {
    pub(crate) name: String,
    pub(crate) item_name: String,
    #[allow(dead_code)]
    pub(crate) relationship: Relationship,
    pub(crate) parent: ExtractedActor,
    pub(crate) child: ExtractedActor,
}

impl std::fmt::Debug for ExtractedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractedConfig")
            .field("name", &self.name)
            .field("item_name", &self.item_name)
            .finish_non_exhaustive()
    }
}

fn extract_actor(association: &str, side: ActorKind, actor: ActorConfig) -> Result<ExtractedActor> {
    let config_error = |reason: &str| GraphQLError::Config {
        association: association.to_string(),
        side,
        reason: reason.to_string(),
    };

    let resolve = actor.resolve.ok_or_else(|| config_error("`resolve` is required"))?;

    let ids = match (&actor.connection, actor.get_id, actor.get_ids) {
        (Some(_), _, Some(get_ids)) => IdExtractor::Plural(get_ids),
        (Some(_), _, None) => {
            return Err(config_error("a connection is declared but `get_ids` is missing"))
        }
        (None, Some(get_id), _) => IdExtractor::Single(get_id),
        (None, None, _) => {
            return Err(config_error("`get_id` is required when no connection is declared"))
        }
    };

    Ok(ExtractedActor {
        connection: actor.connection,
        connection_args: actor.connection_args,
        resolve,
        ids,
        naming: NamingTable::for_side(side, actor.naming),
    })
}
