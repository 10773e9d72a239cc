//! # modular-graphql
//!
//! Schema-composition helpers for `async_graphql::dynamic` schemas.
//!
//! ## Features
//!
//! - **Type Registry** - named type declarations with deferred,
//!   lazily merged field contributions
//! - **Associations** - declarative one-to-one, one-to-many and
//!   many-to-many relationships between registered types
//! - **Membership Checks** - generated boolean fields testing whether
//!   related-entity identifiers match queried ids
//!
//! ## Usage
//!
//! ```rust
//! use async_graphql::dynamic::TypeRef;
//! use async_graphql::{value, Value};
//! use modular_graphql::{ActorConfig, AssociationConfig, Registry, TypeDraft};
//!
//! fn object_id(value: &Value) -> Option<String> {
//!     match value {
//!         Value::Object(map) => match map.get("id") {
//!             Some(Value::String(id)) => Some(id.clone()),
//!             _ => None,
//!         },
//!         _ => None,
//!     }
//! }
//!
//! # fn main() -> modular_graphql::Result<()> {
//! let mut registry = Registry::new();
//! registry.declare("user", TypeDraft::new("User"))?;
//! registry.declare("post", TypeDraft::new("Post"))?;
//!
//! registry.handle("user")?.associate_with("post", || {
//!     AssociationConfig::new("createdPosts")
//!         .item_name("createdPost")
//!         .parent(
//!             ActorConfig::new()
//!                 .resolve(|_post, _args| async { Ok(value!({ "id": "0" })) })
//!                 .get_id(object_id),
//!         )
//!         .child(
//!             ActorConfig::new()
//!                 .connection(TypeRef::named_nn_list("Post"))
//!                 .resolve(|_user, _args| async { Ok(value!([{ "id": "1" }])) })
//!                 .get_ids(|posts| match posts {
//!                     Value::List(items) => {
//!                         Some(items.iter().filter_map(object_id).collect())
//!                     }
//!                     _ => None,
//!                 }),
//!         )
//! })?;
//!
//! // Field generation is deferred until compilation.
//! let objects = registry.compile()?;
//! assert_eq!(objects.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod fields;
pub mod naming;
pub mod registry;

pub use config::{
    resolver, ActorConfig, ActorKind, ArgumentMap, AssociationConfig, ConfigFn, GetIdFn, GetIdsFn,
    Relationship, ResolveFn,
};
pub use naming::{FieldKind, NamingFn, NamingOverrides};
pub use registry::{Registry, TypeDraft, TypeHandle};

use thiserror::Error;

/// Schema-composition errors
#[derive(Error, Debug)]
pub enum GraphQLError {
    #[error("raw type '{0}' does not exist")]
    TypeNotFound(String),

    #[error("type '{0}' already exists")]
    DuplicateType(String),

    #[error("association '{association}' is misconfigured on the {side} side: {reason}")]
    Config {
        association: String,
        side: ActorKind,
        reason: String,
    },

    #[error("schema build failed: {0}")]
    Build(String),
}

/// Result type for schema-composition operations
pub type Result<T> = std::result::Result<T, GraphQLError>;
