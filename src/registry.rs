//! Registry of named type declarations with deferred field contributions.
//!
//! Types are declared under a key, extended with lazily evaluated field
//! thunks (associations register theirs this way), and merged into
//! `async_graphql::dynamic` objects at compile time. The registry is an
//! explicit instance owned by the application; [`Registry::flush`] resets
//! it for test isolation. Registration and compilation are separate
//! phases; compilation is pure and repeatable.

use std::sync::Arc;

use async_graphql::dynamic::{Field, Object, Schema, TypeRef};
use indexmap::IndexMap;

use crate::config::{ActorKind, AssociationConfig, ConfigFn};
use crate::fields::association_fields;
use crate::{GraphQLError, Result};

type FieldsThunk = Box<dyn Fn(&Registry) -> Result<Vec<Field>> + Send + Sync>;

/// A named type declaration, not yet compiled.
pub struct TypeDraft {
    name: String,
    description: Option<String>,
    fields: Vec<FieldsThunk>,
}

impl TypeDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a base field contribution. The thunk is re-evaluated on every
    /// compilation and must produce fresh field values each time.
    pub fn fields(mut self, thunk: impl Fn() -> Vec<Field> + Send + Sync + 'static) -> Self {
        self.fields.push(Box::new(move |_| Ok(thunk())));
        self
    }

    /// The GraphQL display name of this type.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Type registry and association registrar.
#[derive(Default)]
pub struct Registry {
    types: IndexMap<String, TypeDraft>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a type under `key`.
    pub fn declare(&mut self, key: impl Into<String>, draft: TypeDraft) -> Result<TypeHandle<'_>> {
        let key = key.into();
        if self.types.contains_key(&key) {
            return Err(GraphQLError::DuplicateType(key));
        }
        self.types.insert(key.clone(), draft);

        Ok(TypeHandle { registry: self, key })
    }

    /// Obtain a handle to a previously declared type.
    pub fn handle(&mut self, key: &str) -> Result<TypeHandle<'_>> {
        if !self.types.contains_key(key) {
            return Err(GraphQLError::TypeNotFound(key.to_string()));
        }

        Ok(TypeHandle {
            registry: self,
            key: key.to_string(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.types.contains_key(key)
    }

    pub(crate) fn draft(&self, key: &str) -> Result<&TypeDraft> {
        self.types
            .get(key)
            .ok_or_else(|| GraphQLError::TypeNotFound(key.to_string()))
    }

    /// The GraphQL display name of the type declared under `key`.
    pub fn display_name(&self, key: &str) -> Result<&str> {
        Ok(self.draft(key)?.name())
    }

    /// A named reference to the compiled object type for `key`, resolved
    /// by the dynamic schema at build time.
    pub fn object_ref(&self, key: &str) -> Result<TypeRef> {
        Ok(TypeRef::named(self.display_name(key)?.to_string()))
    }

    /// Register an additional, lazily evaluated field contribution for
    /// `key`, merged into its final field set at compile time.
    pub fn extend(
        &mut self,
        key: &str,
        thunk: impl Fn() -> Vec<Field> + Send + Sync + 'static,
    ) -> Result<()> {
        self.extend_thunk(key, Box::new(move |_| Ok(thunk())))
    }

    fn extend_thunk(&mut self, key: &str, thunk: FieldsThunk) -> Result<()> {
        let draft = self
            .types
            .get_mut(key)
            .ok_or_else(|| GraphQLError::TypeNotFound(key.to_string()))?;
        draft.fields.push(thunk);
        Ok(())
    }

    /// Register the deferred field contributions for both sides of an
    /// association. `config_fn` is not invoked here; generation happens at
    /// compile time.
    pub(crate) fn associate(
        &mut self,
        parent_key: &str,
        child_key: &str,
        config_fn: ConfigFn,
    ) -> Result<()> {
        self.draft(parent_key)?;
        self.draft(child_key)?;

        for side in [ActorKind::Parent, ActorKind::Child] {
            let parent_key = parent_key.to_string();
            let child_key = child_key.to_string();
            let config_fn = config_fn.clone();
            let target = match side {
                ActorKind::Parent => parent_key.clone(),
                ActorKind::Child => child_key.clone(),
            };

            self.extend_thunk(
                &target,
                Box::new(move |registry| {
                    association_fields(side, &parent_key, &child_key, config_fn(), registry)
                }),
            )?;
        }

        Ok(())
    }

    /// Evaluate every field contribution and merge each type's
    /// contributions into one object.
    pub fn compile(&self) -> Result<Vec<Object>> {
        let mut objects = Vec::with_capacity(self.types.len());

        for draft in self.types.values() {
            let mut object = Object::new(draft.name.clone());
            if let Some(description) = &draft.description {
                object = object.description(description.clone());
            }
            for thunk in &draft.fields {
                for field in thunk(self)? {
                    object = object.field(field);
                }
            }
            objects.push(object);
        }

        Ok(objects)
    }

    /// Compile all types and build an executable schema rooted at the
    /// query type declared under `query_key`.
    pub fn compile_schema(&self, query_key: &str) -> Result<Schema> {
        let query_name = self.display_name(query_key)?.to_string();

        let mut builder = Schema::build(&query_name, None, None);
        for object in self.compile()? {
            builder = builder.register(object);
        }

        builder
            .finish()
            .map_err(|err| GraphQLError::Build(err.to_string()))
    }

    /// Drop all declarations, for test isolation.
    pub fn flush(&mut self) {
        self.types.clear();
    }
}

/// Mutable handle to one declared type.
pub struct TypeHandle<'a> {
    registry: &'a mut Registry,
    key: String,
}

impl std::fmt::Debug for TypeHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeHandle")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl TypeHandle<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Register an additional field contribution for this type.
    pub fn extend(&mut self, thunk: impl Fn() -> Vec<Field> + Send + Sync + 'static) -> Result<()> {
        self.registry.extend(&self.key, thunk)
    }

    /// Associate this type (the parent side) with the type declared under
    /// `child_key`. The configuration thunk is captured and evaluated
    /// lazily, once per side, at compile time.
    pub fn associate_with(
        &mut self,
        child_key: &str,
        config_fn: impl Fn() -> AssociationConfig + Send + Sync + 'static,
    ) -> Result<()> {
        let parent_key = self.key.clone();
        self.registry
            .associate(&parent_key, child_key, Arc::new(config_fn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActorConfig;
    use async_graphql::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn one_to_one_config() -> AssociationConfig {
        AssociationConfig::new("favoritePost")
            .parent(
                ActorConfig::new()
                    .resolve(|_, _| async { Ok(Value::Null) })
                    .get_id(|_| Some("0".into())),
            )
            .child(
                ActorConfig::new()
                    .resolve(|_, _| async { Ok(Value::Null) })
                    .get_id(|_| Some("0".into())),
            )
    }

    #[test]
    fn test_duplicate_declare_is_rejected() {
        let mut registry = Registry::new();
        registry.declare("user", TypeDraft::new("User")).unwrap();

        let err = registry.declare("user", TypeDraft::new("User")).unwrap_err();
        assert!(matches!(err, GraphQLError::DuplicateType(key) if key == "user"));
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.handle("user").unwrap_err(),
            GraphQLError::TypeNotFound(_)
        ));
        assert!(matches!(
            registry.display_name("user").unwrap_err(),
            GraphQLError::TypeNotFound(_)
        ));
    }

    #[test]
    fn test_object_ref_uses_display_name() {
        let mut registry = Registry::new();
        registry.declare("user", TypeDraft::new("User")).unwrap();

        assert_eq!(registry.object_ref("user").unwrap().to_string(), "User");
    }

    #[test]
    fn test_flush_clears_declarations() {
        let mut registry = Registry::new();
        registry.declare("user", TypeDraft::new("User")).unwrap();
        assert!(registry.contains("user"));

        registry.flush();
        assert!(!registry.contains("user"));
    }

    #[test]
    fn test_associate_requires_both_types() {
        let mut registry = Registry::new();
        registry.declare("user", TypeDraft::new("User")).unwrap();

        let err = registry
            .handle("user")
            .unwrap()
            .associate_with("post", one_to_one_config)
            .unwrap_err();
        assert!(matches!(err, GraphQLError::TypeNotFound(key) if key == "post"));
    }

    #[test]
    fn test_config_thunk_is_deferred_and_reevaluated_per_side() {
        let mut registry = Registry::new();
        registry.declare("user", TypeDraft::new("User")).unwrap();
        registry.declare("post", TypeDraft::new("Post")).unwrap();

        let evaluations = Arc::new(AtomicUsize::new(0));
        let counter = evaluations.clone();
        registry
            .handle("user")
            .unwrap()
            .associate_with("post", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                one_to_one_config()
            })
            .unwrap();

        assert_eq!(evaluations.load(Ordering::SeqCst), 0);

        registry.compile().unwrap();
        assert_eq!(evaluations.load(Ordering::SeqCst), 2);

        registry.compile().unwrap();
        assert_eq!(evaluations.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_extension_thunks_reevaluated_per_compile() {
        let mut registry = Registry::new();
        registry.declare("user", TypeDraft::new("User")).unwrap();

        let evaluations = Arc::new(AtomicUsize::new(0));
        let counter = evaluations.clone();
        registry
            .extend("user", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Vec::new()
            })
            .unwrap();

        registry.compile().unwrap();
        registry.compile().unwrap();
        assert_eq!(evaluations.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_misconfiguration_fails_at_compile_not_declaration() {
        let mut registry = Registry::new();
        registry.declare("user", TypeDraft::new("User")).unwrap();
        registry.declare("post", TypeDraft::new("Post")).unwrap();

        // Plural child without `get_ids`: accepted here, rejected later.
        registry
            .handle("user")
            .unwrap()
            .associate_with("post", || {
                AssociationConfig::new("createdPosts")
                    .parent(
                        ActorConfig::new()
                            .resolve(|_, _| async { Ok(Value::Null) })
                            .get_id(|_| Some("0".into())),
                    )
                    .child(
                        ActorConfig::new()
                            .resolve(|_, _| async { Ok(Value::Null) })
                            .connection(TypeRef::named_nn_list("Post")),
                    )
            })
            .unwrap();

        let err = registry.compile().unwrap_err();
        match err {
            GraphQLError::Config { association, side, .. } => {
                assert_eq!(association, "createdPosts");
                assert_eq!(side, ActorKind::Child);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
