//! Generation of association fields for one side of a relationship.
//!
//! Invoked lazily at schema-compilation time, once per side, so opposing
//! type lookups succeed regardless of declaration order. Each invocation
//! re-extracts the configuration and produces the element field, the
//! single-check field, and (when the associated side is plural) the
//! multi-check and multi-check-all fields.

use async_graphql::dynamic::{Field, FieldFuture, FieldValue, InputValue, ResolverContext, TypeRef};
use async_graphql::Value;
use tracing::warn;

use crate::config::{ActorKind, ArgumentMap, AssociationConfig, ExtractedConfig};
use crate::naming::FieldKind;
use crate::registry::Registry;
use crate::Result;

/// Produce the generated field set contributed to `actor`'s type.
pub(crate) fn association_fields(
    actor: ActorKind,
    parent_key: &str,
    child_key: &str,
    config: AssociationConfig,
    registry: &Registry,
) -> Result<Vec<Field>> {
    let ExtractedConfig {
        name,
        item_name,
        relationship: _,
        parent,
        child,
    } = config.extract()?;

    let (current_key, associated_key) = match actor {
        ActorKind::Parent => (parent_key, child_key),
        ActorKind::Child => (child_key, parent_key),
    };
    let (current, associated) = match actor {
        ActorKind::Parent => (parent, child),
        ActorKind::Child => (child, parent),
    };

    let associated_name = registry.display_name(associated_key)?.to_string();
    let field_name =
        |kind: FieldKind| current.naming.resolve(kind, &name, &item_name, &associated_name);

    let mut fields = Vec::new();

    // Element field: a direct pass-through to the associated side's
    // resolver, typed as the connection when that side is plural.
    let element_type = match &associated.connection {
        Some(connection) => connection.clone(),
        None => registry.object_ref(associated_key)?,
    };
    let mut element = Field::new(field_name(FieldKind::Element), element_type, {
        let resolve = associated.resolve.clone();
        move |ctx| {
            let resolve = resolve.clone();
            FieldFuture::new(async move {
                let args = ctx.args.as_index_map().clone();
                let resolved = resolve(current_object(&ctx), args).await?;
                Ok(to_field_value(resolved))
            })
        }
    })
    .description("element field");
    for arg in associated.connection_args {
        element = element.argument(arg);
    }
    fields.push(element);

    // Single check: membership of one id among the associated identifiers.
    // For a singular associated side this tests the one related entity.
    let single_check_name = field_name(FieldKind::SingleCheck);
    let single_check = Field::new(
        single_check_name.clone(),
        TypeRef::named(TypeRef::BOOLEAN),
        {
            let resolve = associated.resolve.clone();
            let ids = associated.ids.clone();
            move |ctx| {
                let resolve = resolve.clone();
                let ids = ids.clone();
                FieldFuture::new(async move {
                    let id = required_id(&ctx, "id")?;
                    let resolved = resolve(current_object(&ctx), ArgumentMap::new()).await?;
                    let known = ids.ids(&resolved)?;
                    Ok(Some(FieldValue::value(
                        known.iter().any(|known_id| *known_id == id),
                    )))
                })
            }
        },
    )
    .description("single check field")
    .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::ID)));
    fields.push(single_check);

    if associated.connection.is_some() {
        // Multi check: one existential membership test per input id,
        // output order matching input order.
        let multi_check_name = field_name(FieldKind::MultiCheck);
        if multi_check_name == single_check_name {
            warn!(
                association = %name,
                type_key = current_key,
                field = %multi_check_name,
                "multiCheck naming conflicts with singleCheck naming; skipping multiCheck field"
            );
        } else {
            let multi_check = Field::new(
                multi_check_name.clone(),
                TypeRef::named_list(TypeRef::BOOLEAN),
                {
                    let resolve = associated.resolve.clone();
                    let ids = associated.ids.clone();
                    move |ctx| {
                        let resolve = resolve.clone();
                        let ids = ids.clone();
                        FieldFuture::new(async move {
                            let queried = required_id_list(&ctx, "ids")?;
                            let resolved =
                                resolve(current_object(&ctx), ArgumentMap::new()).await?;
                            let known = ids.ids(&resolved)?;
                            let checks: Vec<FieldValue> = queried
                                .iter()
                                .map(|id| FieldValue::value(known.contains(id)))
                                .collect();
                            Ok(Some(FieldValue::list(checks)))
                        })
                    }
                },
            )
            .description("multi check field")
            .argument(InputValue::new("ids", TypeRef::named_nn_list_nn(TypeRef::ID)));
            fields.push(multi_check);
        }

        // Multi check all: AND-reduction over the same membership tests,
        // vacuously true for an empty id list.
        let multi_check_all_name = field_name(FieldKind::MultiCheckAll);
        if multi_check_all_name == multi_check_name {
            warn!(
                association = %name,
                type_key = current_key,
                field = %multi_check_all_name,
                "multiCheckAll naming conflicts with multiCheck naming; skipping multiCheckAll field"
            );
        } else {
            let multi_check_all = Field::new(
                multi_check_all_name,
                TypeRef::named(TypeRef::BOOLEAN),
                {
                    let resolve = associated.resolve.clone();
                    let ids = associated.ids.clone();
                    move |ctx| {
                        let resolve = resolve.clone();
                        let ids = ids.clone();
                        FieldFuture::new(async move {
                            let queried = required_id_list(&ctx, "ids")?;
                            let resolved =
                                resolve(current_object(&ctx), ArgumentMap::new()).await?;
                            let known = ids.ids(&resolved)?;
                            let all = queried.iter().all(|id| known.contains(id));
                            Ok(Some(FieldValue::value(all)))
                        })
                    }
                },
            )
            .description("multi check all field")
            .argument(InputValue::new("ids", TypeRef::named_nn_list_nn(TypeRef::ID)));
            fields.push(multi_check_all);
        }
    }

    Ok(fields)
}

/// The current side's resolved value, as seen by a generated resolver.
fn current_object(ctx: &ResolverContext<'_>) -> Value {
    ctx.parent_value.as_value().cloned().unwrap_or(Value::Null)
}

/// Coerce an ID argument value to its string form.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_id(ctx: &ResolverContext<'_>, arg: &str) -> async_graphql::Result<String> {
    ctx.args
        .as_index_map()
        .get(arg)
        .and_then(id_string)
        .ok_or_else(|| format!("argument `{arg}` must be an ID").into())
}

fn required_id_list(ctx: &ResolverContext<'_>, arg: &str) -> async_graphql::Result<Vec<String>> {
    match ctx.args.as_index_map().get(arg) {
        Some(Value::List(items)) => items
            .iter()
            .map(|item| {
                id_string(item)
                    .ok_or_else(|| format!("argument `{arg}` must contain only IDs").into())
            })
            .collect(),
        _ => Err(format!("argument `{arg}` must be a list of IDs").into()),
    }
}

fn to_field_value(value: Value) -> Option<FieldValue<'static>> {
    match value {
        Value::Null => None,
        Value::List(items) => Some(FieldValue::list(items.into_iter().map(FieldValue::value))),
        other => Some(FieldValue::value(other)),
    }
}
