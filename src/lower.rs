use std::sync::Arc;

use crate::error::SchemaError;
use crate::schema::{Schema, SchemaDoc};
use crate::shape::{Field, RecordShape, Registry, Shape};

// JTD integer widths all land on i64; range checks are not structural.
const INTEGER_TYPES: &[&str] = &["int8", "uint8", "int16", "uint16", "int32", "uint32"];
const FLOAT_TYPES: &[&str] = &["float32", "float64"];

/// Lower a schema document into a checked registry plus root shape.
///
/// Definitions become registry entries under their own names; inline records
/// are named after their position (`Root`, `RootAddress`, `RootAddressGeo`).
pub fn lower_schema(doc: &SchemaDoc, root_name: &str) -> Result<Schema, SchemaError> {
    let mut registry = Registry::new();
    for (name, def) in &doc.definitions {
        let at = format!("/definitions/{name}");
        let shape = lower_node(def, &pascal_case(name), &at)?;
        registry.define(name.clone(), shape);
    }
    let root = lower_node(doc, root_name, "")?;
    registry.check_root(&root)?;
    // `nullable` on a ref to a nullable definition adds nothing
    let root = registry.collapse_optionals(&root);
    tracing::debug!(definitions = registry.len(), root = %root, "schema lowered");
    Ok(Schema::new(registry, root))
}

fn lower_node(doc: &SchemaDoc, name: &str, at: &str) -> Result<Shape, SchemaError> {
    let base = lower_form(doc, name, at)?;
    Ok(if doc.nullable { Shape::optional(base) } else { base })
}

fn lower_form(doc: &SchemaDoc, name: &str, at: &str) -> Result<Shape, SchemaError> {
    if !at.is_empty() && !doc.definitions.is_empty() {
        return Err(invalid(at, "definitions are only allowed at the root"));
    }

    let forms = [
        ("ref", doc.ref_.is_some()),
        ("type", doc.type_.is_some()),
        ("enum", doc.enum_.is_some()),
        ("elements", doc.elements.is_some()),
        ("values", doc.values.is_some()),
        ("properties", doc.properties.is_some() || doc.optional_properties.is_some()),
        ("discriminator", doc.discriminator.is_some()),
        ("oneOf", doc.one_of.is_some()),
    ];
    let present: Vec<&str> = forms.iter().filter(|(_, set)| *set).map(|(k, _)| *k).collect();
    if present.len() > 1 {
        return Err(invalid(at, &format!("conflicting forms: {}", present.join(", "))));
    }
    if doc.mapping.is_some() && doc.discriminator.is_none() {
        return Err(invalid(at, "`mapping` requires `discriminator`"));
    }
    if doc.additional_properties.is_some() && doc.properties.is_none() && doc.optional_properties.is_none() {
        return Err(invalid(at, "`additionalProperties` requires `properties`"));
    }

    // 1) References
    if let Some(target) = &doc.ref_ {
        return Ok(Shape::reference(target.clone()));
    }

    // 2) Scalars
    if let Some(type_) = &doc.type_ {
        return lower_type(type_);
    }
    if let Some(values) = &doc.enum_ {
        if values.is_empty() {
            return Err(invalid(at, "`enum` must not be empty"));
        }
        if let Some(dup) = values.iter().enumerate().find(|&(i, v)| values[..i].contains(v)) {
            return Err(invalid(at, &format!("duplicate enum value `{}`", dup.1)));
        }
        return Ok(Shape::Enum(values.clone()));
    }

    // 3) Containers
    if let Some(element) = &doc.elements {
        return Ok(Shape::list(lower_node(element, name, &format!("{at}/elements"))?));
    }
    if let Some(value) = &doc.values {
        return Ok(Shape::map(lower_node(value, name, &format!("{at}/values"))?));
    }

    // 4) Records
    if doc.properties.is_some() || doc.optional_properties.is_some() {
        return Ok(Shape::Record(Arc::new(lower_record(doc, name, at, None)?)));
    }

    // 5) Unions
    if let Some(tag) = &doc.discriminator {
        return lower_discriminator(doc, tag, name, at);
    }
    if let Some(variants) = &doc.one_of {
        if variants.is_empty() {
            return Err(invalid(at, "`oneOf` must not be empty"));
        }
        let arms = variants
            .iter()
            .enumerate()
            .map(|(i, v)| lower_node(v, &format!("{name}{i}"), &format!("{at}/oneOf/{i}")))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Shape::Union(arms));
    }

    // 6) Empty form
    Ok(Shape::Any)
}

fn lower_type(type_: &str) -> Result<Shape, SchemaError> {
    match type_ {
        "boolean" => Ok(Shape::boolean()),
        "string" | "timestamp" => Ok(Shape::string()),
        t if INTEGER_TYPES.contains(&t) => Ok(Shape::integer()),
        t if FLOAT_TYPES.contains(&t) => Ok(Shape::float()),
        other => Err(SchemaError::UnknownType(other.to_string())),
    }
}

/// `tag` is the discriminator field to put first, for mapping variants.
fn lower_record(doc: &SchemaDoc, name: &str, at: &str, tag: Option<Field>) -> Result<RecordShape, SchemaError> {
    let mut record = RecordShape::new(name);
    record.description = doc.description().map(str::to_string);
    record.fields.extend(tag);

    let required = doc.properties.iter().flatten().map(|(k, v)| (k, v, false, "properties"));
    let optional = doc.optional_properties.iter().flatten().map(|(k, v)| (k, v, true, "optionalProperties"));
    for (key, sub, optional, section) in required.chain(optional) {
        if record.get(key).is_some() {
            return Err(invalid(at, &format!("property `{key}` declared twice")));
        }
        let sub_at = format!("{at}/{section}/{key}");
        let mut shape = lower_node(sub, &format!("{name}{}", pascal_case(key)), &sub_at)?;
        if optional {
            shape = Shape::optional(shape);
        }
        record.fields.push(Field {
            name: key.clone(),
            shape,
            optional,
            description: sub.description().map(str::to_string),
        });
    }
    Ok(record)
}

// Each mapping entry becomes a record whose first field pins the tag to a
// single enum value; the ordered union then picks the one whose tag matches.
fn lower_discriminator(doc: &SchemaDoc, tag: &str, name: &str, at: &str) -> Result<Shape, SchemaError> {
    let Some(mapping) = &doc.mapping else {
        return Err(invalid(at, "`discriminator` requires `mapping`"));
    };
    let mut arms = Vec::with_capacity(mapping.len());
    for (value, variant) in mapping {
        let variant_at = format!("{at}/mapping/{value}");
        if variant.nullable {
            return Err(invalid(&variant_at, "mapping variants cannot be nullable"));
        }
        if variant.properties.is_none() && variant.optional_properties.is_none() {
            return Err(invalid(&variant_at, "mapping variants must use the properties form"));
        }
        let tag_field = Field {
            name: tag.to_string(),
            shape: Shape::Enum(vec![value.clone()]),
            optional: false,
            description: None,
        };
        let declares_tag = [&variant.properties, &variant.optional_properties]
            .into_iter()
            .flatten()
            .any(|props| props.contains_key(tag));
        if declares_tag {
            return Err(invalid(&variant_at, &format!("property `{tag}` is the discriminator")));
        }
        let variant_name = format!("{name}{}", pascal_case(value));
        let record = lower_record(variant, &variant_name, &variant_at, Some(tag_field))?;
        arms.push(Shape::record(record));
    }
    if arms.is_empty() {
        return Err(invalid(at, "`mapping` must not be empty"));
    }
    Ok(Shape::Union(arms))
}

fn invalid(at: &str, message: &str) -> SchemaError {
    let at = if at.is_empty() { "/" } else { at };
    SchemaError::Invalid { at: at.to_string(), message: message.to_string() }
}

/// `shipping_address` → `ShippingAddress`, `geo-point` → `GeoPoint`.
fn pascal_case(s: &str) -> String {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_splits_on_punctuation() {
        assert_eq!(pascal_case("shipping_address"), "ShippingAddress");
        assert_eq!(pascal_case("geo-point"), "GeoPoint");
        assert_eq!(pascal_case("x"), "X");
    }

    #[test]
    fn integer_widths_collapse() {
        for t in INTEGER_TYPES {
            assert_eq!(lower_type(t).unwrap(), Shape::integer());
        }
        assert!(matches!(lower_type("int64"), Err(SchemaError::UnknownType(t)) if t == "int64"));
    }
}
