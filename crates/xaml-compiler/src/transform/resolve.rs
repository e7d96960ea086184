//! XML type name resolution shared by the passes

use super::context::TransformContext;
use crate::ast::{XamlTypeReference, XmlTypeReference, XAML2006};
use xaml_types::{full_type_name, XType};

const CLR_NAMESPACE: &str = "clr-namespace:";
const USING_NAMESPACE: &str = "using:";

/// Resolve a markup type reference, caching the result in the context
pub fn resolve_type(ctx: &mut TransformContext, reference: &XmlTypeReference) -> Result<XType, String> {
    if let Some(ty) = ctx.type_cache.get(reference) {
        return Ok(ty.clone());
    }

    let arguments = reference
        .generic_arguments
        .iter()
        .map(|arg| resolve_reference(ctx, arg))
        .collect::<Result<Vec<_>, _>>()?;

    let name = if arguments.is_empty() {
        reference.name.clone()
    } else {
        format!("{}`{}", reference.name, arguments.len())
    };

    let definition = lookup(ctx, &reference.namespace, &name).ok_or_else(|| {
        format!(
            "Unable to resolve type {} from namespace {}",
            name, reference.namespace
        )
    })?;

    let ty = if arguments.is_empty() {
        definition
    } else {
        definition
            .make_generic_type(&arguments)
            .map_err(|e| format!("Unable to instantiate {}: {}", name, e))?
    };

    ctx.type_cache.insert(reference.clone(), ty.clone());
    Ok(ty)
}

/// Resolve either flavour of type reference
pub fn resolve_reference(ctx: &mut TransformContext, reference: &XamlTypeReference) -> Result<XType, String> {
    match reference {
        XamlTypeReference::Clr(ty) => Ok(ty.clone()),
        XamlTypeReference::Xml(xml) => resolve_type(ctx, xml),
    }
}

/// Resolve a `prefix:Name` string through the document's namespace aliases
pub fn resolve_prefixed(ctx: &mut TransformContext, prefixed: &str) -> Result<XType, String> {
    let (prefix, name) = prefixed.trim().split_once(':').unwrap_or(("", prefixed.trim()));
    let namespace = ctx
        .namespace_aliases
        .get(prefix)
        .cloned()
        .ok_or_else(|| format!("Unable to resolve namespace prefix '{}'", prefix))?;
    resolve_type(ctx, &XmlTypeReference::new(namespace, name))
}

fn lookup(ctx: &TransformContext, namespace: &str, name: &str) -> Option<XType> {
    let ts = ctx.config.type_system();

    if namespace == XAML2006 {
        let wk = ctx.config.well_known_types();
        return match name {
            "Object" => Some(wk.object.clone()),
            "String" => Some(wk.string.clone()),
            "Boolean" => Some(wk.boolean.clone()),
            "Int32" => Some(wk.int32.clone()),
            "Int64" => Some(wk.int64.clone()),
            "Double" => Some(wk.double.clone()),
            "Type" => Some(wk.system_type.clone()),
            _ => None,
        };
    }

    if let Some(rest) = namespace.strip_prefix(CLR_NAMESPACE) {
        let mut parts = rest.split(';');
        let clr_ns = parts.next().unwrap_or_default().trim();
        let assembly = parts.find_map(|p| p.trim().strip_prefix("assembly="));
        let full_name = full_type_name(clr_ns, name);
        return match assembly {
            Some(assembly) => ts.find_type_in(&full_name, assembly),
            None => ts.find_type(&full_name),
        };
    }

    if let Some(clr_ns) = namespace.strip_prefix(USING_NAMESPACE) {
        return ts.find_type(&full_type_name(clr_ns.trim(), name));
    }

    ctx.config
        .type_mappings()
        .xmlns_mappings
        .get(namespace)?
        .iter()
        .find_map(|mapping| {
            let full_name = full_type_name(&mapping.namespace, name);
            match &mapping.assembly {
                Some(assembly) => ts.find_type_in(&full_name, assembly),
                None => ts.find_type(&full_name),
            }
        })
}
