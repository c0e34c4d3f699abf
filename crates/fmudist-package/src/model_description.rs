//! Reader for the `modelDescription.xml` metadata file.
//!
//! Only the facts the release pipeline needs are extracted: identity
//! attributes of the root element and, per model variable, its causality,
//! description and unit. Units are resolved from the variable itself or
//! from its declared type.

use std::collections::HashMap;

use roxmltree::{Document, Node};

use crate::error::{PackageError, Result};

/// A model variable as listed in the metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelVariable {
    pub name: String,
    pub causality: Option<String>,
    pub description: Option<String>,
    /// Unit from the variable or its declared type.
    pub unit: Option<String>,
}

/// Parsed metadata of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescription {
    /// Value of the `fmiVersion` attribute (e.g. "2.0", "3.0").
    pub fmi_version: String,
    /// Value of the `modelName` attribute.
    pub model_name: String,
    /// Value of the `generationTool` attribute, if present.
    pub generation_tool: Option<String>,
    /// Value of the `generationDateAndTime` attribute, if present.
    pub generation_date_and_time: Option<String>,
    /// Model variables in document order.
    pub variables: Vec<ModelVariable>,
}

impl ModelDescription {
    /// Parse a model description from XML text.
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();
        if root.tag_name().name() != "fmiModelDescription" {
            return Err(PackageError::InvalidMetadata {
                detail: format!(
                    "root element is <{}>, expected <fmiModelDescription>",
                    root.tag_name().name()
                ),
            });
        }

        let fmi_version = required_attribute(root, "fmiVersion")?;
        let model_name = required_attribute(root, "modelName")?;

        let type_units = child_element(root, "TypeDefinitions")
            .map(collect_type_units)
            .unwrap_or_default();

        let variables = child_element(root, "ModelVariables")
            .map(|vars| {
                vars.children()
                    .filter(|n| n.is_element())
                    .filter_map(|n| read_variable(n, &type_units))
                    .collect()
            })
            .unwrap_or_default();

        Ok(ModelDescription {
            fmi_version,
            model_name,
            generation_tool: root.attribute("generationTool").map(str::to_string),
            generation_date_and_time: root
                .attribute("generationDateAndTime")
                .map(str::to_string),
            variables,
        })
    }

    /// Look up a variable by name.
    pub fn variable(&self, name: &str) -> Option<&ModelVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Unit of the named variable, or an empty string if it has none.
    pub fn unit_of(&self, name: &str) -> &str {
        self.variable(name)
            .and_then(|v| v.unit.as_deref())
            .unwrap_or("")
    }
}

fn required_attribute(node: Node<'_, '_>, name: &str) -> Result<String> {
    node.attribute(name)
        .map(str::to_string)
        .ok_or_else(|| PackageError::InvalidMetadata {
            detail: format!("missing attribute '{name}' on <{}>", node.tag_name().name()),
        })
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
}

fn first_element_child<'a, 'input>(node: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.is_element())
}

/// Map declared type names to their unit.
///
/// FMI 1.0/2.0 nest the unit in a child element (`<SimpleType><Real unit/>`),
/// FMI 3.0 carries it on the type element itself (`<Float64Type unit/>`).
fn collect_type_units(defs: Node<'_, '_>) -> HashMap<String, String> {
    let mut units = HashMap::new();
    for ty in defs.children().filter(|n| n.is_element()) {
        let Some(name) = ty.attribute("name") else {
            continue;
        };
        let unit = ty
            .attribute("unit")
            .or_else(|| first_element_child(ty).and_then(|c| c.attribute("unit")));
        if let Some(unit) = unit {
            units.insert(name.to_string(), unit.to_string());
        }
    }
    units
}

fn read_variable(node: Node<'_, '_>, type_units: &HashMap<String, String>) -> Option<ModelVariable> {
    let name = node.attribute("name")?;

    // FMI 1.0/2.0 wrap the typed element in <ScalarVariable>.
    let typed = if node.tag_name().name() == "ScalarVariable" {
        first_element_child(node)
    } else {
        Some(node)
    };

    let unit = typed.and_then(|t| {
        t.attribute("unit").map(str::to_string).or_else(|| {
            t.attribute("declaredType")
                .and_then(|d| type_units.get(d).cloned())
        })
    });

    Some(ModelVariable {
        name: name.to_string(),
        causality: node.attribute("causality").map(str::to_string),
        description: node.attribute("description").map(str::to_string),
        unit,
    })
}
