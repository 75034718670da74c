//! Resource schema model.
//!
//! Each resource declares its attribute surface once. The declaration
//! drives configuration validation before any API call is made; the
//! flags (`computed`, `force_new`, `sensitive`) describe how Terraform
//! should treat the attribute in plans and state output.

use crate::diag::Diagnostics;
use crate::state::DynamicValue;

#[derive(Debug, Clone)]
pub enum AttributeType {
    String,
    Int,
    Float,
    Bool,
    /// Ordered list of a scalar element type.
    List(Box<AttributeType>),
    /// Unordered list. Stored like a list; compared order-independently.
    Set(Box<AttributeType>),
    /// String-keyed map of a scalar element type.
    Map(Box<AttributeType>),
    /// Nested block: a list of objects with their own schema.
    Block(Schema),
}

#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: &'static str,
    pub attr_type: AttributeType,
    pub description: &'static str,
    pub required: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Changing this attribute forces replacement of the resource.
    pub force_new: bool,
    pub default: Option<DynamicValue>,
    /// Upper bound on block repetitions; `None` means unbounded.
    pub max_items: Option<usize>,
}

impl AttributeSchema {
    pub fn new(name: &'static str, attr_type: AttributeType) -> Self {
        Self {
            name,
            attr_type,
            description: "",
            required: false,
            computed: false,
            sensitive: false,
            force_new: false,
            default: None,
            max_items: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn default_value(mut self, value: DynamicValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn description(mut self, text: &'static str) -> Self {
        self.description = text;
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = Some(n);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub description: &'static str,
    pub attributes: Vec<AttributeSchema>,
}

impl Schema {
    pub fn new(description: &'static str, attributes: Vec<AttributeSchema>) -> Self {
        Self {
            description,
            attributes,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Validate a configuration value against this schema, accumulating
    /// every problem into `diags`.
    pub fn validate(&self, config: &DynamicValue, diags: &mut Diagnostics) {
        self.validate_at("", config, diags);
    }

    fn validate_at(&self, path: &str, config: &DynamicValue, diags: &mut Diagnostics) {
        let map = match config {
            DynamicValue::Map(m) => m,
            _ => {
                diags.add_attribute_error(attr_path(path, ""), "expected a configuration object");
                return;
            }
        };

        for attr in &self.attributes {
            let at = attr_path(path, attr.name);
            match map.get(attr.name) {
                None | Some(DynamicValue::Null) => {
                    // Computed attributes and attributes with defaults
                    // are filled in later.
                    if attr.required && attr.default.is_none() {
                        diags.add_attribute_error(at, "required attribute is not set");
                    }
                }
                Some(value) => check_type(&at, &attr.attr_type, attr.max_items, value, diags),
            }
        }

        for key in map.keys() {
            if key == "id" {
                continue;
            }
            if self.attribute(key).is_none() {
                diags.add_attribute_error(attr_path(path, key), "unknown attribute");
            }
        }
    }
}

fn attr_path(prefix: &str, name: &str) -> String {
    match (prefix.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{prefix}.{name}"),
    }
}

fn check_type(
    path: &str,
    expected: &AttributeType,
    max_items: Option<usize>,
    value: &DynamicValue,
    diags: &mut Diagnostics,
) {
    match (expected, value) {
        (AttributeType::String, DynamicValue::String(_)) => {}
        (AttributeType::Bool, DynamicValue::Bool(_)) => {}
        (AttributeType::Int, DynamicValue::Number(n)) => {
            if n.as_i64().is_none() {
                diags.add_attribute_error(path, "expected an integer");
            }
        }
        (AttributeType::Float, DynamicValue::Number(_)) => {}
        (AttributeType::List(elem) | AttributeType::Set(elem), DynamicValue::List(items)) => {
            for (i, item) in items.iter().enumerate() {
                check_type(&format!("{path}.{i}"), elem, None, item, diags);
            }
        }
        (AttributeType::Map(elem), DynamicValue::Map(entries)) => {
            for (key, item) in entries {
                check_type(&format!("{path}.{key}"), elem, None, item, diags);
            }
        }
        (AttributeType::Block(schema), DynamicValue::List(items)) => {
            if let Some(max) = max_items {
                if items.len() > max {
                    diags.add_attribute_error(
                        path,
                        format!("at most {max} block(s) allowed, got {}", items.len()),
                    );
                }
            }
            for (i, item) in items.iter().enumerate() {
                schema.validate_at(&format!("{path}.{i}"), item, diags);
            }
        }
        (expected, _) => {
            diags.add_attribute_error(path, format!("expected {}", type_name(expected)));
        }
    }
}

fn type_name(t: &AttributeType) -> &'static str {
    match t {
        AttributeType::String => "a string",
        AttributeType::Int => "an integer",
        AttributeType::Float => "a number",
        AttributeType::Bool => "a bool",
        AttributeType::List(_) => "a list",
        AttributeType::Set(_) => "a set",
        AttributeType::Map(_) => "a map",
        AttributeType::Block(_) => "a block list",
    }
}
