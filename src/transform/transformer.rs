use hashlink::LinkedHashMap;
use snafu::Snafu;
use tracing::{debug, warn};

use crate::document::{GenericNode, Scalar};
use crate::transform::ElementNode;

const ROOT_ELEMENT: &str = "ActorFrame";
const LAYER_ELEMENT: &str = "Layer";
/// Reserved mapping key. Its sequence becomes the nested layers
const CHILDREN_KEY: &str = "children";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOptions {
    /// Fail on the first structural problem instead of rendering an empty element
    pub strict: bool,
}

/// Output of a successful transformation.
///
/// `issues` lists the structural problems that were degraded to empty
/// elements or attributes. It is always empty in strict mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformation {
    pub root: ElementNode,
    pub issues: Vec<SchemaError>,
}

impl Transformation {
    pub fn to_xml(&self) -> String {
        self.root.to_xml()
    }
}

/// Pure conversion from a parsed document into the `ActorFrame` element tree
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeTransformer {
    options: TransformOptions,
}

impl TreeTransformer {
    pub fn new(options: TransformOptions) -> Self {
        Self { options }
    }

    pub fn transform(&self, document: &GenericNode) -> Result<Transformation, SchemaError> {
        let mut build = Build {
            strict: self.options.strict,
            issues: Vec::new(),
        };
        let root = build.root(document)?;
        Ok(Transformation {
            root,
            issues: build.issues,
        })
    }

    /// Convenience wrapper returning the serialized XML only
    pub fn transform_to_xml(&self, document: &GenericNode) -> Result<String, SchemaError> {
        let transformation = self.transform(document)?;
        debug!(
            "Built {} element tree with {} schema issue(s)",
            ROOT_ELEMENT,
            transformation.issues.len()
        );
        Ok(transformation.to_xml())
    }
}

struct Build {
    strict: bool,
    issues: Vec<SchemaError>,
}

impl Build {
    fn report(&mut self, issue: SchemaError) -> Result<(), SchemaError> {
        if self.strict {
            return Err(issue);
        }
        warn!("{issue}");
        self.issues.push(issue);
        Ok(())
    }

    fn root(&mut self, document: &GenericNode) -> Result<ElementNode, SchemaError> {
        let element = ElementNode::new(ROOT_ELEMENT);
        match document {
            GenericNode::Mapping(entries) => self.mapping(element, entries, ROOT_ELEMENT),
            // An empty file has nothing to render
            GenericNode::Scalar(Scalar::Null) => Ok(element),
            GenericNode::Scalar(_) | GenericNode::Sequence(_) => {
                self.report(SchemaError::RootNotMapping)?;
                Ok(element)
            }
        }
    }

    fn layer(&mut self, item: &GenericNode, path: &str) -> Result<ElementNode, SchemaError> {
        let element = ElementNode::new(LAYER_ELEMENT);
        match item {
            GenericNode::Mapping(entries) => self.mapping(element, entries, path),
            GenericNode::Scalar(_) | GenericNode::Sequence(_) => {
                self.report(SchemaError::LayerNotMapping {
                    path: path.to_string(),
                })?;
                Ok(element)
            }
        }
    }

    fn mapping(
        &mut self,
        mut element: ElementNode,
        entries: &LinkedHashMap<String, GenericNode>,
        path: &str,
    ) -> Result<ElementNode, SchemaError> {
        for (key, value) in entries {
            if key == CHILDREN_KEY {
                let wrapper = self.children(value, &format!("{path}/{CHILDREN_KEY}"))?;
                element.push_child(wrapper);
            } else {
                let text = self.attribute_value(value, path, key)?;
                element.push_attribute(key.as_str(), text);
            }
        }
        Ok(element)
    }

    fn children(&mut self, value: &GenericNode, path: &str) -> Result<ElementNode, SchemaError> {
        let mut wrapper = ElementNode::new(CHILDREN_KEY);
        match value {
            GenericNode::Sequence(items) => {
                for (index, item) in items.iter().enumerate() {
                    let layer = self.layer(item, &format!("{path}/{LAYER_ELEMENT}[{index}]"))?;
                    wrapper.push_child(layer);
                }
            }
            // `children:` with nothing after it
            GenericNode::Scalar(Scalar::Null) => {}
            GenericNode::Scalar(_) | GenericNode::Mapping(_) => {
                self.report(SchemaError::ChildrenNotSequence {
                    path: path.to_string(),
                })?;
            }
        }
        Ok(wrapper)
    }

    fn attribute_value(
        &mut self,
        value: &GenericNode,
        path: &str,
        key: &str,
    ) -> Result<String, SchemaError> {
        match coerce(value) {
            Some(text) => Ok(text),
            None => {
                self.report(SchemaError::NonScalarAttribute {
                    path: path.to_string(),
                    key: key.to_string(),
                })?;
                Ok(String::new())
            }
        }
    }
}

/// Textual form of an attribute value. Sequences are joined with commas,
/// mappings have no textual form.
fn coerce(value: &GenericNode) -> Option<String> {
    match value {
        GenericNode::Scalar(scalar) => Some(scalar.to_string()),
        GenericNode::Sequence(items) => items
            .iter()
            .map(coerce)
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.join(",")),
        GenericNode::Mapping(_) => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum SchemaError {
    #[snafu(display("Document root is not a mapping, rendering an empty {ROOT_ELEMENT}"))]
    RootNotMapping,
    #[snafu(display("'{CHILDREN_KEY}' at {} is not a sequence", path))]
    ChildrenNotSequence { path: String },
    #[snafu(display("Item at {} is not a mapping, rendering an empty {LAYER_ELEMENT}", path))]
    LayerNotMapping { path: String },
    #[snafu(display("Attribute '{}' at {} holds a mapping", key, path))]
    NonScalarAttribute { path: String, key: String },
}
