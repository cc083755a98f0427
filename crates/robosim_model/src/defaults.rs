//! Default attribute classes
//!
//! `<default>` blocks form a tree of named classes. A geom or joint looks up
//! attributes it does not set itself in its class, then in that class's
//! ancestors. The unnamed top-level block is the `main` class.

use std::collections::HashMap;

/// Name of the root default class
pub const MAIN_CLASS: &str = "main";

/// Element kinds that can take defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultKind {
    Geom,
    Joint,
}

impl DefaultKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "geom" => Some(DefaultKind::Geom),
            "joint" => Some(DefaultKind::Joint),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct DefaultClass {
    parent: Option<String>,
    attributes: HashMap<DefaultKind, HashMap<String, String>>,
}

/// All default classes declared by a model
#[derive(Debug, Clone)]
pub struct DefaultClasses {
    classes: HashMap<String, DefaultClass>,
}

impl Default for DefaultClasses {
    fn default() -> Self {
        let mut classes = HashMap::new();
        classes.insert(MAIN_CLASS.to_string(), DefaultClass::default());
        Self { classes }
    }
}

impl DefaultClasses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a class. Redeclaring keeps already recorded attributes.
    pub fn declare(&mut self, name: &str, parent: Option<&str>) {
        let entry = self.classes.entry(name.to_string()).or_default();
        if name != MAIN_CLASS {
            entry.parent = parent.map(str::to_string);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Record a default attribute for `kind` in class `class`
    pub fn set(&mut self, class: &str, kind: DefaultKind, attribute: &str, value: &str) {
        self.classes
            .entry(class.to_string())
            .or_default()
            .attributes
            .entry(kind)
            .or_default()
            .insert(attribute.to_string(), value.to_string());
    }

    /// Look up an attribute through the class chain
    pub fn lookup(&self, class: &str, kind: DefaultKind, attribute: &str) -> Option<&str> {
        let mut current = Some(class);
        // depth bound guards against parent cycles in malformed input
        for _ in 0..64 {
            let name = current?;
            let class = self.classes.get(name)?;
            if let Some(value) = class
                .attributes
                .get(&kind)
                .and_then(|attrs| attrs.get(attribute))
            {
                return Some(value.as_str());
            }
            current = class.parent.as_deref();
        }
        None
    }
}
