//! MJCF loader
//!
//! Walks the XML tree produced by `sxd_document` and fills a [`Model`].
//! `<include>` elements are expanded in place: the included file's root
//! children are visited as if they appeared where the include was.

use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use sxd_document::dom::Element;
use sxd_document::parser;

use crate::attributes::{
    parse_array, parse_floats, parse_size, parse_vec3, rotation_z_to, unit_vector, AngleUnit,
    OrientationAttrs,
};
use crate::defaults::{DefaultClasses, DefaultKind, MAIN_CLASS};
use crate::error::ModelError;
use crate::model::{Body, Geom, GeomKind, Joint, JointKind, Light, Model, WORLD_BODY};

const DEFAULT_RGBA: [f32; 4] = [0.5, 0.5, 0.5, 1.0];
const DEFAULT_DENSITY: f32 = 1000.0;

/// Where in the document the children being visited live
#[derive(Debug, Clone)]
enum Scope {
    /// Direct children of `<mujoco>`
    Top,
    /// Children of `<worldbody>` or `<body>`
    Body { body: usize, childclass: String },
}

/// Builds a [`Model`] from one MJCF document and its includes
pub(crate) struct ModelLoader {
    model: Model,
    angle: AngleUnit,
    defaults: DefaultClasses,
    include_stack: Vec<PathBuf>,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self {
            model: Model::empty("unnamed"),
            angle: AngleUnit::default(),
            defaults: DefaultClasses::new(),
            include_stack: Vec::new(),
        }
    }

    pub fn load_file(mut self, path: &Path) -> Result<Model, ModelError> {
        let xml = read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.include_stack.push(canonical(path));
        self.load_document(&xml, &path.display().to_string(), &dir, true)?;
        self.finish()
    }

    pub fn load_str(mut self, xml: &str) -> Result<Model, ModelError> {
        self.load_document(xml, "<string>", Path::new("."), true)?;
        self.finish()
    }

    fn load_document(&mut self, xml: &str, label: &str, dir: &Path, is_root: bool) -> Result<(), ModelError> {
        let package = parser::parse(xml).map_err(|e| ModelError::Xml {
            path: label.to_string(),
            message: e.to_string(),
        })?;
        let document = package.as_document();
        let root = document
            .root()
            .children()
            .into_iter()
            .find_map(|c| c.element())
            .ok_or_else(|| ModelError::Xml {
                path: label.to_string(),
                message: "document has no root element".to_string(),
            })?;

        let root_name = root.name().local_part();
        if root_name != "mujoco" {
            return Err(ModelError::UnexpectedRoot(root_name.to_string()));
        }
        if is_root {
            if let Some(name) = attribute(&root, "model") {
                self.model.name = name.to_string();
            }
        }

        self.visit_children(&root, &Scope::Top, dir)
    }

    fn finish(mut self) -> Result<Model, ModelError> {
        for (body_index, body) in self.model.bodies.iter().enumerate().skip(1) {
            let joints: Vec<&Joint> = self.model.body_joints(body_index).collect();
            if joints.iter().any(|j| j.kind == JointKind::Free) && joints.len() > 1 {
                return Err(ModelError::Invalid(format!(
                    "body '{}' combines a free joint with other joints",
                    body.name.as_deref().unwrap_or("unnamed")
                )));
            }
        }
        if self.model.options.timestep <= 0.0 {
            return Err(ModelError::Invalid("timestep must be positive".to_string()));
        }
        self.model.compute_statistic();
        Ok(self.model)
    }

    fn visit_children(&mut self, element: &Element, scope: &Scope, dir: &Path) -> Result<(), ModelError> {
        for child in element.children().into_iter().filter_map(|c| c.element()) {
            if child.name().local_part() == "include" {
                self.include(&child, scope, dir)?;
            } else {
                match scope {
                    Scope::Top => self.visit_top(&child, dir)?,
                    Scope::Body { body, childclass } => self.visit_body_child(&child, *body, childclass, dir)?,
                }
            }
        }
        Ok(())
    }

    fn include(&mut self, element: &Element, scope: &Scope, dir: &Path) -> Result<(), ModelError> {
        let file = attribute(element, "file").ok_or_else(|| ModelError::missing_attribute("include", "file"))?;
        let path = dir.join(file);
        let key = canonical(&path);
        if self.include_stack.contains(&key) {
            return Err(ModelError::IncludeCycle(path.display().to_string()));
        }

        let xml = read_to_string(&path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let include_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        log::debug!("Including '{}'", path.display());
        self.include_stack.push(key);
        let package = parser::parse(&xml).map_err(|e| ModelError::Xml {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let document = package.as_document();
        let root = document
            .root()
            .children()
            .into_iter()
            .find_map(|c| c.element())
            .ok_or_else(|| ModelError::Xml {
                path: path.display().to_string(),
                message: "document has no root element".to_string(),
            })?;
        if root.name().local_part() != "mujoco" {
            return Err(ModelError::UnexpectedRoot(root.name().local_part().to_string()));
        }
        self.visit_children(&root, scope, &include_dir)?;
        self.include_stack.pop();
        Ok(())
    }

    fn visit_top(&mut self, element: &Element, dir: &Path) -> Result<(), ModelError> {
        match element.name().local_part() {
            "compiler" => {
                if let Some(angle) = attribute(element, "angle") {
                    self.angle = AngleUnit::parse(angle)?;
                }
            }
            "option" => {
                if let Some(value) = attribute(element, "timestep") {
                    let [timestep] = parse_array::<1>("option", "timestep", value)?;
                    if timestep <= 0.0 {
                        return Err(ModelError::invalid_attribute("option", "timestep", value, "must be positive"));
                    }
                    self.model.options.timestep = timestep;
                }
                if let Some(value) = attribute(element, "gravity") {
                    self.model.options.gravity = parse_vec3("option", "gravity", value)?;
                }
            }
            "default" => self.parse_default(element, None)?,
            "worldbody" => {
                let scope = Scope::Body {
                    body: WORLD_BODY,
                    childclass: MAIN_CLASS.to_string(),
                };
                self.visit_children(element, &scope, dir)?;
            }
            other => log::debug!("Skipping <{}> section", other),
        }
        Ok(())
    }

    fn parse_default(&mut self, element: &Element, parent: Option<&str>) -> Result<(), ModelError> {
        let class = match (attribute(element, "class"), parent) {
            (Some(class), _) => class.to_string(),
            (None, None) => MAIN_CLASS.to_string(),
            (None, Some(_)) => return Err(ModelError::missing_attribute("default", "class")),
        };
        self.defaults.declare(&class, parent);

        for child in element.children().into_iter().filter_map(|c| c.element()) {
            let tag = child.name().local_part();
            if tag == "default" {
                self.parse_default(&child, Some(&class))?;
            } else if let Some(kind) = DefaultKind::from_tag(tag) {
                for attr in child.attributes() {
                    self.defaults.set(&class, kind, attr.name().local_part(), attr.value());
                }
            }
        }
        Ok(())
    }

    fn visit_body_child(&mut self, element: &Element, body: usize, childclass: &str, dir: &Path) -> Result<(), ModelError> {
        match element.name().local_part() {
            "body" => self.parse_body(element, body, childclass, dir)?,
            "geom" => self.parse_geom(element, body, childclass)?,
            "joint" => self.parse_joint(element, body, childclass, false)?,
            "freejoint" => self.parse_joint(element, body, childclass, true)?,
            "inertial" => self.parse_inertial(element, body)?,
            "light" => self.parse_light(element)?,
            other => log::debug!("Skipping <{}> in body {}", other, body),
        }
        Ok(())
    }

    fn parse_body(&mut self, element: &Element, parent: usize, childclass: &str, dir: &Path) -> Result<(), ModelError> {
        let childclass = match attribute(element, "childclass") {
            Some(class) => self.checked_class(class)?,
            None => childclass.to_string(),
        };
        let pos = match attribute(element, "pos") {
            Some(value) => parse_vec3("body", "pos", value)?,
            None => Vector3::zeros(),
        };
        let quat = orientation(element).resolve("body", self.angle)?;

        self.model.bodies.push(Body {
            name: attribute(element, "name").map(str::to_string),
            parent,
            pos,
            quat,
            mass: None,
        });
        let index = self.model.bodies.len() - 1;

        let scope = Scope::Body {
            body: index,
            childclass,
        };
        self.visit_children(element, &scope, dir)
    }

    fn parse_geom(&mut self, element: &Element, body: usize, childclass: &str) -> Result<(), ModelError> {
        let class = self.element_class(element, childclass)?;
        let get = |name: &str| self.lookup(element, &class, DefaultKind::Geom, name);

        let type_name = get("type").unwrap_or_else(|| "sphere".to_string());
        let Some(kind) = GeomKind::parse(&type_name)? else {
            log::warn!(
                "Skipping {} geom '{}': type not supported",
                type_name,
                attribute(element, "name").unwrap_or("unnamed")
            );
            return Ok(());
        };

        if kind == GeomKind::Plane && body != WORLD_BODY {
            return Err(ModelError::Invalid(format!(
                "plane geom '{}' must belong to the world body",
                attribute(element, "name").unwrap_or("unnamed")
            )));
        }

        let size_attr = get("size");
        let mut size = match &size_attr {
            Some(value) => parse_size("geom", value)?,
            None => [0.0; 3],
        };

        let (pos, quat) = if let Some(value) = get("fromto") {
            if !matches!(kind, GeomKind::Capsule | GeomKind::Cylinder) {
                return Err(ModelError::invalid_attribute(
                    "geom",
                    "fromto",
                    &value,
                    "only capsule and cylinder geoms accept fromto",
                ));
            }
            let [x0, y0, z0, x1, y1, z1] = parse_array::<6>("geom", "fromto", &value)?;
            let from = Vector3::new(x0, y0, z0);
            let to = Vector3::new(x1, y1, z1);
            let axis = unit_vector("geom", "fromto", &value, to - from)?;
            size[1] = (to - from).norm() * 0.5;
            ((from + to) * 0.5, rotation_z_to(&axis))
        } else {
            let pos = match get("pos") {
                Some(value) => parse_vec3("geom", "pos", &value)?,
                None => Vector3::zeros(),
            };
            (pos, orientation(element).resolve("geom", self.angle)?)
        };

        let required = kind.required_sizes();
        if size[..required].iter().any(|s| *s <= 0.0) {
            return Err(match size_attr {
                Some(value) => ModelError::invalid_attribute(
                    "geom",
                    "size",
                    &value,
                    format!("{:?} geom needs {} positive values", kind, required),
                ),
                None => ModelError::missing_attribute("geom", "size"),
            });
        }

        let rgba = match get("rgba") {
            Some(value) => parse_array::<4>("geom", "rgba", &value)?,
            None => DEFAULT_RGBA,
        };
        let friction = match get("friction") {
            Some(value) => {
                let values = parse_floats("geom", "friction", &value)?;
                *values.first().ok_or_else(|| {
                    ModelError::invalid_attribute("geom", "friction", &value, "expected at least one number")
                })?
            }
            None => 1.0,
        };
        let density = match get("density") {
            Some(value) => parse_array::<1>("geom", "density", &value)?[0],
            None => DEFAULT_DENSITY,
        };
        let mass = match get("mass") {
            Some(value) => Some(parse_array::<1>("geom", "mass", &value)?[0]),
            None => None,
        };
        let contype = parse_bits(get("contype"), "contype")?;
        let conaffinity = parse_bits(get("conaffinity"), "conaffinity")?;

        self.model.geoms.push(Geom {
            name: attribute(element, "name").map(str::to_string),
            kind,
            body,
            pos,
            quat,
            size,
            rgba,
            friction,
            density,
            mass,
            contype,
            conaffinity,
        });
        Ok(())
    }

    fn parse_joint(&mut self, element: &Element, body: usize, childclass: &str, free: bool) -> Result<(), ModelError> {
        let tag = if free { "freejoint" } else { "joint" };
        if body == WORLD_BODY {
            return Err(ModelError::Invalid(format!("<{}> is not allowed in the world body", tag)));
        }

        let class = self.element_class(element, childclass)?;
        let get = |name: &str| self.lookup(element, &class, DefaultKind::Joint, name);

        let kind = if free {
            JointKind::Free
        } else {
            JointKind::parse(&get("type").unwrap_or_else(|| "hinge".to_string()))?
        };
        if kind == JointKind::Free && self.model.bodies[body].parent != WORLD_BODY {
            return Err(ModelError::Invalid(format!(
                "free joint on body '{}' which is not a child of the world",
                self.model.bodies[body].name.as_deref().unwrap_or("unnamed")
            )));
        }

        let pos = match get("pos") {
            Some(value) => parse_vec3(tag, "pos", &value)?,
            None => Vector3::zeros(),
        };
        let axis = match get("axis") {
            Some(value) => unit_vector(tag, "axis", &value, parse_vec3(tag, "axis", &value)?)?,
            None => Vector3::z(),
        };

        let limited = match get("limited") {
            Some(value) => match value.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                "auto" => None,
                _ => {
                    return Err(ModelError::invalid_attribute(
                        tag,
                        "limited",
                        &value,
                        "expected true, false or auto",
                    ))
                }
            },
            None => None,
        };
        let range = match get("range") {
            Some(value) if limited != Some(false) && matches!(kind, JointKind::Hinge | JointKind::Slide) => {
                let [mut lo, mut hi] = parse_array::<2>(tag, "range", &value)?;
                if kind == JointKind::Hinge {
                    lo = self.angle.to_radians(lo);
                    hi = self.angle.to_radians(hi);
                }
                if lo > hi {
                    return Err(ModelError::invalid_attribute(tag, "range", &value, "lower bound exceeds upper bound"));
                }
                Some((lo, hi))
            }
            _ => None,
        };
        if limited == Some(true) && range.is_none() && matches!(kind, JointKind::Hinge | JointKind::Slide) {
            return Err(ModelError::missing_attribute(tag, "range"));
        }

        let damping = match get("damping") {
            Some(value) => parse_array::<1>(tag, "damping", &value)?[0].max(0.0),
            None => 0.0,
        };

        self.model.joints.push(Joint {
            name: attribute(element, "name").map(str::to_string),
            kind,
            body,
            pos,
            axis,
            range,
            damping,
        });
        Ok(())
    }

    fn parse_inertial(&mut self, element: &Element, body: usize) -> Result<(), ModelError> {
        if body == WORLD_BODY {
            return Err(ModelError::Invalid("<inertial> is not allowed in the world body".to_string()));
        }
        let value = attribute(element, "mass").ok_or_else(|| ModelError::missing_attribute("inertial", "mass"))?;
        let [mass] = parse_array::<1>("inertial", "mass", value)?;
        if mass < 0.0 {
            return Err(ModelError::invalid_attribute("inertial", "mass", value, "must not be negative"));
        }
        self.model.bodies[body].mass = Some(mass);
        Ok(())
    }

    fn parse_light(&mut self, element: &Element) -> Result<(), ModelError> {
        let pos = match attribute(element, "pos") {
            Some(value) => parse_vec3("light", "pos", value)?,
            None => Vector3::zeros(),
        };
        let dir = match attribute(element, "dir") {
            Some(value) => unit_vector("light", "dir", value, parse_vec3("light", "dir", value)?)?,
            None => -Vector3::z(),
        };
        let directional = match attribute(element, "directional") {
            Some(value) => parse_bool("light", "directional", value)?,
            None => false,
        };
        let diffuse = match attribute(element, "diffuse") {
            Some(value) => parse_array::<3>("light", "diffuse", value)?,
            None => [0.7, 0.7, 0.7],
        };
        self.model.lights.push(Light {
            pos,
            dir,
            directional,
            diffuse,
        });
        Ok(())
    }

    /// Class for a geom or joint: its own `class`, else the inherited childclass
    fn element_class(&self, element: &Element, childclass: &str) -> Result<String, ModelError> {
        match attribute(element, "class") {
            Some(class) => self.checked_class(class),
            None => Ok(childclass.to_string()),
        }
    }

    fn checked_class(&self, class: &str) -> Result<String, ModelError> {
        if self.defaults.contains(class) {
            Ok(class.to_string())
        } else {
            Err(ModelError::Invalid(format!("unknown default class '{}'", class)))
        }
    }

    /// Attribute from the element itself, falling back to the default class chain
    fn lookup(&self, element: &Element, class: &str, kind: DefaultKind, name: &str) -> Option<String> {
        attribute(element, name)
            .or_else(|| self.defaults.lookup(class, kind, name))
            .map(str::to_string)
    }
}

fn attribute<'d>(element: &Element<'d>, name: &str) -> Option<&'d str> {
    element.attribute(name).map(|attr| attr.value())
}

fn orientation<'d>(element: &Element<'d>) -> OrientationAttrs<'d> {
    OrientationAttrs {
        quat: attribute(element, "quat"),
        euler: attribute(element, "euler"),
        axisangle: attribute(element, "axisangle"),
        zaxis: attribute(element, "zaxis"),
    }
}

fn parse_bool(element: &str, name: &str, value: &str) -> Result<bool, ModelError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ModelError::invalid_attribute(element, name, value, "expected true or false")),
    }
}

fn parse_bits(value: Option<String>, name: &str) -> Result<u32, ModelError> {
    match value {
        Some(value) => value
            .trim()
            .parse::<u32>()
            .map_err(|_| ModelError::invalid_attribute("geom", name, &value, "expected a non-negative integer")),
        None => Ok(1),
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
