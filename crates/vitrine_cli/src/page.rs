//! Page layouts for headless runs
//!
//! A layout is a stack of full-width sections, each holding positioned
//! elements, plus fixed page chrome such as the progress bar. Layouts load
//! from TOML:
//!
//! ```toml
//! [[chrome]]
//! tag = "div"
//! id = "scroll-progress"
//! height = 4
//!
//! [[sections]]
//! id = "hero"
//! height = 900
//!
//! [[sections.elements]]
//! tag = "h1"
//! x = 80
//! y = 240
//! width = 900
//! height = 90
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use vitrine_core::{NodeSpec, Rect, SceneSurface, Viewport};

/// A whole page
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PageLayout {
    /// Elements positioned against the document origin
    #[serde(default)]
    pub chrome: Vec<ElementLayout>,
    /// Sections stacked top to bottom
    #[serde(default)]
    pub sections: Vec<SectionLayout>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SectionLayout {
    #[serde(default = "default_section_tag")]
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    pub height: f32,
    #[serde(default)]
    pub elements: Vec<ElementLayout>,
}

fn default_section_tag() -> String {
    "section".to_string()
}

/// One element, or a row/column of identical elements
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ElementLayout {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub x: f32,
    /// Offset from the top of the section
    #[serde(default)]
    pub y: f32,
    /// Full viewport width when absent
    #[serde(default)]
    pub width: Option<f32>,
    pub height: f32,
    #[serde(default = "default_repeat")]
    pub repeat: usize,
    /// Offset between repeated copies
    #[serde(default)]
    pub step_x: f32,
    #[serde(default)]
    pub step_y: f32,
    /// Per-copy attribute overrides, in copy order
    #[serde(default)]
    pub values: Vec<BTreeMap<String, String>>,
}

fn default_repeat() -> usize {
    1
}

impl ElementLayout {
    fn new(tag: &str, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            x,
            y,
            width: Some(width),
            height,
            repeat: 1,
            step_x: 0.0,
            step_y: 0.0,
            values: Vec::new(),
        }
    }

    fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    fn repeat(mut self, count: usize, step_x: f32, step_y: f32) -> Self {
        self.repeat = count;
        self.step_x = step_x;
        self.step_y = step_y;
        self
    }

    fn full_width(mut self) -> Self {
        self.width = None;
        self
    }

    fn insert_into(&self, scene: &mut SceneSurface, top: f32, viewport_width: f32) {
        let width = self.width.unwrap_or(viewport_width);
        for i in 0..self.repeat {
            let mut spec = NodeSpec::new(self.tag.clone()).bounds(Rect::new(
                self.x + i as f32 * self.step_x,
                top + self.y + i as f32 * self.step_y,
                width,
                self.height,
            ));
            if let Some(id) = &self.id {
                spec = spec.id(id.clone());
            }
            for class in &self.classes {
                spec = spec.class(class.clone());
            }
            let overrides = self.values.get(i);
            for (name, value) in &self.attributes {
                let value = overrides.and_then(|o| o.get(name)).unwrap_or(value);
                spec = spec.attr(name.clone(), value.clone());
            }
            if let Some(overrides) = overrides {
                for (name, value) in overrides.iter().filter(|(n, _)| !self.attributes.contains_key(*n)) {
                    spec = spec.attr(name.clone(), value.clone());
                }
            }
            scene.insert_element(spec);
        }
    }
}

impl PageLayout {
    /// Load a layout from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("invalid page layout in {}", path.display()))
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let layout: PageLayout = toml::from_str(source)?;
        if let Some(section) = layout.sections.iter().find(|s| !(s.height > 0.0)) {
            anyhow::bail!("section {:?} must have a positive height", section.id.as_deref().unwrap_or(&section.tag));
        }
        Ok(layout)
    }

    /// Total document height
    pub fn height(&self) -> f32 {
        self.sections.iter().map(|s| s.height).sum()
    }

    /// Lay the page out into a surface with the given viewport
    pub fn build(&self, width: f32, height: f32) -> SceneSurface {
        let mut scene = SceneSurface::new(Viewport::new(width, height, height));
        for element in &self.chrome {
            element.insert_into(&mut scene, 0.0, width);
        }

        let mut top = 0.0;
        for section in &self.sections {
            let mut spec = NodeSpec::new(section.tag.clone()).bounds(Rect::new(0.0, top, width, section.height));
            if let Some(id) = &section.id {
                spec = spec.id(id.clone());
            }
            scene.insert_element(spec);
            for element in &section.elements {
                element.insert_into(&mut scene, top, width);
            }
            top += section.height;
        }
        scene
    }

    /// The brochure site: hero, services, gallery, stats, contact and footer
    pub fn brochure() -> Self {
        let section = |tag: &str, id: Option<&str>, height: f32, elements: Vec<ElementLayout>| SectionLayout {
            tag: tag.to_string(),
            id: id.map(str::to_string),
            height,
            elements,
        };

        let mut stat = ElementLayout::new("span", 80.0, 120.0, 240.0, 80.0)
            .class("stat-number")
            .repeat(3, 360.0, 0.0);
        stat.attributes.insert("data-count".into(), "0".into());
        stat.values = ["120", "45", "98"]
            .iter()
            .map(|v| BTreeMap::from([("data-count".to_string(), v.to_string())]))
            .collect();

        Self {
            chrome: vec![ElementLayout::new("div", 0.0, 0.0, 0.0, 4.0).id("scroll-progress").full_width()],
            sections: vec![
                section(
                    "section",
                    Some("hero"),
                    900.0,
                    vec![
                        ElementLayout::new("div", 0.0, 0.0, 0.0, 900.0)
                            .class("hero-particles")
                            .full_width(),
                        ElementLayout::new("h1", 80.0, 240.0, 900.0, 90.0),
                        ElementLayout::new("h2", 80.0, 350.0, 700.0, 50.0),
                        ElementLayout::new("p", 80.0, 420.0, 640.0, 60.0),
                        ElementLayout::new("a", 80.0, 520.0, 200.0, 56.0)
                            .class("cta-button")
                            .repeat(2, 230.0, 0.0),
                    ],
                ),
                section(
                    "section",
                    Some("services"),
                    1100.0,
                    vec![
                        ElementLayout::new("h2", 80.0, 80.0, 600.0, 50.0),
                        ElementLayout::new("div", 80.0, 200.0, 340.0, 380.0)
                            .class("service-card")
                            .repeat(3, 380.0, 0.0),
                        ElementLayout::new("div", 80.0, 620.0, 340.0, 380.0)
                            .class("service-card")
                            .repeat(3, 380.0, 0.0),
                    ],
                ),
                section(
                    "section",
                    Some("gallery"),
                    1000.0,
                    vec![
                        ElementLayout::new("h2", 80.0, 80.0, 600.0, 50.0),
                        ElementLayout::new("div", 80.0, 200.0, 360.0, 340.0)
                            .class("gallery-item")
                            .repeat(3, 380.0, 0.0),
                        ElementLayout::new("div", 80.0, 580.0, 360.0, 340.0)
                            .class("gallery-item")
                            .repeat(3, 380.0, 0.0),
                    ],
                ),
                section("section", Some("stats"), 400.0, vec![stat]),
                section(
                    "section",
                    Some("contact"),
                    800.0,
                    vec![
                        ElementLayout::new("h2", 80.0, 80.0, 600.0, 50.0),
                        ElementLayout::new("div", 80.0, 200.0, 480.0, 400.0).class("contact-info"),
                        ElementLayout::new("button", 640.0, 540.0, 200.0, 56.0),
                    ],
                ),
                section(
                    "footer",
                    None,
                    300.0,
                    vec![ElementLayout::new("p", 80.0, 120.0, 600.0, 40.0)],
                ),
            ],
        }
    }
}
