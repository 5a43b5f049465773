// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM presentation.
//!
//! Translates drained [`PresentationChanges`] into data attributes and
//! classes. Styling lives in the page's CSS, keyed on these hooks:
//!
//! | Element        | Hook                                         |
//! |----------------|----------------------------------------------|
//! | root           | `data-tier`, `data-loader`, `.hover-enabled` |
//! | visual slot    | `data-visual`, scene `data-*` settings       |
//! | carousel       | `data-index`                                 |
//! | pagination dot | `.is-active`, `aria-current`                 |
//! | block          | `.is-visible`, `transition-delay`            |

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::ToString;
use alloc::vec::Vec;

use web_sys::HtmlElement;

use vitrine_core::backend::{PresentationChanges, PresentationSource, Presenter};
use vitrine_core::carousel::CarouselId;
use vitrine_core::loader::Visual;
use vitrine_core::reveal::BlockId;
use vitrine_core::scene::{FrameLoop, SceneSettings};

/// Class toggled on the root while hover affordances are enabled.
pub const HOVER_CLASS: &str = "hover-enabled";
/// Class set on the active pagination dot.
pub const ACTIVE_DOT_CLASS: &str = "is-active";
/// Class added to a block once it is revealed.
pub const VISIBLE_CLASS: &str = "is-visible";

#[derive(Debug)]
struct CarouselElements {
    container: HtmlElement,
    dots: Vec<HtmlElement>,
}

/// Applies presentation changes to live DOM elements.
///
/// The presenter only touches elements registered with it; everything else
/// on the page is left alone.
pub struct DomPresenter {
    root: HtmlElement,
    visual_slot: Option<HtmlElement>,
    carousels: BTreeMap<CarouselId, CarouselElements>,
    blocks: BTreeMap<BlockId, HtmlElement>,
}

impl core::fmt::Debug for DomPresenter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomPresenter")
            .field("root", &"HtmlElement")
            .field("has_visual_slot", &self.visual_slot.is_some())
            .field("carousels", &self.carousels.len())
            .field("blocks", &self.blocks.len())
            .finish()
    }
}

impl DomPresenter {
    /// Creates a presenter that writes page-level state onto `root`.
    #[must_use]
    pub fn new(root: HtmlElement) -> Self {
        Self {
            root,
            visual_slot: None,
            carousels: BTreeMap::new(),
            blocks: BTreeMap::new(),
        }
    }

    /// Returns the root element.
    #[must_use]
    pub fn root(&self) -> &HtmlElement {
        &self.root
    }

    /// Sets the element that hosts the heavy visual.
    pub fn set_visual_slot(&mut self, slot: HtmlElement) {
        self.visual_slot = Some(slot);
    }

    /// Returns the visual slot, if set.
    #[must_use]
    pub fn visual_slot(&self) -> Option<&HtmlElement> {
        self.visual_slot.as_ref()
    }

    /// Registers a carousel container and its pagination dots.
    pub fn add_carousel(&mut self, id: CarouselId, container: HtmlElement, dots: Vec<HtmlElement>) {
        self.carousels.insert(id, CarouselElements { container, dots });
    }

    /// Returns a carousel's container element.
    #[must_use]
    pub fn carousel_container(&self, id: CarouselId) -> Option<&HtmlElement> {
        self.carousels.get(&id).map(|c| &c.container)
    }

    /// Registered carousel containers.
    pub(crate) fn carousel_containers(&self) -> impl Iterator<Item = (CarouselId, &HtmlElement)> + '_ {
        self.carousels.iter().map(|(id, c)| (*id, &c.container))
    }

    /// Registers a block element for reveal updates.
    pub fn add_block(&mut self, block: BlockId, element: HtmlElement) {
        self.blocks.insert(block, element);
    }

    /// Forgets a block element.
    pub fn remove_block(&mut self, block: BlockId) -> Option<HtmlElement> {
        self.blocks.remove(&block)
    }

    /// Blocks registered for reveal updates.
    pub(crate) fn blocks(&self) -> impl Iterator<Item = (BlockId, &HtmlElement)> + '_ {
        self.blocks.iter().map(|(block, el)| (*block, el))
    }

    pub(crate) fn apply_visual(&self, visual: Visual) {
        let Some(slot) = &self.visual_slot else {
            return;
        };
        let data = slot.dataset();
        match visual {
            Visual::Placeholder => {
                let _ = data.set("visual", "placeholder");
            }
            Visual::StaticAsset => {
                let _ = data.set("visual", "static");
            }
            Visual::Scene(settings) => {
                let _ = data.set("visual", "scene");
                write_scene_settings(slot, &settings);
            }
        }
    }
}

impl Presenter for DomPresenter {
    /// Applies incremental changes to the DOM.
    fn apply(&mut self, source: &dyn PresentationSource, changes: &PresentationChanges) {
        let root_data = self.root.dataset();

        // 1. Tier
        if changes.tier {
            let _ = root_data.set("tier", source.tier().as_str());
        }

        // 2. Loader and visual
        if changes.loader {
            let _ = root_data.set("loader", source.loader_state().as_str());
            self.apply_visual(source.visual());
        }

        // 3. Hover affordances
        if changes.hover {
            let _ = self
                .root
                .class_list()
                .toggle_with_force(HOVER_CLASS, source.hover_affordances_enabled());
        }

        // 4. Carousel indices
        for id in &changes.indices {
            let (Some(elements), Some(index)) = (self.carousels.get(id), source.current_index(*id))
            else {
                continue;
            };
            let _ = elements.container.dataset().set("index", &index.to_string());
            for (i, dot) in elements.dots.iter().enumerate() {
                let active = i == index;
                let _ = dot.class_list().toggle_with_force(ACTIVE_DOT_CLASS, active);
                if active {
                    let _ = dot.set_attribute("aria-current", "true");
                } else {
                    let _ = dot.remove_attribute("aria-current");
                }
            }
        }

        // 5. Reveals
        for block in &changes.revealed {
            let Some(el) = self.blocks.get(block) else {
                continue;
            };
            if let Some(delay) = source.reveal_delay(*block) {
                let _ = el
                    .style()
                    .set_property("transition-delay", &format!("{}ms", delay.as_millis()));
            }
            let _ = el.class_list().add_1(VISIBLE_CLASS);
        }
    }
}

/// Writes scene settings as data attributes for the scene script to read.
fn write_scene_settings(slot: &HtmlElement, settings: &SceneSettings) {
    let data = slot.dataset();
    let frame_loop = match settings.frame_loop {
        FrameLoop::Always => "always",
        FrameLoop::OnDemand => "demand",
    };
    let _ = data.set("frameLoop", frame_loop);
    let _ = data.set("shadows", bool_str(settings.shadows));
    let _ = data.set("antialias", bool_str(settings.antialias));
    let _ = data.set("maxDpr", &format!("{}", settings.max_pixel_ratio));
    let _ = data.set("cameraDistance", &format!("{}", settings.camera_distance));
    let _ = data.set("fov", &format!("{}", settings.field_of_view));
    let _ = data.set("autoRotateSpeed", &format!("{}", settings.auto_rotate_speed));
    let _ = data.set("damping", bool_str(settings.damping));
    let _ = data.set("fillLight", bool_str(settings.fill_light));
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
