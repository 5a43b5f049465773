// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web demo: an adaptive product showcase driven by `vitrine_backend_web`.
//!
//! Builds a small storefront page (hero visual, value props, a product
//! carousel and an auto-advancing testimonial carousel) and hands it to a
//! [`WebHost`]. Resize the window across 768 px to watch the tier change.
//!
//! Build with: `wasm-pack build --target web demos/web_showcase`
//!
//! [`WebHost`]: vitrine_backend_web::WebHost

// This crate only runs in the browser; suppress dead-code warnings when
// cargo-checking on a native host target.
#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

use alloc::format;
use alloc::vec::Vec;
use core::num::NonZeroUsize;

use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement};

use vitrine_backend_web::WebHost;
use vitrine_core::carousel::CarouselId;
use vitrine_core::controller::{CarouselConfig, ControllerConfig};
use vitrine_core::loader::Visual;
use vitrine_core::reveal::{BlockId, RevealSpec};
use vitrine_core::time::Duration;

const PRODUCTS: [&str; 6] = [
    "Eco Tote Bag",
    "Minimalist Watch",
    "Ceramic Mug",
    "Wireless Earbuds",
    "Scented Candle",
    "Leather Wallet",
];

const TESTIMONIALS: [(&str, &str); 3] = [
    (
        "Ava Martinez",
        "ShopEase made finding unique gifts so easy! The app is a game changer.",
    ),
    ("Liam Chen", "Fast shipping and beautiful products. Highly recommend!"),
    (
        "Sofia Rossi",
        "Love the sustainable options. I feel good about my purchases.",
    ),
];

const VALUE_PROPS: [&str; 3] = [
    "Handpicked Collections",
    "Fast & Free Shipping",
    "Sustainable Sourcing",
];

const PRODUCT_CAROUSEL: CarouselId = CarouselId(0);
const TESTIMONIAL_CAROUSEL: CarouselId = CarouselId(1);

const CARD_STAGGER: Duration = Duration::from_millis(120);
const TESTIMONIAL_STAGGER: Duration = Duration::from_millis(180);
const AUTO_ADVANCE: Duration = Duration::from_millis(5000);

const STYLES: &str = r"
.vitrine-block { opacity: 0; transform: translateY(40px); transition: opacity 0.7s ease-out, transform 0.7s ease-out; }
.vitrine-block.is-visible { opacity: 1; transform: none; }
.vitrine-track { display: flex; overflow-x: auto; scroll-snap-type: x mandatory; gap: 0; }
.vitrine-track > * { flex: 0 0 100%; scroll-snap-align: start; }
.vitrine-dot { width: 10px; height: 10px; border-radius: 5px; border: 0; margin: 4px; background: #ccc; }
.vitrine-dot.is-active { background: #222; }
.hover-enabled .vitrine-card:hover { transform: scale(1.04); }
[data-visual='placeholder'] { background: linear-gradient(90deg, #eee, #ddd, #eee); }
[data-visual='static'] { background: #6c5ce7 center / contain no-repeat; }
@keyframes vitrine-spin { to { transform: rotate(360deg); } }
";

/// Entry point, called automatically by `wasm_bindgen(start)`.
#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("no body"))?;

    let style = document.create_element("style")?;
    style.set_text_content(Some(STYLES));
    body.append_child(&style)?;

    let root = create(&document, "main", "vitrine-root")?;
    body.append_child(&root)?;

    let host = WebHost::mount(window, root.clone(), ControllerConfig::web())?;

    // Hero visual.
    let slot = create(&document, "div", "vitrine-visual")?;
    slot.style().set_property("height", "320px")?;
    root.append_child(&slot)?;
    host.set_visual_slot(slot, mount_scene);

    // Value props.
    let heading = create(&document, "h2", "vitrine-block")?;
    heading.set_text_content(Some("Why shop with us"));
    root.append_child(&heading)?;
    host.observe(BlockId(0), heading, RevealSpec::new(0.5))?;
    for (slot, title) in (0_u32..).zip(VALUE_PROPS) {
        let card = create(&document, "div", "vitrine-block vitrine-card")?;
        card.set_text_content(Some(title));
        root.append_child(&card)?;
        host.observe(
            BlockId(1 + slot),
            card,
            RevealSpec::staggered(0.3, CARD_STAGGER, slot),
        )?;
    }

    // Product carousel.
    let labels: Vec<&str> = PRODUCTS.to_vec();
    let (track, dots) = create_carousel(&document, &root, &labels)?;
    host.add_carousel(PRODUCT_CAROUSEL, track, dots, CarouselConfig::new(count(PRODUCTS.len())))?;

    // Testimonials, auto-advancing on narrow tiers.
    let quotes: Vec<alloc::string::String> = TESTIMONIALS
        .iter()
        .map(|(name, quote)| format!("\u{201c}{quote}\u{201d} ({name})"))
        .collect();
    let labels: Vec<&str> = quotes.iter().map(|q| q.as_str()).collect();
    let (track, dots) = create_carousel(&document, &root, &labels)?;
    for (slot, child) in (0_u32..).zip(track_children(&track)) {
        child.class_list().add_1("vitrine-block")?;
        host.observe(
            BlockId(10 + slot),
            child,
            RevealSpec::staggered(0.2, TESTIMONIAL_STAGGER, slot),
        )?;
    }
    host.add_carousel(
        TESTIMONIAL_CAROUSEL,
        track,
        dots,
        CarouselConfig::new(count(TESTIMONIALS.len())).with_auto_advance(AUTO_ADVANCE),
    )?;

    // The page lives as long as the tab; there is no graceful shutdown.
    core::mem::forget(host);
    Ok(())
}

/// Stands in for the 3D scene: a spinning tile whose speed and shadow follow
/// the tier's scene settings. A demotion to the static asset removes it.
fn mount_scene(visual: &Visual, slot: &HtmlElement) -> Result<(), JsValue> {
    let Visual::Scene(settings) = visual else {
        slot.replace_children_with_node_0();
        return Ok(());
    };
    let document = slot
        .owner_document()
        .ok_or_else(|| JsValue::from_str("no owner document"))?;
    let tile = create(&document, "div", "vitrine-scene")?;
    let s = tile.style();
    s.set_property("width", "160px")?;
    s.set_property("height", "160px")?;
    s.set_property("margin", "80px auto")?;
    s.set_property("background", "#6c5ce7")?;
    let period = 8.0 / settings.auto_rotate_speed.max(0.1);
    s.set_property("animation", &format!("vitrine-spin {period}s linear infinite"))?;
    if settings.shadows {
        s.set_property("box-shadow", "0 16px 40px rgba(0,0,0,0.35)")?;
    }
    slot.replace_children_with_node_1(&tile);
    Ok(())
}

fn create(document: &Document, tag: &str, class: &str) -> Result<HtmlElement, JsValue> {
    let el: HtmlElement = document.create_element(tag)?.unchecked_into();
    el.set_class_name(class);
    Ok(el)
}

fn create_carousel(
    document: &Document,
    root: &HtmlElement,
    labels: &[&str],
) -> Result<(HtmlElement, Vec<HtmlElement>), JsValue> {
    let track = create(document, "div", "vitrine-track")?;
    for label in labels {
        let item = create(document, "div", "vitrine-card")?;
        item.set_text_content(Some(label));
        track.append_child(&item)?;
    }
    root.append_child(&track)?;

    let nav = create(document, "nav", "vitrine-dots")?;
    let mut dots = Vec::with_capacity(labels.len());
    for i in 0..labels.len() {
        let dot = create(document, "button", "vitrine-dot")?;
        dot.set_attribute("aria-label", &format!("Go to item {}", i + 1))?;
        nav.append_child(&dot)?;
        dots.push(dot);
    }
    root.append_child(&nav)?;
    Ok((track, dots))
}

fn track_children(track: &HtmlElement) -> Vec<HtmlElement> {
    let children = track.children();
    (0..children.length())
        .filter_map(|i| children.item(i))
        .map(JsCast::unchecked_into)
        .collect()
}

fn count(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN)
}
