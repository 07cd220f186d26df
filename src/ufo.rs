//! Load UFO sources into the checker's font model.

use std::path::Path;

use kurbo::{Affine, Point};

use crate::contour::{Contour, ContourPoint, PointType};
use crate::error::CheckError;
use crate::font::{Font, FontInfo};
use crate::glyph::{Anchor, Component, Glyph};

static GLYPH_ORDER_KEY: &str = "public.glyphOrder";

/// Load the default layer of a UFO.
pub fn load(path: &Path) -> Result<Font, CheckError> {
    let ufo = norad::Font::load(path)?;
    Ok(from_norad(&ufo))
}

/// Convert a loaded `norad::Font`.
///
/// Glyphs follow `public.glyphOrder` when the lib has one; glyphs it
/// doesn't list come after, in layer order.
pub fn from_norad(ufo: &norad::Font) -> Font {
    let mut font = Font::new(font_info(&ufo.font_info));
    for glyph in ufo.default_layer().iter() {
        font.insert(to_glyph(glyph));
    }
    if let Some(order) = glyph_order(ufo) {
        font.apply_glyph_order(&order);
    } else {
        log::debug!("no {GLYPH_ORDER_KEY} in lib, keeping layer order");
    }
    font
}

/// Names listed in the lib's glyph order, if present and well formed.
pub fn glyph_order(ufo: &norad::Font) -> Option<Vec<String>> {
    ufo.lib
        .get(GLYPH_ORDER_KEY)
        .and_then(|val| val.as_array())
        .and_then(|names| {
            names
                .iter()
                .map(|val| val.as_string().map(str::to_string))
                .collect()
        })
}

pub fn font_info(info: &norad::FontInfo) -> FontInfo {
    FontInfo {
        units_per_em: info.units_per_em.map(|v| v.as_f64()),
        ascender: info.ascender,
        descender: info.descender,
        x_height: info.x_height,
        cap_height: info.cap_height,
        blue_values: info.postscript_blue_values.clone().unwrap_or_default(),
        other_blues: info.postscript_other_blues.clone().unwrap_or_default(),
        stem_snap_h: info.postscript_stem_snap_h.clone().unwrap_or_default(),
        stem_snap_v: info.postscript_stem_snap_v.clone().unwrap_or_default(),
    }
}

pub fn to_glyph(ufo_glyph: &norad::Glyph) -> Glyph {
    let mut glyph = Glyph::new(ufo_glyph.name().as_str());
    glyph.set_width(ufo_glyph.width);
    glyph.set_unicodes(ufo_glyph.codepoints.iter().collect());
    glyph.set_contours(ufo_glyph.contours.iter().map(to_contour).collect());
    for component in &ufo_glyph.components {
        glyph.add_component(to_component(component));
    }
    for anchor in &ufo_glyph.anchors {
        glyph.add_anchor(Anchor {
            name: anchor.name.as_ref().map(|n| n.to_string()),
            position: Point::new(anchor.x, anchor.y),
        });
    }
    glyph
}

pub fn to_contour(contour: &norad::Contour) -> Contour {
    Contour::new(contour.points.iter().map(contour_point).collect())
}

fn to_component(component: &norad::Component) -> Component {
    let t = &component.transform;
    Component::new(
        component.base.as_str(),
        Affine::new([t.x_scale, t.xy_scale, t.yx_scale, t.y_scale, t.x_offset, t.y_offset]),
    )
}

fn contour_point(p: &norad::ContourPoint) -> ContourPoint {
    let typ = match p.typ {
        norad::PointType::Move => PointType::Move,
        norad::PointType::Line => PointType::Line,
        norad::PointType::OffCurve => PointType::OffCurve,
        norad::PointType::Curve => PointType::Curve,
        norad::PointType::QCurve => PointType::QCurve,
    };
    ContourPoint::new(p.x, p.y, typ, p.smooth)
}
