//! Style map to solver constraint conversion.
//!
//! Only layout-relevant keys are read. Shorthands (`flex`, `margin`,
//! `padding`, `borderWidth` and their axis variants) are applied before the
//! per-edge keys, so `marginLeft` always wins over `margin` regardless of map
//! iteration order.
//!
//! Lengths accept a number (points), `"auto"`, `"N%"`, `"Npx"` or a numeric
//! string. Anything else is ignored.

use taffy::{
    AlignContent, AlignItems, AlignSelf, Dimension, Display, FlexDirection, FlexWrap, JustifyContent,
    LengthPercentage, LengthPercentageAuto, Overflow, Point, Position, Rect, Style,
};
use trellis_value::DomValue;

use crate::logging::targets;
use crate::style::StyleMap;

/// Layout keys in application order.
const LAYOUT_KEYS: &[&str] = &[
    "display",
    "position",
    "overflow",
    "flexDirection",
    "flexWrap",
    "justifyContent",
    "alignItems",
    "alignSelf",
    "alignContent",
    "flex",
    "flexGrow",
    "flexShrink",
    "flexBasis",
    "aspectRatio",
    "width",
    "height",
    "minWidth",
    "minHeight",
    "maxWidth",
    "maxHeight",
    "top",
    "right",
    "bottom",
    "left",
    "margin",
    "marginHorizontal",
    "marginVertical",
    "marginTop",
    "marginRight",
    "marginBottom",
    "marginLeft",
    "padding",
    "paddingHorizontal",
    "paddingVertical",
    "paddingTop",
    "paddingRight",
    "paddingBottom",
    "paddingLeft",
    "borderWidth",
    "borderTopWidth",
    "borderRightWidth",
    "borderBottomWidth",
    "borderLeftWidth",
];

/// Whether `key` influences layout.
pub(crate) fn is_layout_key(key: &str) -> bool {
    LAYOUT_KEYS.contains(&key)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Length {
    Points(f32),
    Percent(f32),
    Auto,
}

/// The constraints a node has when its style map is empty.
pub(crate) fn base_style() -> Style {
    Style {
        display: Display::Flex,
        flex_direction: FlexDirection::Column,
        flex_shrink: 0.0,
        ..Default::default()
    }
}

/// Convert a style map into solver constraints.
pub fn build_style(map: &StyleMap) -> Style {
    let mut style = base_style();
    for key in LAYOUT_KEYS {
        let Some(value) = map.get(*key) else {
            continue;
        };
        if apply_key(&mut style, key, value).is_none() {
            tracing::trace!(target: targets::LAYOUT, key, %value, "ignoring malformed layout value");
        }
    }
    style
}

fn apply_key(style: &mut Style, key: &str, value: &DomValue) -> Option<()> {
    match key {
        "display" => style.display = parse_display(value)?,
        "position" => style.position = parse_position(value)?,
        "overflow" => {
            let overflow = parse_overflow(value)?;
            style.overflow = Point {
                x: overflow,
                y: overflow,
            };
        }
        "flexDirection" => style.flex_direction = parse_flex_direction(value)?,
        "flexWrap" => style.flex_wrap = parse_flex_wrap(value)?,
        "justifyContent" => style.justify_content = Some(parse_justify_content(value)?),
        "alignItems" => style.align_items = Some(parse_align_items(value)?),
        "alignSelf" => style.align_self = parse_align_self(value)?,
        "alignContent" => style.align_content = Some(parse_align_content(value)?),
        "flex" => {
            let flex = parse_number(value)?;
            if flex > 0.0 {
                style.flex_grow = flex;
                style.flex_shrink = 1.0;
                style.flex_basis = Dimension::Length(0.0);
            } else if flex < 0.0 {
                style.flex_grow = 0.0;
                style.flex_shrink = -flex;
                style.flex_basis = Dimension::Auto;
            } else {
                style.flex_grow = 0.0;
                style.flex_shrink = 0.0;
                style.flex_basis = Dimension::Auto;
            }
        }
        "flexGrow" => style.flex_grow = non_negative(parse_number(value)?)?,
        "flexShrink" => style.flex_shrink = non_negative(parse_number(value)?)?,
        "flexBasis" => style.flex_basis = to_dimension(parse_length(value)?),
        "aspectRatio" => {
            let ratio = parse_number(value)?;
            if ratio <= 0.0 {
                return None;
            }
            style.aspect_ratio = Some(ratio);
        }
        "width" => style.size.width = to_dimension(parse_length(value)?),
        "height" => style.size.height = to_dimension(parse_length(value)?),
        "minWidth" => style.min_size.width = to_dimension(parse_length(value)?),
        "minHeight" => style.min_size.height = to_dimension(parse_length(value)?),
        "maxWidth" => style.max_size.width = to_dimension(parse_length(value)?),
        "maxHeight" => style.max_size.height = to_dimension(parse_length(value)?),
        "top" => style.inset.top = to_length_percentage_auto(parse_length(value)?),
        "right" => style.inset.right = to_length_percentage_auto(parse_length(value)?),
        "bottom" => style.inset.bottom = to_length_percentage_auto(parse_length(value)?),
        "left" => style.inset.left = to_length_percentage_auto(parse_length(value)?),
        "margin" => style.margin = uniform(to_length_percentage_auto(parse_length(value)?)),
        "marginHorizontal" => {
            let margin = to_length_percentage_auto(parse_length(value)?);
            style.margin.left = margin;
            style.margin.right = margin;
        }
        "marginVertical" => {
            let margin = to_length_percentage_auto(parse_length(value)?);
            style.margin.top = margin;
            style.margin.bottom = margin;
        }
        "marginTop" => style.margin.top = to_length_percentage_auto(parse_length(value)?),
        "marginRight" => style.margin.right = to_length_percentage_auto(parse_length(value)?),
        "marginBottom" => style.margin.bottom = to_length_percentage_auto(parse_length(value)?),
        "marginLeft" => style.margin.left = to_length_percentage_auto(parse_length(value)?),
        "padding" => style.padding = uniform(to_length_percentage(parse_length(value)?)?),
        "paddingHorizontal" => {
            let padding = to_length_percentage(parse_length(value)?)?;
            style.padding.left = padding;
            style.padding.right = padding;
        }
        "paddingVertical" => {
            let padding = to_length_percentage(parse_length(value)?)?;
            style.padding.top = padding;
            style.padding.bottom = padding;
        }
        "paddingTop" => style.padding.top = to_length_percentage(parse_length(value)?)?,
        "paddingRight" => style.padding.right = to_length_percentage(parse_length(value)?)?,
        "paddingBottom" => style.padding.bottom = to_length_percentage(parse_length(value)?)?,
        "paddingLeft" => style.padding.left = to_length_percentage(parse_length(value)?)?,
        "borderWidth" => style.border = uniform(parse_border(value)?),
        "borderTopWidth" => style.border.top = parse_border(value)?,
        "borderRightWidth" => style.border.right = parse_border(value)?,
        "borderBottomWidth" => style.border.bottom = parse_border(value)?,
        "borderLeftWidth" => style.border.left = parse_border(value)?,
        _ => return None,
    }
    Some(())
}

// =============================================================================
// VALUE PARSING
// =============================================================================

fn parse_number(value: &DomValue) -> Option<f32> {
    let number = match value {
        DomValue::String(s) => s.trim().parse::<f32>().ok()?,
        other => other.as_f32()?,
    };
    number.is_finite().then_some(number)
}

fn non_negative(value: f32) -> Option<f32> {
    (value >= 0.0).then_some(value)
}

fn parse_length(value: &DomValue) -> Option<Length> {
    match value {
        DomValue::Number(_) => parse_number(value).map(Length::Points),
        DomValue::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("auto") {
                return Some(Length::Auto);
            }
            if let Some(percent) = s.strip_suffix('%') {
                let percent = percent.trim().parse::<f32>().ok()?;
                return percent.is_finite().then_some(Length::Percent(percent / 100.0));
            }
            let points = s.strip_suffix("px").unwrap_or(s).trim().parse::<f32>().ok()?;
            points.is_finite().then_some(Length::Points(points))
        }
        _ => None,
    }
}

fn parse_border(value: &DomValue) -> Option<LengthPercentage> {
    parse_number(value)
        .and_then(non_negative)
        .map(LengthPercentage::Length)
}

fn to_dimension(length: Length) -> Dimension {
    match length {
        Length::Points(n) => Dimension::Length(n),
        Length::Percent(p) => Dimension::Percent(p),
        Length::Auto => Dimension::Auto,
    }
}

fn to_length_percentage_auto(length: Length) -> LengthPercentageAuto {
    match length {
        Length::Points(n) => LengthPercentageAuto::Length(n),
        Length::Percent(p) => LengthPercentageAuto::Percent(p),
        Length::Auto => LengthPercentageAuto::Auto,
    }
}

fn to_length_percentage(length: Length) -> Option<LengthPercentage> {
    match length {
        Length::Points(n) => Some(LengthPercentage::Length(n)),
        Length::Percent(p) => Some(LengthPercentage::Percent(p)),
        Length::Auto => None,
    }
}

fn uniform<T: Copy>(value: T) -> Rect<T> {
    Rect {
        left: value,
        right: value,
        top: value,
        bottom: value,
    }
}

// =============================================================================
// KEYWORD PARSING
// =============================================================================

fn keyword(value: &DomValue) -> Option<&str> {
    value.as_str().map(str::trim)
}

fn parse_display(value: &DomValue) -> Option<Display> {
    match keyword(value)? {
        "flex" => Some(Display::Flex),
        "none" => Some(Display::None),
        _ => None,
    }
}

fn parse_position(value: &DomValue) -> Option<Position> {
    match keyword(value)? {
        "relative" => Some(Position::Relative),
        "absolute" => Some(Position::Absolute),
        _ => None,
    }
}

fn parse_overflow(value: &DomValue) -> Option<Overflow> {
    match keyword(value)? {
        "visible" => Some(Overflow::Visible),
        "hidden" => Some(Overflow::Hidden),
        "scroll" => Some(Overflow::Scroll),
        _ => None,
    }
}

fn parse_flex_direction(value: &DomValue) -> Option<FlexDirection> {
    match keyword(value)? {
        "row" => Some(FlexDirection::Row),
        "row-reverse" => Some(FlexDirection::RowReverse),
        "column" => Some(FlexDirection::Column),
        "column-reverse" => Some(FlexDirection::ColumnReverse),
        _ => None,
    }
}

fn parse_flex_wrap(value: &DomValue) -> Option<FlexWrap> {
    match keyword(value)? {
        "nowrap" => Some(FlexWrap::NoWrap),
        "wrap" => Some(FlexWrap::Wrap),
        "wrap-reverse" => Some(FlexWrap::WrapReverse),
        _ => None,
    }
}

fn parse_justify_content(value: &DomValue) -> Option<JustifyContent> {
    match keyword(value)? {
        "flex-start" => Some(JustifyContent::FlexStart),
        "flex-end" => Some(JustifyContent::FlexEnd),
        "center" => Some(JustifyContent::Center),
        "space-between" => Some(JustifyContent::SpaceBetween),
        "space-around" => Some(JustifyContent::SpaceAround),
        "space-evenly" => Some(JustifyContent::SpaceEvenly),
        _ => None,
    }
}

fn parse_align_items(value: &DomValue) -> Option<AlignItems> {
    match keyword(value)? {
        "flex-start" => Some(AlignItems::FlexStart),
        "flex-end" => Some(AlignItems::FlexEnd),
        "center" => Some(AlignItems::Center),
        "baseline" => Some(AlignItems::Baseline),
        "stretch" => Some(AlignItems::Stretch),
        _ => None,
    }
}

/// `"auto"` defers to the parent's `alignItems`, hence the nested option.
fn parse_align_self(value: &DomValue) -> Option<Option<AlignSelf>> {
    if keyword(value)? == "auto" {
        return Some(None);
    }
    parse_align_items(value).map(Some)
}

fn parse_align_content(value: &DomValue) -> Option<AlignContent> {
    match keyword(value)? {
        "flex-start" => Some(AlignContent::FlexStart),
        "flex-end" => Some(AlignContent::FlexEnd),
        "center" => Some(AlignContent::Center),
        "stretch" => Some(AlignContent::Stretch),
        "space-between" => Some(AlignContent::SpaceBetween),
        "space-around" => Some(AlignContent::SpaceAround),
        _ => None,
    }
}
