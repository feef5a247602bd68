use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::backend::ElementKind;

pub const NODE_SHAPES: &[&str] = &["ellipse", "rectangle", "round-rectangle", "diamond", "triangle"];
pub const LINE_TYPES: &[&str] = &["solid", "dashed", "dotted"];
pub const ARROW_SHAPES: &[&str] = &["triangle", "vee", "none"];
pub const CURVE_STYLES: &[&str] = &["bezier", "straight", "taxi"];

/// What kind of value a visual property takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Color,
    Number,
    /// One of a closed set of tokens.
    Enum(&'static [&'static str]),
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Color => "color",
            ValueKind::Number => "number",
            ValueKind::Enum(_) => "enum",
        }
    }
}

#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum VisualProperty {
    FillColor,
    LabelColor,
    LabelFontSize,
    Shape,
    Size,
    BorderWidth,
    BorderColor,
    Opacity,
    LineColor,
    Width,
    LineType,
    ArrowShape,
    CurveStyle,
}

impl VisualProperty {
    pub fn value_kind(&self) -> ValueKind {
        match self {
            VisualProperty::FillColor
            | VisualProperty::LabelColor
            | VisualProperty::BorderColor
            | VisualProperty::LineColor => ValueKind::Color,
            VisualProperty::LabelFontSize
            | VisualProperty::Size
            | VisualProperty::BorderWidth
            | VisualProperty::Opacity
            | VisualProperty::Width => ValueKind::Number,
            VisualProperty::Shape => ValueKind::Enum(NODE_SHAPES),
            VisualProperty::LineType => ValueKind::Enum(LINE_TYPES),
            VisualProperty::ArrowShape => ValueKind::Enum(ARROW_SHAPES),
            VisualProperty::CurveStyle => ValueKind::Enum(CURVE_STYLES),
        }
    }

    pub fn applies_to(&self, kind: ElementKind) -> bool {
        match kind {
            ElementKind::Node => matches!(
                self,
                VisualProperty::FillColor
                    | VisualProperty::LabelColor
                    | VisualProperty::LabelFontSize
                    | VisualProperty::Shape
                    | VisualProperty::Size
                    | VisualProperty::BorderWidth
                    | VisualProperty::BorderColor
                    | VisualProperty::Opacity
            ),
            ElementKind::Edge => matches!(
                self,
                VisualProperty::LineColor
                    | VisualProperty::Width
                    | VisualProperty::LineType
                    | VisualProperty::ArrowShape
                    | VisualProperty::CurveStyle
                    | VisualProperty::Opacity
            ),
        }
    }

    /// Properties stylable on `kind`, in declaration order.
    pub fn for_kind(kind: ElementKind) -> Vec<VisualProperty> {
        VisualProperty::iter().filter(|p| p.applies_to(kind)).collect()
    }

    /// Font sizes resolve to whole numbers, other numbers to one decimal.
    pub fn rounds_to_integer(&self) -> bool {
        matches!(self, VisualProperty::LabelFontSize)
    }

    pub fn is_color(&self) -> bool {
        self.value_kind() == ValueKind::Color
    }
}
