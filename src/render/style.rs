use std::{fmt, str::FromStr, sync::Arc};

use crate::foundation::core::{Rect, Rgba};
use crate::foundation::error::{DotfxError, DotfxResult};

/// Default stroke width when a style does not declare one.
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// Draw category a style is applied for. Buckets of different categories never mix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Category {
    Stroke,
    Fill,
}

/// Canonical key identifying a fully resolved draw style.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numbers in signatures: 4 decimals, no negative zero.
fn num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_owned();
    }
    let r = (v * 10_000.0).round() / 10_000.0;
    let r = if r == 0.0 { 0.0 } else { r };
    format!("{r}")
}

/// One CSS-like filter function.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum FilterOp {
    /// Gaussian blur radius in pixels.
    Blur(f64),
    Brightness(f64),
    Contrast(f64),
    Grayscale(f64),
    /// Hue rotation in degrees.
    HueRotate(f64),
    Invert(f64),
    Opacity(f64),
    Saturate(f64),
    Sepia(f64),
    /// Reference to an externally loaded filter resource (`url(#id)`).
    Url(String),
}

impl FilterOp {
    fn canonical(&self) -> String {
        match self {
            Self::Blur(v) => format!("blur({}px)", num(*v)),
            Self::Brightness(v) => format!("brightness({})", num(*v)),
            Self::Contrast(v) => format!("contrast({})", num(*v)),
            Self::Grayscale(v) => format!("grayscale({})", num(*v)),
            Self::HueRotate(v) => format!("hue-rotate({}deg)", num(*v)),
            Self::Invert(v) => format!("invert({})", num(*v)),
            Self::Opacity(v) => format!("opacity({})", num(*v)),
            Self::Saturate(v) => format!("saturate({})", num(*v)),
            Self::Sepia(v) => format!("sepia({})", num(*v)),
            Self::Url(r) => format!("url({r})"),
        }
    }
}

/// Ordered filter chain; empty means `none`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Filter {
    pub ops: Vec<FilterOp>,
}

impl Filter {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn blur(px: f64) -> Self {
        Self {
            ops: vec![FilterOp::Blur(px)],
        }
    }

    pub fn is_none(&self) -> bool {
        self.ops.is_empty()
    }

    /// External filter resources cannot be shared across a merged path.
    pub fn requires_isolation(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, FilterOp::Url(_)))
    }

    /// Canonical CSS-like text (`none` when empty).
    pub fn canonical(&self) -> String {
        if self.ops.is_empty() {
            return "none".to_owned();
        }
        self.ops
            .iter()
            .map(FilterOp::canonical)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Parse, falling back to `none` on malformed input.
    pub fn parse_or_none(s: &str) -> Self {
        s.parse().unwrap_or_else(|err: DotfxError| {
            tracing::warn!(filter = s, %err, "invalid filter, using none");
            Self::none()
        })
    }
}

impl FromStr for Filter {
    type Err = DotfxError;

    fn from_str(s: &str) -> DotfxResult<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(Self::none());
        }

        let mut ops = Vec::new();
        let mut rest = s;
        while !rest.is_empty() {
            let open = rest
                .find('(')
                .ok_or_else(|| DotfxError::validation(format!("filter '{s}': missing '('")))?;
            let close = rest[open..]
                .find(')')
                .map(|i| open + i)
                .ok_or_else(|| DotfxError::validation(format!("filter '{s}': missing ')'")))?;
            let name = rest[..open].trim().to_ascii_lowercase();
            let arg = rest[open + 1..close].trim();
            ops.push(parse_filter_op(&name, arg)?);
            rest = rest[close + 1..].trim_start();
        }
        Ok(Self { ops })
    }
}

fn parse_filter_op(name: &str, arg: &str) -> DotfxResult<FilterOp> {
    if name == "url" {
        let r = arg.trim_matches(|c| c == '"' || c == '\'');
        if r.is_empty() {
            return Err(DotfxError::validation("url() filter needs a reference"));
        }
        return Ok(FilterOp::Url(r.to_owned()));
    }

    let value = parse_filter_amount(arg)
        .ok_or_else(|| DotfxError::validation(format!("filter {name}(): bad amount '{arg}'")))?;
    Ok(match name {
        "blur" => FilterOp::Blur(value),
        "brightness" => FilterOp::Brightness(value),
        "contrast" => FilterOp::Contrast(value),
        "grayscale" => FilterOp::Grayscale(value),
        "hue-rotate" => FilterOp::HueRotate(value),
        "invert" => FilterOp::Invert(value),
        "opacity" => FilterOp::Opacity(value),
        "saturate" => FilterOp::Saturate(value),
        "sepia" => FilterOp::Sepia(value),
        other => {
            return Err(DotfxError::validation(format!(
                "unknown filter function '{other}'"
            )));
        }
    })
}

fn parse_filter_amount(arg: &str) -> Option<f64> {
    let arg = arg.trim();
    let (digits, scale) = if let Some(v) = arg.strip_suffix('%') {
        (v, 0.01)
    } else if let Some(v) = arg.strip_suffix("px") {
        (v, 1.0)
    } else if let Some(v) = arg.strip_suffix("deg") {
        (v, 1.0)
    } else {
        (arg, 1.0)
    };
    let v: f64 = digits.trim().parse().ok()?;
    v.is_finite().then_some(v * scale)
}

/// Canvas composite operations (`globalCompositeOperation`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeOp {
    #[default]
    SourceOver,
    SourceIn,
    SourceOut,
    SourceAtop,
    DestinationOver,
    DestinationIn,
    DestinationOut,
    DestinationAtop,
    Lighter,
    Copy,
    Xor,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl CompositeOp {
    pub const ALL: [Self; 26] = [
        Self::SourceOver,
        Self::SourceIn,
        Self::SourceOut,
        Self::SourceAtop,
        Self::DestinationOver,
        Self::DestinationIn,
        Self::DestinationOut,
        Self::DestinationAtop,
        Self::Lighter,
        Self::Copy,
        Self::Xor,
        Self::Multiply,
        Self::Screen,
        Self::Overlay,
        Self::Darken,
        Self::Lighten,
        Self::ColorDodge,
        Self::ColorBurn,
        Self::HardLight,
        Self::SoftLight,
        Self::Difference,
        Self::Exclusion,
        Self::Hue,
        Self::Saturation,
        Self::Color,
        Self::Luminosity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourceOver => "source-over",
            Self::SourceIn => "source-in",
            Self::SourceOut => "source-out",
            Self::SourceAtop => "source-atop",
            Self::DestinationOver => "destination-over",
            Self::DestinationIn => "destination-in",
            Self::DestinationOut => "destination-out",
            Self::DestinationAtop => "destination-atop",
            Self::Lighter => "lighter",
            Self::Copy => "copy",
            Self::Xor => "xor",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::ColorDodge => "color-dodge",
            Self::ColorBurn => "color-burn",
            Self::HardLight => "hard-light",
            Self::SoftLight => "soft-light",
            Self::Difference => "difference",
            Self::Exclusion => "exclusion",
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::Color => "color",
            Self::Luminosity => "luminosity",
        }
    }
}

impl FromStr for CompositeOp {
    type Err = DotfxError;

    fn from_str(s: &str) -> DotfxResult<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DotfxError::validation(format!("unknown composite operation '{s}'")))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineJoin {
    fn as_str(self) -> &'static str {
        match self {
            Self::Miter => "miter",
            Self::Round => "round",
            Self::Bevel => "bevel",
        }
    }
}

impl LineCap {
    fn as_str(self) -> &'static str {
        match self {
            Self::Butt => "butt",
            Self::Round => "round",
            Self::Square => "square",
        }
    }
}

/// Stroke-only style fields.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LineStyle {
    pub width: f64,
    #[serde(default)]
    pub dash: Vec<f64>,
    #[serde(default)]
    pub dash_offset: f64,
    #[serde(default)]
    pub join: LineJoin,
    #[serde(default)]
    pub cap: LineCap,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            width: DEFAULT_LINE_WIDTH,
            dash: Vec::new(),
            dash_offset: 0.0,
            join: LineJoin::default(),
            cap: LineCap::default(),
        }
    }
}

impl LineStyle {
    pub fn with_width(width: f64) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    /// Canonical form: bad widths fall back to the default, bad or all-zero dash patterns mean
    /// solid, odd-length patterns are repeated (as canvas does).
    pub fn canonical(&self) -> Self {
        let width = if self.width.is_finite() && self.width > 0.0 {
            self.width
        } else {
            DEFAULT_LINE_WIDTH
        };
        let valid_dash = self.dash.iter().all(|v| v.is_finite() && *v >= 0.0)
            && self.dash.iter().any(|v| *v > 0.0);
        let mut dash = if valid_dash {
            self.dash.clone()
        } else {
            Vec::new()
        };
        if dash.len() % 2 == 1 {
            dash.extend_from_within(..);
        }
        let dash_offset = if dash.is_empty() || !self.dash_offset.is_finite() {
            0.0
        } else {
            self.dash_offset
        };
        Self {
            width,
            dash,
            dash_offset,
            join: self.join,
            cap: self.cap,
        }
    }
}

/// Identifier of a dynamic paint registered on a [`StyleBook`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PaintId(pub u32);

/// Identifier of a reusable [`StyleProfile`] registered on a [`StyleBook`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ProfileId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorStop {
    /// Position along the gradient in `[0, 1]`.
    pub offset: f64,
    pub color: Rgba,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum GradientKind {
    /// Linear gradient across the bounds, rotated by `angle_deg` (0 = left to right).
    Linear { angle_deg: f64 },
    /// Radial gradient from the bounds center to the farthest corner.
    Radial,
}

/// A gradient positioned on the bounds of whatever geometry it paints.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Gradient {
    pub kind: GradientKind,
    pub stops: Vec<ColorStop>,
}

impl Gradient {
    pub fn linear(angle_deg: f64, stops: impl IntoIterator<Item = (f64, Rgba)>) -> Self {
        Self::with_stops(GradientKind::Linear { angle_deg }, stops)
    }

    pub fn radial(stops: impl IntoIterator<Item = (f64, Rgba)>) -> Self {
        Self::with_stops(GradientKind::Radial, stops)
    }

    fn with_stops(kind: GradientKind, stops: impl IntoIterator<Item = (f64, Rgba)>) -> Self {
        let mut stops: Vec<ColorStop> = stops
            .into_iter()
            .map(|(offset, color)| ColorStop {
                offset: if offset.is_finite() {
                    offset.clamp(0.0, 1.0)
                } else {
                    0.0
                },
                color,
            })
            .collect();
        stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Self { kind, stops }
    }

    /// Highest stop alpha; a fully transparent gradient is never drawn.
    pub fn max_alpha(&self) -> f64 {
        self.stops
            .iter()
            .map(|s| s.color.a)
            .fold(0.0, f64::max)
    }

    /// Color at `t` in `[0, 1]`, linearly interpolated between stops.
    pub fn sample(&self, t: f64) -> Rgba {
        let Some(first) = self.stops.first() else {
            return Rgba::TRANSPARENT;
        };
        let t = t.clamp(0.0, 1.0);
        if t <= first.offset {
            return first.color;
        }
        for w in self.stops.windows(2) {
            let (a, b) = (w[0], w[1]);
            if t <= b.offset {
                let span = b.offset - a.offset;
                let u = if span <= 0.0 {
                    1.0
                } else {
                    (t - a.offset) / span
                };
                return Rgba::new(
                    a.color.r + (b.color.r - a.color.r) * u,
                    a.color.g + (b.color.g - a.color.g) * u,
                    a.color.b + (b.color.b - a.color.b) * u,
                    a.color.a + (b.color.a - a.color.a) * u,
                );
            }
        }
        self.stops[self.stops.len() - 1].color
    }
}

/// Paint as declared by callers.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Paint {
    Color(Rgba),
    /// Registered dynamic paint (gradient).
    Dynamic(PaintId),
}

impl From<Rgba> for Paint {
    fn from(c: Rgba) -> Self {
        Self::Color(c)
    }
}

/// Paint after registry lookup, ready for a surface.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedPaint {
    Color(Rgba),
    Gradient {
        id: PaintId,
        /// Bumped each time the paint is replaced.
        revision: u32,
        gradient: Arc<Gradient>,
        /// Geometry bounds the gradient is stretched over.
        bounds: Rect,
    },
}

impl ResolvedPaint {
    fn alpha(&self) -> f64 {
        match self {
            Self::Color(c) => c.a,
            Self::Gradient { gradient, .. } => gradient.max_alpha(),
        }
    }
}

/// Filter / composite mode / opacity triple. `None` fields fall back to the owner's defaults.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VisualEffects {
    #[serde(default)]
    pub filter: Option<Filter>,
    #[serde(default)]
    pub composite: Option<CompositeOp>,
    #[serde(default)]
    pub opacity: Option<f64>,
}

impl VisualEffects {
    /// Fill unset fields from `fallback`.
    pub fn or(&self, fallback: &VisualEffects) -> VisualEffects {
        VisualEffects {
            filter: self.filter.clone().or_else(|| fallback.filter.clone()),
            composite: self.composite.or(fallback.composite),
            opacity: self.opacity.or(fallback.opacity),
        }
    }
}

/// Reusable named style, updated in place by its owner and shared by reference.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StyleProfile {
    pub paint: Paint,
    #[serde(default)]
    pub filter: Filter,
    #[serde(default)]
    pub composite: CompositeOp,
    #[serde(default = "one")]
    pub opacity: f64,
    #[serde(default)]
    pub line: LineStyle,
}

fn one() -> f64 {
    1.0
}

impl Default for StyleProfile {
    fn default() -> Self {
        Self {
            paint: Paint::Color(Rgba::WHITE),
            filter: Filter::none(),
            composite: CompositeOp::SourceOver,
            opacity: 1.0,
            line: LineStyle::default(),
        }
    }
}

impl StyleProfile {
    pub fn color(color: Rgba) -> Self {
        Self {
            paint: Paint::Color(color),
            ..Self::default()
        }
    }
}

/// Style as handed to the batcher: an inline literal or a reference to a registered profile.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleInput {
    Literal {
        paint: Paint,
        effects: VisualEffects,
        line: Option<LineStyle>,
    },
    Profile(ProfileId),
}

impl StyleInput {
    pub fn color(color: Rgba) -> Self {
        Self::Literal {
            paint: Paint::Color(color),
            effects: VisualEffects::default(),
            line: None,
        }
    }

    pub fn with_line(self, line: LineStyle) -> Self {
        match self {
            Self::Literal { paint, effects, .. } => Self::Literal {
                paint,
                effects,
                line: Some(line),
            },
            profile => profile,
        }
    }
}

impl From<Rgba> for StyleInput {
    fn from(c: Rgba) -> Self {
        Self::color(c)
    }
}

/// Fully resolved style with every default filled in.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStyle {
    pub paint: ResolvedPaint,
    pub filter: Filter,
    pub composite: CompositeOp,
    pub opacity: f64,
    pub line: LineStyle,
}

impl ResolvedStyle {
    /// Alpha the geometry will actually be drawn with.
    pub fn effective_alpha(&self) -> f64 {
        self.paint.alpha().clamp(0.0, 1.0) * self.opacity
    }

    pub fn requires_isolation(&self) -> bool {
        self.filter.requires_isolation()
    }

    /// Canonical signature. Stroke signatures include the line fields, fill signatures do not.
    pub fn signature(&self, category: Category) -> Signature {
        let mut s = match &self.paint {
            ResolvedPaint::Color(c) => {
                let [r, g, b, _] = c.to_rgba8();
                let a = if c.a.is_finite() {
                    c.a.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                format!("c:{r},{g},{b},{}", num(a))
            }
            ResolvedPaint::Gradient { id, bounds, .. } => format!(
                "g:{}@{},{},{},{}",
                id.0,
                num(bounds.x0),
                num(bounds.y0),
                num(bounds.x1),
                num(bounds.y1)
            ),
        };
        s.push_str(&format!(
            "|f:{}|o:{}|a:{}",
            self.filter.canonical(),
            self.composite.as_str(),
            num(self.opacity)
        ));
        if category == Category::Stroke {
            let line = &self.line;
            let dash = line
                .dash
                .iter()
                .map(|v| num(*v))
                .collect::<Vec<_>>()
                .join(",");
            s.push_str(&format!(
                "|w:{}|d:{}@{}|j:{}|p:{}",
                num(line.width),
                dash,
                num(line.dash_offset),
                line.join.as_str(),
                line.cap.as_str()
            ));
        }
        Signature(s)
    }
}

/// Registry of reusable profiles and dynamic paints.
#[derive(Clone, Debug, Default)]
pub struct StyleBook {
    profiles: Vec<StyleProfile>,
    paints: Vec<PaintSlot>,
}

#[derive(Clone, Debug)]
struct PaintSlot {
    gradient: Arc<Gradient>,
    revision: u32,
}

impl StyleBook {
    pub fn add_profile(&mut self, profile: StyleProfile) -> ProfileId {
        self.profiles.push(profile);
        ProfileId((self.profiles.len() - 1) as u32)
    }

    pub fn profile(&self, id: ProfileId) -> Option<&StyleProfile> {
        self.profiles.get(id.0 as usize)
    }

    pub fn profile_mut(&mut self, id: ProfileId) -> Option<&mut StyleProfile> {
        self.profiles.get_mut(id.0 as usize)
    }

    pub fn add_gradient(&mut self, gradient: Gradient) -> PaintId {
        self.paints.push(PaintSlot {
            gradient: Arc::new(gradient),
            revision: 0,
        });
        PaintId((self.paints.len() - 1) as u32)
    }

    pub fn gradient(&self, id: PaintId) -> Option<&Arc<Gradient>> {
        self.paints.get(id.0 as usize).map(|slot| &slot.gradient)
    }

    /// Replace a registered gradient; geometry drawn afterwards picks up the new stops.
    pub fn set_gradient(&mut self, id: PaintId, gradient: Gradient) -> DotfxResult<()> {
        let slot = self
            .paints
            .get_mut(id.0 as usize)
            .ok_or_else(|| DotfxError::validation(format!("unknown paint id {}", id.0)))?;
        slot.gradient = Arc::new(gradient);
        slot.revision = slot.revision.wrapping_add(1);
        Ok(())
    }

    fn resolve_paint(&self, paint: Paint, bounds: Rect) -> ResolvedPaint {
        match paint {
            Paint::Color(c) => ResolvedPaint::Color(c),
            Paint::Dynamic(id) => match self.paints.get(id.0 as usize) {
                Some(slot) => ResolvedPaint::Gradient {
                    id,
                    revision: slot.revision,
                    gradient: slot.gradient.clone(),
                    bounds,
                },
                None => {
                    tracing::warn!(paint = id.0, "unknown dynamic paint, using transparent");
                    ResolvedPaint::Color(Rgba::TRANSPARENT)
                }
            },
        }
    }

    /// Resolve an input against the registry, filling every omitted field with its default.
    ///
    /// `bounds` is the bounding box of the geometry being drawn; it positions dynamic paints.
    pub fn resolve(&self, input: &StyleInput, bounds: Rect) -> ResolvedStyle {
        let resolved = match input {
            StyleInput::Literal {
                paint,
                effects,
                line,
            } => ResolvedStyle {
                paint: self.resolve_paint(*paint, bounds),
                filter: effects.filter.clone().unwrap_or_default(),
                composite: effects.composite.unwrap_or_default(),
                opacity: effects.opacity.unwrap_or(1.0),
                line: line.clone().unwrap_or_default(),
            },
            StyleInput::Profile(id) => match self.profile(*id) {
                Some(p) => ResolvedStyle {
                    paint: self.resolve_paint(p.paint, bounds),
                    filter: p.filter.clone(),
                    composite: p.composite,
                    opacity: p.opacity,
                    line: p.line.clone(),
                },
                None => {
                    tracing::warn!(profile = id.0, "unknown style profile, using defaults");
                    let p = StyleProfile::default();
                    ResolvedStyle {
                        paint: ResolvedPaint::Color(Rgba::WHITE),
                        filter: p.filter,
                        composite: p.composite,
                        opacity: p.opacity,
                        line: p.line,
                    }
                }
            },
        };
        ResolvedStyle {
            opacity: if resolved.opacity.is_finite() {
                resolved.opacity.clamp(0.0, 1.0)
            } else {
                1.0
            },
            line: resolved.line.canonical(),
            ..resolved
        }
    }

    /// Resolve and serialize in one step.
    pub fn serialize(&self, input: &StyleInput, category: Category, bounds: Rect) -> Signature {
        self.resolve(input, bounds).signature(category)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/style.rs"]
mod tests;
