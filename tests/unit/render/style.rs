use super::*;

fn bounds() -> Rect {
    Rect::new(0.0, 0.0, 10.0, 10.0)
}

#[test]
fn equivalent_color_literals_share_a_signature() {
    let book = StyleBook::default();
    let a = StyleInput::color(Rgba::new(255.0, 0.0, 0.0, 1.0));
    let b = StyleInput::color(Rgba::new(254.7, 0.2, 0.0, 1.0));
    assert_eq!(
        book.serialize(&a, Category::Fill, bounds()),
        book.serialize(&b, Category::Fill, bounds())
    );
}

#[test]
fn alpha_is_part_of_the_signature() {
    let book = StyleBook::default();
    let opaque = StyleInput::color(Rgba::new(255.0, 0.0, 0.0, 1.0));
    let half = StyleInput::color(Rgba::new(255.0, 0.0, 0.0, 0.5));
    assert_ne!(
        book.serialize(&opaque, Category::Fill, bounds()),
        book.serialize(&half, Category::Fill, bounds())
    );
}

#[test]
fn omitted_fields_resolve_to_defaults() {
    let mut book = StyleBook::default();
    let explicit = StyleInput::Literal {
        paint: Paint::Color(Rgba::WHITE),
        effects: VisualEffects {
            filter: Some(Filter::none()),
            composite: Some(CompositeOp::SourceOver),
            opacity: Some(1.0),
        },
        line: Some(LineStyle::default()),
    };
    let implicit = StyleInput::color(Rgba::WHITE);
    let profile = StyleInput::Profile(book.add_profile(StyleProfile::default()));
    for category in [Category::Fill, Category::Stroke] {
        let sig = book.serialize(&explicit, category, bounds());
        assert_eq!(sig, book.serialize(&implicit, category, bounds()));
        assert_eq!(sig, book.serialize(&profile, category, bounds()));
    }
}

#[test]
fn line_fields_only_affect_strokes() {
    let book = StyleBook::default();
    let thin = StyleInput::color(Rgba::WHITE).with_line(LineStyle::with_width(1.0));
    let thick = StyleInput::color(Rgba::WHITE).with_line(LineStyle::with_width(4.0));
    assert_eq!(
        book.serialize(&thin, Category::Fill, bounds()),
        book.serialize(&thick, Category::Fill, bounds())
    );
    assert_ne!(
        book.serialize(&thin, Category::Stroke, bounds()),
        book.serialize(&thick, Category::Stroke, bounds())
    );
}

#[test]
fn gradient_signature_is_tagged_and_bounds_sensitive() {
    let mut book = StyleBook::default();
    let id = book.add_gradient(Gradient::linear(
        0.0,
        [(0.0, Rgba::WHITE), (1.0, Rgba::new(0.0, 0.0, 0.0, 1.0))],
    ));
    let input = StyleInput::Literal {
        paint: Paint::Dynamic(id),
        effects: VisualEffects::default(),
        line: None,
    };
    let a = book.serialize(&input, Category::Fill, bounds());
    let b = book.serialize(&input, Category::Fill, Rect::new(5.0, 5.0, 20.0, 20.0));
    assert!(a.as_str().starts_with("g:"));
    assert_ne!(a, b);

    let color = book.serialize(&StyleInput::color(Rgba::WHITE), Category::Fill, bounds());
    assert!(color.as_str().starts_with("c:"));
}

#[test]
fn profile_updates_change_later_signatures() {
    let mut book = StyleBook::default();
    let id = book.add_profile(StyleProfile::color(Rgba::WHITE));
    let before = book.serialize(&StyleInput::Profile(id), Category::Fill, bounds());
    book.profile_mut(id).unwrap().opacity = 0.5;
    let after = book.serialize(&StyleInput::Profile(id), Category::Fill, bounds());
    assert_ne!(before, after);
}

#[test]
fn dangling_profile_falls_back_to_defaults() {
    let book = StyleBook::default();
    let resolved = book.resolve(&StyleInput::Profile(ProfileId(42)), bounds());
    assert_eq!(resolved.paint, ResolvedPaint::Color(Rgba::WHITE));
    assert_eq!(resolved.opacity, 1.0);
}

#[test]
fn effective_alpha_combines_paint_and_opacity() {
    let book = StyleBook::default();
    let input = StyleInput::Literal {
        paint: Paint::Color(Rgba::WHITE.with_alpha(0.5)),
        effects: VisualEffects {
            opacity: Some(0.5),
            ..VisualEffects::default()
        },
        line: None,
    };
    let resolved = book.resolve(&input, bounds());
    assert!((resolved.effective_alpha() - 0.25).abs() < 1e-12);
}

#[test]
fn filter_parsing_canonicalizes_units() {
    let f: Filter = "blur(2px)  brightness(120%) hue-rotate(90deg)".parse().unwrap();
    assert_eq!(f.canonical(), "blur(2px) brightness(1.2) hue-rotate(90deg)");
    assert!(!f.requires_isolation());

    let g: Filter = "blur(2)".parse().unwrap();
    assert_eq!(g, Filter::blur(2.0));
}

#[test]
fn url_filters_require_isolation() {
    let f: Filter = "url(#glow)".parse().unwrap();
    assert!(f.requires_isolation());
    assert_eq!(f.canonical(), "url(#glow)");
}

#[test]
fn malformed_filters_fall_back_to_none() {
    assert!("blur(".parse::<Filter>().is_err());
    assert!("wobble(3)".parse::<Filter>().is_err());
    assert!(Filter::parse_or_none("blur(abc)").is_none());
    assert!(Filter::parse_or_none("none").is_none());
}

#[test]
fn composite_names_round_trip() {
    for op in CompositeOp::ALL {
        assert_eq!(op.as_str().parse::<CompositeOp>().unwrap(), op);
    }
    assert_eq!(
        "LIGHTER".parse::<CompositeOp>().unwrap(),
        CompositeOp::Lighter
    );
    assert!("glow".parse::<CompositeOp>().is_err());
}

#[test]
fn line_style_canonicalization() {
    let odd = LineStyle {
        dash: vec![4.0],
        ..LineStyle::default()
    };
    let even = LineStyle {
        dash: vec![4.0, 4.0],
        ..LineStyle::default()
    };
    assert_eq!(odd.canonical(), even.canonical());

    let zero = LineStyle {
        dash: vec![0.0, 0.0],
        dash_offset: 3.0,
        ..LineStyle::default()
    };
    assert_eq!(zero.canonical(), LineStyle::default());

    let bad = LineStyle {
        width: f64::NAN,
        dash: vec![-1.0, 2.0],
        ..LineStyle::default()
    };
    assert_eq!(bad.canonical(), LineStyle::default());
}

#[test]
fn gradient_sampling_interpolates_between_stops() {
    let g = Gradient::linear(
        0.0,
        [
            (1.0, Rgba::new(0.0, 0.0, 0.0, 1.0)),
            (0.0, Rgba::new(200.0, 0.0, 0.0, 0.0)),
        ],
    );
    assert_eq!(g.stops[0].offset, 0.0);
    let mid = g.sample(0.5);
    assert!((mid.r - 100.0).abs() < 1e-9);
    assert!((mid.a - 0.5).abs() < 1e-9);
    assert_eq!(g.max_alpha(), 1.0);
    assert_eq!(Gradient::radial([]).sample(0.3), Rgba::TRANSPARENT);
}

#[test]
fn unknown_gradient_resolves_to_transparent() {
    let book = StyleBook::default();
    let input = StyleInput::Literal {
        paint: Paint::Dynamic(PaintId(7)),
        effects: VisualEffects::default(),
        line: None,
    };
    assert_eq!(book.resolve(&input, bounds()).effective_alpha(), 0.0);
}

#[test]
fn visual_effects_fall_back_field_by_field() {
    let own = VisualEffects {
        opacity: Some(0.3),
        ..VisualEffects::default()
    };
    let group = VisualEffects {
        filter: Some(Filter::blur(1.0)),
        composite: Some(CompositeOp::Lighter),
        opacity: Some(0.9),
    };
    let merged = own.or(&group);
    assert_eq!(merged.opacity, Some(0.3));
    assert_eq!(merged.composite, Some(CompositeOp::Lighter));
    assert_eq!(merged.filter, Some(Filter::blur(1.0)));
}

#[test]
fn replacing_a_gradient_bumps_its_revision() {
    let mut book = StyleBook::default();
    let id = book.add_gradient(Gradient::radial([(0.0, Rgba::WHITE)]));
    let input = StyleInput::Literal {
        paint: Paint::Dynamic(id),
        effects: VisualEffects::default(),
        line: None,
    };
    let revision = |book: &StyleBook| match book.resolve(&input, bounds()).paint {
        ResolvedPaint::Gradient { revision, .. } => Some(revision),
        ResolvedPaint::Color(_) => None,
    };
    assert_eq!(revision(&book), Some(0));
    book.set_gradient(id, Gradient::radial([(0.0, Rgba::TRANSPARENT)]))
        .unwrap();
    assert_eq!(revision(&book), Some(1));
    assert!(book.set_gradient(PaintId(9), Gradient::radial([])).is_err());
}
