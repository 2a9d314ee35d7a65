use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use dotfx::{
    Anim, AnimFrame, ConnectionTarget, CpuSurface, Draggable, Drawable, Ease, EngineConfig, Filter,
    FrameDriver, Gradient, Lane, LineStyle, MediaSource, Paint, Point, Pointer, Rgba, Rng64,
    RunStats, StyleInput, TextStyle, Vec2, Viewport, VisualEffects, distance, draw_dot_connections,
    draw_line, draw_outer_ring, fade, falloff, generate_dots,
};

#[derive(Parser, Debug)]
#[command(name = "dotfx", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive the demo scene headlessly and print a JSON report.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Number of host ticks to feed the driver.
    #[arg(long, default_value_t = 120)]
    frames: u64,

    /// Simulated host refresh rate.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Engine config JSON; its viewport is replaced by `--width`/`--height`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the generated star field and ground.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Write the last frame as a PNG.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Image file shown in the middle of the scene.
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Debug, serde::Serialize)]
struct Report {
    ticks: u64,
    fps: f64,
    width: u32,
    height: u32,
    objects: usize,
    scene_time_ms: f64,
    stats: RunStats,
    config: EngineConfig,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    if !(args.fps.is_finite() && args.fps > 0.0) {
        anyhow::bail!("--fps must be a positive number, got {}", args.fps);
    }
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => EngineConfig::default(),
    };
    config.viewport = Viewport::new(f64::from(args.width), f64::from(args.height));

    let surface = CpuSurface::new(args.width, args.height)
        .context("create cpu surface")?
        .with_clear_rgba(Some([18, 20, 28, 255]));
    let mut driver = FrameDriver::new(config, Box::new(surface));
    build_demo(&mut driver, args.seed, args.image.clone());

    // The pointer sweeps across the lower half so pointer-driven effects show up in the stats.
    let step = 1000.0 / args.fps;
    let (w, h) = (f64::from(args.width), f64::from(args.height));
    let mut stats = RunStats::default();
    driver.start();
    for i in 0..args.frames {
        let t = if args.frames > 1 {
            i as f64 / (args.frames - 1) as f64
        } else {
            0.0
        };
        driver.set_pointer(Pointer::at(w * t, h * 0.7));
        if let Some(report) = driver.tick(i as f64 * step) {
            stats.record(&report);
        }
    }
    driver.stop();

    let report = Report {
        ticks: args.frames,
        fps: args.fps,
        width: args.width,
        height: args.height,
        objects: driver.scene().len(),
        scene_time_ms: driver.scene_time_ms(),
        stats,
        config: driver.config().clone(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(out) = args.out {
        let frame = driver
            .render()
            .surface()
            .read_pixels()
            .context("surface has no pixel readback")?;
        let data = frame.to_straight_rgba8();
        image::save_buffer_with_format(
            &out,
            &data,
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", out.display()))?;
        eprintln!("wrote {}", out.display());
    }

    Ok(())
}

fn build_demo(driver: &mut FrameDriver, seed: u64, image: Option<PathBuf>) {
    let vp = driver.scene().viewport();
    let (w, h) = (vp.width, vp.height);
    let mut rng = Rng64::new(seed);
    let mut dot_rng = Rng64::new(seed ^ 0x9e37_79b9_7f4a_7c15);

    let backdrop = driver.render_mut().add_gradient(Gradient::linear(
        245.0,
        [
            (0.0, Rgba::new(2.0, 0.0, 36.0, 1.0)),
            (0.4, Rgba::new(65.0, 9.0, 121.0, 0.5)),
            (1.0, Rgba::new(0.0, 178.0, 214.0, 0.25)),
        ],
    ));
    driver.scene_mut().add(
        Drawable::shape(
            Point::ZERO,
            [
                Drawable::dot(Point::new(0.0, 0.0)),
                Drawable::dot(Point::new(w, 0.0)),
                Drawable::dot(Point::new(w, h)),
                Drawable::dot(Point::new(0.0, h)),
            ],
        )
        .with_fill(Paint::Dynamic(backdrop))
        .hide_dots(),
    );

    // (gap, max alpha, max radius, rotation period, link distance)
    for (gap, max_alpha, max_radius, period_ms, link) in [
        (30.0, 1.15, 10.0, 120_000.0, 100.0),
        (40.0, 0.28, 5.0, 600_000.0, 60.0),
    ] {
        let stars = star_layer(
            w,
            h,
            gap,
            max_alpha,
            max_radius,
            period_ms,
            link,
            &mut rng,
            &mut dot_rng,
        );
        driver.scene_mut().add(stars);
    }

    for (depth, color) in [
        (0.78, Rgba::new(24.0, 28.0, 44.0, 1.0)),
        (0.88, Rgba::new(12.0, 14.0, 24.0, 1.0)),
    ] {
        driver.scene_mut().add(ground(w, h, depth, color, &mut rng));
    }

    let title = Drawable::text(
        Point::new(w / 2.0, h * 0.35),
        "dotfx",
        TextStyle {
            weight: 700,
            ..TextStyle::new("sans-serif", 46.0)
        },
    )
    .with_color(Rgba::new(235.0, 235.0, 255.0, 0.9))
    .on_setup(|t| {
        t.play_anim(
            Anim::looping(
                |t: &mut Drawable, f: AnimFrame| {
                    t.set_rotation(fade(f.progress, f.play_count, -6.0, 6.0));
                },
                3000.0,
                Ease::InOutSine,
            ),
            Lane::Concurrent,
        );
    });
    driver.scene_mut().add(title);

    if let Some(path) = image {
        let media = Drawable::image(Point::new(w / 2.0, h / 2.0), MediaSource::File(path))
            .with_size(Vec2::new(w / 4.0, h / 4.0))
            .on_error(|err| tracing::warn!(%err, "demo image unavailable"));
        driver.scene_mut().add(media);
    }

    tracing::info!(objects = driver.scene().len(), "demo scene built");
}

#[allow(clippy::too_many_arguments)]
fn star_layer(
    w: f64,
    h: f64,
    gap: f64,
    max_alpha: f64,
    max_radius: f64,
    period_ms: f64,
    link: f64,
    rng: &mut Rng64,
    dot_rng: &mut Rng64,
) -> Drawable {
    let dots = generate_dots(
        |_| 0.0,
        Point::ZERO,
        w,
        gap,
        [-h / 2.0, h / 2.0],
        rng,
        |dot, _| {
            let drift = dot_rng.range(-38.0, 38.0);
            let strength = dot_rng.range(0.1, 1.0);
            let cycle = dot_rng.range(4000.0, 7000.0);
            let mut applied = 0.0;
            dot.play_anim(
                Anim::looping(
                    move |d: &mut Drawable, f: AnimFrame| {
                        let dir = if f.play_count % 2 == 1 { 1.0 } else { -1.0 };
                        let dy = dir * drift * f.progress - applied;
                        d.translate(Vec2::new(0.0, dy));
                        applied += dy;
                        if f.progress >= 1.0 {
                            applied = 0.0;
                        }
                        d.set_alpha(fade(f.progress, f.play_count, 0.15, max_alpha * strength));
                        d.set_radius(fade(
                            f.progress,
                            f.play_count,
                            2.0,
                            max_radius - max_radius / 2.0 * strength,
                        ));
                    },
                    cycle,
                    Ease::InOutQuad,
                ),
                Lane::Concurrent,
            );
            if let Some(data) = dot.dot_data_mut() {
                data.drag = Some(Draggable::returning_home(1000.0, Ease::OutBack));
            }
        },
    );

    let pivot = Point::new(w / 2.0, h * 1.2);
    let ring = VisualEffects {
        filter: Some(Filter::blur(2.0)),
        ..VisualEffects::default()
    };
    let star = Rgba::new(225.0, 225.0, 255.0, 1.0);
    Drawable::shape(Point::new(0.0, h / 2.0), dots)
        .with_color(star)
        .with_limit(link * 2.0)
        .with_draw_effect(move |render, dot, ctx| {
            let alpha = dot.appearance().alpha.unwrap_or(1.0);
            let pos = ctx.transform * dot.pos();
            for &(id, other) in ctx.siblings {
                if Some(id) == dot.id() {
                    continue;
                }
                let other = ctx.transform * other;
                let d = distance(pos, other);
                if d > link {
                    continue;
                }
                let a = falloff(alpha * 0.6, d / link, alpha * 0.6);
                draw_line(
                    render,
                    pos,
                    other,
                    &StyleInput::color(star.with_alpha(a)).with_line(LineStyle::with_width(1.0)),
                );
            }
            if ctx.ratio < 1.0 {
                draw_outer_ring(
                    render,
                    pos,
                    max_radius * 2.0,
                    &StyleInput::Literal {
                        paint: Paint::Color(star.with_alpha(falloff(0.8, ctx.ratio, 0.8))),
                        effects: ring.clone(),
                        line: Some(LineStyle::with_width(2.0)),
                    },
                );
            }
        })
        .on_setup(move |s| {
            s.play_anim(
                Anim::looping(
                    move |s: &mut Drawable, f: AnimFrame| {
                        s.rotate_at(f.progress * 360.0, pivot);
                        let k = fade(f.progress, f.play_count, 1.0, 1.5);
                        s.scale_at(Vec2::new(k, k), pivot);
                    },
                    period_ms,
                    Ease::Linear,
                ),
                Lane::Concurrent,
            );
        })
}

fn ground(w: f64, h: f64, depth: f64, fill: Rgba, rng: &mut Rng64) -> Drawable {
    let spacing = 100.0;
    let line = Rgba::new(160.0, 170.0, 255.0, 0.6);
    let mut dots = vec![Drawable::dot(Point::new(0.0, h))];
    // Generated dot `i` sits at member index `i + 1`, so `Sibling(i)` is its left neighbour.
    dots.extend(generate_dots(
        |_| 0.0,
        Point::ZERO,
        w + spacing,
        spacing,
        [-12.5, 12.5],
        rng,
        |dot, i| dot.add_connection(ConnectionTarget::Sibling(i)),
    ));
    dots.push(Drawable::dot(Point::new(w, h)));

    Drawable::shape(Point::new(0.0, h * depth), dots)
        .with_radius(3.0)
        .with_color(line)
        .with_fill(fill)
        .with_limit(150.0)
        .with_draw_effect(move |render, dot, ctx| {
            draw_dot_connections(
                render,
                dot,
                ctx.frame,
                &StyleInput::color(line).with_line(LineStyle::with_width(2.0)),
            );
            dot.set_radius(falloff(6.0, ctx.ratio, 6.0 * 0.8));
            dot.set_alpha(falloff(1.0, ctx.ratio, 0.8));
        })
}
