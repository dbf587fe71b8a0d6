//! grindgauge CLI — command-line interface for grind particle analysis.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use grindgauge::{
    circle_from_3, AnalysisConfig, AnalysisResult, Analyzer, Calibration, Circle, ContrastMode,
    Point, Rect,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "grindgauge")]
#[command(about = "Calibrated espresso grind particle-size analysis from a portafilter photo")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the basket rim circle in an image.
    DetectRim(CliDetectRimArgs),

    /// Run the full particle analysis pipeline.
    Analyze(CliAnalyzeArgs),
}

#[derive(Debug, Clone, Args)]
struct CliDetectRimArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Path to write the detected circle (JSON). Omit for stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliAnalyzeArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Path to write the analysis result (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Optional path for a per-particle CSV of accepted particles.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Basket inner diameter in millimetres.
    #[arg(long, default_value = "58.0")]
    basket_mm: f64,

    /// Calibration circle "cx,cy,r" in pixels; skips automatic detection.
    #[arg(long, value_parser = parse_circle)]
    circle: Option<Circle>,

    /// Calibration from three rim points "x1,y1,x2,y2,x3,y3" (pixels).
    #[arg(long, value_parser = parse_points3, conflicts_with = "circle")]
    points: Option<[Point; 3]>,

    /// Analysis region "x,y,w,h" in pixels; defaults to the whole image.
    #[arg(long, value_parser = parse_rect)]
    roi: Option<Rect>,

    /// Exclusion rectangle "x,y,w,h" in pixels. Repeatable.
    #[arg(long = "exclude", value_parser = parse_rect)]
    exclusions: Vec<Rect>,

    /// Use global histogram equalization instead of CLAHE.
    #[arg(long)]
    global_equalize: bool,
}

fn parse_floats(s: &str, n: usize, what: &str) -> Result<Vec<f64>, String> {
    let vals: Result<Vec<f64>, _> = s.split(',').map(|v| v.trim().parse::<f64>()).collect();
    match vals {
        Ok(v) if v.len() == n => Ok(v),
        Ok(v) => Err(format!("expected {} values for {}, got {}", n, what, v.len())),
        Err(e) => Err(format!("invalid {}: {}", what, e)),
    }
}

fn parse_circle(s: &str) -> Result<Circle, String> {
    let v = parse_floats(s, 3, "circle (cx,cy,r)")?;
    Ok(Circle {
        cx: v[0],
        cy: v[1],
        r: v[2],
    })
}

fn parse_rect(s: &str) -> Result<Rect, String> {
    let v = parse_floats(s, 4, "rectangle (x,y,w,h)")?;
    Ok(Rect::new(v[0], v[1], v[2], v[3]))
}

fn parse_points3(s: &str) -> Result<[Point; 3], String> {
    let v = parse_floats(s, 6, "points (x1,y1,x2,y2,x3,y3)")?;
    Ok([
        Point::new(v[0], v[1]),
        Point::new(v[2], v[3]),
        Point::new(v[4], v[5]),
    ])
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::DetectRim(args) => run_detect_rim(&args),
        Commands::Analyze(args) => run_analyze(&args),
    }
}

fn load_image(path: &PathBuf) -> CliResult<image::RgbaImage> {
    let img = image::open(path)
        .map_err(|e| -> CliError { format!("failed to open image {}: {}", path.display(), e).into() })?;
    Ok(img.to_rgba8())
}

// ── detect-rim ────────────────────────────────────────────────────────

fn run_detect_rim(args: &CliDetectRimArgs) -> CliResult<()> {
    let img = load_image(&args.image)?;
    let (w, h) = img.dimensions();
    tracing::info!("Image size: {}x{}", w, h);

    let analyzer = Analyzer::new();
    let circle = analyzer
        .detect_rim(&img)
        .ok_or("no rim circle found; calibrate manually with --circle or --points")?;
    tracing::info!(
        "Rim: center ({:.1}, {:.1}), radius {:.1} px",
        circle.cx,
        circle.cy,
        circle.r
    );

    let json = serde_json::to_string_pretty(&circle)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("Circle written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

// ── analyze ───────────────────────────────────────────────────────────

fn run_analyze(args: &CliAnalyzeArgs) -> CliResult<()> {
    let img = load_image(&args.image)?;
    let (w, h) = img.dimensions();
    tracing::info!("Image size: {}x{}", w, h);

    let mut config = AnalysisConfig::default();
    if args.global_equalize {
        config.segment.contrast = ContrastMode::GlobalEqualize;
    }
    let analyzer = Analyzer::with_config(config);

    let circle = match (&args.circle, &args.points) {
        (Some(c), _) => *c,
        (None, Some([p1, p2, p3])) => circle_from_3(*p1, *p2, *p3)
            .ok_or("the three rim points are collinear; pick points spread around the rim")?,
        (None, None) => {
            let c = analyzer
                .detect_rim(&img)
                .ok_or("no rim circle found; calibrate manually with --circle or --points")?;
            tracing::info!(
                "Rim: center ({:.1}, {:.1}), radius {:.1} px",
                c.cx,
                c.cy,
                c.r
            );
            c
        }
    };
    let calibration = Calibration::new(circle, args.basket_mm);

    let result = analyzer.analyze(
        &img,
        Some(&calibration),
        args.roi.as_ref(),
        &args.exclusions,
    )?;

    tracing::info!(
        "Particles: {} measured, {} accepted, score {}",
        result.particles.len(),
        result.accepted().count(),
        result.precision_score,
    );
    if let Some(ref stats) = result.stats {
        tracing::info!(
            "D10/D50/D90: {:.0}/{:.0}/{:.0} um, gsd {:.3}",
            stats.d10,
            stats.d50,
            stats.d90,
            stats.gsd,
        );
    }

    let json = serde_json::to_string_pretty(&result)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Results written to {}", args.out.display());

    if let Some(csv_path) = &args.csv {
        let csv = particles_csv(&result);
        std::fs::write(csv_path, csv)?;
        tracing::info!("CSV written to {}", csv_path.display());
    }

    Ok(())
}

fn particles_csv(result: &AnalysisResult) -> String {
    let mut out =
        String::from("id,cx_px,cy_px,diameter_um,area_um2,perimeter_um,solidity,circularity\n");
    for (i, p) in result.accepted().enumerate() {
        out.push_str(&format!(
            "{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.4},{:.4}\n",
            i,
            p.centroid[0],
            p.centroid[1],
            p.diameter_um,
            p.area_um2,
            p.perimeter_um,
            p.solidity,
            p.circularity,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_argument_parses() {
        let c = parse_circle("100.5, 200, 50").unwrap();
        assert_eq!(c.cx, 100.5);
        assert_eq!(c.cy, 200.0);
        assert_eq!(c.r, 50.0);
    }

    #[test]
    fn rect_argument_parses() {
        let r = parse_rect("10,20,30,40").unwrap();
        assert_eq!((r.x, r.y, r.w, r.h), (10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn wrong_arity_is_rejected() {
        assert!(parse_circle("1,2").is_err());
        assert!(parse_rect("1,2,3").is_err());
        assert!(parse_points3("1,2,3,4,5").is_err());
        assert!(parse_rect("1,2,x,4").is_err());
    }
}
