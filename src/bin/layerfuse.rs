use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "layerfuse", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a scene into a single PNG.
    Flatten(FlattenArgs),
    /// Print the compositing tree built for a scene.
    Tree(TreeArgs),
}

#[derive(Parser, Debug)]
struct FlattenArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Composite onto an opaque background color (`#RRGGBB`) instead of transparency.
    #[arg(long)]
    background: Option<layerfuse::Rgba8>,

    /// Always keep a root group, never hand back a single layer's pixels.
    #[arg(long)]
    simple: bool,
}

#[derive(Parser, Debug)]
struct TreeArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Always keep a root group, never hand back a single layer's pixels.
    #[arg(long)]
    simple: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Flatten(args) => cmd_flatten(args),
        Command::Tree(args) => cmd_tree(args),
    }
}

fn load_document(path: &std::path::Path) -> anyhow::Result<layerfuse::Document> {
    let scene = layerfuse::Scene::from_path(path)
        .with_context(|| format!("load scene '{}'", path.display()))?;
    let doc = scene
        .to_document()
        .with_context(|| format!("build document from '{}'", path.display()))?;
    Ok(doc)
}

fn cmd_flatten(args: FlattenArgs) -> anyhow::Result<()> {
    let doc = load_document(&args.in_path)?;
    let opts = layerfuse::BlendTreeOpts::default().with_require_simple_fusion(args.simple);
    let mut tree = layerfuse::BlendTree::for_document(&doc, opts);
    let fusion = tree.blend_tree(doc.root());

    let out = match args.background {
        Some(color) => {
            let color = layerfuse::Rgba8::opaque(color.r, color.g, color.b);
            let mut bg = layerfuse::ColorBuffer::filled(doc.width(), doc.height(), color);
            let rect = bg.bounds();
            layerfuse::fuse_image_onto_image(
                &mut bg,
                fusion.image,
                false,
                fusion.alpha,
                fusion.blend_mode,
                rect,
                fusion.mask,
            );
            bg
        }
        None => fusion.flatten(),
    };

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        out.data(),
        out.width(),
        out.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_tree(args: TreeArgs) -> anyhow::Result<()> {
    let doc = load_document(&args.in_path)?;
    let opts = layerfuse::BlendTreeOpts::default().with_require_simple_fusion(args.simple);
    let mut tree = layerfuse::BlendTree::for_document(&doc, opts);
    tree.build_tree(doc.root());
    print!("{}", tree.describe());
    Ok(())
}
