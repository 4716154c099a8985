use carve_sfs::{export_surface, CarvingSettings, SceneLoader, VoxelGrid};
use log::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Clone)]
#[structopt(
    name = "carve-sandbox",
    about = "A tool for carving meshes out of calibrated silhouettes"
)]
struct Opt {
    /// The scene folder.
    ///
    /// It must contain `cameras.txt` and `images.txt` in the COLMAP text format and a `sil`
    /// folder with one silhouette per image.
    #[structopt(parse(from_os_str))]
    folder: PathBuf,
    /// Only use the first this many images of `images.txt`.
    #[structopt(short, long)]
    max_views: Option<usize>,
    /// The file where settings are specified.
    ///
    /// This is in the format of `carve_sfs::CarvingSettings`.
    #[structopt(short, long, default_value = "carve-settings.json")]
    settings: PathBuf,
    /// Output PLY file to deposit the carved surface
    #[structopt(short, long, default_value = "carved.ply")]
    output: PathBuf,
    /// Output file to deposit the raw carved grid with bincode
    #[structopt(short, long)]
    field: Option<PathBuf>,
}

fn run(opt: Opt) -> carve_sfs::Result<()> {
    let settings = File::open(&opt.settings)
        .ok()
        .and_then(|file| serde_json::from_reader(file).ok());
    if settings.is_some() {
        info!("loaded existing settings");
    } else {
        info!("used default settings");
    }
    let settings: CarvingSettings = settings.unwrap_or_default();
    debug!("settings: {:?}", settings);

    let views = SceneLoader::new(&opt.folder)
        .threshold(settings.silhouette_threshold)
        .max_views(opt.max_views)
        .transform(settings.metric)
        .load()?;

    let mut grid = VoxelGrid::new(&settings.parameters());
    let engine = settings.engine();
    let report = if settings.buffered {
        engine.carve_all_buffered(&mut grid, &views)
    } else {
        engine.carve_all(&mut grid, &views)
    };
    debug!("{:?}", report);

    if let Some(path) = &opt.field {
        info!("saving the carved grid to {}", path.display());
        if let Err(e) = bincode::serialize_into(BufWriter::new(File::create(path)?), &grid) {
            error!("unable to save the carved grid: {}", e);
        }
    }

    info!("exporting the surface to {}", opt.output.display());
    let mesh = export_surface(
        &grid,
        &settings.extractor(),
        &settings.writer(),
        BufWriter::new(File::create(&opt.output)?),
    )?;
    info!(
        "wrote {} vertices and {} triangles",
        mesh.vertices.len(),
        mesh.faces.len()
    );
    Ok(())
}

fn main() {
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();
    if let Err(e) = run(opt) {
        error!("{}", e);
        std::process::exit(1);
    }
}
