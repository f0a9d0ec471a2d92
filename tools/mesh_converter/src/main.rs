//! Mesh converter
//!
//! Converts Wavefront OBJ files into the engine's native mesh format. Each
//! `model.obj` produces `model.umesh` next to it.
//!
//! Usage: mesh_converter [--config config.toml] input.obj [more.obj ...]

use umbra_engine::assets::AssetLoader;
use umbra_engine::core::config::{ApplicationConfig, Config};
use umbra_engine::foundation::logging;

fn usage() -> ! {
    eprintln!("Usage: mesh_converter [--config config.toml] input.obj [more.obj ...]");
    eprintln!("Converts OBJ models into native .umesh files");
    std::process::exit(1);
}

fn main() {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    let config = if args[0] == "--config" {
        if args.len() < 2 {
            usage();
        }
        let path = args[1].clone();
        args.drain(..2);
        match ApplicationConfig::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        }
    } else {
        ApplicationConfig::default()
    };
    if args.is_empty() {
        usage();
    }

    logging::init_with_level(&config.engine.log_level);
    let loader = AssetLoader::from_config(&config.assets);

    let failed: Vec<&String> = args.iter().filter(|source| !loader.convert_obj(source.as_str())).collect();
    log::info!("Converted {} of {} files", args.len() - failed.len(), args.len());

    if !failed.is_empty() {
        for source in failed {
            eprintln!("Failed to convert {}", source);
        }
        std::process::exit(1);
    }
}
