/// Preview — render spintext copy repeatedly and report variety.
///
/// Usage:
///   spintext_preview --template "<text>" [options]
///   spintext_preview --library <path> [--block <name>] [options]
///
/// Options:
///   --locations <path>  --location <slug>   use a location's context
///   --keyword <text>                        set {keyword}
///   --set key=value                         set any context key (repeatable)
///   --count <n>                             renders per template (default 5)
///   --seed <n>                              RNG seed (default 42)
use rand::rngs::StdRng;
use rand::SeedableRng;
use spintext::core::variants::SpintextLibrary;
use spintext::schema::location::Location;
use spintext::{Context, Renderer};
use std::collections::BTreeMap;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut template = None;
    let mut library_path = None;
    let mut block = None;
    let mut locations_path = None;
    let mut location_slug = None;
    let mut keyword = None;
    let mut extra: Vec<(String, String)> = Vec::new();
    let mut count: usize = 5;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--template" if i + 1 < args.len() => {
                i += 1;
                template = Some(args[i].clone());
            }
            "--library" if i + 1 < args.len() => {
                i += 1;
                library_path = Some(args[i].clone());
            }
            "--block" if i + 1 < args.len() => {
                i += 1;
                block = Some(args[i].clone());
            }
            "--locations" if i + 1 < args.len() => {
                i += 1;
                locations_path = Some(args[i].clone());
            }
            "--location" if i + 1 < args.len() => {
                i += 1;
                location_slug = Some(args[i].clone());
            }
            "--keyword" if i + 1 < args.len() => {
                i += 1;
                keyword = Some(args[i].clone());
            }
            "--set" if i + 1 < args.len() => {
                i += 1;
                match args[i].split_once('=') {
                    Some((k, v)) => extra.push((k.to_string(), v.to_string())),
                    None => {
                        eprintln!("--set expects key=value, got: {}", args[i]);
                        std::process::exit(1);
                    }
                }
            }
            "--count" if i + 1 < args.len() => {
                i += 1;
                count = args[i].parse().unwrap_or(5);
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut ctx = match (locations_path, location_slug) {
        (Some(path), Some(slug)) => match Location::load_all_from_ron(Path::new(&path)) {
            Ok(locations) => match Location::find_by_slug(&locations, &slug) {
                Some(location) => location.context(),
                None => {
                    eprintln!("ERROR: no location with slug '{}'", slug);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("ERROR: Failed to load locations: {}", e);
                std::process::exit(1);
            }
        },
        (None, Some(_)) => {
            eprintln!("ERROR: --location requires --locations <path>");
            std::process::exit(1);
        }
        _ => Context::new(),
    };
    if let Some(keyword) = keyword {
        ctx.insert("keyword", keyword);
    }
    ctx.extend(extra);

    println!("Seed: {}", seed);

    if let Some(text) = template {
        let mut renderer = Renderer::seeded(seed);
        let outputs: Vec<String> = (0..count).map(|_| renderer.render(&text, &ctx)).collect();
        print_outputs("template", &outputs);
        return;
    }

    let Some(path) = library_path else {
        eprintln!("ERROR: one of --template or --library is required");
        print_usage();
        std::process::exit(1);
    };

    let library = match SpintextLibrary::load_from_ron(Path::new(&path)) {
        Ok(lib) => lib,
        Err(e) => {
            eprintln!("ERROR: Failed to load library: {}", e);
            std::process::exit(1);
        }
    };

    let names: Vec<String> = match block {
        Some(name) => vec![name],
        None => library.block_names().into_iter().map(str::to_string).collect(),
    };

    let mut rng = StdRng::seed_from_u64(seed);
    for name in names {
        let mut outputs = Vec::with_capacity(count);
        for _ in 0..count {
            match library.render_block(&name, &ctx, &mut rng) {
                Ok(text) => outputs.push(text),
                Err(e) => {
                    eprintln!("ERROR: {}", e);
                    std::process::exit(1);
                }
            }
        }
        print_outputs(&name, &outputs);
    }
}

fn print_outputs(label: &str, outputs: &[String]) {
    println!("\n--- {} ---", label);
    for text in outputs {
        println!("  {}", text);
    }

    let mut distinct: BTreeMap<&str, usize> = BTreeMap::new();
    for text in outputs {
        *distinct.entry(text.as_str()).or_default() += 1;
    }
    let unresolved = outputs.iter().filter(|t| t.contains('{')).count();
    println!(
        "  [{} renders, {} distinct, {} with unresolved tokens]",
        outputs.len(),
        distinct.len(),
        unresolved
    );
}

fn print_usage() {
    println!("Usage:");
    println!("  spintext_preview --template \"<text>\" [options]");
    println!("  spintext_preview --library <path> [--block <name>] [options]");
    println!();
    println!("Options:");
    println!("  --locations <path> --location <slug>  use a location's context");
    println!("  --keyword <text>                      set {{keyword}}");
    println!("  --set key=value                       set any context key");
    println!("  --count <n>                           renders per template (default 5)");
    println!("  --seed <n>                            RNG seed (default 42)");
}
