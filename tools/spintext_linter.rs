/// Spintext Linter — validates copy libraries before they ship.
///
/// Usage: spintext_linter <library_dir_or_file> [--keys <k1,k2,...>]
use spintext::core::grammar::{PlaceholderKind, Template, TemplateSegment};
use spintext::core::variants::SpintextLibrary;
use std::collections::HashSet;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

const DEFAULT_KEYS: [&str; 6] = ["city_name", "region_name", "state_code", "slug", "phone", "keyword"];

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: spintext_linter <library_dir_or_file> [--keys <k1,k2,...>]");
        process::exit(0);
    }

    let library_path = Path::new(&args[1]);
    let mut keys: HashSet<String> = DEFAULT_KEYS.iter().map(|k| k.to_string()).collect();

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--keys" && i + 1 < args.len() {
            i += 1;
            keys = args[i]
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }
        i += 1;
    }

    let mut library = SpintextLibrary::default();
    if library_path.is_file() {
        match SpintextLibrary::load_from_ron(library_path) {
            Ok(lib) => library.merge(lib),
            Err(e) => {
                eprintln!("ERROR: Failed to load library file: {}", e);
                process::exit(1);
            }
        }
    } else if library_path.is_dir() {
        load_libraries_recursive(library_path, &mut library);
    } else {
        eprintln!("ERROR: Path '{}' does not exist", library_path.display());
        process::exit(1);
    }

    println!("Loaded {} copy blocks", library.blocks.len());

    let (errors, warnings) = lint_library(&library, &keys);

    println!("\n=== Spintext Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    process::exit(if errors.is_empty() { 0 } else { 1 });
}

fn load_libraries_recursive(dir: &Path, library: &mut SpintextLibrary) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                load_libraries_recursive(&path, library);
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                match SpintextLibrary::load_from_ron(&path) {
                    Ok(lib) => {
                        println!("  Loaded: {}", path.display());
                        library.merge(lib);
                    }
                    Err(e) => {
                        eprintln!("  ERROR loading {}: {}", path.display(), e);
                    }
                }
            }
        }
    }
}

fn lint_library(library: &SpintextLibrary, keys: &HashSet<String>) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for name in library.block_names() {
        let Ok(block) = library.get(name) else {
            continue;
        };

        if block.interval.is_some() && !block.variants.rotates() {
            warnings.push(format!(
                "Block '{}' sets interval_ms but has a single variant (never rotates)",
                name
            ));
        }
        if !block.resolve {
            warnings.push(format!(
                "Block '{}' is in raw mode; visitors will see unrendered templates",
                name
            ));
        }

        let mut seen = HashSet::new();
        for (idx, template) in block.variants.iter().enumerate() {
            let source = template.source();
            if !seen.insert(source.clone()) {
                warnings.push(format!("Block '{}' variant {} is a duplicate", name, idx));
            }
            lint_template(name, idx, template, keys, &mut errors, &mut warnings);
        }
    }

    (errors, warnings)
}

fn lint_template(
    block: &str,
    idx: usize,
    template: &Template,
    keys: &HashSet<String>,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    for segment in &template.segments {
        match segment {
            TemplateSegment::Literal(text) => {
                if text.contains('{') || text.contains('}') {
                    errors.push(format!(
                        "Block '{}' variant {} has a malformed brace span in: {:?}",
                        block, idx, text
                    ));
                }
            }
            TemplateSegment::Alternation { raw, options } => {
                let mut unique = HashSet::new();
                for option in options {
                    if !unique.insert(option.as_str()) {
                        warnings.push(format!(
                            "Block '{}' variant {} repeats option {:?} in {}",
                            block, idx, option, raw
                        ));
                    }
                }
            }
            TemplateSegment::Placeholder { raw, name, kind } => {
                if name.contains(char::is_whitespace) {
                    errors.push(format!(
                        "Block '{}' variant {} has {} which looks like an alternation missing '|'",
                        block, idx, raw
                    ));
                } else if !keys.contains(name.as_str()) {
                    let prefix = match kind {
                        PlaceholderKind::Location => "location field",
                        PlaceholderKind::Bare => "placeholder",
                    };
                    warnings.push(format!(
                        "Block '{}' variant {} uses unknown {} '{}' (renders as {})",
                        block, idx, prefix, name, raw
                    ));
                }
            }
        }
    }
}
