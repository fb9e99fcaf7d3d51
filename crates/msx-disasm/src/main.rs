//! `msx-disasm <rom> [--style branch-all|linear] [--dialect native|asm] [--show-header]`

use std::path::PathBuf;
use std::process;

use msx_disasm::{disassemble_file, Config, Dialect};
use msx_disasm_core::ExploreStyle;

fn main() {
    env_logger::init();

    let mut path: Option<PathBuf> = None;
    let mut config = Config::default();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--style" => match args.next().as_deref() {
                Some("branch-all") => config.style = ExploreStyle::BranchAll,
                Some("linear") => config.style = ExploreStyle::Linear,
                other => usage_error(&format!("--style expects branch-all|linear, got {other:?}")),
            },
            "--dialect" => match args.next().as_deref() {
                Some("native") => config.dialect = Dialect::Native,
                Some("asm") => config.dialect = Dialect::Asm,
                other => usage_error(&format!("--dialect expects native|asm, got {other:?}")),
            },
            "--show-header" => config.show_header = true,
            "-h" | "--help" => {
                print_usage();
                return;
            }
            other if path.is_none() => path = Some(PathBuf::from(other)),
            other => usage_error(&format!("unexpected argument: {other}")),
        }
    }

    let Some(path) = path else {
        print_usage();
        process::exit(1);
    };

    match disassemble_file(&path, &config) {
        Ok(result) => {
            print!("{}", result.output);
            if let Some(err) = result.error {
                eprintln!("msx-disasm: {err}");
                process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("msx-disasm: {err}");
            process::exit(1);
        }
    }
}

fn usage_error(message: &str) -> ! {
    eprintln!("msx-disasm: {message}");
    print_usage();
    process::exit(1);
}

fn print_usage() {
    eprintln!(
        "usage: msx-disasm <rom> [--style branch-all|linear] [--dialect native|asm] [--show-header]"
    );
}
