// shadertype: C++ header layouts to HLSL

use std::fs;
use std::io;
use std::path::PathBuf;

use clap::{Parser as _, ValueEnum};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use shadertype::codegen::{self, Template};
use shadertype::logger::{self, LogLevel};
use shadertype::parser::types::TypeInfo;
use shadertype::parser::{Grammar, Parser, ParserOptions, UnresolvedTypePolicy};
use shadertype::ui::App;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// HLSL struct per type
    Struct,
    /// HLSL cbuffer per type, registers counted from --register
    Cbuffer,
    /// Vertex-input format per member
    Formats,
}

#[derive(clap::Parser, Debug)]
#[command(name = "shadertype")]
#[command(version)]
#[command(about = "Compute C++ struct layouts and generate HLSL", long_about = None)]
struct Cli {
    /// Header files, parsed in order into one type table
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Print generated output instead of opening the inspector
    #[arg(short, long, value_enum)]
    emit: Option<Emit>,

    /// Only emit this type (`N::S`)
    #[arg(short = 't', long = "type", value_name = "NAME")]
    type_name: Option<String>,

    /// First cbuffer register
    #[arg(short, long, default_value_t = 0)]
    register: u32,

    /// Treat unknown type names as int instead of failing
    #[arg(long)]
    legacy_fallback: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Errors only
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logger::init_with_level(LogLevel::from_flags(cli.verbose, cli.quiet));

    let options = ParserOptions {
        unresolved_types: if cli.legacy_fallback {
            UnresolvedTypePolicy::FallbackToInt
        } else {
            UnresolvedTypePolicy::Error
        },
        ..ParserOptions::default()
    };
    let mut parser = Parser::with_options(Grammar::Cpp, options);

    for file in &cli.files {
        let source = match fs::read_to_string(file) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("Error: cannot read '{}': {}", file.display(), e);
                std::process::exit(1);
            }
        };
        if let Err(e) = parser.parse(&source) {
            eprintln!("{}: {}", file.display(), e);
            std::process::exit(1);
        }
        tracing::info!("parsed {}", file.display());
    }

    let Some(emit) = cli.emit else {
        return run_inspector(&parser, cli.register);
    };

    let selected: Vec<&TypeInfo> = match &cli.type_name {
        Some(name) => match parser.type_info_by_name(name) {
            Some(info) => vec![info],
            None => {
                eprintln!("Error: no type named '{name}'");
                std::process::exit(1);
            }
        },
        None => parser.type_infos().user_types().collect(),
    };

    let output = match emit {
        Emit::Struct => codegen::generate_module(selected, Template::Struct, cli.register),
        Emit::Cbuffer => codegen::generate_module(selected, Template::Cbuffer, cli.register),
        Emit::Formats => Ok(format_table(&selected)),
    };
    match output {
        Ok(text) => print!("{text}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// One block per type: the whole type as one attribute, then each member.
fn format_table(infos: &[&TypeInfo]) -> String {
    let mut out = String::new();
    for info in infos {
        out.push_str(&format!(
            "{} ({} bytes): {}\n",
            info.name.replace('.', "::"),
            info.size,
            codegen::vertex_format(info)
        ));
        for element in codegen::vertex_elements(info) {
            out.push_str(&format!(
                "  +{:<5} {:<20} {}\n",
                element.offset, element.name, element.format
            ));
        }
    }
    out
}

fn run_inspector(parser: &Parser, first_register: u32) -> Result<(), Box<dyn std::error::Error>> {
    // Built before the alternate screen so codegen warnings stay visible.
    let mut app = App::new(parser, first_register);

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
