// Play language frontend: lexer, parser, AST transformer, and semantic
// analyzer.
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this program.  If not, see
// <https://www.gnu.org/licenses/>.

use std::fs;
use std::process::ExitCode;

use clap::Parser as ClapParser;

use play_lang::ast::Program;
use play_lang::compile::tokenize;
use play_lang::error::CompileError;
use play_lang::parser::Parser;

/// Compiles a Play source file through the lexer, parser, transformer, and
/// semantic analyzer, and prints the resulting AST.
#[derive(ClapParser, Debug)]
#[command(name = "playc", version, about)]
struct Cli {
    /// Path to a .play source file.
    path: String,

    /// Print the AST as JSON instead of the default debug form.
    #[arg(long)]
    json: bool,

    /// Print the token stream and stop before parsing.
    #[arg(long)]
    dump_tokens: bool,

    /// Print the concrete syntax tree and stop before transforming.
    #[arg(long)]
    dump_cst: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: couldn't read '{}': {e}", cli.path);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, source: &str) -> Result<(), CompileError> {
    let tokens = tokenize(source)?;
    if cli.dump_tokens {
        for token in &tokens {
            println!("{token:?}");
        }
        return Ok(());
    }

    let cst = Parser::parse_program(&tokens)?;
    if cli.dump_cst {
        println!("{cst:#?}");
        return Ok(());
    }

    let program = play_lang::transform::transform_program(cst)?;
    play_lang::semantics::Analyzer::analyze(&program)?;
    print_program(&program, cli.json);
    Ok(())
}

fn print_program(program: &Program, as_json: bool) {
    if as_json {
        match serde_json::to_string_pretty(program) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("error: couldn't serialize AST: {e}"),
        }
    } else {
        println!("{program:#?}");
    }
}
