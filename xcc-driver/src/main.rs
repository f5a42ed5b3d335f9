//! xcc - compiles a C-like source file to x86-64 assembly

use clap::Parser;
use log::{debug, LevelFilter};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use xcc_common::{CompilerError, ExitStatus};
use xcc_driver::{compile_source, CompileOptions};
use xcc_frontend::Frontend;
use xcc_ir::OptLevel;

#[derive(Parser, Debug)]
#[command(name = "xcc", version, about = "Compiles a C-like language to x86-64 assembly")]
struct Cli {
    /// Input source file
    input: PathBuf,

    /// Output assembly file (defaults to <input>.s)
    output: Option<PathBuf>,

    /// Print the syntax tree as JSON
    #[arg(long)]
    print_ast: bool,

    /// Print the SSA graph of every function
    #[arg(long)]
    print_ir: bool,

    /// Write the SSA graphs to a file
    #[arg(long, value_name = "PATH")]
    save_ir: Option<PathBuf>,

    /// Print the generated assembly
    #[arg(long)]
    print_asm: bool,

    /// Print the register assignment of every function as JSON
    #[arg(long)]
    print_regalloc: bool,

    /// Run the program on the simulator and print its exit value
    #[arg(long)]
    run: bool,

    /// Optimization level
    #[arg(short = 'O', value_name = "LEVEL", default_value_t = 1,
          value_parser = clap::value_parser!(u8).range(0..=1))]
    opt_level: u8,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn prints_anything(&self) -> bool {
        self.print_ast || self.print_ir || self.print_asm || self.print_regalloc
    }

    /// Where to write the assembly, if anywhere
    fn output_path(&self) -> Option<PathBuf> {
        match &self.output {
            Some(path) => Some(path.clone()),
            None if self.run || self.prints_anything() => None,
            None => Some(default_output(&self.input)),
        }
    }
}

fn default_output(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".s");
    PathBuf::from(name)
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let status = if err.use_stderr() {
                ExitStatus::InvalidArguments
            } else {
                ExitStatus::Success
            };
            process::exit(status.code());
        }
    };

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    match compile(&cli) {
        Ok(status) => process::exit(status),
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(err.exit_status().code());
        }
    }
}

/// Returns the process exit code on success
fn compile(cli: &Cli) -> Result<i32, CompilerError> {
    let source = fs::read_to_string(&cli.input)?;
    let filename = cli.input.display().to_string();
    let optimize = OptLevel::from_level(cli.opt_level).unwrap_or_default();
    let options = CompileOptions { optimize };
    debug!("options: {:?}", options);

    if cli.print_ast {
        let program = Frontend::parse_source(&source, &filename)?;
        println!("{}", Frontend::program_to_json(&program)?);
    }

    let compilation = compile_source(&source, &filename, &options)?;

    if cli.print_ir {
        print!("{}", compilation.ir_dump());
    }
    if let Some(path) = &cli.save_ir {
        fs::write(path, compilation.ir_dump())?;
        println!("IR written to: {}", path.display());
    }
    if cli.print_regalloc {
        let json = serde_json::to_string_pretty(&compilation.allocations())
            .map_err(|e| CompilerError::internal(e.to_string()))?;
        println!("{}", json);
    }

    let assembly = compilation.assembly()?;
    if cli.print_asm {
        print!("{}", assembly);
    }
    if let Some(path) = cli.output_path() {
        fs::write(&path, &assembly)?;
        debug!("assembly written to {}", path.display());
    }

    if cli.run {
        match compilation.run() {
            Ok(value) => println!("{}", value),
            Err(err) => {
                eprintln!("runtime error: {}", err);
                return Ok(ExitStatus::Failure.code());
            }
        }
    }
    Ok(ExitStatus::Success.code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("xcc").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_output_defaults_next_to_input() {
        let cli = parse(&["prog.l2"]);
        assert_eq!(cli.output_path(), Some(PathBuf::from("prog.l2.s")));
        assert_eq!(cli.opt_level, 1);
    }

    #[test]
    fn test_print_and_run_flags_suppress_default_output() {
        assert_eq!(parse(&["prog.l2", "--run"]).output_path(), None);
        assert_eq!(parse(&["prog.l2", "--print-asm"]).output_path(), None);
        assert_eq!(
            parse(&["prog.l2", "out.s", "--run"]).output_path(),
            Some(PathBuf::from("out.s"))
        );
    }

    #[test]
    fn test_optimization_level_is_bounded() {
        assert_eq!(parse(&["-O", "0", "prog.l2"]).opt_level, 0);
        assert!(Cli::try_parse_from(["xcc", "-O", "2", "prog.l2"]).is_err());
    }
}
