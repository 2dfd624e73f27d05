use clap::{App, Arg, ArgMatches};
use log::LevelFilter;
use std::io::{self, BufRead};
use std::process;
use std::time::Instant;
use tridollar::{source, Parser, Program, Vm, VmConfig};

fn args() -> ArgMatches {
    App::new("tridollar")
        .about("a lexer, parser and virtual machine for the $$$ labeled-instruction language")
        .version("0.1.0")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .takes_value(true)
                .required(false)
                .help("source file to run, read from stdin until an empty line if omitted"),
        )
        .arg(
            Arg::new("ir")
                .short('i')
                .long("ir")
                .required(false)
                .takes_value(false)
                .help("prints the parsed instructions and exits without running them"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .takes_value(false)
                .required(false)
                .help("logs the registers after each executed instruction"),
        )
        .arg(
            Arg::new("debug-memory")
                .short('m')
                .long("debug-memory")
                .takes_value(false)
                .required(false)
                .help("logs the memory store after each executed instruction"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .required(false)
                .takes_value(false)
                .help("suppresses all output other than what the program is printing"),
        )
        .arg(
            Arg::new("state")
                .short('s')
                .long("state")
                .required(false)
                .takes_value(false)
                .help("prints the final registers and memory after the run"),
        )
        .arg(
            Arg::new("lenient")
                .short('l')
                .long("lenient")
                .required(false)
                .takes_value(false)
                .help("runs the instructions that parsed even if the source has syntax errors"),
        )
        .get_matches()
}

fn init_logging(debug: bool, quiet: bool) {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    if quiet {
        builder.filter_level(LevelFilter::Error);
    } else if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

/// Reads program lines from stdin until an empty line or end of input.
fn read_stdin() -> io::Result<String> {
    let mut source = String::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        source.push_str(&line);
        source.push('\n');
    }

    Ok(source)
}

fn load(file_name: Option<&str>) -> Result<String, String> {
    match file_name {
        Some(file_name) => source::read_file(file_name).map_err(|err| err.to_string()),
        None => {
            log::info!("reading program from stdin, finish with an empty line");
            read_stdin().map_err(|err| format!("failed to read stdin: {}", err))
        }
    }
}

fn compile(source: &str, lenient: bool) -> Option<Program> {
    let (program, diagnostics) = Parser::new(source).parse();
    for diagnostic in &diagnostics {
        if lenient {
            log::warn!("{}", diagnostic);
        } else {
            log::error!("{}", diagnostic);
        }
    }

    if diagnostics.is_empty() || lenient {
        Some(program)
    } else {
        None
    }
}

fn main() {
    let args = args();
    let ir = args.is_present("ir");
    let debug = args.is_present("debug");
    let debug_memory = args.is_present("debug-memory");
    let quiet = args.is_present("quiet");
    init_logging(debug || debug_memory, quiet);

    let start = Instant::now();
    let source = match load(args.value_of("file")) {
        Ok(source) => source,
        Err(err) => {
            log::error!("{}", err);
            process::exit(1);
        }
    };
    let program = match compile(&source, args.is_present("lenient")) {
        Some(program) => program,
        None => process::exit(1),
    };
    let end = Instant::now();
    log::info!(
        "parsed {} instruction(s) in {} ms ({} ns)",
        program.len(),
        end.duration_since(start).as_millis(),
        end.duration_since(start).as_nanos()
    );

    let mut vm = Vm::new(program, VmConfig::new(ir, debug, debug_memory, false));
    if ir {
        return;
    }

    let start = Instant::now();
    let result = vm.run();
    let end = Instant::now();
    log::info!(
        "routine took {} ms ({} ns)",
        end.duration_since(start).as_millis(),
        end.duration_since(start).as_nanos()
    );

    if args.is_present("state") {
        print!("{}", vm.state());
    }
    if let Err(err) = result {
        log::error!("{}", err);
        process::exit(1);
    }
}
