use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tridollar::{parse, Lexer, ParseError, SourceError};

pub fn lex_benchmark(c: &mut Criterion) -> Result<(), SourceError> {
    let source = tridollar::source::read_file("resources/primes.tds")?;
    c.bench_function("lex", |b| {
        b.iter(|| Lexer::new(black_box(&source)).count())
    });

    Ok(())
}

pub fn parse_benchmark(c: &mut Criterion) -> Result<(), SourceError> {
    let source = tridollar::source::read_file("resources/primes.tds")?;
    c.bench_function("parse", |b| {
        b.iter(|| -> Result<(), ParseError> {
            parse(black_box(&source))?;

            Ok(())
        })
    });

    Ok(())
}

pub fn parser_benchmarks(c: &mut Criterion) {
    if let Err(err) = lex_benchmark(c).and_then(|_| parse_benchmark(c)) {
        eprintln!("failed to load benchmark source: {}", err);
    }
}

criterion_group!(parser, parser_benchmarks);
criterion_main!(parser);
