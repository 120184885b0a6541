//! Tree-walking interpreter benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dylang::interpreter::Interpreter;
use dylang::lexer::Scanner;
use dylang::parser::Parser;

fn parse(source: &str) -> dylang::ast::Program {
    let tokens = Scanner::new(source).scan_tokens().expect("lexer error");
    Parser::new(tokens).parse().expect("parser error")
}

fn run(source: &str) {
    let program = parse(source);
    let mut interpreter = Interpreter::new();
    interpreter.interpret(&program).expect("runtime error");
}

fn bench_loop_sum(c: &mut Criterion) {
    let source = r#"
let sum = 0
for range(i, 10000) {
    sum = sum + i
}
"#;
    c.bench_function("interp_loop_sum", |b| b.iter(|| run(black_box(source))));
}

fn bench_fib_recursive(c: &mut Criterion) {
    let source = r#"
funct fib(n) {
    if (n < 2) { return n }
    return fib(n - 1) + fib(n - 2)
}
fib(15)
"#;
    c.bench_function("interp_fib_recursive", |b| b.iter(|| run(black_box(source))));
}

fn bench_string_building(c: &mut Criterion) {
    let source = r#"
let s = ""
for range(i, 200) {
    s = s + "x" + i
}
"#;
    c.bench_function("interp_string_building", |b| {
        b.iter(|| run(black_box(source)))
    });
}

fn bench_closures(c: &mut Criterion) {
    let source = r#"
funct mk() {
    let c = 0
    funct inc() {
        ++c
        return c
    }
    return inc
}
let f = mk()
for range(i, 1000) { f() }
"#;
    c.bench_function("interp_closures", |b| b.iter(|| run(black_box(source))));
}

criterion_group!(
    benches,
    bench_loop_sum,
    bench_fib_recursive,
    bench_string_building,
    bench_closures
);
criterion_main!(benches);
