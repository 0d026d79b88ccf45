use std::sync::Arc;

use alder::{CompileOptions, Namespace, Value, Vm, VmConfig, runtime::closure::Closure};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

#[path = "../tests/common/reader.rs"]
mod reader;

struct Scenario {
    name: &'static str,
    n: i64,
}

const COUNT_DOWN: &str = "
(lambda (n)
  ((lambda loop (i acc) (if (== i 0) acc (loop (- i 1) (+ acc 1)))) n 0))";

const PING_PONG: &str = "
(lambda (n)
  (letrec (ping (lambda (i) (if (== i 0) 'done (pong (- i 1))))
           pong (lambda (i) (if (== i 0) 'done (ping (- i 1)))))
    (ping n)))";

fn compile_program(vm: &Vm, source: &str) -> Arc<Closure> {
    let form = reader::read(source).unwrap_or_else(|e| panic!("{}", e));
    match vm.eval(&Namespace::user(), &form).unwrap() {
        Value::Closure(closure) => closure,
        other => panic!("expected a closure, got {}", other),
    }
}

fn build_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "10k",
            n: 10_000,
        },
        Scenario {
            name: "100k",
            n: 100_000,
        },
    ]
}

fn bench_program(c: &mut Criterion, group_name: &str, source: &str, vm: &Vm) {
    let closure = compile_program(vm, source);
    let mut group = c.benchmark_group(group_name);

    for scenario in build_scenarios() {
        group.throughput(Throughput::Elements(scenario.n as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(scenario.name),
            &scenario.n,
            |b, n| {
                b.iter(|| {
                    let result = vm.invoke(&closure, vec![Value::Integer(*n)]).unwrap();
                    black_box(result);
                });
            },
        );
    }

    group.finish();
}

fn bench_self_tail_call(c: &mut Criterion) {
    bench_program(c, "vm/self_tail_call", COUNT_DOWN, &Vm::new());
}

fn bench_mutual_tail_call(c: &mut Criterion) {
    bench_program(c, "vm/mutual_tail_call", PING_PONG, &Vm::new());
}

fn bench_without_inlining(c: &mut Criterion) {
    let vm = Vm::with_config(VmConfig {
        compile: CompileOptions::without_inlining(),
        ..VmConfig::default()
    });
    bench_program(c, "vm/self_tail_call_no_inline", COUNT_DOWN, &vm);
}

criterion_group!(
    benches,
    bench_self_tail_call,
    bench_mutual_tail_call,
    bench_without_inlining
);
criterion_main!(benches);
