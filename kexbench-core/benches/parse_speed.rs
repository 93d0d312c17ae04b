// SPDX-License-Identifier: Apache-2.0

//! Parser throughput over a realistic `openssl speed` report.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kexbench_core::SpeedReportParser;

fn sample_report() -> String {
    let mut report = String::from("OpenSSL 3.5.0 speed report\noptions: bn(64,64)\n");
    for alg in ["X25519", "ML-KEM-512", "ML-KEM-768", "ML-KEM-1024"] {
        for (phase, count) in [("keygen", 450_000), ("encaps", 240_000), ("decaps", 200_000)] {
            report.push_str(&format!(
                "Doing {alg} {phase} ops for 3s: {count} {phase} in 3.00s\n"
            ));
        }
        report.push_str("unrelated section line\n");
    }
    report
}

fn bench_parse(c: &mut Criterion) {
    let parser = SpeedReportParser::new();
    let report = sample_report();

    c.bench_function("parse_speed_report", |b| {
        b.iter(|| parser.parse(black_box(&report)))
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
