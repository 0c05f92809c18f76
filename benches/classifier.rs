//! Benchmarks for prompt classification and session reconstruction.
//!
//! The prompt hook runs on every submitted instruction, so classification
//! should stay well under a millisecond for typical prompts.

// Criterion macros generate items without docs - this is expected for benchmarks
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;

use hookwise::models::{Event, FileOperation};
use hookwise::rules::RuleSet;
use hookwise::services::{ClassifierConfig, PromptAdvisor, SummaryRenderer, classify, reconstruct};

const SHORT_PROMPT: &str = "add a login form";
const MEDIUM_PROMPT: &str =
    "Add a login form with client-side validation and a new API endpoint for authentication";
const LONG_PROMPT: &str = "I'm trying to figure out why the dashboard is slow. The React \
    component re-renders on every keystroke, the API endpoint runs an unindexed SQL query, \
    and the tests around it are flaky. Can you profile it, add a database index, fix the \
    failing tests and update the README with the new caching behavior?";

fn bench_classify(c: &mut Criterion) {
    let (rules, _) = RuleSet::builtin();
    let config = ClassifierConfig::default();
    let mut group = c.benchmark_group("classify");
    group.measurement_time(Duration::from_secs(5));

    for (name, prompt) in [
        ("short_prompt", SHORT_PROMPT),
        ("medium_prompt", MEDIUM_PROMPT),
        ("long_prompt", LONG_PROMPT),
    ] {
        group.throughput(Throughput::Bytes(prompt.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| classify(black_box(prompt), &rules, &config));
        });
    }

    group.bench_function("no_match", |b| {
        b.iter(|| classify(black_box("what a lovely day it is"), &rules, &config));
    });

    group.finish();
}

fn bench_advise(c: &mut Criterion) {
    let (rules, _) = RuleSet::builtin();
    let advisor = PromptAdvisor::new(&rules, ClassifierConfig::default());

    c.bench_function("advise_medium_prompt", |b| {
        b.iter(|| advisor.advise(black_box(MEDIUM_PROMPT)));
    });
}

fn bench_catalog_load(c: &mut Criterion) {
    c.bench_function("load_builtin_catalog", |b| {
        b.iter(RuleSet::builtin);
    });
}

fn session_events(size: u64) -> Vec<Event> {
    (0..size)
        .map(|i| {
            let seq = i + 1;
            match i % 4 {
                0 => Event::user_message(seq, format!("request {}", i % 10)),
                1 => Event::file_tool(seq, "Edit", format!("src/file_{}.rs", i % 50), FileOperation::Edit),
                2 => Event::success(seq, Some(seq - 1)),
                _ => Event::command(seq, "Bash", "cargo test"),
            }
        })
        .collect()
}

fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");
    let renderer = SummaryRenderer::new();

    for size in [100u64, 1_000, 10_000] {
        let events = session_events(size);
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("events", size), &events, |b, events| {
            b.iter(|| reconstruct(black_box(events)));
        });
        group.bench_with_input(BenchmarkId::new("render_report", size), &events, |b, events| {
            b.iter(|| {
                let timeline = reconstruct(events).unwrap_or_default();
                renderer.report(&renderer.render_now(&timeline))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_advise, bench_catalog_load, bench_reconstruct);
criterion_main!(benches);
