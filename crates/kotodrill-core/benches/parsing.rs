use criterion::{black_box, criterion_group, criterion_main, Criterion};

use kotodrill_core::evaluator::is_correct;
use kotodrill_core::model::Difficulty;
use kotodrill_core::parser::{extract_fields, parse_question};

fn bench_parse_question(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_question");

    let well_formed = "QUESTION: 私は毎日学校___行きます。\nANSWER: に\nEXPLANATION: The particle 'に' indicates the direction of movement towards a destination.\n";

    let chatty = r#"Sure! Here is a new question for you.

QUESTION: 友達___映画を見ました。
ANSWER: と
EXPLANATION: The particle 'と' marks the person you do something together with.
It is often translated as "with".

I hope this helps with your studies!"#;

    let no_markers = "The model rambled about the weather instead of writing a question.";

    let runaway = {
        let mut s = String::from("QUESTION: ");
        for _ in 0..100 {
            s.push_str("ああああああああああ");
        }
        s
    };

    group.bench_function("well_formed", |b| {
        b.iter(|| parse_question(black_box(well_formed), Difficulty::Beginner))
    });

    group.bench_function("chatty", |b| {
        b.iter(|| parse_question(black_box(chatty), Difficulty::Intermediate))
    });

    group.bench_function("fallback", |b| {
        b.iter(|| parse_question(black_box(no_markers), Difficulty::Beginner))
    });

    group.bench_function("runaway_extract", |b| {
        b.iter(|| extract_fields(black_box(&runaway)))
    });

    group.finish();
}

fn bench_is_correct(c: &mut Criterion) {
    let alternates: Vec<String> = ["へ", "で", "を", "が", "は"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    c.bench_function("is_correct_last_alternate", |b| {
        b.iter(|| is_correct(black_box("  は "), black_box("に"), black_box(&alternates)))
    });
}

criterion_group!(benches, bench_parse_question, bench_is_correct);
criterion_main!(benches);
