use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::HashMap;

use formscore_core::feedback::resolve_feedback;
use formscore_core::model::{
    AnswerValue, FieldDefinition, FieldOption, FieldType, ResponseSet, ScoreRange,
};
use formscore_core::scoring::compute_total_score;

fn make_fields(count: usize) -> Vec<FieldDefinition> {
    (0..count)
        .map(|i| FieldDefinition {
            id: format!("q{i}"),
            field_type: match i % 4 {
                0 => FieldType::Checkbox,
                1 => FieldType::Radio,
                2 => FieldType::YesNo,
                _ => FieldType::StarRating,
            },
            label: format!("Question {i}"),
            required: false,
            options: (0..4)
                .map(|j| FieldOption {
                    id: format!("q{i}-o{j}"),
                    label: format!("Option {j}"),
                    value: format!("v{j}"),
                    numeric_value: Some(j),
                })
                .collect(),
            has_numeric_values: true,
            score_ranges: vec![],
        })
        .collect()
}

fn make_responses(fields: &[FieldDefinition]) -> ResponseSet {
    let mut responses = HashMap::new();
    for field in fields {
        let answer = match field.field_type {
            FieldType::Checkbox => {
                AnswerValue::Selections(vec!["v1".into(), "v2".into(), "v3".into()])
            }
            FieldType::Radio => AnswerValue::Selection("v2".into()),
            FieldType::YesNo => AnswerValue::Toggle(true),
            _ => AnswerValue::Scale(4),
        };
        responses.insert(field.id.clone(), answer);
    }
    responses
}

fn make_ranges(count: usize) -> Vec<ScoreRange> {
    (0..count as i64)
        .map(|i| ScoreRange {
            min: i * 10,
            max: i * 10 + 9,
            message: format!("bucket {i}"),
        })
        .collect()
}

fn bench_total_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_total_score");

    for size in [10usize, 50, 200] {
        let fields = make_fields(size);
        let responses = make_responses(&fields);
        group.bench_function(format!("{size}_fields"), |b| {
            b.iter(|| compute_total_score(black_box(&responses), black_box(&fields)))
        });
    }

    group.finish();
}

fn bench_resolve_feedback(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_feedback");

    for size in [4usize, 32, 256] {
        let ranges = make_ranges(size);
        let score = (size as i64) * 10 - 5;
        group.bench_function(format!("{size}_ranges_last_match"), |b| {
            b.iter(|| resolve_feedback(black_box(score), black_box(&ranges)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_total_score, bench_resolve_feedback);
criterion_main!(benches);
