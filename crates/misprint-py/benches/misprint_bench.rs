// Criterion benchmarks for misprint-py.
//
// Run:
//   cargo bench -p misprint-py

use criterion::{Criterion, criterion_group, criterion_main};
use misprint_core::damerau_levenshtein;
use misprint_py::{CheckOptions, KeywordVocabulary, MisprintDetector, classify};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

const MODULE: &str = "\
def render(template, context=None, **options):
    strict = options.get('strict', False)
    escape = options.get('autoescape', True)
    trim = options['trim_blocks']
    lstrip = options.get('lstrip_blocks')
    newline = options.get('newline_sequence', '\\n')
    keep = options.get('keep_trailing_newline')
    return template

class Widget:
    def __init__(self, parent=None, **kw):
        self.width = kw.get('width')
        self.height = kw.get('height')
        self.color = kw['color']

class Button(Widget):
    def __init__(self, label, **kw):
        super().__init__(**kw)
        self.command = kw.get('command')

render('x', strict=True, autoescap=False, trim_block=True, unknown=1)
b = Button('ok', widht=10, color='red', comand=None)
";

fn vocabulary() -> KeywordVocabulary {
    [
        "autoescape",
        "context",
        "keep_trailing_newline",
        "lstrip_blocks",
        "newline_sequence",
        "strict",
        "trim_blocks",
    ]
    .into_iter()
    .collect()
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_distance(c: &mut Criterion) {
    let pairs = [
        ("autoescap", "autoescape"),
        ("trim_block", "trim_blocks"),
        ("newline_sequnece", "newline_sequence"),
        ("keep_trailing_newline", "lstrip_blocks"),
        ("strict", "strict"),
    ];
    c.bench_function("damerau_levenshtein", |b| {
        b.iter(|| {
            for (a, z) in &pairs {
                std::hint::black_box(damerau_levenshtein(a, z));
            }
        });
    });
}

fn bench_classify(c: &mut Criterion) {
    let vocabulary = vocabulary();
    let supplied = ["strict", "autoescap", "trim_block", "unknown", "context"];
    let options = CheckOptions::default();
    c.bench_function("classify_5_of_7", |b| {
        b.iter(|| std::hint::black_box(classify(&vocabulary, supplied, &options)));
    });
}

fn bench_module(c: &mut Criterion) {
    c.bench_function("parse_and_register_module", |b| {
        b.iter(|| std::hint::black_box(MisprintDetector::from_source(MODULE)));
    });

    let broken = format!("{MODULE}\ndef broken(**kw):\n    s = 'unterminated\n");
    c.bench_function("recover_and_register_module", |b| {
        b.iter(|| std::hint::black_box(MisprintDetector::from_source(&broken)));
    });

    let detector = MisprintDetector::from_source(MODULE);
    c.bench_function("check_calls", |b| {
        b.iter(|| std::hint::black_box(detector.check_calls()));
    });
}

criterion_group!(benches, bench_distance, bench_classify, bench_module);
criterion_main!(benches);
